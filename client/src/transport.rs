//! Executes core `HttpRequest` values with `reqwest`.

use bookshelf_core::{ApiError, HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartForm, PartValue};
use reqwest::multipart::{Form, Part};
use reqwest::Method;

/// Send `req` and return the response as data.
///
/// Non-2xx statuses are returned as `Ok`; interpreting them is the core's
/// job. Only failures to get any response become `ApiError::Transport`.
pub async fn execute(http: &reqwest::Client, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let method = req.method;
    let url = req.url;
    let multipart = matches!(req.body, Some(HttpBody::Multipart(_)));
    tracing::debug!(
        method = method.as_str(),
        %url,
        authenticated = req.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("authorization")),
        "sending request"
    );

    let mut builder = http.request(to_method(method), &url);
    for (name, value) in &req.headers {
        // reqwest writes the multipart content type itself, boundary included.
        if multipart && name.eq_ignore_ascii_case("content-type") {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder = match req.body {
        None => builder,
        Some(HttpBody::Json(text)) => builder.body(text),
        Some(HttpBody::Multipart(form)) => builder.multipart(to_form(form)?),
    };

    let response = builder.send().await.map_err(|e| {
        tracing::warn!(method = method.as_str(), %url, error = %e, "request failed");
        ApiError::Transport(e.to_string())
    })?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    if !(200..300).contains(&status) {
        tracing::warn!(method = method.as_str(), %url, status, "request rejected");
    }
    Ok(HttpResponse { status, headers, body })
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn to_form(form: MultipartForm) -> Result<Form, ApiError> {
    form.parts.into_iter().try_fold(Form::new(), |acc, part| {
        let form = match part.value {
            PartValue::Text(text) => acc.text(part.name, text),
            PartValue::File(upload) => {
                let file = Part::bytes(upload.bytes)
                    .file_name(upload.file_name)
                    .mime_str(&upload.mime_type)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                acc.part(part.name, file)
            }
        };
        Ok(form)
    })
}
