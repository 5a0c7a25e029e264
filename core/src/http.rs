//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and parses `HttpResponse` values without
//! ever touching the network; the host (see the `bookshelf-client` crate)
//! executes the actual I/O.
//!
//! Multipart bodies stay structured (`MultipartForm`) instead of being
//! encoded here. The boundary and the final `content-type` value belong to
//! whichever HTTP stack puts the bytes on the wire.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A picked file: name, MIME type and contents.
///
/// The byte length of `bytes` is the size that upload rules check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Value of a single multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(Upload),
}

/// One named field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

/// A multipart form body, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: &str, upload: Upload) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::File(upload),
        });
        self
    }

    /// Field names in the order they will be sent.
    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&PartValue> {
        self.parts.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PartValue::Text(s) => Some(s),
            PartValue::File(_) => None,
        }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// Serialized JSON text.
    Json(String),
    Multipart(MultipartForm),
}

impl HttpBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            HttpBody::Json(_) => "application/json",
            HttpBody::Multipart(_) => "multipart/form-data",
        }
    }

    pub fn as_json(&self) -> Option<&str> {
        match self {
            HttpBody::Json(s) => Some(s),
            HttpBody::Multipart(_) => None,
        }
    }

    pub fn as_multipart(&self) -> Option<&MultipartForm> {
        match self {
            HttpBody::Multipart(form) => Some(form),
            HttpBody::Json(_) => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `BookClient::build_*` methods. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Set a header, replacing any existing value under the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.remove_header(name);
        self.headers.push((name.to_ascii_lowercase(), value.into()));
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the host after executing an `HttpRequest`, then passed
/// to `BookClient::parse_*` methods.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
