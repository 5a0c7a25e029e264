//! Request builder and response parser for the book catalog API.
//!
//! # Design
//! `BookClient` holds the base URL, the default headers and a `Session`
//! handle. Each operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The host executes the round-trip in between.
//!
//! Every `build_*` goes through `BookClient::request`, which applies the
//! default headers and then injects `Authorization: Bearer <token>` from the
//! session as it is at build time. Requests built without a token carry no
//! `Authorization` header at all.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::form::{BookPatch, NewBook};
use crate::http::{HttpBody, HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{AuthResult, Book, BookRef, LoginRequest, RegisterRequest};

const CONTENT_TYPE: &str = "content-type";
const AUTHORIZATION: &str = "authorization";

pub const LOGIN_PATH: &str = "/api/users/login";
pub const REGISTER_PATH: &str = "/api/users/register";
pub const BOOKS_PATH: &str = "/api/books";

/// Synchronous client core for the book catalog API.
#[derive(Debug, Clone)]
pub struct BookClient {
    base_url: String,
    default_headers: Vec<(String, String)>,
    session: Session,
}

impl BookClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: vec![(CONTENT_TYPE.to_string(), "application/json".to_string())],
            session,
        }
    }

    /// Add or replace a header sent with every request.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.default_headers.retain(|(k, _)| *k != name);
        self.default_headers.push((name, value.to_string()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Post, LOGIN_PATH, Some(json_body(input)?)))
    }

    pub fn build_register(&self, input: &RegisterRequest) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Post, REGISTER_PATH, Some(json_body(input)?)))
    }

    pub fn build_list_books(&self) -> HttpRequest {
        self.request(HttpMethod::Get, BOOKS_PATH, None)
    }

    pub fn build_create_book(&self, book: &NewBook) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            BOOKS_PATH,
            Some(HttpBody::Multipart(book.to_multipart())),
        )
    }

    pub fn build_get_book(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &book_path(id), None)
    }

    pub fn build_update_book(&self, id: &str, patch: &BookPatch) -> HttpRequest {
        self.request(
            HttpMethod::Patch,
            &book_path(id),
            Some(HttpBody::Multipart(patch.to_multipart())),
        )
    }

    pub fn build_delete_book(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &book_path(id), None)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthResult, ApiError> {
        parse_json(response)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<AuthResult, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_books(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_book(&self, response: HttpResponse) -> Result<BookRef, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<HttpBody>) -> HttpRequest {
        let body_type = body.as_ref().map(HttpBody::content_type);
        let is_json = matches!(body, Some(HttpBody::Json(_)));
        let mut req = HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers: self.default_headers.clone(),
            body,
        };
        match body_type {
            None => req.remove_header(CONTENT_TYPE),
            // JSON bodies keep a configured content type.
            Some(_) if is_json && req.header(CONTENT_TYPE).is_some() => {}
            Some(value) => req.set_header(CONTENT_TYPE, value),
        }
        self.authorize(&mut req);
        req
    }

    fn authorize(&self, req: &mut HttpRequest) {
        match self.session.token() {
            Some(token) => req.set_header(AUTHORIZATION, format!("Bearer {token}")),
            None => req.remove_header(AUTHORIZATION),
        }
    }
}

fn book_path(id: &str) -> String {
    format!("{BOOKS_PATH}/{}", urlencoding::encode(id))
}

fn json_body<T: Serialize>(input: &T) -> Result<HttpBody, ApiError> {
    serde_json::to_string(input)
        .map(HttpBody::Json)
        .map_err(|e| ApiError::Serialization(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map any non-2xx status to `ApiError::Status`, body untouched.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}
