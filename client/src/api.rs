//! Typed async operations against the book catalog backend.

use bookshelf_core::{
    ApiError, AuthResult, Book, BookClient, BookPatch, BookRef, HttpRequest, HttpResponse,
    LoginRequest, NewBook, RegisterRequest, Session,
};

use crate::config::ClientConfig;
use crate::transport;

/// Async client for the book catalog API.
///
/// Each method issues exactly one HTTP call. Every call carries
/// `Authorization: Bearer <token>` when the session holds a token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    core: BookClient,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self::with_http_client(http, config, session))
    }

    /// Reuse an existing `reqwest::Client` and its connection pool.
    pub fn with_http_client(http: reqwest::Client, config: &ClientConfig, session: Session) -> Self {
        let core = config
            .default_headers
            .iter()
            .fold(BookClient::new(&config.base_url, session), |core, (name, value)| {
                core.with_default_header(name, value)
            });
        Self { http, core }
    }

    pub fn session(&self) -> &Session {
        self.core.session()
    }

    pub fn base_url(&self) -> &str {
        self.core.base_url()
    }

    pub async fn login(&self, input: &LoginRequest) -> Result<AuthResult, ApiError> {
        let req = self.core.build_login(input)?;
        self.core.parse_login(self.send(req).await?)
    }

    pub async fn register(&self, input: &RegisterRequest) -> Result<AuthResult, ApiError> {
        let req = self.core.build_register(input)?;
        self.core.parse_register(self.send(req).await?)
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        let req = self.core.build_list_books();
        self.core.parse_list_books(self.send(req).await?)
    }

    pub async fn create_book(&self, book: &NewBook) -> Result<BookRef, ApiError> {
        let req = self.core.build_create_book(book);
        self.core.parse_create_book(self.send(req).await?)
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, ApiError> {
        let req = self.core.build_get_book(id);
        self.core.parse_get_book(self.send(req).await?)
    }

    pub async fn update_book(&self, id: &str, patch: &BookPatch) -> Result<Book, ApiError> {
        let req = self.core.build_update_book(id, patch);
        self.core.parse_update_book(self.send(req).await?)
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), ApiError> {
        let req = self.core.build_delete_book(id);
        self.core.parse_delete_book(self.send(req).await?)
    }

    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        transport::execute(&self.http, req).await
    }
}
