//! Client core for the book catalog API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A host such as
//! `bookshelf-client` executes the actual HTTP round-trip.
//!
//! # Design
//! - `BookClient` reads the bearer token from a shared `Session` every time
//!   it builds a request.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit.
//! - Book forms are validated here (`form`), before any request exists.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod form;
pub mod http;
pub mod session;
pub mod types;

pub use client::BookClient;
pub use error::ApiError;
pub use form::{BookPatch, CreateBookForm, FieldIssue, NewBook, UpdateBookForm, ValidationErrors};
pub use http::{HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartForm, PartValue, Upload};
pub use session::Session;
pub use types::{Author, AuthResult, Book, BookRef, LoginRequest, RegisterRequest};
