//! Async host for `bookshelf-core`.
//!
//! # Overview
//! `bookshelf-core` decides what goes over the wire; this crate moves the
//! bytes. `transport::execute` turns a core `HttpRequest` into a `reqwest`
//! call, `ApiClient` exposes one async method per backend operation, and
//! `Dashboard` chains those into the sign-in and book-editing flows.
//!
//! # Design
//! - One `reqwest::Client` per `ApiClient`; clones share its pool.
//! - The `Session` passed at construction is the only token source.
//!   Storing a token there affects every later call, including calls made
//!   through clones.
//! - Errors come back as `bookshelf_core::ApiError`, unchanged.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod transport;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use dashboard::Dashboard;

pub use bookshelf_core::{
    ApiError, Book, BookPatch, BookRef, CreateBookForm, NewBook, Session, UpdateBookForm, Upload,
};
