//! Domain DTOs for the book catalog API.
//!
//! # Design
//! These types mirror the backend's JSON (camelCase, Mongo-style `_id`) but
//! are defined independently from the mock-server crate. Integration tests
//! catch any schema drift between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book as returned by the list and get endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub genre: String,
    pub author: Author,
    #[serde(default)]
    pub description: String,
    /// URL of the cover image.
    pub cover_image: String,
    /// URL of the PDF, when the backend exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// Reference to a newly created book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookRef {
    #[serde(alias = "_id")]
    pub id: String,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful login or registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub access_token: String,
}
