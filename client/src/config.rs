//! Client configuration loaded from environment variables.

use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5513";
pub const BASE_URL_VAR: &str = "BOOKSHELF_API_URL";

/// Where the backend lives and which headers go with every request.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Extra headers on top of the JSON content-type default.
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            default_headers: Vec::new(),
        }
    }

    /// Load configuration from `BOOKSHELF_API_URL`, falling back to
    /// `http://localhost:5513`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers.push((name.to_string(), value.to_string()));
        self
    }
}
