//! Session token store.
//!
//! # Design
//! A `Session` is a handle to a single token slot. Clones share the slot, so
//! the sign-in flow and the request builder see the same value without a
//! process-wide global. Every request reads the slot at build time, which
//! means a token stored after the client was constructed is picked up by the
//! next call.

use std::sync::{Arc, RwLock};

/// Shared, optional bearer token.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// An empty session with no token.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    /// Current token, if any.
    pub fn token(&self) -> Option<String> {
        // A poisoned lock still holds a complete `Option<String>`.
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.slot() = Some(token.into());
    }

    /// Drop the token. Later requests go out unauthenticated.
    pub fn clear(&self) {
        *self.slot() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    fn slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
