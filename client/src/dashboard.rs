//! Sign-in and book-editing flows built on `ApiClient`.
//!
//! # Design
//! Each flow mirrors one dashboard page: it checks the form first, makes
//! the backend call, and on sign-in/sign-up stores the returned token in
//! the shared session. Validation failures return before any request is
//! built.

use bookshelf_core::{
    ApiError, Book, BookRef, CreateBookForm, FieldIssue, LoginRequest, RegisterRequest,
    UpdateBookForm, ValidationErrors,
};

use crate::api::ApiClient;

#[derive(Debug, Clone)]
pub struct Dashboard {
    api: ApiClient,
}

impl Dashboard {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn is_signed_in(&self) -> bool {
        self.api.session().is_authenticated()
    }

    /// Log in and keep the access token for later calls.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), ApiError> {
        require(&[("email", email), ("password", password)], "Email and password are required")?;
        let auth = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.api.session().set_token(auth.access_token);
        tracing::info!("signed in");
        Ok(())
    }

    /// Register and keep the access token for later calls.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        require(
            &[("name", name), ("email", email), ("password", password)],
            "Name, email and password are required",
        )?;
        let auth = self
            .api
            .register(&RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.api.session().set_token(auth.access_token);
        tracing::info!("registered");
        Ok(())
    }

    pub fn sign_out(&self) {
        self.api.session().clear();
    }

    pub async fn books(&self) -> Result<Vec<Book>, ApiError> {
        self.api.list_books().await
    }

    pub async fn create_book(&self, form: CreateBookForm) -> Result<BookRef, ApiError> {
        let book = form.validate()?;
        let created = self.api.create_book(&book).await?;
        tracing::info!(id = %created.id, "book created");
        Ok(created)
    }

    /// Fetch a book and prefill the edit form with it.
    pub async fn edit_form(&self, id: &str) -> Result<UpdateBookForm, ApiError> {
        let book = self.api.get_book(id).await?;
        Ok(UpdateBookForm::from_book(&book))
    }

    pub async fn update_book(&self, id: &str, form: UpdateBookForm) -> Result<Book, ApiError> {
        let patch = form.validate()?;
        let book = self.api.update_book(id, &patch).await?;
        tracing::info!(%id, "book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete_book(id).await?;
        tracing::info!(%id, "book deleted");
        Ok(())
    }
}

/// Reject the submission when any of `fields` is empty.
fn require(fields: &[(&'static str, &str)], message: &'static str) -> Result<(), ValidationErrors> {
    let issues: Vec<FieldIssue> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|&(field, _)| FieldIssue { field, message })
        .collect();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { issues })
    }
}
