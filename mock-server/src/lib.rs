//! In-memory book catalog backend.
//!
//! Implements the REST contract the dashboard client talks to: user
//! registration and login handing out bearer tokens, public book listing,
//! and token-guarded multipart create/update/delete. Every request is
//! recorded so tests can assert on exactly what went over the wire.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const BOOKS_PATH: &str = "/api/books";

/// Large enough for a 50 MiB PDF plus a 5 MiB cover and form overhead.
pub const BODY_LIMIT: usize = 60 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub genre: String,
    pub author: Author,
    pub description: String,
    pub cover_image: String,
    pub file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// What the server saw of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    /// Every header with a readable value, lowercase names.
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Field names of one accepted multipart body, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedForm {
    pub path: String,
    pub fields: Vec<String>,
}

struct User {
    id: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    /// token -> user id
    tokens: HashMap<String, String>,
    books: Vec<Book>,
}

impl Store {
    fn issue_token(&mut self, user_id: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    fn user_for_token(&self, token: &str) -> Option<&User> {
        let user_id = self.tokens.get(token)?;
        self.users.iter().find(|u| &u.id == user_id)
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    forms: Arc<RwLock<Vec<RecordedForm>>>,
}

impl AppState {
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn recorded_forms(&self) -> Vec<RecordedForm> {
        self.forms.read().await.clone()
    }
}

type ApiError = (StatusCode, Json<Message>);
type ApiResult<T> = Result<T, ApiError>;

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(Message {
            message: message.into(),
        }),
    )
}

pub fn app() -> Router {
    app_with_state(AppState::default())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route(BOOKS_PATH, get(list_books).post(create_book))
        .route(
            "/api/books/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn record_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // The request body is not `Sync`; no borrow of `request` may live across an await.
    let recorded = {
        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
            headers: request
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
                .collect(),
        }
    };
    tracing::info!(
        method = %recorded.method,
        path = %recorded.path,
        authenticated = recorded.authorization.is_some(),
        "request"
    );
    state.requests.write().await.push(recorded);
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller's user id and name from the bearer token.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Author> {
    let token = bearer_token(headers)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Authorization token is required."))?;
    let store = state.store.read().await;
    let user = store
        .user_for_token(token)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Invalid token."))?;
    Ok(Author {
        id: user.id.clone(),
        name: user.name.clone(),
    })
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> ApiResult<(StatusCode, Json<AccessToken>)> {
    if input.name.is_empty() || input.email.is_empty() || input.password.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "All fields are required"));
    }
    let mut store = state.store.write().await;
    if store.users.iter().any(|u| u.email == input.email) {
        return Err(error(StatusCode::BAD_REQUEST, "User already exists with this email."));
    }
    let user = User {
        id: Uuid::new_v4().simple().to_string(),
        name: input.name,
        email: input.email,
        password: input.password,
    };
    let access_token = store.issue_token(&user.id);
    store.users.push(user);
    Ok((StatusCode::CREATED, Json(AccessToken { access_token })))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginUser>,
) -> ApiResult<Json<AccessToken>> {
    let mut store = state.store.write().await;
    let user_id = store
        .users
        .iter()
        .find(|u| u.email == input.email && u.password == input.password)
        .map(|u| u.id.clone())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Username or password incorrect!"))?;
    let access_token = store.issue_token(&user_id);
    Ok(Json(AccessToken { access_token }))
}

async fn list_books(State(state): State<AppState>) -> Json<Vec<Book>> {
    let store = state.store.read().await;
    Json(store.books.clone())
}

async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Book>> {
    let store = state.store.read().await;
    store
        .books
        .iter()
        .find(|b| b.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Book not found"))
}

struct StoredFile {
    file_name: String,
}

#[derive(Default)]
struct BookForm {
    fields: Vec<String>,
    title: Option<String>,
    genre: Option<String>,
    description: Option<String>,
    cover_image: Option<StoredFile>,
    file: Option<StoredFile>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<BookForm> {
    let bad_request = |e: axum::extract::multipart::MultipartError| {
        error(StatusCode::BAD_REQUEST, e.body_text())
    };
    let mut form = BookForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        form.fields.push(name.clone());
        match name.as_str() {
            "title" => form.title = Some(field.text().await.map_err(bad_request)?),
            "genre" => form.genre = Some(field.text().await.map_err(bad_request)?),
            "description" => form.description = Some(field.text().await.map_err(bad_request)?),
            "coverImage" | "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let valid = if name == "coverImage" {
                    content_type.starts_with("image/")
                } else {
                    content_type == "application/pdf"
                };
                if !valid {
                    return Err(error(
                        StatusCode::BAD_REQUEST,
                        format!("Unsupported content type for {name}: {content_type}"),
                    ));
                }
                // Drain the part; only the name is kept.
                field.bytes().await.map_err(bad_request)?;
                let stored = Some(StoredFile { file_name });
                if name == "coverImage" {
                    form.cover_image = stored;
                } else {
                    form.file = stored;
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn record_form(state: &AppState, path: String, fields: Vec<String>) {
    state.forms.write().await.push(RecordedForm { path, fields });
}

fn upload_url(book_id: &str, file: &StoredFile) -> String {
    format!("/uploads/{book_id}/{}", file.file_name)
}

async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let author = authenticate(&state, &headers).await?;
    let form = read_form(multipart).await?;
    let fields = form.fields;

    let (Some(title), Some(genre), Some(description), Some(cover_image), Some(file)) =
        (form.title, form.genre, form.description, form.cover_image, form.file)
    else {
        return Err(error(StatusCode::BAD_REQUEST, "All fields are required"));
    };

    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now();
    let book = Book {
        cover_image: upload_url(&id, &cover_image),
        file: upload_url(&id, &file),
        id: id.clone(),
        title,
        genre,
        author,
        description,
        created_at: now,
        updated_at: now,
    };
    state.store.write().await.books.push(book);
    record_form(&state, BOOKS_PATH.to_string(), fields).await;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<Book>> {
    let author = authenticate(&state, &headers).await?;
    let form = read_form(multipart).await?;

    let mut store = state.store.write().await;
    let book = store
        .books
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Book not found"))?;
    if book.author.id != author.id {
        return Err(error(StatusCode::FORBIDDEN, "You can not update others book."));
    }
    if let Some(title) = form.title {
        book.title = title;
    }
    if let Some(genre) = form.genre {
        book.genre = genre;
    }
    if let Some(description) = form.description {
        book.description = description;
    }
    if let Some(cover_image) = form.cover_image {
        book.cover_image = upload_url(&id, &cover_image);
    }
    if let Some(file) = form.file {
        book.file = upload_url(&id, &file);
    }
    book.updated_at = Utc::now();
    let updated = book.clone();
    drop(store);
    record_form(&state, format!("{BOOKS_PATH}/{id}"), form.fields).await;
    Ok(Json(updated))
}

async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let author = authenticate(&state, &headers).await?;
    let mut store = state.store.write().await;
    let index = store
        .books
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Book not found"))?;
    if store.books[index].author.id != author.id {
        return Err(error(StatusCode::FORBIDDEN, "You can not delete others book."));
    }
    store.books.remove(index);
    Ok(StatusCode::NO_CONTENT)
}
