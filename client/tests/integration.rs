//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port with its own state,
//! drives it through `ApiClient`/`Dashboard` over real HTTP, and then checks
//! the server's request log to see exactly what went over the wire.

use bookshelf_client::{
    ApiClient, ApiError, ClientConfig, CreateBookForm, Dashboard, Session, Upload,
};
use mock_server::{AppState, RecordedRequest};

async fn start_server() -> (String, AppState) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::default();
    tokio::spawn(mock_server::run_with_state(listener, state.clone()));
    (format!("http://{addr}"), state)
}

fn dashboard(base_url: &str) -> Dashboard {
    let api = ApiClient::new(&ClientConfig::new(base_url), Session::new()).unwrap();
    Dashboard::new(api)
}

fn create_form(title: &str) -> CreateBookForm {
    CreateBookForm {
        title: title.to_string(),
        genre: "Sci-fi".to_string(),
        description: "Desert planet".to_string(),
        cover_image: vec![Upload::new("cover.png", "image/png", vec![0x89, b'P', b'N', b'G'])],
        file: vec![Upload::new("book.pdf", "application/pdf", b"%PDF-1.4".to_vec())],
    }
}

fn last(requests: &[RecordedRequest]) -> &RecordedRequest {
    requests.last().unwrap()
}

#[tokio::test]
async fn requests_without_token_carry_no_authorization() {
    let (base_url, state) = start_server().await;
    let dash = dashboard(&base_url);

    dash.books().await.unwrap();
    let err = dash.api().get_book("missing").await.unwrap_err();
    assert!(err.is_not_found());

    let requests = state.recorded_requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn every_request_carries_the_current_token() {
    let (base_url, state) = start_server().await;
    let dash = dashboard(&base_url);

    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();
    let token = dash.api().session().token().unwrap();

    dash.books().await.unwrap();
    let created = dash.create_book(create_form("Dune")).await.unwrap();
    dash.api().get_book(&created.id).await.unwrap();

    let requests = state.recorded_requests().await;
    let expected = format!("Bearer {token}");
    for r in &requests[1..] {
        assert_eq!(r.authorization.as_deref(), Some(expected.as_str()), "{} {}", r.method, r.path);
    }

    // A fresh login replaces the token; the next call uses the new value.
    dash.sign_in("ann@example.com", "hunter22").await.unwrap();
    let new_token = dash.api().session().token().unwrap();
    assert_ne!(new_token, token);
    dash.books().await.unwrap();
    let requests = state.recorded_requests().await;
    assert_eq!(last(&requests).authorization, Some(format!("Bearer {new_token}")));

    dash.sign_out();
    assert!(!dash.is_signed_in());
    dash.books().await.unwrap();
    let requests = state.recorded_requests().await;
    assert!(last(&requests).authorization.is_none());
}

#[tokio::test]
async fn configured_headers_reach_the_backend() {
    let (base_url, state) = start_server().await;
    let config = ClientConfig::new(&base_url)
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_header("X-Client", "dashboard");
    let dash = Dashboard::new(ApiClient::new(&config, Session::new()).unwrap());

    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();
    dash.books().await.unwrap();
    dash.create_book(create_form("Dune")).await.unwrap();

    let requests = state.recorded_requests().await;
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.header("x-client") == Some("dashboard")));

    let register = &requests[0];
    assert_eq!(register.path, "/api/users/register");
    assert_eq!(
        register.content_type.as_deref(),
        Some("application/json; charset=utf-8")
    );

    let list = &requests[1];
    assert_eq!((list.method.as_str(), list.path.as_str()), ("GET", "/api/books"));
    assert_eq!(list.content_type, None);

    // The multipart boundary wins over the configured JSON type.
    assert!(requests[2]
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
}

#[tokio::test]
async fn create_book_sends_exactly_five_multipart_fields() {
    let (base_url, state) = start_server().await;
    let dash = dashboard(&base_url);
    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();

    let created = dash.create_book(create_form("Dune")).await.unwrap();

    let forms = state.recorded_forms().await;
    assert_eq!(forms.len(), 1);
    assert_eq!(
        forms[0].fields,
        vec!["title", "genre", "description", "coverImage", "file"]
    );
    let requests = state.recorded_requests().await;
    let create = last(&requests);
    assert_eq!((create.method.as_str(), create.path.as_str()), ("POST", "/api/books"));
    assert!(create
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data; boundary="));

    let book = dash.api().get_book(&created.id).await.unwrap();
    assert_eq!(book.title, "Dune");
    assert_eq!(book.author.name, "Ann");
}

#[tokio::test]
async fn invalid_form_never_reaches_the_network() {
    let (base_url, state) = start_server().await;
    let dash = dashboard(&base_url);

    let mut form = create_form("Dune");
    form.cover_image = vec![Upload::new("cover.txt", "text/plain", vec![1])];
    let err = dash.create_book(form).await.unwrap_err();
    match err {
        ApiError::Validation(errors) => {
            assert_eq!(errors.messages(), vec!["Cover image must be an image file"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = dash.sign_in("", "").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    assert!(state.recorded_requests().await.is_empty());
}

#[tokio::test]
async fn unmodified_edit_form_round_trips_without_files() {
    let (base_url, state) = start_server().await;
    let dash = dashboard(&base_url);
    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();
    let created = dash.create_book(create_form("Dune")).await.unwrap();
    let original = dash.api().get_book(&created.id).await.unwrap();

    let form = dash.edit_form(&created.id).await.unwrap();
    assert_eq!(form.title, "Dune");
    assert!(form.cover_image.is_empty());
    let updated = dash.update_book(&created.id, form).await.unwrap();

    assert_eq!(updated.title, original.title);
    assert_eq!(updated.genre, original.genre);
    assert_eq!(updated.description, original.description);
    assert_eq!(updated.cover_image, original.cover_image);
    assert_eq!(updated.file, original.file);

    let forms = state.recorded_forms().await;
    let patch = forms.last().unwrap();
    assert_eq!(patch.path, format!("/api/books/{}", created.id));
    assert_eq!(patch.fields, vec!["title", "genre", "description"]);
}

#[tokio::test]
async fn update_with_new_cover_replaces_only_the_cover() {
    let (base_url, state) = start_server().await;
    let dash = dashboard(&base_url);
    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();
    let created = dash.create_book(create_form("Dune")).await.unwrap();
    let original = dash.api().get_book(&created.id).await.unwrap();

    let mut form = dash.edit_form(&created.id).await.unwrap();
    form.title = "Dune Messiah".to_string();
    form.cover_image = vec![Upload::new("messiah.jpg", "image/jpeg", vec![0xFF, 0xD8])];
    let updated = dash.update_book(&created.id, form).await.unwrap();

    assert_eq!(updated.title, "Dune Messiah");
    assert_ne!(updated.cover_image, original.cover_image);
    assert_eq!(updated.file, original.file);

    let forms = state.recorded_forms().await;
    assert_eq!(
        forms.last().unwrap().fields,
        vec!["title", "genre", "description", "coverImage"]
    );
}

#[tokio::test]
async fn delete_issues_exactly_one_request() {
    let (base_url, state) = start_server().await;
    let dash = dashboard(&base_url);
    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();
    let created = dash.create_book(create_form("Dune")).await.unwrap();
    let before = state.recorded_requests().await.len();

    dash.delete_book(&created.id).await.unwrap();

    let requests = state.recorded_requests().await;
    assert_eq!(requests.len(), before + 1);
    let delete = last(&requests);
    assert_eq!(delete.method, "DELETE");
    assert_eq!(delete.path, format!("/api/books/{}", created.id));

    let err = dash.api().get_book(&created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn backend_rejections_pass_through_unchanged() {
    let (base_url, _state) = start_server().await;
    let dash = dashboard(&base_url);

    let err = dash.create_book(create_form("Dune")).await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();
    let err = dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("User already exists"));
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let err = dash.sign_in("ann@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dash = dashboard(&format!("http://{addr}"));
    let err = dash.books().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn crud_lifecycle() {
    let (base_url, _state) = start_server().await;
    let dash = dashboard(&base_url);

    // Step 1: empty catalog.
    assert!(dash.books().await.unwrap().is_empty());

    // Step 2: register and create two books.
    dash.sign_up("Ann", "ann@example.com", "hunter22").await.unwrap();
    let dune = dash.create_book(create_form("Dune")).await.unwrap();
    let emma = dash.create_book(create_form("Emma")).await.unwrap();

    // Step 3: list shows both.
    let books = dash.books().await.unwrap();
    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "Emma"]);

    // Step 4: edit one.
    let mut form = dash.edit_form(&emma.id).await.unwrap();
    form.genre = "Romance".to_string();
    let updated = dash.update_book(&emma.id, form).await.unwrap();
    assert_eq!(updated.genre, "Romance");

    // Step 5: delete the other.
    dash.delete_book(&dune.id).await.unwrap();
    let books = dash.books().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, emma.id);

    // Step 6: deleting again is a 404.
    let err = dash.delete_book(&dune.id).await.unwrap_err();
    assert!(err.is_not_found());
}
