//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes the session token, inputs, expected requests,
//! simulated responses, and expected parse results or error statuses.
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use bookshelf_core::{
    ApiError, AuthResult, Book, BookClient, HttpMethod, HttpRequest, HttpResponse, LoginRequest,
    RegisterRequest, Session,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:5513";

/// Client whose session holds the case's `token`, if any.
fn client_for(case: &Value) -> BookClient {
    let session = match case["token"].as_str() {
        Some(token) => Session::with_token(token),
        None => Session::new(),
    };
    BookClient::new(BASE_URL, session)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated_response(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Compare method, URL, headers and (when present) JSON body.
fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let json = req.body.as_ref().and_then(|b| b.as_json()).unwrap();
            let actual: Value = serde_json::from_str(json).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn assert_error_status(name: &str, err: ApiError, case: &Value) {
    let expected = case["expected_error"]["status"].as_u64().unwrap() as u16;
    assert_eq!(err.status(), Some(expected), "{name}: error status");
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Login / register
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    for case in cases(include_str!("../../test-vectors/login.json")) {
        let name = case["name"].as_str().unwrap();
        let c = client_for(&case);
        let input: LoginRequest = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_login(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_login(simulated_response(&case));
        if case.get("expected_error").is_some() {
            assert_error_status(name, result.unwrap_err(), &case);
        } else {
            let expected: AuthResult = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

#[test]
fn register_test_vectors() {
    for case in cases(include_str!("../../test-vectors/register.json")) {
        let name = case["name"].as_str().unwrap();
        let c = client_for(&case);
        let input: RegisterRequest = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_register(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_register(simulated_response(&case));
        if case.get("expected_error").is_some() {
            assert_error_status(name, result.unwrap_err(), &case);
        } else {
            let expected: AuthResult = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    for case in cases(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();
        let c = client_for(&case);

        let req = c.build_list_books();
        assert_request(name, &req, &case["expected_request"]);

        let books = c.parse_list_books(simulated_response(&case)).unwrap();
        let expected: Vec<Book> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(books, expected, "{name}: parsed result");
    }
}

#[test]
fn get_test_vectors() {
    for case in cases(include_str!("../../test-vectors/get.json")) {
        let name = case["name"].as_str().unwrap();
        let c = client_for(&case);
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_get_book(id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_get_book(simulated_response(&case));
        if case.get("expected_error").is_some() {
            assert_error_status(name, result.unwrap_err(), &case);
        } else {
            let expected: Book = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

#[test]
fn delete_test_vectors() {
    for case in cases(include_str!("../../test-vectors/delete.json")) {
        let name = case["name"].as_str().unwrap();
        let c = client_for(&case);
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_delete_book(id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_delete_book(simulated_response(&case));
        if case.get("expected_error").is_some() {
            assert_error_status(name, result.unwrap_err(), &case);
        } else {
            assert!(result.is_ok(), "{name}: expected success");
        }
    }
}
