//! End-to-end tests of the router over the in-memory store

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::router;
use crate::config::Config;
use crate::pagination::decode_page_token;
use crate::problem::PROBLEM_JSON;
use crate::repository::InMemoryStore;
use crate::state::AppState;

fn app() -> Router {
    router(AppState::new(Config::default(), &InMemoryStore::new()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(request.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn assert_problem(response: Response, status: StatusCode, problem_type: &str) -> Value {
    assert_eq!(response.status(), status);
    assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);
    let body = json_body(response).await;
    assert_eq!(body["type"], problem_type);
    assert_eq!(body["status"], status.as_u16());
    assert!(body["title"].as_str().is_some_and(|t| !t.is_empty()));
    body
}

const HTTP_ERROR: &str = "aep.example.com/http-error";
const VALIDATION_ERROR: &str = "aep.example.com/validation-error";

async fn create_shelf(app: &Router, id: &str, theme: &str) {
    let response = send(
        app,
        Method::POST,
        &format!("/shelves?id={id}"),
        Some(json!({ "theme": theme })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn create_book(app: &Router, shelf: &str, id: &str, title: &str, author: &str) {
    let response = send(
        app,
        Method::POST,
        &format!("/shelves/{shelf}/books?id={id}"),
        Some(json!({ "title": title, "author": author })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_scifi_shelf_with_dune() {
    let app = app();

    let response = send(
        &app,
        Method::POST,
        "/shelves?id=SciFi",
        Some(json!({ "theme": "Science fiction" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::LOCATION], "/shelves/SciFi");
    assert_eq!(
        json_body(response).await,
        json!({ "path": "shelves/SciFi", "theme": "Science fiction" })
    );

    let response = send(
        &app,
        Method::POST,
        "/shelves/SciFi/books?id=dune",
        Some(json!({ "title": "Dune", "author": "Frank Herbert" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/shelves/SciFi/books/dune"
    );

    let response = send(&app, Method::GET, "/shelves/SciFi/books?max_page_size=1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "books": [{
                "path": "shelves/SciFi/books/dune",
                "title": "Dune",
                "author": "Frank Herbert",
            }],
            "next_page_token": "",
        })
    );
}

#[tokio::test]
async fn test_create_get_round_trip() {
    let app = app();
    create_shelf(&app, "Classics", "Old books").await;

    let response = send(&app, Method::GET, "/shelves/Classics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "path": "shelves/Classics", "theme": "Old books" })
    );
}

#[tokio::test]
async fn test_create_without_id_generates_one() {
    let app = app();
    let response = send(&app, Method::POST, "/shelves", Some(json!({ "theme": "t" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let path = body["path"].as_str().unwrap().to_string();

    let response = send(&app, Method::GET, &format!("/{path}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_body_path_is_ignored_on_create() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/shelves?id=Real",
        Some(json!({ "path": "shelves/Fake", "theme": "t" })),
    )
    .await;
    assert_eq!(json_body(response).await["path"], "shelves/Real");

    let response = send(&app, Method::GET, "/shelves/Fake", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let app = app();
    create_shelf(&app, "SciFi", "Science fiction").await;
    create_book(&app, "SciFi", "dune", "Dune", "Herbert").await;

    let response = send(
        &app,
        Method::PATCH,
        "/shelves/SciFi/books/dune",
        Some(json!({ "title": "Dune Messiah" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["title"], "Dune Messiah");
    assert_eq!(body["author"], "Herbert");

    let response = send(
        &app,
        Method::PATCH,
        "/shelves/SciFi/books/dune",
        Some(json!({ "author": "Frank Herbert", "path": "shelves/Other/books/x" })),
    )
    .await;
    let body = json_body(response).await;
    assert_eq!(body["title"], "Dune Messiah");
    assert_eq!(body["author"], "Frank Herbert");
    assert_eq!(body["path"], "shelves/SciFi/books/dune");

    let response = send(
        &app,
        Method::PATCH,
        "/shelves/SciFi",
        Some(json!({ "theme": "" })),
    )
    .await;
    assert_eq!(json_body(response).await["theme"], "");
}

#[tokio::test]
async fn test_pagination_visits_every_item_once() {
    let app = app();
    let mut expected: Vec<String> = (0..25).map(|i| format!("shelf-{i:02}")).collect();
    for id in expected.iter().rev() {
        create_shelf(&app, id, "t").await;
    }
    expected.sort();

    let mut seen = Vec::new();
    let mut token = String::new();
    let mut pages = 0;
    loop {
        let uri = format!("/shelves?max_page_size=7&page_token={token}");
        let body = json_body(send(&app, Method::GET, &uri, None).await).await;
        let shelves = body["shelves"].as_array().unwrap();
        assert!(shelves.len() <= 7);
        seen.extend(
            shelves
                .iter()
                .map(|s| s["path"].as_str().unwrap().trim_start_matches("shelves/").to_string()),
        );
        pages += 1;

        token = body["next_page_token"].as_str().unwrap().to_string();
        if token.is_empty() {
            break;
        }
        assert!(decode_page_token(&token).unwrap().is_some());
    }

    assert_eq!(pages, 4);
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_page_size_defaults_and_clamps() {
    let app = app();
    for i in 0..12 {
        create_shelf(&app, &format!("s{i:02}"), "t").await;
    }

    for uri in ["/shelves", "/shelves?max_page_size=0", "/shelves?max_page_size=-3"] {
        let body = json_body(send(&app, Method::GET, uri, None).await).await;
        assert_eq!(body["shelves"].as_array().unwrap().len(), 10, "{uri}");
        assert_ne!(body["next_page_token"], "");
    }

    let body = json_body(send(&app, Method::GET, "/shelves?max_page_size=500", None).await).await;
    assert_eq!(body["shelves"].as_array().unwrap().len(), 12);
    assert_eq!(body["next_page_token"], "");
}

#[tokio::test]
async fn test_duplicate_id_conflicts() {
    let app = app();
    create_shelf(&app, "SciFi", "first").await;

    let response = send(
        &app,
        Method::POST,
        "/shelves?id=SciFi",
        Some(json!({ "theme": "second" })),
    )
    .await;
    let body = assert_problem(response, StatusCode::CONFLICT, HTTP_ERROR).await;
    assert_eq!(body["title"], "Shelf already exists");

    let body = json_body(send(&app, Method::GET, "/shelves/SciFi", None).await).await;
    assert_eq!(body["theme"], "first");
}

#[tokio::test]
async fn test_book_in_missing_shelf_is_not_found() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/shelves/Poetry/books?id=odes",
        Some(json!({ "title": "Odes", "author": "Keats" })),
    )
    .await;
    let body = assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;
    assert_eq!(body["title"], "Parent shelf not found");

    let response = send(&app, Method::GET, "/shelves/Poetry/books", None).await;
    assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;
}

#[tokio::test]
async fn test_missing_resources_use_problem_envelope() {
    let app = app();
    let response = send(&app, Method::GET, "/shelves/Nope?x=1", None).await;
    let body = assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;
    assert_eq!(body["title"], "Shelf not found");
    assert_eq!(body["instance"], "/shelves/Nope?x=1");

    let response = send(&app, Method::DELETE, "/shelves/Nope", None).await;
    assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;

    let response = send(
        &app,
        Method::PATCH,
        "/shelves/Nope",
        Some(json!({ "theme": "x" })),
    )
    .await;
    assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = app();
    create_shelf(&app, "SciFi", "t").await;
    create_book(&app, "SciFi", "dune", "Dune", "Herbert").await;

    let response = send(&app, Method::DELETE, "/shelves/SciFi/books/dune", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app, Method::GET, "/shelves/SciFi/books/dune", None).await;
    assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;

    let response = send(&app, Method::DELETE, "/shelves/SciFi", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app, Method::GET, "/shelves/SciFi", None).await;
    assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;
}

#[tokio::test]
async fn test_book_under_wrong_shelf_is_not_found() {
    let app = app();
    create_shelf(&app, "SciFi", "t").await;
    create_shelf(&app, "Classics", "t").await;
    create_book(&app, "SciFi", "dune", "Dune", "Herbert").await;

    let response = send(&app, Method::GET, "/shelves/Classics/books/dune", None).await;
    assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;

    let response = send(&app, Method::DELETE, "/shelves/Classics/books/dune", None).await;
    assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;

    let response = send(&app, Method::GET, "/shelves/SciFi/books/dune", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_id_is_invalid_argument() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/shelves?id=bad_id",
        Some(json!({ "theme": "t" })),
    )
    .await;
    let body = assert_problem(response, StatusCode::BAD_REQUEST, VALIDATION_ERROR).await;
    assert_eq!(body["title"], "Invalid Argument");
    assert!(body["detail"].as_str().unwrap().contains("bad_id"));

    let response = send(&app, Method::GET, "/shelves/bad.id", None).await;
    assert_problem(response, StatusCode::BAD_REQUEST, VALIDATION_ERROR).await;
}

#[tokio::test]
async fn test_malformed_page_token_is_invalid_argument() {
    let app = app();
    let response = send(&app, Method::GET, "/shelves?page_token=@@not-a-token@@", None).await;
    let body = assert_problem(response, StatusCode::BAD_REQUEST, VALIDATION_ERROR).await;
    assert_eq!(body["title"], "Invalid Argument");
}

#[tokio::test]
async fn test_undecodable_input_is_validation_failed() {
    let app = app();

    let response = send(&app, Method::POST, "/shelves", Some(json!({ "title": "no theme" }))).await;
    let body = assert_problem(response, StatusCode::UNPROCESSABLE_ENTITY, VALIDATION_ERROR).await;
    assert_eq!(body["title"], "Validation Error");
    assert!(body["detail"].as_str().is_some());

    let response = send(&app, Method::GET, "/shelves?max_page_size=lots", None).await;
    assert_problem(response, StatusCode::UNPROCESSABLE_ENTITY, VALIDATION_ERROR).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/shelves")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_problem(response, StatusCode::UNPROCESSABLE_ENTITY, VALIDATION_ERROR).await;
}

#[tokio::test]
async fn test_unknown_route_is_problem() {
    let app = app();
    let response = send(&app, Method::GET, "/authors", None).await;
    let body = assert_problem(response, StatusCode::NOT_FOUND, HTTP_ERROR).await;
    assert_eq!(body["instance"], "/authors");
}

#[tokio::test]
async fn test_wrong_method_is_problem() {
    let app = app();
    let response = send(&app, Method::PUT, "/shelves", None).await;
    let body = assert_problem(response, StatusCode::METHOD_NOT_ALLOWED, HTTP_ERROR).await;
    assert_eq!(body["title"], "Method Not Allowed");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app();
    let body = json_body(send(&app, Method::GET, "/health", None).await).await;
    assert_eq!(body["status"], "healthy");

    let body = json_body(send(&app, Method::GET, "/ready", None).await).await;
    assert_eq!(body["ready"], true);
}
