use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookshelf::App;
use bookshelf_kernel::settings::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    app: App,
    router: Router,
}

impl TestApp {
    async fn spawn() -> Self {
        let settings = Settings::default();
        let app = App::bootstrap(&settings).await.unwrap();
        let router = app.router(&settings);
        Self { app, router }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn root_greets() {
    let app = TestApp::spawn().await;
    let (status, body) = app.send(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Welcome to the Book API!");
}

#[tokio::test]
async fn lists_seeded_books() {
    let app = TestApp::spawn().await;
    let (status, body) = app.json(Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);

    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 3);
    assert_eq!(
        books[1],
        json!({
            "id": 2,
            "name": "The Lord of the Rings: The Fellowship of the Ring",
            "img": "https://bit.ly/2tC1Lcg",
            "summary": "A young hobbit, Frodo, who has found the One Ring that belongs to the Dark Lord Sauron, begins his journey with eight companions to Mount Doom, the only place where it can be destroyed."
        })
    );
}

#[tokio::test]
async fn create_get_update_delete_lifecycle() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/books",
            Some(json!({ "name": "X", "img": "Y", "summary": "Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 4 }));

    let (status, body) = app.json(Method::GET, "/books/4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "id": 4, "name": "X", "img": "Y", "summary": "Z" })
    );

    let (status, body) = app
        .json(
            Method::PUT,
            "/books/4",
            Some(json!({ "name": "X2", "img": "Y", "summary": "Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book updated" }));

    let (_, body) = app.json(Method::GET, "/books/4", None).await;
    assert_eq!(body["name"], "X2");
    assert_eq!(body["id"], 4);

    let (status, body) = app.json(Method::DELETE, "/books/4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, body) = app.json(Method::GET, "/books/4", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));

    let (_, body) = app.json(Method::GET, "/books", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn update_and_delete_unknown_id_are_not_found() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .json(Method::PUT, "/books/99", Some(json!({ "name": "ghost" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));

    let (status, _) = app.json(Method::DELETE, "/books/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(Method::GET, "/books/not-a-number", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.json(Method::GET, "/books", None).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn missing_fields_are_stored_as_null() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .json(Method::POST, "/books", Some(json!({ "name": "Untitled" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_i64().unwrap();

    let (_, body) = app.json(Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(
        body,
        json!({ "id": id, "name": "Untitled", "img": null, "summary": null })
    );
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .json(Method::POST, "/books", Some(json!({ "name": 42 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (_, body) = app.json(Method::GET, "/books", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn storage_failure_is_generic_internal_error() {
    let app = TestApp::spawn().await;
    app.app
        .db
        .call(|conn| conn.execute_batch("DROP TABLE books"))
        .await
        .unwrap();

    let payload = json!({ "name": "X", "img": "Y", "summary": "Z" });
    let requests = [
        (Method::GET, "/books", None),
        (Method::GET, "/books/1", None),
        (Method::POST, "/books", Some(payload.clone())),
        (Method::PUT, "/books/1", Some(payload)),
        (Method::DELETE, "/books/1", None),
    ];
    for (method, uri, body) in requests {
        let (status, body) = app.json(method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(body, json!({ "error": "Internal Server Error" }), "{method} {uri}");
    }

    // The service keeps answering after a storage failure.
    let (status, _) = app.send(Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(Method::GET, "/healthz/books", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_is_an_ordinary_book_id() {
    let app = TestApp::spawn().await;

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = app.json(method, "/books/health", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Book not found" }));
    }

    let (status, body) = app
        .json(Method::PUT, "/books/health", Some(json!({ "name": "ghost" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));
}

#[tokio::test]
async fn unrouted_requests_use_error_body() {
    let app = TestApp::spawn().await;

    let (status, body) = app.json(Method::GET, "/authors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));

    let (status, body) = app.json(Method::PATCH, "/books/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method Not Allowed" }));
}

#[tokio::test]
async fn operational_endpoints() {
    let app = TestApp::spawn().await;

    let (status, body) = app.send(Method::GET, "/healthz/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"books module is healthy");

    let (status, doc) = app.json(Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/books/{id}"]["put"].is_object());
    assert!(doc["paths"]["/healthz/books"]["get"].is_object());
    assert!(doc["components"]["schemas"]["Book"].is_object());
    assert!(doc["components"]["schemas"]["ErrorResponse"].is_object());
}

#[tokio::test]
async fn modules_stop_cleanly() {
    let app = TestApp::spawn().await;
    assert!(app.app.registry.get_module("books").is_some());
    app.app.registry.stop_modules().await.unwrap();
}
