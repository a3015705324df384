//! Generated REST routes, exercised through the router without a listener.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use restforge::{AppConfig, Application, ModelSpec};
use serde_json::{json, Value};
use tower::ServiceExt;

fn event_spec() -> ModelSpec {
    serde_json::from_value(json!({
        "name": "Event",
        "attributes": {
            "email": { "required": true, "default": "admin@host.com" },
            "when": { "type": "date" }
        }
    }))
    .unwrap()
}

async fn router(name: &str) -> Router {
    let config: AppConfig = serde_json::from_value(json!({
        "name": name,
        "db": { "name": "testdb.json", "create": false, "load": false },
        "models": [event_spec()]
    }))
    .unwrap();
    let app = Application::create(config).await.unwrap();
    app.run().unwrap();
    app.router()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn post_then_get_by_id_round_trips() {
    let router = router("http-roundtrip").await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/events",
            json!({"email": "test1@test.com", "when": 7}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().expect("assigned id");
    assert_eq!(created["data"]["email"], json!("test1@test.com"));

    let response = router
        .clone()
        .oneshot(get_request(&format!("/events/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["data"]["when"], json!(7));
}

#[tokio::test]
async fn list_returns_envelope_with_count_and_honors_filters() {
    let router = router("http-list").await;

    for (email, when) in [("a@test.com", 1), ("a@test.com", 2), ("b@test.com", 3)] {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/events",
                json!({"email": email, "when": when}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = router.clone().oneshot(get_request("/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed["meta"]["count"], json!(3));

    let response = router
        .clone()
        .oneshot(get_request("/events?email=a@test.com"))
        .await
        .unwrap();
    let filtered = body_json(response).await;
    assert_eq!(filtered["meta"]["count"], json!(2));
}

#[tokio::test]
async fn put_updates_and_delete_removes() {
    let router = router("http-mutate").await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/events",
            json!({"email": "test1@test.com", "when": 7}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/events/{}", id),
            json!({"email": "test99@test.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["email"], json!("test99@test.com"));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/events/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .clone()
        .oneshot(get_request(&format!("/events/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_resource_is_not_found() {
    let router = router("http-unknown").await;
    let response = router.oneshot(get_request("/widgets")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn non_object_create_body_is_a_bad_request() {
    let router = router("http-bad-body").await;
    let response = router
        .oneshot(json_request("POST", "/events", json!([1, 2, 3])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_required_field_maps_to_unprocessable() {
    let spec: ModelSpec = serde_json::from_value(json!({
        "name": "Profile",
        "attributes": { "handle": { "required": true } }
    }))
    .unwrap();
    let config: AppConfig = serde_json::from_value(json!({
        "name": "http-validation",
        "db": { "name": "", "create": false, "load": false },
        "models": [spec]
    }))
    .unwrap();
    let app = Application::create(config).await.unwrap();
    let router = app.router();

    let response = router
        .oneshot(json_request("POST", "/profiles", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("validation_error"));
}

#[tokio::test]
async fn non_integer_numeric_key_is_addressable() {
    let spec: ModelSpec = serde_json::from_value(json!({
        "name": "Sample",
        "attributes": { "score": { "id": true, "type": "number" } }
    }))
    .unwrap();
    let config: AppConfig = serde_json::from_value(json!({
        "name": "http-float-key",
        "db": { "name": "", "create": false, "load": false },
        "models": [spec]
    }))
    .unwrap();
    let app = Application::create(config).await.unwrap();
    let router = app.router();

    let response = router
        .clone()
        .oneshot(json_request("POST", "/samples", json!({"score": 1.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router.oneshot(get_request("/samples/1.5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["score"], json!(1.5));
}

#[tokio::test]
async fn health_and_version_respond() {
    let router = router("http-common").await;
    let response = router.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(get_request("/version")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["name"], json!("restforge"));
}
