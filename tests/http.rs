use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use ridehail::auth::{Role, User};
use ridehail::db::MemoryStore;
use ridehail::engine::Engine;
use ridehail::server::router;

fn app() -> Router {
    router(Engine::new(MemoryStore::new()).unwrap())
}

fn request(method: &str, uri: &str, user: Option<&User>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(user) = user {
        builder = builder
            .header("x-user-id", user.id.to_string())
            .header("x-user-role", user.role.name());
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, body)
}

fn ride_body() -> Value {
    json!({
        "pickup": { "address": "A", "lat": 6.9271, "lng": 79.8612 },
        "dropoff": { "address": "B", "lat": 6.9319, "lng": 79.8478 },
        "price": 10.0
    })
}

#[tokio::test]
async fn ride_lifecycle_over_http() {
    let app = app();
    let passenger = User::new(Uuid::new_v4(), Role::Passenger);
    let driver = User::new(Uuid::new_v4(), Role::Driver);
    let rival = User::new(Uuid::new_v4(), Role::Driver);

    let create = request("POST", "/rides", Some(&passenger), Some(ride_body()));
    let (status, ride) = send(&app, create).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ride["status"], "PENDING");
    assert_eq!(ride["driver_id"], Value::Null);
    let id = ride["id"].as_str().unwrap().to_string();

    let (status, available) =
        send(&app, request("GET", "/available_rides", Some(&driver), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available.as_array().unwrap().len(), 1);

    let uri = format!("/rides/{}/accept", id);
    let (status, ride) = send(&app, request("PATCH", &uri, Some(&driver), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ride["status"], "ACCEPTED");
    assert_eq!(ride["driver_id"], driver.id.to_string());

    let (status, error) = send(&app, request("PATCH", &uri, Some(&rival), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], 102);

    let uri = format!("/rides/{}/advance", id);
    let (status, error) = send(
        &app,
        request("PATCH", &uri, Some(&driver), Some(json!({ "status": "COMPLETED" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], 104);

    for target in ["IN_PROGRESS", "COMPLETED"] {
        let (status, ride) = send(
            &app,
            request("PATCH", &uri, Some(&driver), Some(json!({ "status": target }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ride["status"], target);
    }

    let uri = format!("/rides/{}/cancel", id);
    let (status, _) = send(&app, request("PATCH", &uri, Some(&passenger), None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, rides) = send(&app, request("GET", "/rides", Some(&passenger), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rides[0]["status"], "COMPLETED");

    let uri = format!("/rides/{}", id);
    let (status, _) = send(&app, request("GET", &uri, Some(&rival), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_identity_is_unauthenticated() {
    let app = app();

    let (status, error) = send(&app, request("POST", "/rides", None, Some(ride_body()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["code"], 105);

    let request = Request::builder()
        .method("GET")
        .uri("/available_rides")
        .header("x-user-id", "not-a-uuid")
        .header("x-user-role", "driver")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validation_and_lookup_errors() {
    let app = app();
    let passenger = User::new(Uuid::new_v4(), Role::Passenger);
    let driver = User::new(Uuid::new_v4(), Role::Driver);

    let mut body = ride_body();
    body["price"] = Value::Null;
    let (status, error) = send(&app, request("POST", "/rides", Some(&passenger), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], 100);

    let uri = format!("/rides/{}", Uuid::new_v4());
    let (status, error) = send(&app, request("GET", &uri, Some(&driver), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], 101);

    let (status, _) = send(
        &app,
        request("GET", "/available_rides?lat=6.9", Some(&driver), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, rides) = send(
        &app,
        request(
            "GET",
            "/available_rides?lat=6.9271&lng=79.8612&radius_m=1500",
            Some(&driver),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(rides.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_input_is_a_validation_error() {
    let app = app();
    let passenger = User::new(Uuid::new_v4(), Role::Passenger);
    let driver = User::new(Uuid::new_v4(), Role::Driver);

    let mut body = ride_body();
    body["price"] = json!("ten");
    let (status, error) = send(&app, request("POST", "/rides", Some(&passenger), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], 100);

    let mut body = ride_body();
    body["pickup"]["lat"] = json!("north");
    let (status, error) = send(&app, request("POST", "/rides", Some(&passenger), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], 100);

    let (status, error) = send(
        &app,
        request("GET", "/available_rides?lat=abc&lng=1&radius_m=10", Some(&driver), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], 100);

    let create = request("POST", "/rides", Some(&passenger), Some(ride_body()));
    let (status, ride) = send(&app, create).await;
    assert_eq!(status, StatusCode::OK);
    let uri = format!("/rides/{}/advance", ride["id"].as_str().unwrap());

    let (status, error) = send(
        &app,
        request("PATCH", &uri, Some(&driver), Some(json!({ "status": "FLYING" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], 100);
}

#[tokio::test]
async fn malformed_ride_id_is_not_found() {
    let app = app();
    let driver = User::new(Uuid::new_v4(), Role::Driver);

    let (status, error) =
        send(&app, request("GET", "/rides/not-a-uuid", Some(&driver), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], 101);

    let (status, error) =
        send(&app, request("PATCH", "/rides/not-a-uuid/accept", Some(&driver), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], 101);
}
