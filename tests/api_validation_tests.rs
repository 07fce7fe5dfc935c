// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Malformed payloads must be rejected with 400 before the database is
//! touched, so these run against the offline mock.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

// 1x1 transparent PNG
const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn recipe_payload() -> Value {
    json!({
        "name": "Pancakes",
        "text": "Mix everything and fry.",
        "cooking_time": 20,
        "image": PNG_DATA_URI,
        "tags": [1],
        "ingredients": [{"id": 1, "amount": 200}, {"id": 2, "amount": 2}]
    })
}

async fn post_recipe(payload: Value) -> (StatusCode, Value) {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(12345, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recipes/")
                .header(header::AUTHORIZATION, format!("Token {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, common::json_body(response).await)
}

#[tokio::test]
async fn test_well_formed_recipe_reaches_database() {
    // Validation passes; the offline database then fails the request.
    let (status, _) = post_recipe(recipe_payload()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_duplicate_ingredient_rejected() {
    let mut payload = recipe_payload();
    payload["ingredients"] = json!([{"id": 1, "amount": 1}, {"id": 1, "amount": 5}]);

    let (status, body) = post_recipe(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["ingredients"].is_string());
}

#[tokio::test]
async fn test_empty_ingredients_rejected() {
    let mut payload = recipe_payload();
    payload["ingredients"] = json!([]);

    let (status, body) = post_recipe(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["ingredients"].is_string());
}

#[tokio::test]
async fn test_too_many_ingredients_rejected() {
    let mut payload = recipe_payload();
    let rows: Vec<Value> = (1..=500)
        .map(|id| json!({"id": id, "amount": 1}))
        .collect();
    payload["ingredients"] = Value::Array(rows);

    let (status, body) = post_recipe(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["ingredients"].is_string());
}

#[tokio::test]
async fn test_zero_amount_rejected() {
    let mut payload = recipe_payload();
    payload["ingredients"] = json!([{"id": 1, "amount": 0}]);

    let (status, _) = post_recipe(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_tag_rejected() {
    let mut payload = recipe_payload();
    payload["tags"] = json!([1, 1]);

    let (status, body) = post_recipe(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["tags"].is_string());
}

#[tokio::test]
async fn test_cooking_time_bounds() {
    for cooking_time in [0, -5, 32_001] {
        let mut payload = recipe_payload();
        payload["cooking_time"] = json!(cooking_time);

        let (status, body) = post_recipe(payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "cooking_time {cooking_time}");
        assert!(body["cooking_time"].is_string());
    }
}

#[tokio::test]
async fn test_missing_image_rejected_on_create() {
    let mut payload = recipe_payload();
    payload.as_object_mut().unwrap().remove("image");

    let (status, body) = post_recipe(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["image"].is_string());
}

#[tokio::test]
async fn test_image_must_be_data_uri() {
    let mut payload = recipe_payload();
    payload["image"] = json!("https://example.com/pancakes.png");

    let (status, body) = post_recipe(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["image"].is_string());
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(12345, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recipes/")
                .header(header::AUTHORIZATION, format!("Token {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert!(body["message"].is_string());
}

async fn post_signup(payload: Value) -> (StatusCode, Value) {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, common::json_body(response).await)
}

fn signup_payload() -> Value {
    json!({
        "email": "vasya@example.com",
        "username": "vasya.pupkin",
        "first_name": "Vasya",
        "last_name": "Pupkin",
        "password": "Qwerty123"
    })
}

#[tokio::test]
async fn test_signup_invalid_email() {
    let mut payload = signup_payload();
    payload["email"] = json!("not-an-email");

    let (status, body) = post_signup(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["email"].is_string());
}

#[tokio::test]
async fn test_signup_invalid_username() {
    let mut payload = signup_payload();
    payload["username"] = json!("vasya pupkin!");

    let (status, body) = post_signup(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["username"].is_string());
}

#[tokio::test]
async fn test_signup_missing_field() {
    let mut payload = signup_payload();
    payload.as_object_mut().unwrap().remove("password");

    let (status, _) = post_signup(payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_password_too_long() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(12345, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/set_password/")
                .header(header::AUTHORIZATION, format!("Token {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"new_password": "x".repeat(151), "current_password": "old"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert!(body["new_password"].is_string());
}

#[tokio::test]
async fn test_ingredient_filter_too_long() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/ingredients/?name={}", "a".repeat(201)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
