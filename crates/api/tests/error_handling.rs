//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests call `IntoResponse` directly on `AppError` values; no router
//! is involved.

use addata_api::error::AppError;
use addata_core::error::CoreError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::script_not_found("GAME_1"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Script with id GAME_1 not found");
}

#[tokio::test]
async fn validation_error_lists_every_field() {
    let err = AppError::Core(CoreError::Validation(vec![
        "defaultAdUnitData.bannerId: must be exactly 16 characters (got 9)".into(),
        "defaultAdUnitData.aoaId: must contain only lowercase letters and digits".into(),
    ]));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "2 validation errors");
    assert_eq!(json["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn single_validation_error_is_the_message() {
    let err = AppError::Core(CoreError::validation("Project name cannot be empty"));

    let (_, json) = error_to_response(err).await;

    assert_eq!(json["error"], "Project name cannot be empty");
    assert_eq!(json["details"][0], "Project name cannot be empty");
}

#[tokio::test]
async fn duplicates_and_policy_return_409_with_distinct_codes() {
    let (status, json) = error_to_response(AppError::Core(CoreError::DuplicateName("Demo".into()))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "DUPLICATE_NAME");

    let (status, json) = error_to_response(AppError::Core(CoreError::DuplicateScriptId {
        project_id: uuid::Uuid::new_v4(),
        script_id: "GAME_1".into(),
    }))
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "DUPLICATE_SCRIPT_ID");

    let (status, json) = error_to_response(AppError::Core(CoreError::Policy("last script".into()))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "POLICY_VIOLATION");
    assert_eq!(json["error"], "last script");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn storage_error_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Storage(
        "connection to 10.0.0.5:5432 refused".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "STORAGE_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Internal(
        "secret database credentials leaked".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
