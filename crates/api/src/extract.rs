//! Extractors whose rejections use the JSON error envelope.
//!
//! Axum's own `Json` and `Path` reject with plain-text bodies. These
//! wrappers turn a body with the wrong field types into a validation error
//! and an unparseable path segment (e.g. a project id that is not a UUID)
//! into a bad request.

use addata_core::error::CoreError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// Path parameters.
#[derive(Debug)]
pub struct ValidPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => CoreError::validation(e.body_text()).into(),
        other => AppError::BadRequest(other.body_text()),
    }
}

fn path_rejection(rejection: PathRejection) -> AppError {
    // Only the project id segment can fail to parse.
    match rejection {
        PathRejection::FailedToDeserializePathParams(_) => {
            AppError::BadRequest("Invalid project ID format".to_string())
        }
        other => AppError::BadRequest(other.body_text()),
    }
}
