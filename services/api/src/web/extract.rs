//! services/api/src/web/extract.rs
//!
//! Body and path extractors whose rejections render as the API's JSON error
//! envelope instead of axum's plain-text defaults.

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    FromRequest, FromRequestParts,
};
use mentorship_core::CoreError;

use crate::error::HttpError;

/// `axum::Json` whose rejection is a `VALIDATION_ERROR`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` whose rejection is a `VALIDATION_ERROR`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HttpError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError(CoreError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        HttpError(CoreError::Validation(rejection.body_text()))
    }
}
