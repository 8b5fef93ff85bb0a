//! axum extractors whose rejections use the JSON error envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::FolioError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(FolioError))]
pub struct Json<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(FolioError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(FolioError))]
pub struct Query<T>(pub T);

impl From<JsonRejection> for FolioError {
    fn from(rejection: JsonRejection) -> Self {
        FolioError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for FolioError {
    fn from(rejection: PathRejection) -> Self {
        FolioError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for FolioError {
    fn from(rejection: QueryRejection) -> Self {
        FolioError::Validation(rejection.body_text())
    }
}
