//! Success envelopes. Errors are rendered by `FolioError`'s `IntoResponse`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::FolioError;
use crate::storage::{ListQuery, Page};

#[derive(Debug, Serialize)]
pub struct Meta {
    pub size: Option<u64>,
    pub total: u64,
    pub total_pages: u64,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub status: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

fn respond<T: Serialize>(status: StatusCode, data: T, meta: Option<Meta>) -> Response {
    let body = Envelope {
        code: status.as_u16(),
        status: "OK",
        data,
        meta,
    };
    (status, Json(body)).into_response()
}

pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, data, None)
}

pub fn created<T: Serialize>(data: T) -> Response {
    respond(StatusCode::CREATED, data, None)
}

/// Plain acknowledgement for deletes and other bodiless results.
pub fn message(text: &str) -> Response {
    ok(serde_json::json!({ "message": text }))
}

/// A page of results; an empty page is reported as 404 "Data not found".
pub fn page<T: Serialize>(page: Page<T>, query: &ListQuery) -> Result<Response, FolioError> {
    if page.items.is_empty() {
        return Err(FolioError::not_found());
    }
    let meta = Meta {
        size: query.size,
        total: page.total,
        total_pages: query.total_pages(page.total),
        offset: query.offset,
    };
    Ok(respond(StatusCode::OK, page.items, Some(meta)))
}

/// An unpaginated list; empty is still 404.
pub fn items<T: Serialize>(items: Vec<T>) -> Result<Response, FolioError> {
    if items.is_empty() {
        return Err(FolioError::not_found());
    }
    let total = items.len() as u64;
    let meta = Meta {
        size: None,
        total,
        total_pages: 1,
        offset: None,
    };
    Ok(respond(StatusCode::OK, items, Some(meta)))
}
