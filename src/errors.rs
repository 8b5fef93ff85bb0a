use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FolioError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(folio::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(folio::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(folio::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(folio::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("JOSE error: {0}")]
    #[diagnostic(code(folio::jose))]
    Jose(String),

    /// Caller-correctable input problem; the message is returned verbatim.
    #[error("{0}")]
    #[diagnostic(code(folio::validation))]
    Validation(String),

    #[error("{0}")]
    #[diagnostic(code(folio::not_found))]
    NotFound(String),

    #[error("{0}")]
    #[diagnostic(code(folio::unauthorized))]
    Unauthorized(String),

    #[error("{0}")]
    #[diagnostic(code(folio::forbidden))]
    Forbidden(String),

    /// A referenced row blocks the operation (e.g. a role still assigned to users).
    #[error("{0}")]
    #[diagnostic(
        code(folio::integrity_constraint),
        help("Remove or reassign the dependent records first")
    )]
    IntegrityConstraint(String),

    /// A child row points at a parent that no longer exists.
    #[error("Data integrity error: {0}")]
    #[diagnostic(code(folio::data_integrity))]
    DataIntegrity(String),

    #[error("{0}")]
    #[diagnostic(code(folio::other))]
    Other(String),
}

impl From<josekit::JoseError> for FolioError {
    fn from(value: josekit::JoseError) -> Self {
        FolioError::Jose(value.to_string())
    }
}

impl FolioError {
    pub fn status(&self) -> StatusCode {
        match self {
            FolioError::Validation(_) | FolioError::IntegrityConstraint(_) => {
                StatusCode::BAD_REQUEST
            }
            FolioError::NotFound(_) => StatusCode::NOT_FOUND,
            FolioError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FolioError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found() -> Self {
        FolioError::NotFound("Data not found".to_string())
    }
}

impl IntoResponse for FolioError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = json!({
            "code": status.as_u16(),
            "status": status.canonical_reason().unwrap_or("Error"),
            "detail": detail,
        });
        (status, Json(body)).into_response()
    }
}
