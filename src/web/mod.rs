//! HTTP surface: `/api/v1` JSON endpoints plus uploaded files under `/static`.

mod auth;
mod catalog;
pub mod extract;
pub mod form;
mod profile;
mod public;
pub mod response;
mod roles;
mod translations;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::Router;
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::authz;
use crate::files::{FileStore, STATIC_PREFIX};
use crate::settings::Settings;
use crate::tokens::TokenSigner;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseConnection,
    pub tokens: TokenSigner,
    pub files: FileStore,
}

impl AppState {
    pub fn new(settings: Settings, db: DatabaseConnection, tokens: TokenSigner) -> Self {
        let files = FileStore::new(&settings.uploads);
        Self {
            settings: Arc::new(settings),
            db,
            tokens,
            files,
        }
    }
}

// Security headers middleware
async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    response
}

/// The full application router with state applied.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(roles::routes())
        .merge(users::routes())
        .merge(catalog::routes())
        .merge(profile::routes())
        .merge(translations::routes())
        .merge(public::routes())
        .merge(authz::web::routes());

    // room for an image and a logo at the configured cap, plus form fields
    let body_limit = (state.settings.uploads.max_size_mb as usize * 2 + 1) * 1024 * 1024;

    Router::new()
        .nest("/api/v1", api)
        .nest_service(STATIC_PREFIX, ServeDir::new(state.files.root()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    settings: Settings,
    db: DatabaseConnection,
    tokens: TokenSigner,
) -> miette::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;
    tokio::fs::create_dir_all(&settings.uploads.root)
        .await
        .into_diagnostic()?;

    let app = router(AppState::new(settings, db, tokens));

    tracing::info!(%addr, "API listening");
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}
