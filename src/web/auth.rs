use axum::extract::{Multipart, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;

use crate::errors::FolioError;
use crate::services::auth::{LoginRequest, PasswordChange, Session};
use crate::services::AuthService;
use crate::session::{AccessCookie, AuthUser};
use crate::storage::users::{Gender, UserUpdate};
use crate::web::extract::Json;
use crate::web::form::Form;
use crate::web::response;
use crate::web::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/profile", get(profile).patch(update_profile))
        .route("/auth/profile/password", put(change_password))
}

fn service(state: &AppState) -> AuthService<'_> {
    AuthService::new(&state.db, &state.tokens, &state.files)
}

fn with_cookie(state: &AppState, session: Session) -> Response {
    let cookie = AccessCookie::new(session.access_token.token.clone())
        .to_cookie_header(&state.settings, &session.access_token);
    ([(SET_COOKIE, cookie)], response::ok(session)).into_response()
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, FolioError> {
    let session = service(&state).login(request).await?;
    Ok(with_cookie(&state, session))
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Response, FolioError> {
    let session = service(&state).refresh(&request.refresh_token).await?;
    Ok(with_cookie(&state, session))
}

async fn logout() -> Response {
    (
        [(SET_COOKIE, AccessCookie::delete_cookie_header())],
        response::message("Logged out"),
    )
        .into_response()
}

async fn profile(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Response, FolioError> {
    let user = service(&state).profile(&principal.id).await?;
    Ok(response::ok(user))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let update = UserUpdate {
        email: form.text("email"),
        name: form.text("name"),
        phone_number: form.text("phone_number"),
        gender: form.text("gender").map(|g| Gender::parse(&g)).transpose()?,
        ..Default::default()
    };
    let image = form.file("image");
    let user = service(&state)
        .update_profile(&principal.id, update, image.as_ref())
        .await?;
    Ok(response::ok(user))
}

async fn change_password(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(change): Json<PasswordChange>,
) -> Result<Response, FolioError> {
    service(&state)
        .change_password(&principal.id, change)
        .await?;
    Ok(response::message("Password updated"))
}
