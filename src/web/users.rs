use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::errors::FolioError;
use crate::services::UserService;
use crate::session::AuthUser;
use crate::storage::users::{Gender, NewUser, UserUpdate};
use crate::storage::ListQuery;
use crate::web::extract::{Path, Query};
use crate::web::form::Form;
use crate::web::response;
use crate::web::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(list).post(create))
        .route("/user/{id}", get(read).patch(update).delete(remove))
}

fn service(state: &AppState) -> UserService<'_> {
    UserService::new(&state.db, &state.files)
}

#[derive(Debug, Default, Deserialize)]
struct RoleFilter {
    /// Only users whose role is no more senior than the caller's
    #[serde(default)]
    is_role_level: bool,
    role_id: Option<i32>,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
    Query(filter): Query<RoleFilter>,
) -> Result<Response, FolioError> {
    let page = service(&state)
        .list(&principal, &query, filter.is_role_level, filter.role_id)
        .await?;
    response::page(page, &query)
}

async fn read(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    Ok(response::ok(service(&state).get(&principal, &id).await?))
}

fn gender(form: &Form) -> Result<Option<Gender>, FolioError> {
    form.text("gender").map(|g| Gender::parse(&g)).transpose()
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let input = NewUser {
        role_id: form.parse("role_id")?,
        username: form.required("username")?,
        email: form.required("email")?,
        name: form.required("name")?,
        password: form.required("password")?,
        phone_number: form.text("phone_number"),
        gender: gender(&form)?,
        image_url: None,
    };
    let image = form.file("image");
    let user = service(&state)
        .create(&principal, input, image.as_ref())
        .await?;
    Ok(response::created(user))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let update = UserUpdate {
        role_id: form.parse("role_id")?,
        email: form.text("email"),
        name: form.text("name"),
        phone_number: form.text("phone_number"),
        gender: gender(&form)?,
        is_active: form.parse("is_active")?,
        image_url: None,
        clear_role: false,
    };
    let image = form.file("image");
    let user = service(&state)
        .update(&principal, &id, update, image.as_ref())
        .await?;
    Ok(response::ok(user))
}

async fn remove(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    service(&state).delete(&principal, &id).await?;
    Ok(response::message("User deleted"))
}
