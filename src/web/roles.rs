use axum::extract::State;
use axum::response::Response;
use axum::routing::{delete, get};
use axum::Router;

use crate::authz::Action;
use crate::errors::FolioError;
use crate::services::roles::GrantRequest;
use crate::services::RoleService;
use crate::session::AuthUser;
use crate::storage::roles::{NewRole, RoleUpdate};
use crate::storage::ListQuery;
use crate::web::extract::{Json, Path, Query};
use crate::web::response;
use crate::web::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/role", get(list).post(create))
        .route("/role/{id}", get(read).patch(update).delete(remove))
        .route("/role/{id}/authority", get(authorities).post(grant))
        .route("/role/{id}/authority/{feature}/{action}", delete(revoke))
}

async fn list(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, FolioError> {
    let page = RoleService::new(&state.db).list(&principal, &query).await?;
    response::page(page, &query)
}

async fn read(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, FolioError> {
    Ok(response::ok(RoleService::new(&state.db).get(id).await?))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(input): Json<NewRole>,
) -> Result<Response, FolioError> {
    let role = RoleService::new(&state.db).create(&principal, input).await?;
    Ok(response::created(role))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i32>,
    Json(update): Json<RoleUpdate>,
) -> Result<Response, FolioError> {
    let role = RoleService::new(&state.db)
        .update(&principal, id, update)
        .await?;
    Ok(response::ok(role))
}

async fn remove(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, FolioError> {
    RoleService::new(&state.db).delete(&principal, id).await?;
    Ok(response::message("Role deleted"))
}

async fn authorities(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, FolioError> {
    let rows = RoleService::new(&state.db)
        .authorities(&principal, id)
        .await?;
    response::items(rows)
}

async fn grant(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<GrantRequest>,
) -> Result<Response, FolioError> {
    let created = RoleService::new(&state.db)
        .grant(&principal, id, request)
        .await?;
    Ok(if created {
        response::created(serde_json::json!({ "granted": true }))
    } else {
        response::ok(serde_json::json!({ "granted": false }))
    })
}

async fn revoke(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path((id, feature, action)): Path<(i32, String, String)>,
) -> Result<Response, FolioError> {
    let action: Action = action.parse()?;
    RoleService::new(&state.db)
        .revoke(&principal, id, &feature, action)
        .await?;
    Ok(response::message("Authority revoked"))
}
