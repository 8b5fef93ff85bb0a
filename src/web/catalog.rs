use axum::extract::{Multipart, State};
use axum::routing::get;
use axum::Router;

use crate::errors::FolioError;
use crate::services::{CatalogService, Images};
use crate::session::AuthUser;
use crate::storage::catalog::{CatalogKind, CatalogUpdate, NewCatalogItem};
use crate::storage::ListQuery;
use crate::web::extract::{Path, Query};
use crate::web::form::Form;
use crate::web::response;
use crate::web::AppState;

pub(super) fn routes() -> Router<AppState> {
    [CatalogKind::Company, CatalogKind::School, CatalogKind::Skill]
        .into_iter()
        .fold(Router::new(), |router, kind| router.merge(kind_routes(kind)))
}

fn kind_routes(kind: CatalogKind) -> Router<AppState> {
    let collection = format!("/{}", kind.folder());
    let item = format!("/{}/{{id}}", kind.folder());
    Router::new()
        .route(
            &collection,
            get(
                move |State(state): State<AppState>,
                      AuthUser(_principal): AuthUser,
                      Query(query): Query<ListQuery>| async move {
                    let page = CatalogService::new(&state.db, &state.files, kind)
                        .list(&query)
                        .await?;
                    response::page(page, &query)
                },
            )
            .post(
                move |State(state): State<AppState>,
                      AuthUser(principal): AuthUser,
                      multipart: Multipart| async move {
                    let mut form = Form::read(multipart).await?;
                    let input = NewCatalogItem {
                        code: form.required("code")?,
                        name: form.required("name")?,
                        category: form.text("category"),
                        website_url: form.text("website_url"),
                        image_url: None,
                        logo_url: None,
                    };
                    let images = images(&mut form);
                    let item = CatalogService::new(&state.db, &state.files, kind)
                        .create(&principal, input, images)
                        .await?;
                    Ok::<_, FolioError>(response::created(item))
                },
            ),
        )
        .route(
            &item,
            get(
                move |State(state): State<AppState>,
                      AuthUser(_principal): AuthUser,
                      Path(id): Path<String>| async move {
                    let item = CatalogService::new(&state.db, &state.files, kind)
                        .get(&id)
                        .await?;
                    Ok::<_, FolioError>(response::ok(item))
                },
            )
            .patch(
                move |State(state): State<AppState>,
                      AuthUser(principal): AuthUser,
                      Path(id): Path<String>,
                      multipart: Multipart| async move {
                    let mut form = Form::read(multipart).await?;
                    let update = CatalogUpdate {
                        code: form.text("code"),
                        name: form.text("name"),
                        category: form.text("category"),
                        website_url: form.text("website_url"),
                        is_active: form.parse("is_active")?,
                        image_url: None,
                        logo_url: None,
                    };
                    let images = images(&mut form);
                    let item = CatalogService::new(&state.db, &state.files, kind)
                        .update(&principal, &id, update, images)
                        .await?;
                    Ok::<_, FolioError>(response::ok(item))
                },
            )
            .delete(
                move |State(state): State<AppState>,
                      AuthUser(principal): AuthUser,
                      Path(id): Path<String>| async move {
                    CatalogService::new(&state.db, &state.files, kind)
                        .delete(&principal, &id)
                        .await?;
                    Ok::<_, FolioError>(response::message(&format!(
                        "{} deleted",
                        kind.label()
                    )))
                },
            ),
        )
}

fn images(form: &mut Form) -> Images {
    Images {
        image: form.file("image"),
        logo: form.file("logo"),
    }
}
