use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use sea_orm::IntoActiveModel;

use crate::entities::{
    company_translation, education_translation, experience_translation, project_translation,
    school_translation, skill_translation, solution_translation,
};
use crate::errors::FolioError;
use crate::services::TranslationService;
use crate::session::AuthUser;
use crate::storage::translations::{ActiveOf, Language, TranslationRecord};
use crate::web::extract::{Json, Path};
use crate::web::response;
use crate::web::AppState;

/// `/{family}-translation/{parent_id}/{language}` for one translation family.
///
/// Expanded per model so each handler is checked against a concrete type.
macro_rules! family {
    ($model:ty) => {{
        let path = format!(
            "/{}/{{parent_id}}/{{language}}",
            <$model as TranslationRecord>::ROUTE
        );
        Router::new().route(
            &path,
            get(read::<$model>)
                .post(create::<$model>)
                .patch(update::<$model>)
                .delete(remove::<$model>),
        )
    }};
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .merge(family!(company_translation::Model))
        .merge(family!(school_translation::Model))
        .merge(family!(skill_translation::Model))
        .merge(family!(education_translation::Model))
        .merge(family!(experience_translation::Model))
        .merge(family!(project_translation::Model))
        .merge(family!(solution_translation::Model))
}

fn target((parent_id, language): (String, String)) -> Result<(String, Language), FolioError> {
    Ok((parent_id, language.parse()?))
}

async fn read<T>(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(path): Path<(String, String)>,
) -> Result<Response, FolioError>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
{
    let (parent_id, language) = target(path)?;
    let row = TranslationService::<T>::new(&state.db)
        .get(&principal, &parent_id, language)
        .await?;
    Ok(response::ok(row))
}

async fn create<T>(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(path): Path<(String, String)>,
    Json(input): Json<T::Input>,
) -> Result<Response, FolioError>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
{
    let (parent_id, language) = target(path)?;
    let row = TranslationService::<T>::new(&state.db)
        .create(&principal, &parent_id, language, input)
        .await?;
    Ok(response::created(row))
}

async fn update<T>(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(path): Path<(String, String)>,
    Json(patch): Json<T::Patch>,
) -> Result<Response, FolioError>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
{
    let (parent_id, language) = target(path)?;
    let row = TranslationService::<T>::new(&state.db)
        .update(&principal, &parent_id, language, patch)
        .await?;
    Ok(response::ok(row))
}

async fn remove<T>(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(path): Path<(String, String)>,
) -> Result<Response, FolioError>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
{
    let (parent_id, language) = target(path)?;
    TranslationService::<T>::new(&state.db)
        .delete(&principal, &parent_id, language)
        .await?;
    Ok(response::message("Translation deleted"))
}
