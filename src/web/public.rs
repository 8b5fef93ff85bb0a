//! Unauthenticated portfolio reads for an active user.

use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::errors::FolioError;
use crate::services::PublicProfileService;
use crate::storage::translations::Language;
use crate::web::extract::Path;
use crate::web::response;
use crate::web::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/public-profile/{username}", get(profile))
        .route("/{username}/{lang}/education", get(educations))
        .route("/{username}/{lang}/experience", get(experiences))
        .route("/{username}/{lang}/project", get(projects))
        .route("/{username}/{lang}/project/{slug}", get(project))
        .route("/{username}/{lang}/skill", get(skills))
        .route("/{username}/{lang}/solution", get(solutions))
}

async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, FolioError> {
    let user = PublicProfileService::new(&state.db).profile(&username).await?;
    Ok(response::ok(user))
}

async fn educations(
    State(state): State<AppState>,
    Path((username, lang)): Path<(String, String)>,
) -> Result<Response, FolioError> {
    let language: Language = lang.parse()?;
    let rows = PublicProfileService::new(&state.db)
        .educations(&username, language)
        .await?;
    response::items(rows)
}

async fn experiences(
    State(state): State<AppState>,
    Path((username, lang)): Path<(String, String)>,
) -> Result<Response, FolioError> {
    let language: Language = lang.parse()?;
    let rows = PublicProfileService::new(&state.db)
        .experiences(&username, language)
        .await?;
    response::items(rows)
}

async fn projects(
    State(state): State<AppState>,
    Path((username, lang)): Path<(String, String)>,
) -> Result<Response, FolioError> {
    let language: Language = lang.parse()?;
    let rows = PublicProfileService::new(&state.db)
        .projects(&username, language)
        .await?;
    response::items(rows)
}

async fn project(
    State(state): State<AppState>,
    Path((username, lang, slug)): Path<(String, String, String)>,
) -> Result<Response, FolioError> {
    let language: Language = lang.parse()?;
    let detail = PublicProfileService::new(&state.db)
        .project(&username, language, &slug)
        .await?;
    Ok(response::ok(detail))
}

async fn skills(
    State(state): State<AppState>,
    Path((username, lang)): Path<(String, String)>,
) -> Result<Response, FolioError> {
    let language: Language = lang.parse()?;
    let rows = PublicProfileService::new(&state.db)
        .skills(&username, language)
        .await?;
    response::items(rows)
}

async fn solutions(
    State(state): State<AppState>,
    Path((username, lang)): Path<(String, String)>,
) -> Result<Response, FolioError> {
    let language: Language = lang.parse()?;
    let rows = PublicProfileService::new(&state.db)
        .solutions(&username, language)
        .await?;
    response::items(rows)
}
