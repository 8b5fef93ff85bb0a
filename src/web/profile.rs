use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::routing::{delete, get};
use axum::Router;
use serde::Deserialize;

use crate::errors::FolioError;
use crate::services::profile::{CreateEducation, CreateExperience, CreateSkillMapping};
use crate::services::{
    EducationService, ExperienceService, Images, ProjectService, SkillMappingService,
    SolutionService,
};
use crate::session::AuthUser;
use crate::storage::profile::{
    AttachmentUpdate, EducationUpdate, ExperienceUpdate, NewAttachment, NewProject,
    NewSolution, ProjectUpdate, SkillMappingUpdate, SolutionUpdate,
};
use crate::storage::ListQuery;
use crate::web::extract::{Json, Path, Query};
use crate::web::form::Form;
use crate::web::response;
use crate::web::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/education", get(list_educations).post(create_education))
        .route(
            "/education/{id}",
            get(read_education)
                .patch(update_education)
                .delete(delete_education),
        )
        .route("/experience", get(list_experiences).post(create_experience))
        .route(
            "/experience/{id}",
            get(read_experience)
                .patch(update_experience)
                .delete(delete_experience),
        )
        .route("/project", get(list_projects).post(create_project))
        .route(
            "/project/{id}",
            get(read_project).patch(update_project).delete(delete_project),
        )
        .route("/project-skill", get(list_project_skills).post(add_project_skill))
        .route(
            "/project-skill/{project_id}/{skill_id}",
            delete(remove_project_skill),
        )
        .route(
            "/project-attachment",
            get(list_attachments).post(create_attachment),
        )
        .route(
            "/project-attachment/{id}",
            get(read_attachment)
                .patch(update_attachment)
                .delete(delete_attachment),
        )
        .route("/solution", get(list_solutions).post(create_solution))
        .route(
            "/solution/{id}",
            get(read_solution)
                .patch(update_solution)
                .delete(delete_solution),
        )
        .route(
            "/skill-mapping",
            get(list_skill_mappings).post(create_skill_mapping),
        )
        .route(
            "/skill-mapping/{id}",
            get(read_skill_mapping)
                .patch(update_skill_mapping)
                .delete(delete_skill_mapping),
        )
}

fn images(form: &mut Form) -> Images {
    Images {
        image: form.file("image"),
        logo: form.file("logo"),
    }
}

// ---- education ----

async fn list_educations(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, FolioError> {
    let page = EducationService::new(&state.db)
        .list(&principal, &query)
        .await?;
    response::page(page, &query)
}

async fn read_education(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    let row = EducationService::new(&state.db).get(&principal, &id).await?;
    Ok(response::ok(row))
}

async fn create_education(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(input): Json<CreateEducation>,
) -> Result<Response, FolioError> {
    let row = EducationService::new(&state.db)
        .create(&principal, input)
        .await?;
    Ok(response::created(row))
}

async fn update_education(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(update): Json<EducationUpdate>,
) -> Result<Response, FolioError> {
    let row = EducationService::new(&state.db)
        .update(&principal, &id, update)
        .await?;
    Ok(response::ok(row))
}

async fn delete_education(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    EducationService::new(&state.db)
        .delete(&principal, &id)
        .await?;
    Ok(response::message("Education deleted"))
}

// ---- experience ----

async fn list_experiences(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, FolioError> {
    let page = ExperienceService::new(&state.db)
        .list(&principal, &query)
        .await?;
    response::page(page, &query)
}

async fn read_experience(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    let row = ExperienceService::new(&state.db)
        .get(&principal, &id)
        .await?;
    Ok(response::ok(row))
}

async fn create_experience(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(input): Json<CreateExperience>,
) -> Result<Response, FolioError> {
    let row = ExperienceService::new(&state.db)
        .create(&principal, input)
        .await?;
    Ok(response::created(row))
}

async fn update_experience(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(update): Json<ExperienceUpdate>,
) -> Result<Response, FolioError> {
    let row = ExperienceService::new(&state.db)
        .update(&principal, &id, update)
        .await?;
    Ok(response::ok(row))
}

async fn delete_experience(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    ExperienceService::new(&state.db)
        .delete(&principal, &id)
        .await?;
    Ok(response::message("Experience deleted"))
}

// ---- project ----

fn projects(state: &AppState) -> ProjectService<'_> {
    ProjectService::new(&state.db, &state.files)
}

async fn list_projects(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, FolioError> {
    let page = projects(&state).list(&principal, &query).await?;
    response::page(page, &query)
}

async fn read_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    Ok(response::ok(projects(&state).get(&principal, &id).await?))
}

async fn create_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let owner = form.text("user_id");
    let input = NewProject {
        title: form.required("title")?,
        slug: form.text("slug"),
        image_url: None,
        logo_url: None,
    };
    let images = images(&mut form);
    let row = projects(&state)
        .create(&principal, owner.as_deref(), input, images)
        .await?;
    Ok(response::created(row))
}

async fn update_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let update = ProjectUpdate {
        title: form.text("title"),
        slug: form.text("slug"),
        is_active: form.parse("is_active")?,
        image_url: None,
        logo_url: None,
    };
    let images = images(&mut form);
    let row = projects(&state)
        .update(&principal, &id, update, images)
        .await?;
    Ok(response::ok(row))
}

async fn delete_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    projects(&state).delete(&principal, &id).await?;
    Ok(response::message("Project deleted"))
}

#[derive(Debug, Deserialize)]
struct ProjectFilter {
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct ProjectSkillRequest {
    project_id: String,
    skill_id: String,
}

async fn list_project_skills(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(filter): Query<ProjectFilter>,
) -> Result<Response, FolioError> {
    let skills = projects(&state)
        .skills(&principal, &filter.project_id)
        .await?;
    response::items(skills)
}

async fn add_project_skill(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(request): Json<ProjectSkillRequest>,
) -> Result<Response, FolioError> {
    let row = projects(&state)
        .add_skill(&principal, &request.project_id, &request.skill_id)
        .await?;
    Ok(response::created(row))
}

async fn remove_project_skill(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path((project_id, skill_id)): Path<(String, String)>,
) -> Result<Response, FolioError> {
    projects(&state)
        .remove_skill(&principal, &project_id, &skill_id)
        .await?;
    Ok(response::message("Project skill deleted"))
}

async fn list_attachments(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(filter): Query<ProjectFilter>,
    Query(query): Query<ListQuery>,
) -> Result<Response, FolioError> {
    let page = projects(&state)
        .attachments(&principal, &filter.project_id, &query)
        .await?;
    response::page(page, &query)
}

async fn read_attachment(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    let row = projects(&state).attachment(&principal, &id).await?;
    Ok(response::ok(row))
}

async fn create_attachment(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let input = NewAttachment {
        project_id: form.required("project_id")?,
        title: form.required("title")?,
        description: form.text("description"),
        category: form.text("category"),
        website_url: form.text("website_url"),
        image_url: None,
    };
    let image = form.file("image");
    let row = projects(&state)
        .create_attachment(&principal, input, image.as_ref())
        .await?;
    Ok(response::created(row))
}

async fn update_attachment(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let update = AttachmentUpdate {
        title: form.text("title"),
        description: form.text("description"),
        category: form.text("category"),
        website_url: form.text("website_url"),
        is_active: form.parse("is_active")?,
        image_url: None,
    };
    let image = form.file("image");
    let row = projects(&state)
        .update_attachment(&principal, &id, update, image.as_ref())
        .await?;
    Ok(response::ok(row))
}

async fn delete_attachment(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    projects(&state).delete_attachment(&principal, &id).await?;
    Ok(response::message("Project attachment deleted"))
}

// ---- solution ----

fn solutions(state: &AppState) -> SolutionService<'_> {
    SolutionService::new(&state.db, &state.files)
}

async fn list_solutions(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, FolioError> {
    let page = solutions(&state).list(&principal, &query).await?;
    response::page(page, &query)
}

async fn read_solution(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    Ok(response::ok(solutions(&state).get(&principal, &id).await?))
}

async fn create_solution(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let owner = form.text("user_id");
    let input = NewSolution {
        title: form.required("title")?,
        image_url: None,
        logo_url: None,
    };
    let images = images(&mut form);
    let row = solutions(&state)
        .create(&principal, owner.as_deref(), input, images)
        .await?;
    Ok(response::created(row))
}

async fn update_solution(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, FolioError> {
    let mut form = Form::read(multipart).await?;
    let update = SolutionUpdate {
        title: form.text("title"),
        is_active: form.parse("is_active")?,
        image_url: None,
        logo_url: None,
    };
    let images = images(&mut form);
    let row = solutions(&state)
        .update(&principal, &id, update, images)
        .await?;
    Ok(response::ok(row))
}

async fn delete_solution(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    solutions(&state).delete(&principal, &id).await?;
    Ok(response::message("Solution deleted"))
}

// ---- skill mapping ----

async fn list_skill_mappings(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, FolioError> {
    let page = SkillMappingService::new(&state.db)
        .list(&principal, &query)
        .await?;
    response::page(page, &query)
}

async fn read_skill_mapping(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    let row = SkillMappingService::new(&state.db)
        .get(&principal, &id)
        .await?;
    Ok(response::ok(row))
}

async fn create_skill_mapping(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(input): Json<CreateSkillMapping>,
) -> Result<Response, FolioError> {
    let row = SkillMappingService::new(&state.db)
        .create(&principal, input)
        .await?;
    Ok(response::created(row))
}

async fn update_skill_mapping(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(update): Json<SkillMappingUpdate>,
) -> Result<Response, FolioError> {
    let row = SkillMappingService::new(&state.db)
        .update(&principal, &id, update)
        .await?;
    Ok(response::ok(row))
}

async fn delete_skill_mapping(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, FolioError> {
    SkillMappingService::new(&state.db)
        .delete(&principal, &id)
        .await?;
    Ok(response::message("Skill mapping deleted"))
}
