//! Owned profile rows: education, experience, project, solution, skill mapping.
//!
//! List functions take an optional owner; `None` lists everyone's rows.

use sea_orm::prelude::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use serde::Deserialize;

use crate::entities::{
    education, experience, project, project_attachment, project_skill, skill, skill_mapping,
    solution,
};
use crate::errors::FolioError;
use crate::storage::{self, ListQuery, Page};

fn owned<E: EntityTrait>(select: Select<E>, column: E::Column, owner: Option<&str>) -> Select<E> {
    match owner {
        Some(owner) => select.filter(column.eq(owner)),
        None => select,
    }
}

/// Lowercase, ascii alphanumerics joined by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// ---- education ----

#[derive(Debug, Clone, Deserialize)]
pub struct NewEducation {
    pub school_id: String,
    pub title: String,
    pub started_at: Option<Date>,
    pub finished_at: Option<Date>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EducationUpdate {
    pub school_id: Option<String>,
    pub title: Option<String>,
    pub started_at: Option<Date>,
    pub finished_at: Option<Date>,
    pub is_active: Option<bool>,
}

pub async fn create_education<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    input: NewEducation,
) -> Result<education::Model, FolioError> {
    let now = storage::now();
    let row = education::ActiveModel {
        id: Set(storage::new_id()),
        school_id: Set(input.school_id),
        user_id: Set(user_id.to_string()),
        title: Set(input.title),
        started_at: Set(input.started_at),
        finished_at: Set(input.finished_at),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(row)
}

pub async fn get_education<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<education::Model>, FolioError> {
    storage::find_one::<education::Entity, _>(db, id).await
}

pub async fn list_educations<C: ConnectionTrait>(
    db: &C,
    owner: Option<&str>,
    query: &ListQuery,
) -> Result<Page<education::Model>, FolioError> {
    let select = owned(education::Entity::find(), education::Column::UserId, owner);
    storage::list(db, select, query).await
}

pub async fn update_education<C: ConnectionTrait>(
    db: &C,
    existing: education::Model,
    update: EducationUpdate,
) -> Result<education::Model, FolioError> {
    let mut active: education::ActiveModel = existing.into();
    if let Some(school_id) = update.school_id {
        active.school_id = Set(school_id);
    }
    if let Some(title) = update.title {
        active.title = Set(title);
    }
    if let Some(started_at) = update.started_at {
        active.started_at = Set(Some(started_at));
    }
    if let Some(finished_at) = update.finished_at {
        active.finished_at = Set(Some(finished_at));
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn delete_education<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, FolioError> {
    storage::delete_one::<education::Entity, _>(db, id).await
}

// ---- experience ----

#[derive(Debug, Clone, Deserialize)]
pub struct NewExperience {
    pub company_id: String,
    pub title: String,
    pub started_at: Option<Date>,
    pub finished_at: Option<Date>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceUpdate {
    pub company_id: Option<String>,
    pub title: Option<String>,
    pub started_at: Option<Date>,
    pub finished_at: Option<Date>,
    pub is_active: Option<bool>,
}

pub async fn create_experience<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    input: NewExperience,
) -> Result<experience::Model, FolioError> {
    let now = storage::now();
    let row = experience::ActiveModel {
        id: Set(storage::new_id()),
        company_id: Set(input.company_id),
        user_id: Set(user_id.to_string()),
        title: Set(input.title),
        started_at: Set(input.started_at),
        finished_at: Set(input.finished_at),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(row)
}

pub async fn get_experience<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<experience::Model>, FolioError> {
    storage::find_one::<experience::Entity, _>(db, id).await
}

pub async fn list_experiences<C: ConnectionTrait>(
    db: &C,
    owner: Option<&str>,
    query: &ListQuery,
) -> Result<Page<experience::Model>, FolioError> {
    let select = owned(experience::Entity::find(), experience::Column::UserId, owner);
    storage::list(db, select, query).await
}

pub async fn update_experience<C: ConnectionTrait>(
    db: &C,
    existing: experience::Model,
    update: ExperienceUpdate,
) -> Result<experience::Model, FolioError> {
    let mut active: experience::ActiveModel = existing.into();
    if let Some(company_id) = update.company_id {
        active.company_id = Set(company_id);
    }
    if let Some(title) = update.title {
        active.title = Set(title);
    }
    if let Some(started_at) = update.started_at {
        active.started_at = Set(Some(started_at));
    }
    if let Some(finished_at) = update.finished_at {
        active.finished_at = Set(Some(finished_at));
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn delete_experience<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, FolioError> {
    storage::delete_one::<experience::Entity, _>(db, id).await
}

// ---- project ----

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    slug: &str,
    exclude_id: Option<&str>,
) -> Result<(), FolioError> {
    let mut select = project::Entity::find()
        .filter(project::Column::UserId.eq(user_id))
        .filter(project::Column::Slug.eq(slug));
    if let Some(id) = exclude_id {
        select = select.filter(project::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(FolioError::Validation("Slug already exist".to_string()));
    }
    Ok(())
}

fn checked_slug(raw: &str) -> Result<String, FolioError> {
    let slug = slugify(raw);
    if slug.is_empty() {
        return Err(FolioError::Validation(
            "Slug must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

pub async fn create_project<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    input: NewProject,
) -> Result<project::Model, FolioError> {
    let slug = checked_slug(input.slug.as_deref().unwrap_or(&input.title))?;
    ensure_slug_free(db, user_id, &slug, None).await?;

    let now = storage::now();
    let row = project::ActiveModel {
        id: Set(storage::new_id()),
        user_id: Set(user_id.to_string()),
        title: Set(input.title),
        slug: Set(slug),
        image_url: Set(input.image_url),
        logo_url: Set(input.logo_url),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(row)
}

pub async fn get_project<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<project::Model>, FolioError> {
    storage::find_one::<project::Entity, _>(db, id).await
}

pub async fn get_project_by_slug<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    slug: &str,
) -> Result<Option<project::Model>, FolioError> {
    let row = project::Entity::find()
        .filter(project::Column::UserId.eq(user_id))
        .filter(project::Column::Slug.eq(slug))
        .one(db)
        .await?;
    Ok(row)
}

pub async fn list_projects<C: ConnectionTrait>(
    db: &C,
    owner: Option<&str>,
    query: &ListQuery,
) -> Result<Page<project::Model>, FolioError> {
    let select = owned(project::Entity::find(), project::Column::UserId, owner);
    storage::list(db, select, query).await
}

pub async fn update_project<C: ConnectionTrait>(
    db: &C,
    existing: project::Model,
    update: ProjectUpdate,
) -> Result<project::Model, FolioError> {
    let slug = match update.slug.as_deref() {
        Some(raw) => {
            let slug = checked_slug(raw)?;
            ensure_slug_free(db, &existing.user_id, &slug, Some(&existing.id)).await?;
            Some(slug)
        }
        None => None,
    };

    let mut active: project::ActiveModel = existing.into();
    if let Some(title) = update.title {
        active.title = Set(title);
    }
    if let Some(slug) = slug {
        active.slug = Set(slug);
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(image_url) = update.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(logo_url) = update.logo_url {
        active.logo_url = Set(Some(logo_url));
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn delete_project<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, FolioError> {
    storage::delete_one::<project::Entity, _>(db, id).await
}

// ---- project skills ----

pub async fn add_project_skill<C: ConnectionTrait>(
    db: &C,
    project_id: &str,
    skill_id: &str,
) -> Result<project_skill::Model, FolioError> {
    let taken = project_skill::Entity::find()
        .filter(project_skill::Column::ProjectId.eq(project_id))
        .filter(project_skill::Column::SkillId.eq(skill_id))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(FolioError::Validation(
            "Skill already added to this project".to_string(),
        ));
    }
    let row = project_skill::ActiveModel {
        id: Set(storage::new_id()),
        project_id: Set(project_id.to_string()),
        skill_id: Set(skill_id.to_string()),
        created_at: Set(storage::now()),
    }
    .insert(db)
    .await?;
    Ok(row)
}

pub async fn remove_project_skill<C: ConnectionTrait>(
    db: &C,
    project_id: &str,
    skill_id: &str,
) -> Result<bool, FolioError> {
    let res = project_skill::Entity::delete_many()
        .filter(project_skill::Column::ProjectId.eq(project_id))
        .filter(project_skill::Column::SkillId.eq(skill_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Catalog skills linked to a project, in the order they were added.
pub async fn list_project_skills<C: ConnectionTrait>(
    db: &C,
    project_id: &str,
) -> Result<Vec<skill::Model>, FolioError> {
    let links = project_skill::Entity::find()
        .filter(project_skill::Column::ProjectId.eq(project_id))
        .order_by_asc(project_skill::Column::CreatedAt)
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = links.iter().map(|l| l.skill_id.clone()).collect();
    let mut skills = skill::Entity::find()
        .filter(skill::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?;
    skills.sort_by_key(|s| ids.iter().position(|id| id == &s.id));
    Ok(skills)
}

// ---- project attachments ----

#[derive(Debug, Clone, Default)]
pub struct NewAttachment {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
}

pub async fn create_attachment<C: ConnectionTrait>(
    db: &C,
    input: NewAttachment,
) -> Result<project_attachment::Model, FolioError> {
    let now = storage::now();
    let row = project_attachment::ActiveModel {
        id: Set(storage::new_id()),
        project_id: Set(input.project_id),
        title: Set(input.title),
        image_url: Set(input.image_url),
        description: Set(input.description),
        category: Set(input.category),
        website_url: Set(input.website_url),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(row)
}

pub async fn get_attachment<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<project_attachment::Model>, FolioError> {
    storage::find_one::<project_attachment::Entity, _>(db, id).await
}

pub async fn list_attachments<C: ConnectionTrait>(
    db: &C,
    project_id: &str,
    query: &ListQuery,
) -> Result<Page<project_attachment::Model>, FolioError> {
    let select = project_attachment::Entity::find()
        .filter(project_attachment::Column::ProjectId.eq(project_id));
    storage::list(db, select, query).await
}

pub async fn update_attachment<C: ConnectionTrait>(
    db: &C,
    existing: project_attachment::Model,
    update: AttachmentUpdate,
) -> Result<project_attachment::Model, FolioError> {
    let mut active: project_attachment::ActiveModel = existing.into();
    if let Some(title) = update.title {
        active.title = Set(title);
    }
    if let Some(description) = update.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = update.category {
        active.category = Set(Some(category));
    }
    if let Some(website_url) = update.website_url {
        active.website_url = Set(Some(website_url));
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(image_url) = update.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn delete_attachment<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, FolioError> {
    storage::delete_one::<project_attachment::Entity, _>(db, id).await
}

// ---- solution ----

#[derive(Debug, Clone, Default)]
pub struct NewSolution {
    pub title: String,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SolutionUpdate {
    pub title: Option<String>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
}

pub async fn create_solution<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    input: NewSolution,
) -> Result<solution::Model, FolioError> {
    let now = storage::now();
    let row = solution::ActiveModel {
        id: Set(storage::new_id()),
        user_id: Set(user_id.to_string()),
        title: Set(input.title),
        image_url: Set(input.image_url),
        logo_url: Set(input.logo_url),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(row)
}

pub async fn get_solution<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<solution::Model>, FolioError> {
    storage::find_one::<solution::Entity, _>(db, id).await
}

pub async fn list_solutions<C: ConnectionTrait>(
    db: &C,
    owner: Option<&str>,
    query: &ListQuery,
) -> Result<Page<solution::Model>, FolioError> {
    let select = owned(solution::Entity::find(), solution::Column::UserId, owner);
    storage::list(db, select, query).await
}

pub async fn update_solution<C: ConnectionTrait>(
    db: &C,
    existing: solution::Model,
    update: SolutionUpdate,
) -> Result<solution::Model, FolioError> {
    let mut active: solution::ActiveModel = existing.into();
    if let Some(title) = update.title {
        active.title = Set(title);
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(image_url) = update.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(logo_url) = update.logo_url {
        active.logo_url = Set(Some(logo_url));
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn delete_solution<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, FolioError> {
    storage::delete_one::<solution::Entity, _>(db, id).await
}

// ---- skill mapping ----

#[derive(Debug, Clone, Deserialize)]
pub struct NewSkillMapping {
    pub skill_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillMappingUpdate {
    pub skill_id: Option<String>,
    pub is_active: Option<bool>,
}

async fn ensure_skill_unmapped<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    skill_id: &str,
    exclude_id: Option<&str>,
) -> Result<(), FolioError> {
    let mut select = skill_mapping::Entity::find()
        .filter(skill_mapping::Column::UserId.eq(user_id))
        .filter(skill_mapping::Column::SkillId.eq(skill_id));
    if let Some(id) = exclude_id {
        select = select.filter(skill_mapping::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(FolioError::Validation("Skill already mapped".to_string()));
    }
    Ok(())
}

pub async fn create_skill_mapping<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    input: NewSkillMapping,
) -> Result<skill_mapping::Model, FolioError> {
    ensure_skill_unmapped(db, user_id, &input.skill_id, None).await?;
    let now = storage::now();
    let row = skill_mapping::ActiveModel {
        id: Set(storage::new_id()),
        skill_id: Set(input.skill_id),
        user_id: Set(user_id.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(row)
}

pub async fn get_skill_mapping<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<skill_mapping::Model>, FolioError> {
    storage::find_one::<skill_mapping::Entity, _>(db, id).await
}

pub async fn list_skill_mappings<C: ConnectionTrait>(
    db: &C,
    owner: Option<&str>,
    query: &ListQuery,
) -> Result<Page<skill_mapping::Model>, FolioError> {
    let select = owned(
        skill_mapping::Entity::find(),
        skill_mapping::Column::UserId,
        owner,
    );
    storage::list(db, select, query).await
}

pub async fn update_skill_mapping<C: ConnectionTrait>(
    db: &C,
    existing: skill_mapping::Model,
    update: SkillMappingUpdate,
) -> Result<skill_mapping::Model, FolioError> {
    if let Some(skill_id) = update.skill_id.as_deref() {
        ensure_skill_unmapped(db, &existing.user_id, skill_id, Some(&existing.id)).await?;
    }
    let mut active: skill_mapping::ActiveModel = existing.into();
    if let Some(skill_id) = update.skill_id {
        active.skill_id = Set(skill_id);
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn delete_skill_mapping<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<bool, FolioError> {
    storage::delete_one::<skill_mapping::Entity, _>(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My First Project"), "my-first-project");
        assert_eq!(slugify("  Rust & Axum -- API!  "), "rust-axum-api");
        assert_eq!(slugify("***"), "");
    }
}
