//! Read-only public profile pages. No login; only active rows of active users.

use std::collections::HashMap;

use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::entities::{
    education, education_translation, experience, experience_translation, project,
    project_attachment, project_translation, skill, skill_translation, solution,
    solution_translation, user,
};
use crate::errors::FolioError;
use crate::storage::catalog::{self, CatalogItem, CatalogKind};
use crate::storage::translations::{self, Language, TranslationRecord};
use crate::storage::{profile, users, ListQuery};

#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image_url: Option<String>,
    pub gender: Option<String>,
}

impl From<user::Model> for PublicUser {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            image_url: u.image_url,
            gender: u.gender,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicEducation {
    #[serde(flatten)]
    pub education: education::Model,
    pub school: Option<CatalogItem>,
    pub translation: Option<education_translation::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicExperience {
    #[serde(flatten)]
    pub experience: experience::Model,
    pub company: Option<CatalogItem>,
    pub translation: Option<experience_translation::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicProject {
    #[serde(flatten)]
    pub project: project::Model,
    pub translation: Option<project_translation::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: project::Model,
    pub translation: Option<project_translation::Model>,
    pub skills: Vec<skill::Model>,
    pub attachments: Vec<project_attachment::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicSolution {
    #[serde(flatten)]
    pub solution: solution::Model,
    pub translation: Option<solution_translation::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicSkill {
    #[serde(flatten)]
    pub skill: CatalogItem,
    pub translation: Option<skill_translation::Model>,
}

fn active_only() -> ListQuery {
    ListQuery {
        is_active: Some(true),
        ..Default::default()
    }
}

/// Translations in `language` keyed by parent id.
async fn translations_by_parent<T: TranslationRecord>(
    db: &DatabaseConnection,
    parent_ids: Vec<String>,
    language: Language,
) -> Result<HashMap<String, T>, FolioError> {
    let rows = translations::find_many::<T, _>(db, parent_ids, language).await?;
    Ok(rows
        .into_iter()
        .map(|t| (t.parent_id().to_string(), t))
        .collect())
}

/// Catalog rows keyed by id, fetched in one query.
async fn catalog_items(
    db: &DatabaseConnection,
    kind: CatalogKind,
    mut ids: Vec<String>,
) -> Result<HashMap<String, CatalogItem>, FolioError> {
    ids.sort();
    ids.dedup();
    let items = catalog::get_items(db, kind, ids).await?;
    Ok(items.into_iter().map(|i| (i.id.clone(), i)).collect())
}

pub struct PublicProfileService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PublicProfileService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    async fn active_user(&self, username: &str) -> Result<user::Model, FolioError> {
        let user = users::get_user_by_username(self.db, username)
            .await?
            .ok_or_else(|| FolioError::NotFound("User not found".to_string()))?;
        if !user.is_active {
            return Err(FolioError::Forbidden("this user is not active".to_string()));
        }
        Ok(user)
    }

    pub async fn profile(&self, username: &str) -> Result<PublicUser, FolioError> {
        Ok(self.active_user(username).await?.into())
    }

    pub async fn educations(
        &self,
        username: &str,
        language: Language,
    ) -> Result<Vec<PublicEducation>, FolioError> {
        let user = self.active_user(username).await?;
        let rows = profile::list_educations(self.db, Some(&user.id), &active_only())
            .await?
            .items;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut texts =
            translations_by_parent::<education_translation::Model>(self.db, ids, language).await?;
        let school_ids: Vec<String> = rows.iter().map(|r| r.school_id.clone()).collect();
        let schools = catalog_items(self.db, CatalogKind::School, school_ids).await?;
        Ok(rows
            .into_iter()
            .map(|education| PublicEducation {
                school: schools.get(&education.school_id).cloned(),
                translation: texts.remove(&education.id),
                education,
            })
            .collect())
    }

    pub async fn experiences(
        &self,
        username: &str,
        language: Language,
    ) -> Result<Vec<PublicExperience>, FolioError> {
        let user = self.active_user(username).await?;
        let rows = profile::list_experiences(self.db, Some(&user.id), &active_only())
            .await?
            .items;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut texts =
            translations_by_parent::<experience_translation::Model>(self.db, ids, language)
                .await?;
        let company_ids: Vec<String> = rows.iter().map(|r| r.company_id.clone()).collect();
        let companies = catalog_items(self.db, CatalogKind::Company, company_ids).await?;
        Ok(rows
            .into_iter()
            .map(|experience| PublicExperience {
                company: companies.get(&experience.company_id).cloned(),
                translation: texts.remove(&experience.id),
                experience,
            })
            .collect())
    }

    pub async fn projects(
        &self,
        username: &str,
        language: Language,
    ) -> Result<Vec<PublicProject>, FolioError> {
        let user = self.active_user(username).await?;
        let rows = profile::list_projects(self.db, Some(&user.id), &active_only())
            .await?
            .items;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut texts =
            translations_by_parent::<project_translation::Model>(self.db, ids, language).await?;
        Ok(rows
            .into_iter()
            .map(|project| PublicProject {
                translation: texts.remove(&project.id),
                project,
            })
            .collect())
    }

    pub async fn project(
        &self,
        username: &str,
        language: Language,
        slug: &str,
    ) -> Result<ProjectDetail, FolioError> {
        let user = self.active_user(username).await?;
        let project = profile::get_project_by_slug(self.db, &user.id, slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| FolioError::NotFound("Project not found".to_string()))?;
        let translation =
            translations::find::<project_translation::Model, _>(self.db, &project.id, language)
                .await?;
        let skills = profile::list_project_skills(self.db, &project.id).await?;
        let attachments = profile::list_attachments(self.db, &project.id, &active_only())
            .await?
            .items;
        Ok(ProjectDetail {
            project,
            translation,
            skills,
            attachments,
        })
    }

    pub async fn solutions(
        &self,
        username: &str,
        language: Language,
    ) -> Result<Vec<PublicSolution>, FolioError> {
        let user = self.active_user(username).await?;
        let rows = profile::list_solutions(self.db, Some(&user.id), &active_only())
            .await?
            .items;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut texts =
            translations_by_parent::<solution_translation::Model>(self.db, ids, language).await?;
        Ok(rows
            .into_iter()
            .map(|solution| PublicSolution {
                translation: texts.remove(&solution.id),
                solution,
            })
            .collect())
    }

    pub async fn skills(
        &self,
        username: &str,
        language: Language,
    ) -> Result<Vec<PublicSkill>, FolioError> {
        let user = self.active_user(username).await?;
        let mappings = profile::list_skill_mappings(self.db, Some(&user.id), &active_only())
            .await?
            .items;
        let skill_ids: Vec<String> = mappings.iter().map(|m| m.skill_id.clone()).collect();
        let mut skills = catalog_items(self.db, CatalogKind::Skill, skill_ids.clone()).await?;
        let mut texts =
            translations_by_parent::<skill_translation::Model>(self.db, skill_ids.clone(), language)
                .await?;
        Ok(skill_ids
            .into_iter()
            .filter_map(|id| {
                let skill = skills.remove(&id)?;
                Some(PublicSkill {
                    translation: texts.remove(&id),
                    skill,
                })
            })
            .collect())
    }
}
