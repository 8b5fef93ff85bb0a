//! Owned profile families. Every operation asks the engine for a permit
//! first, then loads the row, then checks its owner, then validates
//! foreign keys, then mutates.

use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::authz::{self, Action, Feature, Permit, Principal};
use crate::entities::{
    education, experience, project, project_attachment, project_skill, skill, skill_mapping,
    solution,
};
use crate::errors::FolioError;
use crate::files::{FileStore, Upload};
use crate::services::{missing_reference, with_image, with_images, Images};
use crate::storage::catalog::{self, CatalogKind};
use crate::storage::profile::{
    self as store, AttachmentUpdate, EducationUpdate, ExperienceUpdate, NewAttachment,
    NewEducation, NewExperience, NewProject, NewSkillMapping, NewSolution, ProjectUpdate,
    SkillMappingUpdate, SolutionUpdate,
};
use crate::storage::{users, ListQuery, Page};

/// Owner of a new row: the caller unless another user is named, which needs
/// the `_other` grant.
async fn resolve_owner(
    db: &DatabaseConnection,
    permit: &Permit,
    principal: &Principal,
    requested: Option<&str>,
) -> Result<String, FolioError> {
    match requested {
        Some(user_id) if user_id != principal.id => {
            permit.check_owner(user_id)?;
            if users::get_user(db, user_id).await?.is_none() {
                return Err(missing_reference("User"));
            }
            Ok(user_id.to_string())
        }
        _ => Ok(principal.id.clone()),
    }
}

async fn ensure_catalog(
    db: &DatabaseConnection,
    kind: CatalogKind,
    id: &str,
) -> Result<(), FolioError> {
    if catalog::exists(db, kind, id).await? {
        Ok(())
    } else {
        Err(missing_reference(kind.label()))
    }
}

fn not_found(label: &str) -> FolioError {
    FolioError::NotFound(format!("{label} not found"))
}

async fn permit_for(
    db: &DatabaseConnection,
    principal: &Principal,
    feature: Feature,
    action: Action,
) -> Result<Permit, FolioError> {
    authz::engine(db).permit(principal, feature, action).await
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEducation {
    /// Defaults to the caller
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub education: NewEducation,
}

pub struct EducationService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EducationService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, id: &str) -> Result<education::Model, FolioError> {
        store::get_education(self.db, id)
            .await?
            .ok_or_else(|| not_found("Education"))
    }

    pub async fn list(
        &self,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Page<education::Model>, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Education, Action::View).await?;
        store::list_educations(self.db, permit.owner_filter(), query).await
    }

    pub async fn get(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<education::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Education, Action::View).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        Ok(row)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateEducation,
    ) -> Result<education::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Education, Action::Create).await?;
        let owner = resolve_owner(self.db, &permit, principal, input.user_id.as_deref()).await?;
        ensure_catalog(self.db, CatalogKind::School, &input.education.school_id).await?;
        store::create_education(self.db, &owner, input.education).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: EducationUpdate,
    ) -> Result<education::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Education, Action::Edit).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        if let Some(school_id) = update.school_id.as_deref() {
            ensure_catalog(self.db, CatalogKind::School, school_id).await?;
        }
        store::update_education(self.db, row, update).await
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), FolioError> {
        let permit = permit_for(self.db, principal, Feature::Education, Action::Delete).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        store::delete_education(self.db, id).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExperience {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub experience: NewExperience,
}

pub struct ExperienceService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ExperienceService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, id: &str) -> Result<experience::Model, FolioError> {
        store::get_experience(self.db, id)
            .await?
            .ok_or_else(|| not_found("Experience"))
    }

    pub async fn list(
        &self,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Page<experience::Model>, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Experience, Action::View).await?;
        store::list_experiences(self.db, permit.owner_filter(), query).await
    }

    pub async fn get(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<experience::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Experience, Action::View).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        Ok(row)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateExperience,
    ) -> Result<experience::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Experience, Action::Create).await?;
        let owner = resolve_owner(self.db, &permit, principal, input.user_id.as_deref()).await?;
        ensure_catalog(self.db, CatalogKind::Company, &input.experience.company_id).await?;
        store::create_experience(self.db, &owner, input.experience).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: ExperienceUpdate,
    ) -> Result<experience::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Experience, Action::Edit).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        if let Some(company_id) = update.company_id.as_deref() {
            ensure_catalog(self.db, CatalogKind::Company, company_id).await?;
        }
        store::update_experience(self.db, row, update).await
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), FolioError> {
        let permit = permit_for(self.db, principal, Feature::Experience, Action::Delete).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        store::delete_experience(self.db, id).await?;
        Ok(())
    }
}

const PROJECT_FOLDER: &str = "project";
const ATTACHMENT_FOLDER: &str = "project-attachment";
const SOLUTION_FOLDER: &str = "solution";

/// Projects plus their skills and attachments, which inherit the project's owner.
pub struct ProjectService<'a> {
    db: &'a DatabaseConnection,
    files: &'a FileStore,
}

impl<'a> ProjectService<'a> {
    pub fn new(db: &'a DatabaseConnection, files: &'a FileStore) -> Self {
        Self { db, files }
    }

    async fn load(&self, id: &str) -> Result<project::Model, FolioError> {
        store::get_project(self.db, id)
            .await?
            .ok_or_else(|| not_found("Project"))
    }

    /// Permit, load and ownership check in one go.
    async fn owned_project(
        &self,
        principal: &Principal,
        id: &str,
        action: Action,
    ) -> Result<project::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Project, action).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        Ok(row)
    }

    pub async fn list(
        &self,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Page<project::Model>, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Project, Action::View).await?;
        store::list_projects(self.db, permit.owner_filter(), query).await
    }

    pub async fn get(&self, principal: &Principal, id: &str) -> Result<project::Model, FolioError> {
        self.owned_project(principal, id, Action::View).await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        user_id: Option<&str>,
        input: NewProject,
        images: Images,
    ) -> Result<project::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Project, Action::Create).await?;
        let owner = resolve_owner(self.db, &permit, principal, user_id).await?;

        let db = self.db;
        let mut input = input;
        let slots = images.slots(None, None);
        with_images(self.files, PROJECT_FOLDER, slots, |[image, logo]| async move {
            input.image_url = image;
            input.logo_url = logo;
            store::create_project(db, &owner, input).await
        })
        .await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: ProjectUpdate,
        images: Images,
    ) -> Result<project::Model, FolioError> {
        let row = self.owned_project(principal, id, Action::Edit).await?;

        let db = self.db;
        let mut update = update;
        let slots = images.slots(row.image_url.clone(), row.logo_url.clone());
        with_images(self.files, PROJECT_FOLDER, slots, |[image, logo]| async move {
            update.image_url = image;
            update.logo_url = logo;
            store::update_project(db, row, update).await
        })
        .await
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), FolioError> {
        let row = self.owned_project(principal, id, Action::Delete).await?;
        let attachments = store::list_attachments(self.db, id, &ListQuery::default()).await?;
        store::delete_project(self.db, id).await?;
        let urls = attachments
            .items
            .into_iter()
            .filter_map(|a| a.image_url)
            .chain(row.image_url)
            .chain(row.logo_url);
        for url in urls {
            self.files.remove(&url).await;
        }
        Ok(())
    }

    pub async fn skills(
        &self,
        principal: &Principal,
        project_id: &str,
    ) -> Result<Vec<skill::Model>, FolioError> {
        self.owned_project(principal, project_id, Action::View)
            .await?;
        store::list_project_skills(self.db, project_id).await
    }

    pub async fn add_skill(
        &self,
        principal: &Principal,
        project_id: &str,
        skill_id: &str,
    ) -> Result<project_skill::Model, FolioError> {
        self.owned_project(principal, project_id, Action::Edit)
            .await?;
        ensure_catalog(self.db, CatalogKind::Skill, skill_id).await?;
        store::add_project_skill(self.db, project_id, skill_id).await
    }

    pub async fn remove_skill(
        &self,
        principal: &Principal,
        project_id: &str,
        skill_id: &str,
    ) -> Result<(), FolioError> {
        self.owned_project(principal, project_id, Action::Edit)
            .await?;
        if !store::remove_project_skill(self.db, project_id, skill_id).await? {
            return Err(not_found("Project skill"));
        }
        Ok(())
    }

    pub async fn attachments(
        &self,
        principal: &Principal,
        project_id: &str,
        query: &ListQuery,
    ) -> Result<Page<project_attachment::Model>, FolioError> {
        self.owned_project(principal, project_id, Action::View)
            .await?;
        store::list_attachments(self.db, project_id, query).await
    }

    /// Load an attachment and check the caller may act on its project.
    async fn owned_attachment(
        &self,
        principal: &Principal,
        id: &str,
        action: Action,
    ) -> Result<project_attachment::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Project, action).await?;
        let row = store::get_attachment(self.db, id)
            .await?
            .ok_or_else(|| not_found("Project attachment"))?;
        let owner =
            authz::ownership::parent_owner(self.db, authz::OwnedFamily::Project, &row.project_id)
                .await?;
        permit.check_owner(&owner)?;
        Ok(row)
    }

    pub async fn attachment(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<project_attachment::Model, FolioError> {
        self.owned_attachment(principal, id, Action::View).await
    }

    pub async fn create_attachment(
        &self,
        principal: &Principal,
        input: NewAttachment,
        image: Option<&Upload>,
    ) -> Result<project_attachment::Model, FolioError> {
        self.owned_project(principal, &input.project_id, Action::Create)
            .await?;

        let db = self.db;
        let mut input = input;
        with_image(self.files, ATTACHMENT_FOLDER, image, None, |url| async move {
            input.image_url = url;
            store::create_attachment(db, input).await
        })
        .await
    }

    pub async fn update_attachment(
        &self,
        principal: &Principal,
        id: &str,
        update: AttachmentUpdate,
        image: Option<&Upload>,
    ) -> Result<project_attachment::Model, FolioError> {
        let row = self.owned_attachment(principal, id, Action::Edit).await?;

        let db = self.db;
        let previous = row.image_url.clone();
        let mut update = update;
        with_image(self.files, ATTACHMENT_FOLDER, image, previous, |url| async move {
            update.image_url = url;
            store::update_attachment(db, row, update).await
        })
        .await
    }

    pub async fn delete_attachment(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<(), FolioError> {
        let row = self.owned_attachment(principal, id, Action::Delete).await?;
        store::delete_attachment(self.db, id).await?;
        if let Some(url) = row.image_url {
            self.files.remove(&url).await;
        }
        Ok(())
    }
}

pub struct SolutionService<'a> {
    db: &'a DatabaseConnection,
    files: &'a FileStore,
}

impl<'a> SolutionService<'a> {
    pub fn new(db: &'a DatabaseConnection, files: &'a FileStore) -> Self {
        Self { db, files }
    }

    async fn load(&self, id: &str) -> Result<solution::Model, FolioError> {
        store::get_solution(self.db, id)
            .await?
            .ok_or_else(|| not_found("Solution"))
    }

    pub async fn list(
        &self,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Page<solution::Model>, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Solution, Action::View).await?;
        store::list_solutions(self.db, permit.owner_filter(), query).await
    }

    pub async fn get(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<solution::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Solution, Action::View).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        Ok(row)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        user_id: Option<&str>,
        input: NewSolution,
        images: Images,
    ) -> Result<solution::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Solution, Action::Create).await?;
        let owner = resolve_owner(self.db, &permit, principal, user_id).await?;

        let db = self.db;
        let mut input = input;
        let slots = images.slots(None, None);
        with_images(self.files, SOLUTION_FOLDER, slots, |[image, logo]| async move {
            input.image_url = image;
            input.logo_url = logo;
            store::create_solution(db, &owner, input).await
        })
        .await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: SolutionUpdate,
        images: Images,
    ) -> Result<solution::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::Solution, Action::Edit).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;

        let db = self.db;
        let mut update = update;
        let slots = images.slots(row.image_url.clone(), row.logo_url.clone());
        with_images(self.files, SOLUTION_FOLDER, slots, |[image, logo]| async move {
            update.image_url = image;
            update.logo_url = logo;
            store::update_solution(db, row, update).await
        })
        .await
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), FolioError> {
        let permit = permit_for(self.db, principal, Feature::Solution, Action::Delete).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        store::delete_solution(self.db, id).await?;
        for url in [row.image_url, row.logo_url].into_iter().flatten() {
            self.files.remove(&url).await;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSkillMapping {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub mapping: NewSkillMapping,
}

pub struct SkillMappingService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SkillMappingService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, id: &str) -> Result<skill_mapping::Model, FolioError> {
        store::get_skill_mapping(self.db, id)
            .await?
            .ok_or_else(|| not_found("Skill mapping"))
    }

    pub async fn list(
        &self,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Page<skill_mapping::Model>, FolioError> {
        let permit = permit_for(self.db, principal, Feature::SkillMapping, Action::View).await?;
        store::list_skill_mappings(self.db, permit.owner_filter(), query).await
    }

    pub async fn get(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<skill_mapping::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::SkillMapping, Action::View).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        Ok(row)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateSkillMapping,
    ) -> Result<skill_mapping::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::SkillMapping, Action::Create).await?;
        let owner = resolve_owner(self.db, &permit, principal, input.user_id.as_deref()).await?;
        ensure_catalog(self.db, CatalogKind::Skill, &input.mapping.skill_id).await?;
        store::create_skill_mapping(self.db, &owner, input.mapping).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: SkillMappingUpdate,
    ) -> Result<skill_mapping::Model, FolioError> {
        let permit = permit_for(self.db, principal, Feature::SkillMapping, Action::Edit).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        if let Some(skill_id) = update.skill_id.as_deref() {
            ensure_catalog(self.db, CatalogKind::Skill, skill_id).await?;
        }
        store::update_skill_mapping(self.db, row, update).await
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), FolioError> {
        let permit = permit_for(self.db, principal, Feature::SkillMapping, Action::Delete).await?;
        let row = self.load(id).await?;
        permit.check_owner(&row.user_id)?;
        store::delete_skill_mapping(self.db, id).await?;
        Ok(())
    }
}
