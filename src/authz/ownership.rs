use sea_orm::{ConnectionTrait, EntityTrait, QuerySelect};

use crate::authz::types::Feature;
use crate::entities::{education, experience, project, skill_mapping, solution};
use crate::errors::FolioError;

/// Resource families whose rows carry an owning `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedFamily {
    Education,
    Experience,
    Project,
    Solution,
    SkillMapping,
}

impl OwnedFamily {
    pub fn feature(&self) -> Feature {
        match self {
            OwnedFamily::Education => Feature::Education,
            OwnedFamily::Experience => Feature::Experience,
            OwnedFamily::Project => Feature::Project,
            OwnedFamily::Solution => Feature::Solution,
            OwnedFamily::SkillMapping => Feature::SkillMapping,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OwnedFamily::Education => "Education",
            OwnedFamily::Experience => "Experience",
            OwnedFamily::Project => "Project",
            OwnedFamily::Solution => "Solution",
            OwnedFamily::SkillMapping => "Skill mapping",
        }
    }
}

/// Owner of a directly-owned row, `None` when the row does not exist.
///
/// Reads the `user_id` column only.
pub async fn owner_of<C: ConnectionTrait>(
    db: &C,
    family: OwnedFamily,
    id: &str,
) -> Result<Option<String>, FolioError> {
    let id = id.to_string();
    let owner = match family {
        OwnedFamily::Education => {
            education::Entity::find_by_id(id)
                .select_only()
                .column(education::Column::UserId)
                .into_tuple::<String>()
                .one(db)
                .await?
        }
        OwnedFamily::Experience => {
            experience::Entity::find_by_id(id)
                .select_only()
                .column(experience::Column::UserId)
                .into_tuple::<String>()
                .one(db)
                .await?
        }
        OwnedFamily::Project => {
            project::Entity::find_by_id(id)
                .select_only()
                .column(project::Column::UserId)
                .into_tuple::<String>()
                .one(db)
                .await?
        }
        OwnedFamily::Solution => {
            solution::Entity::find_by_id(id)
                .select_only()
                .column(solution::Column::UserId)
                .into_tuple::<String>()
                .one(db)
                .await?
        }
        OwnedFamily::SkillMapping => {
            skill_mapping::Entity::find_by_id(id)
                .select_only()
                .column(skill_mapping::Column::UserId)
                .into_tuple::<String>()
                .one(db)
                .await?
        }
    };
    Ok(owner)
}

/// Owner of a child row (translation, attachment, project skill) through its parent.
///
/// The child exists, so a missing parent is corrupt data rather than a 404.
pub async fn parent_owner<C: ConnectionTrait>(
    db: &C,
    family: OwnedFamily,
    parent_id: &str,
) -> Result<String, FolioError> {
    owner_of(db, family, parent_id).await?.ok_or_else(|| {
        tracing::error!(
            family = family.label(),
            parent_id,
            "Child row references a missing parent"
        );
        FolioError::DataIntegrity(format!(
            "{} `{parent_id}` referenced by a child record does not exist",
            family.label()
        ))
    })
}
