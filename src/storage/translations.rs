//! Per-language text for every resource family.
//!
//! One row per `(parent, language)`; a second row for the same pair is rejected.

use std::fmt;
use std::str::FromStr;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    Set, SqlErr,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::authz::OwnedFamily;
use crate::entities::{
    company_translation, education_translation, experience_translation, project_translation,
    school_translation, skill_translation, solution_translation,
};
use crate::errors::FolioError;
use crate::storage::catalog::CatalogKind;
use crate::storage::{self};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Id,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Id => "id",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Language::Id),
            "en" => Ok(Language::En),
            _ => Err(FolioError::Validation(format!(
                "Invalid language `{s}`. only allow id, en"
            ))),
        }
    }
}

/// Which family a translation belongs to, and so which authorization path guards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationParent {
    Owned(OwnedFamily),
    Catalog(CatalogKind),
}

pub type ActiveOf<T> = <<T as TranslationRecord>::Entity as EntityTrait>::ActiveModel;
type ColumnOf<T> = <<T as TranslationRecord>::Entity as EntityTrait>::Column;

/// A translation table: its parent link, language column and payload shapes.
pub trait TranslationRecord: Sized + Clone + Send + Sync + Serialize + 'static {
    type Entity: EntityTrait<Model = Self>;
    /// Body accepted on create
    type Input: DeserializeOwned + Send + 'static;
    /// Body accepted on update, every field optional
    type Patch: DeserializeOwned + Send + 'static;

    const PARENT: TranslationParent;
    /// Path segment, e.g. `education-translation`
    const ROUTE: &'static str;

    fn parent_column() -> ColumnOf<Self>;
    fn language_column() -> ColumnOf<Self>;

    fn parent_id(&self) -> &str;

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: Self::Input,
        now: i64,
    ) -> ActiveOf<Self>;

    fn apply(active: &mut ActiveOf<Self>, patch: Self::Patch, now: i64);
}

pub async fn find<T, C>(
    db: &C,
    parent_id: &str,
    language: Language,
) -> Result<Option<T>, FolioError>
where
    T: TranslationRecord,
    C: ConnectionTrait,
{
    let row = T::Entity::find()
        .filter(T::parent_column().eq(parent_id))
        .filter(T::language_column().eq(language.as_str()))
        .one(db)
        .await?;
    Ok(row)
}

/// Translations in `language` for a set of parents.
pub async fn find_many<T, C>(
    db: &C,
    parent_ids: Vec<String>,
    language: Language,
) -> Result<Vec<T>, FolioError>
where
    T: TranslationRecord,
    C: ConnectionTrait,
{
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = T::Entity::find()
        .filter(T::parent_column().is_in(parent_ids))
        .filter(T::language_column().eq(language.as_str()))
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn create<T, C>(
    db: &C,
    parent_id: &str,
    language: Language,
    input: T::Input,
) -> Result<T, FolioError>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
    C: ConnectionTrait,
{
    if find::<T, _>(db, parent_id, language).await?.is_some() {
        return Err(duplicate(language));
    }
    insert::<T, _>(db, parent_id, language, input).await
}

/// Insert without the existence check.
///
/// A concurrent create that loses the race on the `(parent, language)` index
/// gets the same validation error as the checked path.
pub async fn insert<T, C>(
    db: &C,
    parent_id: &str,
    language: Language,
    input: T::Input,
) -> Result<T, FolioError>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
    C: ConnectionTrait,
{
    let active = T::new_active(
        storage::new_id(),
        parent_id.to_string(),
        language,
        input,
        storage::now(),
    );
    active.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate(language),
        _ => e.into(),
    })
}

fn duplicate(language: Language) -> FolioError {
    FolioError::Validation(format!(
        "Translation for language `{language}` already exist"
    ))
}

pub async fn update<T, C>(db: &C, existing: T, patch: T::Patch) -> Result<T, FolioError>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
    C: ConnectionTrait,
{
    let mut active = existing.into_active_model();
    T::apply(&mut active, patch, storage::now());
    Ok(active.update(db).await?)
}

pub async fn delete<T, C>(db: &C, parent_id: &str, language: Language) -> Result<bool, FolioError>
where
    T: TranslationRecord,
    C: ConnectionTrait,
{
    let res = T::Entity::delete_many()
        .filter(T::parent_column().eq(parent_id))
        .filter(T::language_column().eq(language.as_str()))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedInput {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EducationInput {
    pub title: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EducationPatch {
    pub title: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperienceInput {
    pub title: String,
    pub description: Option<String>,
    pub employee_type: Option<String>,
    pub location: Option<String>,
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperiencePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub employee_type: Option<String>,
    pub location: Option<String>,
    pub location_type: Option<String>,
}

/// Shared by project and solution translations.
#[derive(Debug, Clone, Deserialize)]
pub struct TitledInput {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitledPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

macro_rules! set_some {
    ($active:ident, $patch:ident, $($field:ident),+) => {
        $(
            if let Some(v) = $patch.$field {
                $active.$field = Set(Some(v));
            }
        )+
    };
}

macro_rules! columns {
    ($module:ident, $parent:ident) => {
        fn parent_column() -> $module::Column {
            $module::Column::$parent
        }
        fn language_column() -> $module::Column {
            $module::Column::LanguageId
        }
    };
}

impl TranslationRecord for company_translation::Model {
    type Entity = company_translation::Entity;
    type Input = NamedInput;
    type Patch = NamedPatch;
    const PARENT: TranslationParent = TranslationParent::Catalog(CatalogKind::Company);
    const ROUTE: &'static str = "company-translation";

    columns!(company_translation, CompanyId);

    fn parent_id(&self) -> &str {
        &self.company_id
    }

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: NamedInput,
        now: i64,
    ) -> company_translation::ActiveModel {
        company_translation::ActiveModel {
            id: Set(id),
            company_id: Set(parent_id),
            language_id: Set(language.as_str().to_string()),
            name: Set(input.name),
            description: Set(input.description),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn apply(active: &mut company_translation::ActiveModel, patch: NamedPatch, now: i64) {
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        set_some!(active, patch, description, address);
        active.updated_at = Set(now);
    }
}

impl TranslationRecord for school_translation::Model {
    type Entity = school_translation::Entity;
    type Input = NamedInput;
    type Patch = NamedPatch;
    const PARENT: TranslationParent = TranslationParent::Catalog(CatalogKind::School);
    const ROUTE: &'static str = "school-translation";

    columns!(school_translation, SchoolId);

    fn parent_id(&self) -> &str {
        &self.school_id
    }

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: NamedInput,
        now: i64,
    ) -> school_translation::ActiveModel {
        school_translation::ActiveModel {
            id: Set(id),
            school_id: Set(parent_id),
            language_id: Set(language.as_str().to_string()),
            name: Set(input.name),
            description: Set(input.description),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn apply(active: &mut school_translation::ActiveModel, patch: NamedPatch, now: i64) {
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        set_some!(active, patch, description, address);
        active.updated_at = Set(now);
    }
}

impl TranslationRecord for skill_translation::Model {
    type Entity = skill_translation::Entity;
    type Input = SkillInput;
    type Patch = SkillPatch;
    const PARENT: TranslationParent = TranslationParent::Catalog(CatalogKind::Skill);
    const ROUTE: &'static str = "skill-translation";

    columns!(skill_translation, SkillId);

    fn parent_id(&self) -> &str {
        &self.skill_id
    }

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: SkillInput,
        now: i64,
    ) -> skill_translation::ActiveModel {
        skill_translation::ActiveModel {
            id: Set(id),
            skill_id: Set(parent_id),
            language_id: Set(language.as_str().to_string()),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn apply(active: &mut skill_translation::ActiveModel, patch: SkillPatch, now: i64) {
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        set_some!(active, patch, description);
        active.updated_at = Set(now);
    }
}

impl TranslationRecord for education_translation::Model {
    type Entity = education_translation::Entity;
    type Input = EducationInput;
    type Patch = EducationPatch;
    const PARENT: TranslationParent = TranslationParent::Owned(OwnedFamily::Education);
    const ROUTE: &'static str = "education-translation";

    columns!(education_translation, EducationId);

    fn parent_id(&self) -> &str {
        &self.education_id
    }

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: EducationInput,
        now: i64,
    ) -> education_translation::ActiveModel {
        education_translation::ActiveModel {
            id: Set(id),
            education_id: Set(parent_id),
            language_id: Set(language.as_str().to_string()),
            title: Set(input.title),
            degree: Set(input.degree),
            field_of_study: Set(input.field_of_study),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn apply(active: &mut education_translation::ActiveModel, patch: EducationPatch, now: i64) {
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        set_some!(active, patch, degree, field_of_study, description);
        active.updated_at = Set(now);
    }
}

impl TranslationRecord for experience_translation::Model {
    type Entity = experience_translation::Entity;
    type Input = ExperienceInput;
    type Patch = ExperiencePatch;
    const PARENT: TranslationParent = TranslationParent::Owned(OwnedFamily::Experience);
    const ROUTE: &'static str = "experience-translation";

    columns!(experience_translation, ExperienceId);

    fn parent_id(&self) -> &str {
        &self.experience_id
    }

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: ExperienceInput,
        now: i64,
    ) -> experience_translation::ActiveModel {
        experience_translation::ActiveModel {
            id: Set(id),
            experience_id: Set(parent_id),
            language_id: Set(language.as_str().to_string()),
            title: Set(input.title),
            description: Set(input.description),
            employee_type: Set(input.employee_type),
            location: Set(input.location),
            location_type: Set(input.location_type),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn apply(active: &mut experience_translation::ActiveModel, patch: ExperiencePatch, now: i64) {
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        set_some!(
            active,
            patch,
            description,
            employee_type,
            location,
            location_type
        );
        active.updated_at = Set(now);
    }
}

impl TranslationRecord for project_translation::Model {
    type Entity = project_translation::Entity;
    type Input = TitledInput;
    type Patch = TitledPatch;
    const PARENT: TranslationParent = TranslationParent::Owned(OwnedFamily::Project);
    const ROUTE: &'static str = "project-translation";

    columns!(project_translation, ProjectId);

    fn parent_id(&self) -> &str {
        &self.project_id
    }

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: TitledInput,
        now: i64,
    ) -> project_translation::ActiveModel {
        project_translation::ActiveModel {
            id: Set(id),
            project_id: Set(parent_id),
            language_id: Set(language.as_str().to_string()),
            title: Set(input.title),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn apply(active: &mut project_translation::ActiveModel, patch: TitledPatch, now: i64) {
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        set_some!(active, patch, description);
        active.updated_at = Set(now);
    }
}

impl TranslationRecord for solution_translation::Model {
    type Entity = solution_translation::Entity;
    type Input = TitledInput;
    type Patch = TitledPatch;
    const PARENT: TranslationParent = TranslationParent::Owned(OwnedFamily::Solution);
    const ROUTE: &'static str = "solution-translation";

    columns!(solution_translation, SolutionId);

    fn parent_id(&self) -> &str {
        &self.solution_id
    }

    fn new_active(
        id: String,
        parent_id: String,
        language: Language,
        input: TitledInput,
        now: i64,
    ) -> solution_translation::ActiveModel {
        solution_translation::ActiveModel {
            id: Set(id),
            solution_id: Set(parent_id),
            language_id: Set(language.as_str().to_string()),
            title: Set(input.title),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn apply(active: &mut solution_translation::ActiveModel, patch: TitledPatch, now: i64) {
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        set_some!(active, patch, description);
        active.updated_at = Set(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("id".parse::<Language>().unwrap(), Language::Id);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        let err = "fr".parse::<Language>().unwrap_err();
        assert!(matches!(err, FolioError::Validation(_)));
    }

    #[test]
    fn test_routes_follow_parent_family() {
        assert_eq!(
            <project_translation::Model as TranslationRecord>::PARENT,
            TranslationParent::Owned(OwnedFamily::Project)
        );
        assert_eq!(
            <company_translation::Model as TranslationRecord>::ROUTE,
            "company-translation"
        );
    }
}
