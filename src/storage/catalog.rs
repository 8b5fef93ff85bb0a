use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;

use crate::authz::Feature;
use crate::entities::{company, school, skill};
use crate::errors::FolioError;
use crate::storage::{self, ListQuery, Page};

/// Ownerless, globally-unique reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Company,
    School,
    Skill,
}

impl CatalogKind {
    pub fn feature(&self) -> Feature {
        match self {
            CatalogKind::Company => Feature::Company,
            CatalogKind::School => Feature::School,
            CatalogKind::Skill => Feature::Skill,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Company => "Company",
            CatalogKind::School => "School",
            CatalogKind::Skill => "Skill",
        }
    }

    /// Upload folder name under the static root.
    pub fn folder(&self) -> &'static str {
        match self {
            CatalogKind::Company => "company",
            CatalogKind::School => "school",
            CatalogKind::Skill => "skill",
        }
    }
}

/// Common shape of company, school and skill rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<company::Model> for CatalogItem {
    fn from(m: company::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            category: None,
            image_url: m.image_url,
            logo_url: m.logo_url,
            website_url: m.website_url,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<school::Model> for CatalogItem {
    fn from(m: school::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            category: None,
            image_url: m.image_url,
            logo_url: m.logo_url,
            website_url: m.website_url,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<skill::Model> for CatalogItem {
    fn from(m: skill::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            category: m.category,
            image_url: m.image_url,
            logo_url: m.logo_url,
            website_url: m.website_url,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewCatalogItem {
    pub code: String,
    pub name: String,
    /// Skills only
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
}

/// Code and name must both be unique within the kind.
async fn ensure_unique_keys<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    code: Option<&str>,
    name: Option<&str>,
    exclude_id: Option<&str>,
) -> Result<(), FolioError> {
    macro_rules! check {
        ($entity:ident) => {{
            let exclude = exclude_id.map(|id| ($entity::Column::Id, id.into()));
            if let Some(code) = code {
                storage::ensure_unique::<$entity::Entity, _>(
                    db,
                    $entity::Column::Code,
                    code,
                    exclude.clone(),
                    "Code already exist",
                )
                .await?;
            }
            if let Some(name) = name {
                storage::ensure_unique::<$entity::Entity, _>(
                    db,
                    $entity::Column::Name,
                    name,
                    exclude,
                    "Name already exist",
                )
                .await?;
            }
        }};
    }
    match kind {
        CatalogKind::Company => check!(company),
        CatalogKind::School => check!(school),
        CatalogKind::Skill => check!(skill),
    }
    Ok(())
}

pub async fn create_item<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    input: NewCatalogItem,
) -> Result<CatalogItem, FolioError> {
    let code = input.code.trim().to_string();
    let name = input.name.trim().to_string();
    if code.is_empty() || name.is_empty() {
        return Err(FolioError::Validation("Code and name are required".to_string()));
    }
    ensure_unique_keys(db, kind, Some(&code), Some(&name), None).await?;

    let id = storage::new_id();
    let now = storage::now();
    let item = match kind {
        CatalogKind::Company => company::ActiveModel {
            id: Set(id),
            code: Set(code),
            name: Set(name),
            image_url: Set(input.image_url),
            logo_url: Set(input.logo_url),
            website_url: Set(input.website_url),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
        .into(),
        CatalogKind::School => school::ActiveModel {
            id: Set(id),
            code: Set(code),
            name: Set(name),
            image_url: Set(input.image_url),
            logo_url: Set(input.logo_url),
            website_url: Set(input.website_url),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
        .into(),
        CatalogKind::Skill => skill::ActiveModel {
            id: Set(id),
            code: Set(code),
            name: Set(name),
            category: Set(input.category),
            image_url: Set(input.image_url),
            logo_url: Set(input.logo_url),
            website_url: Set(input.website_url),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
        .into(),
    };
    Ok(item)
}

pub async fn get_item<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    id: &str,
) -> Result<Option<CatalogItem>, FolioError> {
    let item = match kind {
        CatalogKind::Company => storage::find_one::<company::Entity, _>(db, id)
            .await?
            .map(Into::into),
        CatalogKind::School => storage::find_one::<school::Entity, _>(db, id)
            .await?
            .map(Into::into),
        CatalogKind::Skill => storage::find_one::<skill::Entity, _>(db, id)
            .await?
            .map(Into::into),
    };
    Ok(item)
}

/// Rows of one kind for a set of ids, in a single query. Unknown ids are skipped.
pub async fn get_items<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    ids: Vec<String>,
) -> Result<Vec<CatalogItem>, FolioError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<CatalogItem> = match kind {
        CatalogKind::Company => company::Entity::find()
            .filter(company::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
        CatalogKind::School => school::Entity::find()
            .filter(school::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
        CatalogKind::Skill => skill::Entity::find()
            .filter(skill::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
    };
    Ok(items)
}

pub async fn exists<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    id: &str,
) -> Result<bool, FolioError> {
    Ok(get_item(db, kind, id).await?.is_some())
}

pub async fn list_items<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    query: &ListQuery,
) -> Result<Page<CatalogItem>, FolioError> {
    let page = match kind {
        CatalogKind::Company => storage::list(db, company::Entity::find(), query)
            .await?
            .map(Into::into),
        CatalogKind::School => storage::list(db, school::Entity::find(), query)
            .await?
            .map(Into::into),
        CatalogKind::Skill => storage::list(db, skill::Entity::find(), query)
            .await?
            .map(Into::into),
    };
    Ok(page)
}

pub async fn update_item<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    id: &str,
    update: CatalogUpdate,
) -> Result<CatalogItem, FolioError> {
    let code = update.code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let name = update.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    ensure_unique_keys(db, kind, code, name, Some(id)).await?;

    let not_found = || FolioError::NotFound(format!("{} not found", kind.label()));
    let now = storage::now();

    macro_rules! apply {
        ($entity:ident, $active:ident) => {{
            if let Some(code) = code {
                $active.code = Set(code.to_string());
            }
            if let Some(name) = name {
                $active.name = Set(name.to_string());
            }
            if let Some(website_url) = update.website_url.clone() {
                $active.website_url = Set(Some(website_url));
            }
            if let Some(is_active) = update.is_active {
                $active.is_active = Set(is_active);
            }
            if let Some(image_url) = update.image_url.clone() {
                $active.image_url = Set(Some(image_url));
            }
            if let Some(logo_url) = update.logo_url.clone() {
                $active.logo_url = Set(Some(logo_url));
            }
            $active.updated_at = Set(now);
        }};
    }

    let item = match kind {
        CatalogKind::Company => {
            let existing = storage::find_one::<company::Entity, _>(db, id)
                .await?
                .ok_or_else(not_found)?;
            let mut active: company::ActiveModel = existing.into();
            apply!(company, active);
            active.update(db).await?.into()
        }
        CatalogKind::School => {
            let existing = storage::find_one::<school::Entity, _>(db, id)
                .await?
                .ok_or_else(not_found)?;
            let mut active: school::ActiveModel = existing.into();
            apply!(school, active);
            active.update(db).await?.into()
        }
        CatalogKind::Skill => {
            let existing = storage::find_one::<skill::Entity, _>(db, id)
                .await?
                .ok_or_else(not_found)?;
            let mut active: skill::ActiveModel = existing.into();
            apply!(skill, active);
            if let Some(category) = update.category.clone() {
                active.category = Set(Some(category));
            }
            active.update(db).await?.into()
        }
    };
    Ok(item)
}

pub async fn delete_item<C: ConnectionTrait>(
    db: &C,
    kind: CatalogKind,
    id: &str,
) -> Result<bool, FolioError> {
    match kind {
        CatalogKind::Company => storage::delete_one::<company::Entity, _>(db, id).await,
        CatalogKind::School => storage::delete_one::<school::Entity, _>(db, id).await,
        CatalogKind::Skill => storage::delete_one::<skill::Entity, _>(db, id).await,
    }
}
