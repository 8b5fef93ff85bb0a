use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::authz::Action;
use crate::entities::{role, role_authority, user};
use crate::errors::FolioError;
use crate::storage::{self, ListQuery, Page};

#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub level: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub level: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn create_role<C: ConnectionTrait>(
    db: &C,
    input: NewRole,
) -> Result<role::Model, FolioError> {
    let code = input.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(FolioError::Validation("Role code is required".to_string()));
    }
    storage::ensure_unique::<role::Entity, _>(
        db,
        role::Column::Code,
        &code,
        None,
        "Code already exist",
    )
    .await?;
    storage::ensure_unique::<role::Entity, _>(
        db,
        role::Column::Name,
        &input.name,
        None,
        "Name already exist",
    )
    .await?;

    let now = storage::now();
    let role = role::ActiveModel {
        code: Set(code),
        level: Set(input.level),
        name: Set(input.name),
        description: Set(input.description),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(role.insert(db).await?)
}

pub async fn get_role<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<role::Model>, FolioError> {
    Ok(role::Entity::find_by_id(id).one(db).await?)
}

pub async fn get_role_by_code<C: ConnectionTrait>(
    db: &C,
    code: &str,
) -> Result<Option<role::Model>, FolioError> {
    Ok(role::Entity::find()
        .filter(role::Column::Code.eq(code.trim().to_uppercase()))
        .one(db)
        .await?)
}

/// Roles at or below the caller's seniority (`level >= min_level`).
pub async fn list_roles<C: ConnectionTrait>(
    db: &C,
    query: &ListQuery,
    min_level: Option<i32>,
) -> Result<Page<role::Model>, FolioError> {
    let mut select = role::Entity::find();
    if let Some(level) = min_level {
        select = select.filter(role::Column::Level.gte(level));
    }
    storage::list(db, select, query).await
}

pub async fn update_role<C: ConnectionTrait>(
    db: &C,
    id: i32,
    update: RoleUpdate,
) -> Result<role::Model, FolioError> {
    let existing = get_role(db, id)
        .await?
        .ok_or_else(|| FolioError::NotFound("Role not found".to_string()))?;

    let mut active: role::ActiveModel = existing.into();
    if let Some(code) = update.code {
        let code = code.trim().to_uppercase();
        storage::ensure_unique::<role::Entity, _>(
            db,
            role::Column::Code,
            &code,
            Some((role::Column::Id, id.into())),
            "Code already exist",
        )
        .await?;
        active.code = Set(code);
    }
    if let Some(name) = update.name {
        storage::ensure_unique::<role::Entity, _>(
            db,
            role::Column::Name,
            &name,
            Some((role::Column::Id, id.into())),
            "Name already exist",
        )
        .await?;
        active.name = Set(name);
    }
    if let Some(level) = update.level {
        active.level = Set(level);
    }
    if let Some(description) = update.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

/// Delete a role unless some user still holds it.
///
/// The reference count and the delete share one transaction, so a user
/// assigned concurrently cannot slip in between them.
pub async fn delete_role(db: &DatabaseConnection, id: i32) -> Result<(), FolioError> {
    let txn = db.begin().await?;

    if get_role(&txn, id).await?.is_none() {
        return Err(FolioError::NotFound("Role not found".to_string()));
    }

    let holders = user::Entity::find()
        .filter(user::Column::RoleId.eq(id))
        .count(&txn)
        .await?;
    if holders > 0 {
        tracing::info!(role_id = id, holders, "Refusing to delete role still in use");
        return Err(FolioError::IntegrityConstraint(
            "Clear user with this role before deleting this role".to_string(),
        ));
    }

    role::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Record a grant. Returns `false` when it was already present.
pub async fn grant<C: ConnectionTrait>(
    db: &C,
    role_id: i32,
    feature: &str,
    action: Action,
    description: Option<String>,
) -> Result<bool, FolioError> {
    let exists = role_authority::Entity::find()
        .filter(role_authority::Column::RoleId.eq(role_id))
        .filter(role_authority::Column::Feature.eq(feature))
        .filter(role_authority::Column::Action.eq(action.as_str()))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(false);
    }

    let row = role_authority::ActiveModel {
        role_id: Set(role_id),
        feature: Set(feature.to_string()),
        action: Set(action.as_str().to_string()),
        description: Set(description),
        created_at: Set(storage::now()),
        ..Default::default()
    };
    row.insert(db).await?;
    Ok(true)
}

/// Remove a grant. Returns `false` when there was nothing to remove.
pub async fn revoke<C: ConnectionTrait>(
    db: &C,
    role_id: i32,
    feature: &str,
    action: Action,
) -> Result<bool, FolioError> {
    let res = role_authority::Entity::delete_many()
        .filter(role_authority::Column::RoleId.eq(role_id))
        .filter(role_authority::Column::Feature.eq(feature))
        .filter(role_authority::Column::Action.eq(action.as_str()))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

pub async fn list_authorities<C: ConnectionTrait>(
    db: &C,
    role_id: i32,
) -> Result<Vec<role_authority::Model>, FolioError> {
    Ok(role_authority::Entity::find()
        .filter(role_authority::Column::RoleId.eq(role_id))
        .order_by_asc(role_authority::Column::Feature)
        .order_by_asc(role_authority::Column::Action)
        .all(db)
        .await?)
}
