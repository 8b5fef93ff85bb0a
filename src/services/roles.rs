use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::authz::{self, Action, Feature, Principal};
use crate::entities::{role, role_authority};
use crate::errors::FolioError;
use crate::storage::roles::{self as store, NewRole, RoleUpdate};
use crate::storage::{ListQuery, Page};

#[derive(Debug, Clone, Deserialize)]
pub struct GrantRequest {
    pub feature: String,
    pub action: Action,
    pub description: Option<String>,
}

pub struct RoleService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RoleService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Roles no more senior than the caller's own.
    pub async fn list(
        &self,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Page<role::Model>, FolioError> {
        let min_level = principal.role_level.unwrap_or(i32::MAX);
        store::list_roles(self.db, query, Some(min_level)).await
    }

    pub async fn get(&self, id: i32) -> Result<role::Model, FolioError> {
        store::get_role(self.db, id)
            .await?
            .ok_or_else(|| FolioError::NotFound("Role not found".to_string()))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: NewRole,
    ) -> Result<role::Model, FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::Role, Action::Create)
            .await?;
        let role = store::create_role(self.db, input).await?;
        tracing::info!(role = %role.code, by = %principal.username, "Created role");
        Ok(role)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: i32,
        update: RoleUpdate,
    ) -> Result<role::Model, FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::Role, Action::Edit)
            .await?;
        store::update_role(self.db, id, update).await
    }

    pub async fn delete(&self, principal: &Principal, id: i32) -> Result<(), FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::Role, Action::Delete)
            .await?;
        store::delete_role(self.db, id).await?;
        tracing::info!(role_id = id, by = %principal.username, "Deleted role");
        Ok(())
    }

    pub async fn authorities(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<Vec<role_authority::Model>, FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::Role, Action::View)
            .await?;
        self.get(id).await?;
        store::list_authorities(self.db, id).await
    }

    /// Returns `false` when the grant already existed.
    pub async fn grant(
        &self,
        principal: &Principal,
        id: i32,
        request: GrantRequest,
    ) -> Result<bool, FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::Role, Action::Edit)
            .await?;
        self.get(id).await?;
        ensure_grantable(&request.feature)?;
        let created = store::grant(
            self.db,
            id,
            &request.feature,
            request.action,
            request.description,
        )
        .await?;
        if created {
            tracing::info!(
                role_id = id,
                feature = %request.feature,
                action = %request.action,
                by = %principal.username,
                "Granted authority"
            );
        }
        Ok(created)
    }

    pub async fn revoke(
        &self,
        principal: &Principal,
        id: i32,
        feature: &str,
        action: Action,
    ) -> Result<(), FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::Role, Action::Edit)
            .await?;
        self.get(id).await?;
        if !store::revoke(self.db, id, feature, action).await? {
            return Err(FolioError::NotFound("Authority not found".to_string()));
        }
        tracing::info!(role_id = id, feature, action = %action, "Revoked authority");
        Ok(())
    }
}

fn ensure_grantable(feature: &str) -> Result<(), FolioError> {
    if Feature::is_grantable(feature) {
        Ok(())
    } else {
        Err(FolioError::Validation(format!("Unknown feature `{feature}`")))
    }
}
