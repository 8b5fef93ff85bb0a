use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::authz::types::Action;
use crate::entities::{role, role_authority};
use crate::errors::FolioError;

/// Read-only view over recorded grants.
///
/// Unknown roles, deactivated roles and unknown features all answer "not granted";
/// none of them is an error.
#[async_trait]
pub trait AuthorityStore: Send + Sync {
    async fn lookup(
        &self,
        role_id: Option<i32>,
        feature: &str,
        action: Action,
    ) -> Result<bool, FolioError>;

    /// All `(feature, action)` pairs the role holds among `features`.
    async fn list_grants(
        &self,
        role_id: Option<i32>,
        features: &[&str],
    ) -> Result<BTreeSet<(String, Action)>, FolioError>;
}

pub struct DbAuthorityStore<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> DbAuthorityStore<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    async fn active_role(&self, role_id: Option<i32>) -> Result<Option<i32>, FolioError> {
        let Some(role_id) = role_id else {
            return Ok(None);
        };
        match role::Entity::find_by_id(role_id).one(self.db).await? {
            Some(role) if role.is_active => Ok(Some(role.id)),
            Some(_) => {
                tracing::debug!(role_id, "Role is deactivated, denying");
                Ok(None)
            }
            None => {
                tracing::debug!(role_id, "Role does not exist, denying");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<'a, C: ConnectionTrait> AuthorityStore for DbAuthorityStore<'a, C> {
    async fn lookup(
        &self,
        role_id: Option<i32>,
        feature: &str,
        action: Action,
    ) -> Result<bool, FolioError> {
        let Some(role_id) = self.active_role(role_id).await? else {
            return Ok(false);
        };
        let count = role_authority::Entity::find()
            .filter(role_authority::Column::RoleId.eq(role_id))
            .filter(role_authority::Column::Feature.eq(feature))
            .filter(role_authority::Column::Action.eq(action.as_str()))
            .count(self.db)
            .await?;
        Ok(count > 0)
    }

    async fn list_grants(
        &self,
        role_id: Option<i32>,
        features: &[&str],
    ) -> Result<BTreeSet<(String, Action)>, FolioError> {
        let Some(role_id) = self.active_role(role_id).await? else {
            return Ok(BTreeSet::new());
        };
        let rows = role_authority::Entity::find()
            .filter(role_authority::Column::RoleId.eq(role_id))
            .filter(role_authority::Column::Feature.is_in(features.iter().copied()))
            .all(self.db)
            .await?;

        let mut grants = BTreeSet::new();
        for row in rows {
            match row.action.parse::<Action>() {
                Ok(action) => {
                    grants.insert((row.feature, action));
                }
                Err(_) => {
                    tracing::warn!(
                        role_id,
                        feature = %row.feature,
                        action = %row.action,
                        "Ignoring grant with unknown action"
                    );
                }
            }
        }
        Ok(grants)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashSet;

    /// In-memory grant table for engine tests.
    #[derive(Default)]
    pub struct MemoryAuthorityStore {
        grants: HashSet<(i32, String, Action)>,
        inactive_roles: HashSet<i32>,
    }

    impl MemoryAuthorityStore {
        pub fn grant(mut self, role_id: i32, feature: &str, action: Action) -> Self {
            self.grants.insert((role_id, feature.to_string(), action));
            self
        }

        pub fn deactivate(mut self, role_id: i32) -> Self {
            self.inactive_roles.insert(role_id);
            self
        }

        fn is_active(&self, role_id: Option<i32>) -> Option<i32> {
            role_id.filter(|id| !self.inactive_roles.contains(id))
        }
    }

    #[async_trait]
    impl AuthorityStore for MemoryAuthorityStore {
        async fn lookup(
            &self,
            role_id: Option<i32>,
            feature: &str,
            action: Action,
        ) -> Result<bool, FolioError> {
            Ok(self
                .is_active(role_id)
                .map(|id| self.grants.contains(&(id, feature.to_string(), action)))
                .unwrap_or(false))
        }

        async fn list_grants(
            &self,
            role_id: Option<i32>,
            features: &[&str],
        ) -> Result<BTreeSet<(String, Action)>, FolioError> {
            let Some(role_id) = self.is_active(role_id) else {
                return Ok(BTreeSet::new());
            };
            Ok(self
                .grants
                .iter()
                .filter(|(id, feature, _)| *id == role_id && features.contains(&feature.as_str()))
                .map(|(_, feature, action)| (feature.clone(), *action))
                .collect())
        }
    }
}
