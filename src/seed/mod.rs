//! Declarative seeding of roles, their grants and initial users from a KDL file.
//!
//! Syncing is idempotent: roles are matched by code and users by username.
//! A seeded role's grants are replaced by the declared set; an existing
//! user's password is never reset.

pub mod errors;
pub mod parse;

use std::collections::BTreeSet;
use std::path::Path;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use crate::authz::Action;
use crate::errors::FolioError;
use crate::storage::roles::{self, NewRole, RoleUpdate};
use crate::storage::users::{self, NewUser, UserUpdate};

pub use errors::SeedError;
pub use parse::{parse_seed_document, RoleSeed, SeedFile, UserSeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResult {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl SyncCounts {
    fn record(&mut self, result: SyncResult) {
        match result {
            SyncResult::Created => self.created += 1,
            SyncResult::Updated => self.updated += 1,
            SyncResult::Unchanged => self.unchanged += 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: SyncCounts,
    pub users: SyncCounts,
}

/// Read, parse and apply a seed file.
pub async fn seed_from_file(db: &DatabaseConnection, path: &Path) -> Result<SeedReport, SeedError> {
    tracing::info!(path = %path.display(), "Loading seed file");
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let seed = parse_seed_document(&source)?;
    apply(db, &seed).await
}

/// Apply a parsed seed in one transaction.
pub async fn apply(db: &DatabaseConnection, seed: &SeedFile) -> Result<SeedReport, SeedError> {
    let txn = db.begin().await.map_err(FolioError::from)?;
    let mut report = SeedReport::default();

    for role in &seed.roles {
        report.roles.record(sync_role(&txn, role).await?);
    }
    for user in &seed.users {
        report.users.record(sync_user(&txn, user).await?);
    }

    txn.commit().await.map_err(FolioError::from)?;

    tracing::info!(
        "Role sync complete: {} created, {} updated, {} unchanged",
        report.roles.created,
        report.roles.updated,
        report.roles.unchanged
    );
    tracing::info!(
        "User sync complete: {} created, {} updated, {} unchanged",
        report.users.created,
        report.users.updated,
        report.users.unchanged
    );
    Ok(report)
}

async fn sync_role<C: ConnectionTrait>(db: &C, seed: &RoleSeed) -> Result<SyncResult, FolioError> {
    let (role, mut result) = match roles::get_role_by_code(db, &seed.code).await? {
        None => {
            tracing::info!(code = %seed.code, "Creating role");
            let role = roles::create_role(
                db,
                NewRole {
                    code: seed.code.clone(),
                    name: seed.name.clone(),
                    level: seed.level,
                    description: seed.description.clone(),
                },
            )
            .await?;
            (role, SyncResult::Created)
        }
        Some(existing) => {
            let matches = existing.name == seed.name
                && existing.level == seed.level
                && existing.description == seed.description;
            if matches {
                (existing, SyncResult::Unchanged)
            } else {
                tracing::info!(code = %seed.code, "Updating role");
                let update = RoleUpdate {
                    name: Some(seed.name.clone()),
                    level: Some(seed.level),
                    description: seed.description.clone(),
                    ..Default::default()
                };
                (
                    roles::update_role(db, existing.id, update).await?,
                    SyncResult::Updated,
                )
            }
        }
    };

    let current: BTreeSet<(String, Action)> = roles::list_authorities(db, role.id)
        .await?
        .into_iter()
        .filter_map(|a| Some((a.feature, a.action.parse().ok()?)))
        .collect();
    let wanted: BTreeSet<(String, Action)> = seed.grants.iter().cloned().collect();

    let mut changed = false;
    for (feature, action) in wanted.difference(&current) {
        roles::grant(db, role.id, feature, *action, None).await?;
        changed = true;
    }
    for (feature, action) in current.difference(&wanted) {
        roles::revoke(db, role.id, feature, *action).await?;
        changed = true;
    }
    if changed && result == SyncResult::Unchanged {
        tracing::info!(code = %seed.code, "Updating role grants");
        result = SyncResult::Updated;
    }
    Ok(result)
}

async fn sync_user<C: ConnectionTrait>(db: &C, seed: &UserSeed) -> Result<SyncResult, FolioError> {
    let role_id = match &seed.role {
        Some(code) => Some(
            roles::get_role_by_code(db, code)
                .await?
                .ok_or_else(|| FolioError::Validation(format!("Role `{code}` not found")))?
                .id,
        ),
        None => None,
    };

    match users::get_user_by_username(db, &seed.username).await? {
        None => {
            tracing::info!(username = %seed.username, "Creating user");
            users::create_user(
                db,
                NewUser {
                    role_id,
                    username: seed.username.clone(),
                    email: seed.email.clone(),
                    name: seed.name.clone(),
                    password: seed.password.clone(),
                    phone_number: None,
                    gender: None,
                    image_url: None,
                },
            )
            .await?;
            Ok(SyncResult::Created)
        }
        Some(existing) => {
            let email = seed.email.trim().to_lowercase();
            let matches =
                existing.email == email && existing.name == seed.name && existing.role_id == role_id;
            if matches {
                return Ok(SyncResult::Unchanged);
            }
            tracing::info!(username = %seed.username, "Updating user");
            let update = UserUpdate {
                role_id,
                clear_role: role_id.is_none(),
                email: (existing.email != email).then_some(email),
                name: Some(seed.name.clone()),
                ..Default::default()
            };
            users::update_user(db, existing, update).await?;
            Ok(SyncResult::Updated)
        }
    }
}
