//! Role/authority access control.
//!
//! Grants are an allow-list of `(role, feature, action)` rows. Ownership-sensitive
//! families pair a bare feature (`project`, own records) with an `_other` feature
//! (`project_other`, anyone's records). Every decision is evaluated fresh per
//! request from the database so grant and role changes apply immediately.

pub mod engine;
pub mod ownership;
pub mod store;
pub mod types;
pub mod web;

pub use engine::{evaluate, AccessEngine, Permit};
pub use ownership::OwnedFamily;
pub use store::{AuthorityStore, DbAuthorityStore};
pub use types::{Action, Decision, Feature, Principal, Scope};

use sea_orm::ConnectionTrait;

/// Engine backed by the role_authorities table.
pub fn engine<C: ConnectionTrait>(db: &C) -> AccessEngine<DbAuthorityStore<'_, C>> {
    AccessEngine::new(DbAuthorityStore::new(db))
}
