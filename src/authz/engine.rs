use std::collections::BTreeMap;

use crate::authz::store::AuthorityStore;
use crate::authz::types::{forbidden, other_feature, Action, Decision, Feature, Principal, Scope};
use crate::errors::FolioError;

/// Combine the two grant probes with the target's owner.
///
/// 1. Without the base grant the answer is Deny, whatever else holds.
/// 2. The `_other` grant widens the scope to All.
/// 3. A single target under SelfOnly scope must be owned by the caller.
/// Collections (`target_owner == None`) are never denied past step 1.
pub fn evaluate(
    principal: &Principal,
    action: Action,
    base_granted: bool,
    other_granted: bool,
    target_owner: Option<&str>,
) -> Decision {
    if !base_granted {
        return Decision::Deny { action };
    }
    let scope = if other_granted {
        Scope::All
    } else {
        Scope::SelfOnly
    };
    match target_owner {
        Some(owner) if !covers(scope, &principal.id, owner) => Decision::Deny { action },
        _ => Decision::Allow(scope),
    }
}

fn covers(scope: Scope, principal_id: &str, owner: &str) -> bool {
    scope == Scope::All || principal_id == owner
}

pub struct AccessEngine<S> {
    store: S,
}

impl<S: AuthorityStore> AccessEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Full decision for `(feature, action)` against an optional single target.
    pub async fn decide(
        &self,
        principal: &Principal,
        feature: &str,
        action: Action,
        target_owner: Option<&str>,
    ) -> Result<Decision, FolioError> {
        let base = self.store.lookup(principal.role_id, feature, action).await?;
        if !base {
            tracing::debug!(
                user = %principal.username,
                feature,
                action = %action,
                "Base grant missing"
            );
            return Ok(Decision::Deny { action });
        }
        let other = self
            .store
            .lookup(principal.role_id, &other_feature(feature), action)
            .await?;
        Ok(evaluate(principal, action, base, other, target_owner))
    }

    /// Resolve the base grant and scope before the target is loaded.
    ///
    /// A missing base grant fails here with Forbidden, so callers only look
    /// the resource up once the caller is allowed the action at all.
    pub async fn permit(
        &self,
        principal: &Principal,
        feature: Feature,
        action: Action,
    ) -> Result<Permit, FolioError> {
        let scope = self
            .decide(principal, feature.as_str(), action, None)
            .await?
            .into_result()?;
        Ok(Permit {
            principal_id: principal.id.clone(),
            action,
            scope,
        })
    }

    /// Coarse check for ownerless families: base grant only.
    pub async fn require(
        &self,
        principal: &Principal,
        feature: Feature,
        action: Action,
    ) -> Result<(), FolioError> {
        if self
            .store
            .lookup(principal.role_id, feature.as_str(), action)
            .await?
        {
            Ok(())
        } else {
            Err(forbidden(action))
        }
    }

    /// Actions held on `feature` and, for owned families, on its `_other` partner.
    pub async fn permitted_actions(
        &self,
        principal: &Principal,
        feature: Feature,
    ) -> Result<BTreeMap<String, Vec<Action>>, FolioError> {
        let mut names = vec![feature.as_str().to_string()];
        if let Some(other) = feature.other() {
            names.push(other);
        }
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let grants = self.store.list_grants(principal.role_id, &refs).await?;

        let mut out: BTreeMap<String, Vec<Action>> =
            names.into_iter().map(|n| (n, Vec::new())).collect();
        for (name, action) in grants {
            if let Some(actions) = out.get_mut(&name) {
                actions.push(action);
            }
        }
        Ok(out)
    }
}

/// Outcome of a successful base-grant check, applied once the target is known.
#[derive(Debug, Clone)]
pub struct Permit {
    principal_id: String,
    action: Action,
    scope: Scope,
}

impl Permit {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn check_owner(&self, owner: &str) -> Result<(), FolioError> {
        if covers(self.scope, &self.principal_id, owner) {
            Ok(())
        } else {
            Err(forbidden(self.action))
        }
    }

    /// Owner to filter list queries by, `None` when the caller sees everyone's rows.
    pub fn owner_filter(&self) -> Option<&str> {
        match self.scope {
            Scope::SelfOnly => Some(&self.principal_id),
            Scope::All => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::store::memory::MemoryAuthorityStore;

    const USER_ROLE: i32 = 2;

    fn principal(id: &str, role_id: Option<i32>) -> Principal {
        Principal {
            id: id.to_string(),
            username: id.to_string(),
            role_id,
            role_level: Some(1),
        }
    }

    #[test]
    fn test_evaluate_without_base_grant_denies() {
        let p = principal("a", Some(USER_ROLE));
        for other in [false, true] {
            for owner in [None, Some("a"), Some("b")] {
                assert_eq!(
                    evaluate(&p, Action::Edit, false, other, owner),
                    Decision::Deny {
                        action: Action::Edit
                    }
                );
            }
        }
    }

    #[test]
    fn test_evaluate_own_resource_allowed_with_base_grant() {
        let p = principal("a", Some(USER_ROLE));
        assert!(evaluate(&p, Action::Edit, true, false, Some("a")).is_allowed());
        assert!(evaluate(&p, Action::Edit, true, true, Some("a")).is_allowed());
    }

    #[test]
    fn test_evaluate_foreign_resource_needs_other_grant() {
        let p = principal("a", Some(USER_ROLE));
        assert_eq!(
            evaluate(&p, Action::Delete, true, false, Some("b")),
            Decision::Deny {
                action: Action::Delete
            }
        );
        assert_eq!(
            evaluate(&p, Action::Delete, true, true, Some("b")),
            Decision::Allow(Scope::All)
        );
    }

    #[test]
    fn test_evaluate_collection_scope() {
        let p = principal("a", Some(USER_ROLE));
        assert_eq!(
            evaluate(&p, Action::View, true, false, None),
            Decision::Allow(Scope::SelfOnly)
        );
        assert_eq!(
            evaluate(&p, Action::View, true, true, None),
            Decision::Allow(Scope::All)
        );
    }

    #[tokio::test]
    async fn test_decide_unknown_role_denies() {
        let engine = AccessEngine::new(MemoryAuthorityStore::default().grant(
            USER_ROLE,
            "project",
            Action::View,
        ));
        let p = principal("a", Some(99));
        let d = engine.decide(&p, "project", Action::View, None).await.unwrap();
        assert!(!d.is_allowed());

        let no_role = principal("a", None);
        let d = engine
            .decide(&no_role, "project", Action::View, None)
            .await
            .unwrap();
        assert!(!d.is_allowed());
    }

    #[tokio::test]
    async fn test_decide_deactivated_role_denies() {
        let store = MemoryAuthorityStore::default()
            .grant(USER_ROLE, "project", Action::View)
            .deactivate(USER_ROLE);
        let engine = AccessEngine::new(store);
        let d = engine
            .decide(&principal("a", Some(USER_ROLE)), "project", Action::View, None)
            .await
            .unwrap();
        assert!(!d.is_allowed());
    }

    #[tokio::test]
    async fn test_other_grant_for_different_action_does_not_widen() {
        let store = MemoryAuthorityStore::default()
            .grant(USER_ROLE, "project", Action::Edit)
            .grant(USER_ROLE, "project_other", Action::View);
        let engine = AccessEngine::new(store);
        let d = engine
            .decide(
                &principal("b", Some(USER_ROLE)),
                "project",
                Action::Edit,
                Some("a"),
            )
            .await
            .unwrap();
        assert_eq!(
            d,
            Decision::Deny {
                action: Action::Edit
            }
        );
    }

    #[tokio::test]
    async fn test_edit_foreign_project_then_grant_other() {
        let store = MemoryAuthorityStore::default()
            .grant(USER_ROLE, "project", Action::Create)
            .grant(USER_ROLE, "project", Action::Edit);
        let b = principal("b", Some(USER_ROLE));

        let engine = AccessEngine::new(store);
        let denied = engine
            .decide(&b, "project", Action::Edit, Some("a"))
            .await
            .unwrap();
        assert!(!denied.is_allowed());

        let store = MemoryAuthorityStore::default()
            .grant(USER_ROLE, "project", Action::Create)
            .grant(USER_ROLE, "project", Action::Edit)
            .grant(USER_ROLE, "project_other", Action::Edit);
        let engine = AccessEngine::new(store);
        let allowed = engine
            .decide(&b, "project", Action::Edit, Some("a"))
            .await
            .unwrap();
        assert_eq!(allowed, Decision::Allow(Scope::All));
    }

    #[tokio::test]
    async fn test_permit_owner_filter_and_check() {
        let engine = AccessEngine::new(
            MemoryAuthorityStore::default().grant(USER_ROLE, "education", Action::View),
        );
        let p = principal("a", Some(USER_ROLE));
        let permit = engine
            .permit(&p, Feature::Education, Action::View)
            .await
            .unwrap();
        assert_eq!(permit.scope(), Scope::SelfOnly);
        assert_eq!(permit.owner_filter(), Some("a"));
        assert!(permit.check_owner("a").is_ok());
        let err = permit.check_owner("b").unwrap_err();
        assert!(matches!(err, FolioError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_permit_without_base_grant_is_forbidden() {
        let engine = AccessEngine::new(MemoryAuthorityStore::default());
        let err = engine
            .permit(&principal("a", Some(USER_ROLE)), Feature::Project, Action::Create)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not allowed to create");
    }

    #[tokio::test]
    async fn test_require_ignores_other_grant() {
        let engine = AccessEngine::new(
            MemoryAuthorityStore::default().grant(1, "company", Action::Create),
        );
        assert!(engine
            .require(&principal("a", Some(1)), Feature::Company, Action::Create)
            .await
            .is_ok());
        assert!(engine
            .require(&principal("a", Some(1)), Feature::Company, Action::Delete)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_permitted_actions_groups_by_feature() {
        let store = MemoryAuthorityStore::default()
            .grant(USER_ROLE, "project", Action::View)
            .grant(USER_ROLE, "project", Action::Edit)
            .grant(USER_ROLE, "project_other", Action::View)
            .grant(USER_ROLE, "solution", Action::View);
        let engine = AccessEngine::new(store);
        let actions = engine
            .permitted_actions(&principal("a", Some(USER_ROLE)), Feature::Project)
            .await
            .unwrap();
        assert_eq!(actions["project"], vec![Action::View, Action::Edit]);
        assert_eq!(actions["project_other"], vec![Action::View]);
        assert_eq!(actions.len(), 2);
    }
}
