use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FolioError;

/// Grantable operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                FolioError::Validation(format!(
                    "Unknown action `{s}`. only allow view, create, edit, delete"
                ))
            })
    }
}

/// Resource families subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Role,
    User,
    Company,
    School,
    Skill,
    Education,
    Experience,
    Project,
    Solution,
    SkillMapping,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::Role,
        Feature::User,
        Feature::Company,
        Feature::School,
        Feature::Skill,
        Feature::Education,
        Feature::Experience,
        Feature::Project,
        Feature::Solution,
        Feature::SkillMapping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Role => "role",
            Feature::User => "user",
            Feature::Company => "company",
            Feature::School => "school",
            Feature::Skill => "skill",
            Feature::Education => "education",
            Feature::Experience => "experience",
            Feature::Project => "project",
            Feature::Solution => "solution",
            Feature::SkillMapping => "skill_mapping",
        }
    }

    /// Families whose rows carry an owning `user_id`.
    pub fn is_owned(&self) -> bool {
        matches!(
            self,
            Feature::Education
                | Feature::Experience
                | Feature::Project
                | Feature::Solution
                | Feature::SkillMapping
        )
    }

    /// Name of the "anyone's records" partner, for owned families only.
    pub fn other(&self) -> Option<String> {
        self.is_owned().then(|| other_feature(self.as_str()))
    }

    /// Whether `name` is a grantable feature string (`project`, `project_other`, `company`, ...).
    pub fn is_grantable(name: &str) -> bool {
        Feature::ALL.iter().any(|f| {
            f.as_str() == name || f.other().as_deref() == Some(name)
        })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn other_feature(base: &str) -> String {
    format!("{base}_other")
}

/// The authenticated caller, rebuilt from the database on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub role_id: Option<i32>,
    pub role_level: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Own records only
    SelfOnly,
    /// Anyone's records
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Scope),
    Deny { action: Action },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn into_result(self) -> Result<Scope, FolioError> {
        match self {
            Decision::Allow(scope) => Ok(scope),
            Decision::Deny { action } => Err(forbidden(action)),
        }
    }
}

pub(crate) fn forbidden(action: Action) -> FolioError {
    FolioError::Forbidden(format!("Not allowed to {action}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip_names() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!("assign".parse::<Action>().is_err());
    }

    #[test]
    fn test_other_feature_only_for_owned_families() {
        assert_eq!(Feature::Project.other().as_deref(), Some("project_other"));
        assert_eq!(
            Feature::SkillMapping.other().as_deref(),
            Some("skill_mapping_other")
        );
        assert_eq!(Feature::Company.other(), None);
        assert_eq!(Feature::Role.other(), None);
    }

    #[test]
    fn test_grantable_feature_names() {
        assert!(Feature::is_grantable("project"));
        assert!(Feature::is_grantable("project_other"));
        assert!(Feature::is_grantable("company"));
        assert!(!Feature::is_grantable("company_other"));
        assert!(!Feature::is_grantable("service"));
    }

    #[test]
    fn test_deny_message_names_action() {
        let err = Decision::Deny {
            action: Action::Edit,
        }
        .into_result()
        .unwrap_err();
        assert_eq!(err.to_string(), "Not allowed to edit");
    }
}
