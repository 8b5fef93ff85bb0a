use kdl::{KdlDocument, KdlNode};

use crate::authz::{Action, Feature};
use crate::seed::errors::SeedError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSeed {
    pub code: String,
    pub name: String,
    pub level: i32,
    pub description: Option<String>,
    pub grants: Vec<(String, Action)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSeed {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedFile {
    pub roles: Vec<RoleSeed>,
    pub users: Vec<UserSeed>,
}

/// Parse a KDL seed document into roles and users.
pub fn parse_seed_document(source: &str) -> Result<SeedFile, SeedError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| SeedError::KdlParse(e.to_string()))?;

    let mut seed = SeedFile::default();

    for node in doc.nodes() {
        match node.name().value() {
            "role" => seed.roles.push(parse_role(node)?),
            "user" => seed.users.push(parse_user(node)?),
            other => {
                tracing::warn!("ignoring unknown top-level KDL node `{other}`");
            }
        }
    }

    for user in &seed.users {
        if let Some(role) = &user.role {
            if !seed.roles.iter().any(|r| &r.code == role) {
                return Err(SeedError::UndefinedRole {
                    user: user.username.clone(),
                    role: role.clone(),
                });
            }
        }
    }

    Ok(seed)
}

fn parse_role(node: &KdlNode) -> Result<RoleSeed, SeedError> {
    let code = first_string_arg(node)
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            SeedError::InvalidRole("role node requires a code argument (e.g. role \"ADMIN\")".into())
        })?;

    let name = string_prop(node, "name").unwrap_or_else(|| code.clone());
    let level = match node.get("level") {
        None => 0,
        Some(v) => v
            .as_integer()
            .and_then(|l| i32::try_from(l).ok())
            .ok_or_else(|| {
                SeedError::InvalidRole(format!("role `{code}` has a non-integer `level`"))
            })?,
    };
    let description = string_prop(node, "description");

    let mut grants = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "grants" => {
                    for entry in dash_list(child) {
                        grants.push(parse_grant(&code, &entry)?);
                    }
                }
                other => {
                    return Err(SeedError::InvalidRole(format!(
                        "unexpected child `{other}` in role `{code}` (expected `grants`)"
                    )));
                }
            }
        }
    }

    Ok(RoleSeed {
        code,
        name,
        level,
        description,
        grants,
    })
}

/// `feature:action`, where the feature is a known family or its `_other` partner.
fn parse_grant(role: &str, entry: &str) -> Result<(String, Action), SeedError> {
    let (feature, action) = entry.split_once(':').ok_or_else(|| {
        SeedError::InvalidRole(format!(
            "grant `{entry}` in role `{role}` must look like \"feature:action\""
        ))
    })?;
    if !Feature::is_grantable(feature) {
        return Err(SeedError::InvalidRole(format!(
            "unknown feature `{feature}` in role `{role}`"
        )));
    }
    let action: Action = action
        .parse()
        .map_err(|_| SeedError::InvalidRole(format!("unknown action `{action}` in role `{role}`")))?;
    Ok((feature.to_string(), action))
}

fn parse_user(node: &KdlNode) -> Result<UserSeed, SeedError> {
    let username = first_string_arg(node).ok_or_else(|| {
        SeedError::InvalidUser("user node requires a username argument (e.g. user \"admin\")".into())
    })?;
    let required = |key: &str| {
        string_prop(node, key).ok_or_else(|| {
            SeedError::InvalidUser(format!("user `{username}` missing `{key}` property"))
        })
    };

    Ok(UserSeed {
        email: required("email")?,
        password: required("password")?,
        name: string_prop(node, "name").unwrap_or_else(|| username.clone()),
        role: string_prop(node, "role").map(|r| r.trim().to_uppercase()),
        username,
    })
}

fn string_prop(node: &KdlNode, key: &str) -> Option<String> {
    node.get(key)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Strings of the `- "..."` children of a block node.
fn dash_list(node: &KdlNode) -> Vec<String> {
    let Some(children) = node.children() else {
        return Vec::new();
    };
    children
        .nodes()
        .iter()
        .filter(|n| n.name().value() == "-")
        .filter_map(first_string_arg)
        .collect()
}
