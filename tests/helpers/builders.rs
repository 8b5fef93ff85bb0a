use folio::authz::{Action, Principal};
use folio::entities::{role, user};
use folio::storage::roles::{self, NewRole};
use folio::storage::users::{self, NewUser};
use sea_orm::DatabaseConnection;

/// Builder for roles and their grants
pub struct RoleBuilder {
    code: String,
    level: i32,
    grants: Vec<(String, Action)>,
}

impl RoleBuilder {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            level: 10,
            grants: Vec::new(),
        }
    }

    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Grant `action` on `feature`, e.g. `.grant("project_other", Action::Edit)`.
    pub fn grant(mut self, feature: &str, action: Action) -> Self {
        self.grants.push((feature.to_string(), action));
        self
    }

    /// Grant every action on `feature`.
    pub fn grant_all(mut self, feature: &str) -> Self {
        for action in Action::ALL {
            self.grants.push((feature.to_string(), action));
        }
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> role::Model {
        let role = roles::create_role(
            db,
            NewRole {
                code: self.code.clone(),
                name: self.code,
                level: self.level,
                description: None,
            },
        )
        .await
        .expect("Failed to create test role");
        for (feature, action) in self.grants {
            roles::grant(db, role.id, &feature, action, None)
                .await
                .expect("Failed to grant");
        }
        role
    }
}

/// Builder for creating test users
pub struct UserBuilder {
    username: String,
    password: String,
    role_id: Option<i32>,
    active: bool,
}

impl UserBuilder {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            password: "password123".to_string(),
            role_id: None,
            active: true,
        }
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn with_role(mut self, role: &role::Model) -> Self {
        self.role_id = Some(role.id);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> user::Model {
        let user = users::create_user(
            db,
            NewUser {
                role_id: self.role_id,
                email: format!("{}@example.com", self.username),
                name: self.username.clone(),
                username: self.username,
                password: self.password,
                phone_number: None,
                gender: None,
                image_url: None,
            },
        )
        .await
        .expect("Failed to create test user");

        if self.active {
            return user;
        }
        users::update_user(
            db,
            user,
            users::UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to deactivate test user")
    }
}

/// Principal for a user the way the session layer builds it.
pub fn principal(user: &user::Model, role: Option<&role::Model>) -> Principal {
    Principal {
        id: user.id.clone(),
        username: user.username.clone(),
        role_id: user.role_id,
        role_level: role.map(|r| r.level),
    }
}
