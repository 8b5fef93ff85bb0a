use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::entities::user;
use crate::errors::FolioError;
use crate::files::{FileStore, Upload};
use crate::services::users::USER_FOLDER;
use crate::services::with_image;
use crate::storage::users::{self as store, UserUpdate};
use crate::storage::roles;
use crate::tokens::{IssuedToken, TokenClaims, TokenKind, TokenSigner};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
    pub user: user::Model,
}

pub struct AuthService<'a> {
    db: &'a DatabaseConnection,
    tokens: &'a TokenSigner,
    files: &'a FileStore,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a DatabaseConnection, tokens: &'a TokenSigner, files: &'a FileStore) -> Self {
        Self { db, tokens, files }
    }

    async fn issue(&self, user: user::Model) -> Result<Session, FolioError> {
        let role_code = match user.role_id {
            Some(id) => roles::get_role(self.db, id).await?.map(|r| r.code),
            None => None,
        };
        let claims = TokenClaims {
            uid: user.id.clone(),
            username: user.username.clone(),
            role_code,
        };
        Ok(Session {
            access_token: self.tokens.issue(&claims, TokenKind::Access)?,
            refresh_token: self.tokens.issue(&claims, TokenKind::Refresh)?,
            user,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session, FolioError> {
        let bad_credentials = || FolioError::Validation("Invalid username or password".to_string());

        let user = store::find_by_login(self.db, &request.username)
            .await?
            .ok_or_else(bad_credentials)?;
        if !store::verify_password(&user.password_hash, &request.password)? {
            tracing::info!(user = %user.username, "Rejected login with wrong password");
            return Err(bad_credentials());
        }
        if !user.is_active {
            return Err(FolioError::Validation("User is not active".to_string()));
        }

        let user = store::touch_last_login(self.db, user).await?;
        tracing::info!(user = %user.username, "User logged in");
        self.issue(user).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, FolioError> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user = store::get_user(self.db, &claims.uid)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| FolioError::Unauthorized("Invalid token".to_string()))?;
        self.issue(user).await
    }

    pub async fn profile(&self, user_id: &str) -> Result<user::Model, FolioError> {
        store::get_user(self.db, user_id)
            .await?
            .ok_or_else(|| FolioError::NotFound("User not found".to_string()))
    }

    /// Self-service update; role and activation are left untouched.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: UserUpdate,
        image: Option<&Upload>,
    ) -> Result<user::Model, FolioError> {
        let existing = self.profile(user_id).await?;
        let mut update = UserUpdate {
            role_id: None,
            clear_role: false,
            is_active: None,
            ..update
        };
        let db = self.db;
        let previous = existing.image_url.clone();
        with_image(self.files, USER_FOLDER, image, previous, |url| async move {
            update.image_url = url;
            store::update_user(db, existing, update).await
        })
        .await
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        change: PasswordChange,
    ) -> Result<(), FolioError> {
        let existing = self.profile(user_id).await?;
        if !store::verify_password(&existing.password_hash, &change.old_password)? {
            return Err(FolioError::Validation("Old password is incorrect".to_string()));
        }
        if change.new_password != change.confirm_password {
            return Err(FolioError::Validation(
                "Password confirmation does not match".to_string(),
            ));
        }
        store::set_password(self.db, existing, &change.new_password).await?;
        tracing::info!(user_id, "Password changed");
        Ok(())
    }
}
