use sea_orm::DatabaseConnection;

use crate::authz::{self, Action, Feature, Principal};
use crate::entities::user;
use crate::errors::FolioError;
use crate::files::{FileStore, Upload};
use crate::services::{missing_reference, with_image};
use crate::storage::users::{self as store, NewUser, UserFilter, UserUpdate};
use crate::storage::{roles, ListQuery, Page};

pub(crate) const USER_FOLDER: &str = "user";

pub struct UserService<'a> {
    db: &'a DatabaseConnection,
    files: &'a FileStore,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a DatabaseConnection, files: &'a FileStore) -> Self {
        Self { db, files }
    }

    async fn ensure_role(&self, role_id: Option<i32>) -> Result<(), FolioError> {
        if let Some(role_id) = role_id {
            if roles::get_role(self.db, role_id).await?.is_none() {
                return Err(missing_reference("Role"));
            }
        }
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<user::Model, FolioError> {
        store::get_user(self.db, id)
            .await?
            .ok_or_else(|| FolioError::NotFound("User not found".to_string()))
    }

    /// Without `user:view` the caller only sees themselves.
    ///
    /// `role_level_only` narrows the list to roles no more senior than the caller's.
    pub async fn list(
        &self,
        principal: &Principal,
        query: &ListQuery,
        role_level_only: bool,
        role_id: Option<i32>,
    ) -> Result<Page<user::Model>, FolioError> {
        let can_view_all = authz::engine(self.db)
            .decide(principal, Feature::User.as_str(), Action::View, None)
            .await?
            .is_allowed();
        let only_id = (!can_view_all).then_some(principal.id.as_str());
        let min_level = if role_level_only {
            Some(principal.role_level.unwrap_or(i32::MAX))
        } else {
            None
        };
        let filter = UserFilter {
            only_id,
            min_level,
            role_id,
        };
        store::list_users(self.db, query, filter).await
    }

    pub async fn get(&self, principal: &Principal, id: &str) -> Result<user::Model, FolioError> {
        if id != principal.id {
            authz::engine(self.db)
                .require(principal, Feature::User, Action::View)
                .await?;
        }
        self.load(id).await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: NewUser,
        image: Option<&Upload>,
    ) -> Result<user::Model, FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::User, Action::Create)
            .await?;
        self.ensure_role(input.role_id).await?;

        let db = self.db;
        let mut input = input;
        let user = with_image(self.files, USER_FOLDER, image, None, |image_url| async move {
            input.image_url = image_url;
            store::create_user(db, input).await
        })
        .await?;
        tracing::info!(user = %user.username, by = %principal.username, "Created user");
        Ok(user)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: UserUpdate,
        image: Option<&Upload>,
    ) -> Result<user::Model, FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::User, Action::Edit)
            .await?;
        let existing = self.load(id).await?;
        self.ensure_role(update.role_id).await?;

        let db = self.db;
        let previous = existing.image_url.clone();
        let mut update = update;
        with_image(self.files, USER_FOLDER, image, previous, |image_url| async move {
            update.image_url = image_url;
            store::update_user(db, existing, update).await
        })
        .await
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), FolioError> {
        authz::engine(self.db)
            .require(principal, Feature::User, Action::Delete)
            .await?;
        let existing = self.load(id).await?;
        store::delete_user(self.db, id).await?;
        if let Some(image) = existing.image_url {
            self.files.remove(&image).await;
        }
        tracing::info!(user = %existing.username, by = %principal.username, "Deleted user");
        Ok(())
    }
}
