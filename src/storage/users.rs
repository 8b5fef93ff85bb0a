use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{role, user};
use crate::errors::FolioError;
use crate::storage::{self, ListQuery, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(value: &str) -> Result<Self, FolioError> {
        match value.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(FolioError::Validation(format!(
                "Invalid gender `{other}`. only allow male, female"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub role_id: Option<i32>,
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub role_id: Option<i32>,
    /// Detach the user from its role; takes precedence over `role_id`
    pub clear_role: bool,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
}

pub fn hash_password(password: &str) -> Result<String, FolioError> {
    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| FolioError::Other(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password_hash: &str, password: &str) -> Result<bool, FolioError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| FolioError::Other(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Usernames and emails are stored lowercased so lookups are case-insensitive.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    input: NewUser,
) -> Result<user::Model, FolioError> {
    let username = normalize(&input.username);
    let email = normalize(&input.email);
    if username.is_empty() || email.is_empty() {
        return Err(FolioError::Validation(
            "Username and email are required".to_string(),
        ));
    }
    if input.password.len() < 8 {
        return Err(FolioError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    storage::ensure_unique::<user::Entity, _>(
        db,
        user::Column::Username,
        &username,
        None,
        "Username already exist",
    )
    .await?;
    storage::ensure_unique::<user::Entity, _>(
        db,
        user::Column::Email,
        &email,
        None,
        "Email already exist",
    )
    .await?;

    let now = storage::now();
    let user = user::ActiveModel {
        id: Set(storage::new_id()),
        role_id: Set(input.role_id),
        username: Set(username),
        email: Set(email),
        name: Set(input.name),
        password_hash: Set(hash_password(&input.password)?),
        image_url: Set(input.image_url),
        phone_number: Set(input.phone_number),
        gender: Set(input.gender.map(|g| g.as_str().to_string())),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(user.insert(db).await?)
}

pub async fn get_user<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<Option<user::Model>, FolioError> {
    storage::find_one::<user::Entity, _>(db, id).await
}

pub async fn get_user_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>, FolioError> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(normalize(username)))
        .one(db)
        .await?)
}

/// Look a user up by username or email.
pub async fn find_by_login<C: ConnectionTrait>(
    db: &C,
    username_or_email: &str,
) -> Result<Option<user::Model>, FolioError> {
    let login = normalize(username_or_email);
    Ok(user::Entity::find()
        .filter(
            user::Column::Username
                .eq(login.as_str())
                .or(user::Column::Email.eq(login.as_str())),
        )
        .one(db)
        .await?)
}

/// Narrowing applied on top of a [`ListQuery`] when listing users.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFilter<'a> {
    pub only_id: Option<&'a str>,
    /// Roles with `level >= min_level`
    pub min_level: Option<i32>,
    pub role_id: Option<i32>,
}

pub async fn list_users<C: ConnectionTrait>(
    db: &C,
    query: &ListQuery,
    filter: UserFilter<'_>,
) -> Result<Page<user::Model>, FolioError> {
    let mut select = user::Entity::find();
    if let Some(id) = filter.only_id {
        select = select.filter(user::Column::Id.eq(id));
    }
    if let Some(role_id) = filter.role_id {
        select = select.filter(user::Column::RoleId.eq(role_id));
    }
    if let Some(level) = filter.min_level {
        let role_ids: Vec<i32> = role::Entity::find()
            .select_only()
            .column(role::Column::Id)
            .filter(role::Column::Level.gte(level))
            .into_tuple()
            .all(db)
            .await?;
        select = select.filter(user::Column::RoleId.is_in(role_ids));
    }
    storage::list(db, select, query).await
}

pub async fn update_user<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    update: UserUpdate,
) -> Result<user::Model, FolioError> {
    let id = existing.id.clone();
    let mut active: user::ActiveModel = existing.into();
    if update.clear_role {
        active.role_id = Set(None);
    } else if let Some(role_id) = update.role_id {
        active.role_id = Set(Some(role_id));
    }
    if let Some(email) = update.email {
        let email = normalize(&email);
        storage::ensure_unique::<user::Entity, _>(
            db,
            user::Column::Email,
            &email,
            Some((user::Column::Id, id.into())),
            "Email already exist",
        )
        .await?;
        active.email = Set(email);
    }
    if let Some(name) = update.name {
        active.name = Set(name);
    }
    if let Some(phone_number) = update.phone_number {
        active.phone_number = Set(Some(phone_number));
    }
    if let Some(gender) = update.gender {
        active.gender = Set(Some(gender.as_str().to_string()));
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(image_url) = update.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn set_password<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    password: &str,
) -> Result<user::Model, FolioError> {
    if password.len() < 8 {
        return Err(FolioError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    let mut active: user::ActiveModel = existing.into();
    active.password_hash = Set(hash_password(password)?);
    active.updated_at = Set(storage::now());
    Ok(active.update(db).await?)
}

pub async fn touch_last_login<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
) -> Result<user::Model, FolioError> {
    let mut active: user::ActiveModel = existing.into();
    active.last_login_at = Set(Some(storage::now()));
    Ok(active.update(db).await?)
}

/// Delete a user; owned profile rows go with it (`ON DELETE CASCADE`).
pub async fn delete_user<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, FolioError> {
    storage::delete_one::<user::Entity, _>(db, id).await
}
