use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "experience_translations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub experience_id: String,
    pub language_id: String,
    pub title: String,
    pub description: Option<String>,
    /// e.g. `fulltime`, `contract`, `freelance`
    pub employee_type: Option<String>,
    pub location: Option<String>,
    /// e.g. `onsite`, `remote`, `hybrid`
    pub location_type: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
