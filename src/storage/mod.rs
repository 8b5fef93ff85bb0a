//! Persistence helpers over SeaORM.
//!
//! Functions take `&impl ConnectionTrait` so they run the same on a pooled
//! connection or inside a transaction.

pub mod catalog;
pub mod profile;
pub mod roles;
pub mod translations;
pub mod users;

use std::str::FromStr;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, QuerySelect, Select, Value,
};
use serde::{Deserialize, Serialize};

use crate::errors::FolioError;
use crate::settings::Database as DbCfg;

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, FolioError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

pub fn now() -> i64 {
    Utc::now().timestamp()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Columns that can never be sorted or filtered on.
const HIDDEN_COLUMNS: &[&str] = &["password_hash"];

/// Query-string parameters shared by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListQuery {
    /// 1-based page number
    pub offset: Option<u64>,
    pub size: Option<u64>,
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`
    pub sort_order: Option<String>,
    pub filter_by_column: Option<String>,
    pub filter_value: Option<String>,
    pub is_active: Option<bool>,
}

impl ListQuery {
    pub fn page(offset: u64, size: u64) -> Self {
        Self {
            offset: Some(offset),
            size: Some(size),
            ..Default::default()
        }
    }

    fn order(&self) -> Order {
        match self.sort_order.as_deref() {
            Some(o) if o.eq_ignore_ascii_case("desc") => Order::Desc,
            _ => Order::Asc,
        }
    }

    fn validate(&self) -> Result<(), FolioError> {
        if self.offset == Some(0) || self.size == Some(0) {
            return Err(FolioError::Validation(
                "offset and size must be greater than or equal to 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        match self.size {
            Some(size) if size > 0 => total.div_ceil(size),
            _ if total > 0 => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn column<E>(name: &str) -> Option<E::Column>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    if HIDDEN_COLUMNS.contains(&name) {
        return None;
    }
    E::Column::from_str(name).ok()
}

/// Apply `is_active`, the single-column substring filter and the sort.
///
/// An unknown sort column is ignored; an unknown filter column is rejected.
pub fn apply_list<E>(mut select: Select<E>, query: &ListQuery) -> Result<Select<E>, FolioError>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    query.validate()?;

    if let Some(active) = query.is_active {
        if let Some(col) = column::<E>("is_active") {
            select = select.filter(col.eq(active));
        }
    }

    if let (Some(name), Some(value)) = (
        non_empty(&query.filter_by_column),
        non_empty(&query.filter_value),
    ) {
        let col = column::<E>(name)
            .ok_or_else(|| FolioError::Validation(format!("Invalid filter column `{name}`")))?;
        select = select.filter(col.contains(value));
    }

    match non_empty(&query.sort_by).and_then(column::<E>) {
        Some(col) => select = select.order_by(col, query.order()),
        None => {
            if let Some(col) = column::<E>("created_at") {
                select = select.order_by(col, Order::Desc);
            }
        }
    }

    Ok(select)
}

/// Count, then fetch the requested page.
///
/// Rows are skipped only when both `offset` and `size` are given.
pub async fn fetch_page<E, C>(
    db: &C,
    select: Select<E>,
    query: &ListQuery,
) -> Result<Page<E::Model>, FolioError>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let total = select.clone().count(db).await?;
    let mut select = select;
    if let (Some(offset), Some(size)) = (query.offset, query.size) {
        select = select.offset(offset.saturating_sub(1) * size);
    }
    if let Some(size) = query.size {
        select = select.limit(size);
    }
    let items = select.all(db).await?;
    Ok(Page { items, total })
}

pub async fn list<E, C>(
    db: &C,
    select: Select<E>,
    query: &ListQuery,
) -> Result<Page<E::Model>, FolioError>
where
    E: EntityTrait,
    E::Model: Sync,
    E::Column: FromStr,
    C: ConnectionTrait,
{
    let select = apply_list(select, query)?;
    fetch_page(db, select, query).await
}

pub async fn find_one<E, C>(db: &C, id: &str) -> Result<Option<E::Model>, FolioError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
{
    Ok(E::find_by_id(id.to_string()).one(db).await?)
}

pub async fn delete_one<E, C>(db: &C, id: &str) -> Result<bool, FolioError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
{
    let res = E::delete_by_id(id.to_string()).exec(db).await?;
    Ok(res.rows_affected > 0)
}

/// Fail with `message` when another row already holds `value` in `column`.
pub async fn ensure_unique<E, C>(
    db: &C,
    column: E::Column,
    value: &str,
    exclude: Option<(E::Column, Value)>,
    message: &str,
) -> Result<(), FolioError>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let mut select = E::find().filter(column.eq(value));
    if let Some((id_column, id)) = exclude {
        select = select.filter(id_column.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(FolioError::Validation(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(ListQuery::page(1, 10).total_pages(0), 0);
        assert_eq!(ListQuery::page(1, 10).total_pages(10), 1);
        assert_eq!(ListQuery::page(1, 10).total_pages(11), 2);
        assert_eq!(ListQuery::default().total_pages(7), 1);
        assert_eq!(ListQuery::default().total_pages(0), 0);
    }

    #[test]
    fn test_sort_order_parsing() {
        let mut q = ListQuery::default();
        assert_eq!(q.order(), Order::Asc);
        q.sort_order = Some("DESC".to_string());
        assert_eq!(q.order(), Order::Desc);
        q.sort_order = Some("sideways".to_string());
        assert_eq!(q.order(), Order::Asc);
    }

    #[test]
    fn test_zero_page_rejected() {
        assert!(ListQuery::page(0, 10).validate().is_err());
        assert!(ListQuery::page(1, 0).validate().is_err());
        assert!(ListQuery::page(1, 1).validate().is_ok());
    }

    #[test]
    fn test_unknown_filter_column_rejected() {
        use crate::entities::project;
        let q = ListQuery {
            filter_by_column: Some("nope".to_string()),
            filter_value: Some("x".to_string()),
            ..Default::default()
        };
        let err = apply_list(project::Entity::find(), &q).unwrap_err();
        assert_eq!(err.to_string(), "Invalid filter column `nope`");
    }

    #[test]
    fn test_password_hash_is_not_filterable() {
        use crate::entities::user;
        let q = ListQuery {
            filter_by_column: Some("password_hash".to_string()),
            filter_value: Some("$argon2".to_string()),
            ..Default::default()
        };
        assert!(apply_list(user::Entity::find(), &q).is_err());
    }
}
