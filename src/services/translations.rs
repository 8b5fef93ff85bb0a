use std::marker::PhantomData;

use sea_orm::{DatabaseConnection, IntoActiveModel};

use crate::authz::{self, ownership, Action, Principal};
use crate::errors::FolioError;
use crate::storage::catalog;
use crate::storage::translations::{
    self as store, ActiveOf, Language, TranslationParent, TranslationRecord,
};

/// Translations of one family. Owned parents go through the ownership
/// engine; catalog parents use the coarse feature check.
pub struct TranslationService<'a, T> {
    db: &'a DatabaseConnection,
    _record: PhantomData<T>,
}

impl<'a, T> TranslationService<'a, T>
where
    T: TranslationRecord + IntoActiveModel<ActiveOf<T>>,
    ActiveOf<T>: Send,
{
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    /// Guard an operation on a parent that must exist.
    async fn authorize_parent(
        &self,
        principal: &Principal,
        parent_id: &str,
        action: Action,
    ) -> Result<(), FolioError> {
        match T::PARENT {
            TranslationParent::Owned(family) => {
                let permit = authz::engine(self.db)
                    .permit(principal, family.feature(), action)
                    .await?;
                let owner = ownership::owner_of(self.db, family, parent_id)
                    .await?
                    .ok_or_else(|| FolioError::NotFound(format!("{} not found", family.label())))?;
                permit.check_owner(&owner)
            }
            TranslationParent::Catalog(kind) => {
                if action != Action::View {
                    authz::engine(self.db)
                        .require(principal, kind.feature(), action)
                        .await?;
                }
                if !catalog::exists(self.db, kind, parent_id).await? {
                    return Err(FolioError::NotFound(format!("{} not found", kind.label())));
                }
                Ok(())
            }
        }
    }

    /// Guard an operation on an existing translation.
    ///
    /// The row is loaded before ownership is checked; its owner comes from the parent.
    async fn authorize_existing(
        &self,
        principal: &Principal,
        parent_id: &str,
        language: Language,
        action: Action,
    ) -> Result<T, FolioError> {
        let permit = match T::PARENT {
            TranslationParent::Owned(family) => Some((
                family,
                authz::engine(self.db)
                    .permit(principal, family.feature(), action)
                    .await?,
            )),
            TranslationParent::Catalog(kind) => {
                if action != Action::View {
                    authz::engine(self.db)
                        .require(principal, kind.feature(), action)
                        .await?;
                }
                None
            }
        };

        let row = store::find::<T, _>(self.db, parent_id, language)
            .await?
            .ok_or_else(|| FolioError::NotFound("Translation not found".to_string()))?;

        if let Some((family, permit)) = permit {
            let owner = ownership::parent_owner(self.db, family, row.parent_id()).await?;
            permit.check_owner(&owner)?;
        }
        Ok(row)
    }

    pub async fn get(
        &self,
        principal: &Principal,
        parent_id: &str,
        language: Language,
    ) -> Result<T, FolioError> {
        self.authorize_existing(principal, parent_id, language, Action::View)
            .await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        parent_id: &str,
        language: Language,
        input: T::Input,
    ) -> Result<T, FolioError> {
        self.authorize_parent(principal, parent_id, Action::Create)
            .await?;
        store::create::<T, _>(self.db, parent_id, language, input).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        parent_id: &str,
        language: Language,
        patch: T::Patch,
    ) -> Result<T, FolioError> {
        let row = self
            .authorize_existing(principal, parent_id, language, Action::Edit)
            .await?;
        store::update::<T, _>(self.db, row, patch).await
    }

    pub async fn delete(
        &self,
        principal: &Principal,
        parent_id: &str,
        language: Language,
    ) -> Result<(), FolioError> {
        self.authorize_existing(principal, parent_id, language, Action::Delete)
            .await?;
        store::delete::<T, _>(self.db, parent_id, language).await?;
        Ok(())
    }
}
