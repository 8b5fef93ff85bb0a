use sea_orm::DatabaseConnection;

use crate::authz::{self, Action, Principal};
use crate::errors::FolioError;
use crate::files::FileStore;
use crate::services::{with_images, Images};
use crate::storage::catalog::{self as store, CatalogItem, CatalogKind, CatalogUpdate, NewCatalogItem};
use crate::storage::{ListQuery, Page};

/// Companies, schools and skills. Reads need a login only; writes need the
/// bare feature grant.
pub struct CatalogService<'a> {
    db: &'a DatabaseConnection,
    files: &'a FileStore,
    kind: CatalogKind,
}

impl<'a> CatalogService<'a> {
    pub fn new(db: &'a DatabaseConnection, files: &'a FileStore, kind: CatalogKind) -> Self {
        Self { db, files, kind }
    }

    async fn load(&self, id: &str) -> Result<CatalogItem, FolioError> {
        store::get_item(self.db, self.kind, id)
            .await?
            .ok_or_else(|| FolioError::NotFound(format!("{} not found", self.kind.label())))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<CatalogItem>, FolioError> {
        store::list_items(self.db, self.kind, query).await
    }

    pub async fn get(&self, id: &str) -> Result<CatalogItem, FolioError> {
        self.load(id).await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: NewCatalogItem,
        images: Images,
    ) -> Result<CatalogItem, FolioError> {
        authz::engine(self.db)
            .require(principal, self.kind.feature(), Action::Create)
            .await?;

        let (db, kind) = (self.db, self.kind);
        let mut input = input;
        let slots = images.slots(None, None);
        let item = with_images(self.files, kind.folder(), slots, |[image, logo]| async move {
            input.image_url = image;
            input.logo_url = logo;
            store::create_item(db, kind, input).await
        })
        .await?;
        tracing::info!(kind = kind.label(), code = %item.code, by = %principal.username, "Created catalog item");
        Ok(item)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: CatalogUpdate,
        images: Images,
    ) -> Result<CatalogItem, FolioError> {
        authz::engine(self.db)
            .require(principal, self.kind.feature(), Action::Edit)
            .await?;
        let existing = self.load(id).await?;

        let (db, kind) = (self.db, self.kind);
        let mut update = update;
        let slots = images.slots(existing.image_url, existing.logo_url);
        with_images(self.files, kind.folder(), slots, |[image, logo]| async move {
            update.image_url = image;
            update.logo_url = logo;
            store::update_item(db, kind, id, update).await
        })
        .await
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), FolioError> {
        authz::engine(self.db)
            .require(principal, self.kind.feature(), Action::Delete)
            .await?;
        let existing = self.load(id).await?;
        store::delete_item(self.db, self.kind, id).await?;
        for url in [existing.image_url, existing.logo_url].into_iter().flatten() {
            self.files.remove(&url).await;
        }
        Ok(())
    }
}
