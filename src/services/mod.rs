//! Resource services: authorization, existence and foreign-key checks around
//! the storage functions.
//!
//! Services are built per request from shared state and borrow it; they hold no
//! state of their own.

pub mod auth;
pub mod catalog;
pub mod profile;
pub mod public;
pub mod roles;
pub mod translations;
pub mod users;

use std::future::Future;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use profile::{
    EducationService, ExperienceService, ProjectService, SkillMappingService, SolutionService,
};
pub use public::PublicProfileService;
pub use roles::RoleService;
pub use translations::TranslationService;
pub use users::UserService;

use crate::errors::FolioError;
use crate::files::{FileStore, Upload};

/// Image and logo uploads accepted alongside a record.
#[derive(Debug, Default)]
pub struct Images {
    pub image: Option<Upload>,
    pub logo: Option<Upload>,
}

impl Images {
    fn slots(&self, image: Option<String>, logo: Option<String>) -> [ImageSlot<'_>; 2] {
        [
            ImageSlot {
                upload: self.image.as_ref(),
                previous: image,
            },
            ImageSlot {
                upload: self.logo.as_ref(),
                previous: logo,
            },
        ]
    }
}

/// An optional replacement upload and the URL it would replace.
pub(crate) struct ImageSlot<'u> {
    pub upload: Option<&'u Upload>,
    pub previous: Option<String>,
}

/// Store the new images, run `update` with their URLs, then clean up.
///
/// On success each replaced file is removed; when `update` fails the freshly
/// stored files are removed instead. Removal is best-effort either way.
pub(crate) async fn with_images<T, F, Fut, const N: usize>(
    files: &FileStore,
    folder: &str,
    slots: [ImageSlot<'_>; N],
    update: F,
) -> Result<T, FolioError>
where
    F: FnOnce([Option<String>; N]) -> Fut,
    Fut: Future<Output = Result<T, FolioError>>,
{
    for upload in slots.iter().filter_map(|s| s.upload) {
        files.validate(upload)?;
    }

    let mut stored: [Option<String>; N] = std::array::from_fn(|_| None);
    for (i, slot) in slots.iter().enumerate() {
        if let Some(upload) = slot.upload {
            match files.store(folder, upload, None).await {
                Ok(url) => stored[i] = Some(url),
                Err(e) => {
                    discard(files, &stored).await;
                    return Err(e);
                }
            }
        }
    }

    match update(stored.clone()).await {
        Ok(value) => {
            for (slot, new) in slots.into_iter().zip(&stored) {
                if let (Some(_), Some(old)) = (new, slot.previous) {
                    files.remove(&old).await;
                }
            }
            Ok(value)
        }
        Err(e) => {
            discard(files, &stored).await;
            Err(e)
        }
    }
}

async fn discard(files: &FileStore, stored: &[Option<String>]) {
    for url in stored.iter().flatten() {
        files.remove(url).await;
    }
}

/// Single-image form of [`with_images`].
pub(crate) async fn with_image<T, F, Fut>(
    files: &FileStore,
    folder: &str,
    upload: Option<&Upload>,
    previous: Option<String>,
    update: F,
) -> Result<T, FolioError>
where
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = Result<T, FolioError>>,
{
    let slot = ImageSlot { upload, previous };
    with_images(files, folder, [slot], |[url]| update(url)).await
}

/// Validation error for a foreign key pointing nowhere.
pub(crate) fn missing_reference(label: &str) -> FolioError {
    FolioError::Validation(format!("{label} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Uploads;
    use tempfile::TempDir;

    fn png() -> Upload {
        Upload {
            file_name: None,
            content_type: "image/png".to_string(),
            bytes: vec![7u8; 8],
        }
    }

    #[tokio::test]
    async fn test_failed_update_removes_new_file() {
        let dir = TempDir::new().unwrap();
        let files = FileStore::new(&Uploads {
            root: dir.path().to_path_buf(),
            ..Uploads::default()
        });

        let mut seen = None;
        let res: Result<(), _> = with_image(&files, "project", Some(&png()), None, |url| {
            seen = url.clone();
            async { Err(FolioError::Validation("Slug already exist".to_string())) }
        })
        .await;
        assert!(res.is_err());

        let url = seen.unwrap();
        let name = url.rsplit('/').next().unwrap();
        assert!(!dir.path().join("project").join(name).exists());
    }

    #[tokio::test]
    async fn test_successful_update_removes_previous_file() {
        let dir = TempDir::new().unwrap();
        let files = FileStore::new(&Uploads {
            root: dir.path().to_path_buf(),
            ..Uploads::default()
        });
        let old = files.store("project", &png(), Some("old")).await.unwrap();

        let new = with_image(&files, "project", Some(&png()), Some(old), |url| async move {
            Ok(url)
        })
        .await
        .unwrap()
        .unwrap();

        assert!(!dir.path().join("project/old.png").exists());
        let name = new.rsplit('/').next().unwrap();
        assert!(dir.path().join("project").join(name).exists());
    }
}
