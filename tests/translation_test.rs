// Integration tests for per-language translations
//
// One row per (parent, language): a second row for the same language is a
// validation error, a different language is accepted.

mod helpers;

use folio::authz::Action;
use folio::entities::{company_translation, education_translation};
use folio::errors::FolioError;
use folio::files::FileStore;
use folio::services::profile::CreateEducation;
use folio::services::{CatalogService, EducationService, Images, TranslationService};
use folio::settings::Uploads;
use folio::storage::catalog::{CatalogKind, NewCatalogItem};
use folio::storage::profile::NewEducation;
use folio::storage::translations::{self, EducationInput, EducationPatch, Language, NamedInput};
use helpers::{principal, RoleBuilder, TestDb, UserBuilder};
use tempfile::TempDir;

fn education_text(title: &str) -> EducationInput {
    EducationInput {
        title: title.to_string(),
        degree: Some("Bachelor".to_string()),
        field_of_study: None,
        description: None,
    }
}

#[tokio::test]
async fn test_duplicate_language_rejected_other_language_accepted() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = FileStore::new(&Uploads {
        root: dir.path().to_path_buf(),
        ..Default::default()
    });

    let role = RoleBuilder::new("USER")
        .grant_all("education")
        .grant("school", Action::Create)
        .create(db)
        .await;
    let alice = UserBuilder::new("alice").with_role(&role).create(db).await;
    let a = principal(&alice, Some(&role));

    let school = CatalogService::new(db, &files, CatalogKind::School)
        .create(
            &a,
            NewCatalogItem {
                code: "UI".to_string(),
                name: "Universitas Indonesia".to_string(),
                ..Default::default()
            },
            Images::default(),
        )
        .await
        .unwrap();
    let education = EducationService::new(db)
        .create(
            &a,
            CreateEducation {
                user_id: None,
                education: NewEducation {
                    school_id: school.id.clone(),
                    title: "Informatics".to_string(),
                    started_at: None,
                    finished_at: None,
                },
            },
        )
        .await
        .unwrap();

    let texts = TranslationService::<education_translation::Model>::new(db);
    texts
        .create(&a, &education.id, Language::Id, education_text("Informatika"))
        .await
        .expect("first translation");

    let err = texts
        .create(&a, &education.id, Language::Id, education_text("Lagi"))
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
    assert_eq!(err.to_string(), "Translation for language `id` already exist");

    texts
        .create(&a, &education.id, Language::En, education_text("Informatics"))
        .await
        .expect("different language is accepted");

    let updated = texts
        .update(
            &a,
            &education.id,
            Language::En,
            EducationPatch {
                title: Some("Computer Science".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Computer Science");

    let english = translations::find_many::<education_translation::Model, _>(
        db,
        vec![education.id.clone()],
        Language::En,
    )
    .await
    .unwrap();
    assert_eq!(english.len(), 1);

    texts.delete(&a, &education.id, Language::Id).await.unwrap();
    let err = texts
        .get(&a, &education.id, Language::Id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Translation not found");
}

#[tokio::test]
async fn test_catalog_translation_uses_catalog_grant() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = FileStore::new(&Uploads {
        root: dir.path().to_path_buf(),
        ..Default::default()
    });

    let editor = RoleBuilder::new("EDITOR").grant_all("company").create(db).await;
    let viewer = RoleBuilder::new("VIEWER").create(db).await;
    let eddie = UserBuilder::new("eddie").with_role(&editor).create(db).await;
    let vera = UserBuilder::new("vera").with_role(&viewer).create(db).await;
    let e = principal(&eddie, Some(&editor));
    let v = principal(&vera, Some(&viewer));

    let acme = CatalogService::new(db, &files, CatalogKind::Company)
        .create(
            &e,
            NewCatalogItem {
                code: "ACME".to_string(),
                name: "Acme".to_string(),
                ..Default::default()
            },
            Images::default(),
        )
        .await
        .unwrap();

    let texts = TranslationService::<company_translation::Model>::new(db);
    let input = || NamedInput {
        name: "Acme Indonesia".to_string(),
        description: None,
        address: None,
    };

    let err = texts
        .create(&v, &acme.id, Language::Id, input())
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Forbidden(_)));

    texts.create(&e, &acme.id, Language::Id, input()).await.unwrap();

    // reading a catalog translation needs a login only
    let row = texts.get(&v, &acme.id, Language::Id).await.unwrap();
    assert_eq!(row.name, "Acme Indonesia");
}

/// A create that skips the pre-check, as the loser of a race would, still
/// gets the validation error from the unique index
#[tokio::test]
async fn test_concurrent_duplicate_maps_to_validation() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = FileStore::new(&Uploads {
        root: dir.path().to_path_buf(),
        ..Default::default()
    });

    let editor = RoleBuilder::new("EDITOR").grant_all("company").create(db).await;
    let eddie = UserBuilder::new("eddie").with_role(&editor).create(db).await;
    let e = principal(&eddie, Some(&editor));

    let acme = CatalogService::new(db, &files, CatalogKind::Company)
        .create(
            &e,
            NewCatalogItem {
                code: "ACME".to_string(),
                name: "Acme".to_string(),
                ..Default::default()
            },
            Images::default(),
        )
        .await
        .unwrap();

    let input = || NamedInput {
        name: "Acme Indonesia".to_string(),
        description: None,
        address: None,
    };
    translations::create::<company_translation::Model, _>(db, &acme.id, Language::Id, input())
        .await
        .unwrap();

    let err = translations::insert::<company_translation::Model, _>(
        db,
        &acme.id,
        Language::Id,
        input(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
    assert_eq!(err.to_string(), "Translation for language `id` already exist");
}

#[test]
fn test_language_parse() {
    assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
    let err = "fr".parse::<Language>().unwrap_err();
    assert_eq!(err.to_string(), "Invalid language `fr`. only allow id, en");
}
