// Integration tests for the role/authority access rules
//
// These tests drive the services against a migrated SQLite database and verify:
// 1. Bare grants cover own records, `_other` grants cover everyone's
// 2. List queries are narrowed to the caller's rows without `_other:view`
// 3. Existence is checked before ownership, and the base grant before both
// 4. Roles still held by users cannot be deleted; role codes and names are unique
// 5. Catalog writes need only the bare grant

mod helpers;

use folio::authz::{self, Action, Feature, Scope};
use folio::errors::FolioError;
use folio::files::FileStore;
use folio::services::profile::CreateEducation;
use folio::services::{
    CatalogService, EducationService, Images, ProjectService, RoleService, TranslationService,
    UserService,
};
use folio::settings::Uploads;
use folio::storage::catalog::{CatalogKind, NewCatalogItem};
use folio::storage::profile::{NewEducation, NewProject, ProjectUpdate};
use folio::storage::roles::{NewRole, RoleUpdate};
use folio::storage::translations::{Language, TitledInput};
use folio::storage::users::{self, UserUpdate};
use folio::storage::ListQuery;
use folio::entities::project_translation;
use helpers::{principal, RoleBuilder, TestDb, UserBuilder};
use tempfile::TempDir;

fn file_store(dir: &TempDir) -> FileStore {
    FileStore::new(&Uploads {
        root: dir.path().to_path_buf(),
        ..Default::default()
    })
}

fn new_project(title: &str) -> NewProject {
    NewProject {
        title: title.to_string(),
        slug: None,
        image_url: None,
        logo_url: None,
    }
}

fn rename(title: &str) -> ProjectUpdate {
    ProjectUpdate {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

/// Editing someone else's project needs `project_other:edit`
#[tokio::test]
async fn test_edit_foreign_project_requires_other_grant() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let role = RoleBuilder::new("USER")
        .grant("project", Action::Create)
        .grant("project", Action::Edit)
        .create(db)
        .await;
    let alice = UserBuilder::new("alice").with_role(&role).create(db).await;
    let bob = UserBuilder::new("bob").with_role(&role).create(db).await;
    let (a, b) = (principal(&alice, Some(&role)), principal(&bob, Some(&role)));

    let projects = ProjectService::new(db, &files);
    let project = projects
        .create(&a, None, new_project("Folio"), Images::default())
        .await
        .expect("Failed to create project");
    assert_eq!(project.user_id, alice.id);

    let err = projects
        .update(&b, &project.id, rename("Hijacked"), Images::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Forbidden(_)));
    assert_eq!(err.to_string(), "Not allowed to edit");

    folio::storage::roles::grant(db, role.id, "project_other", Action::Edit, None)
        .await
        .unwrap();

    let updated = projects
        .update(&b, &project.id, rename("Shared"), Images::default())
        .await
        .expect("project_other:edit should allow the edit");
    assert_eq!(updated.title, "Shared");
    // ownership does not move with the edit
    assert_eq!(updated.user_id, alice.id);
}

/// Own records never need the `_other` grant
#[tokio::test]
async fn test_owner_edits_with_bare_grant() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let role = RoleBuilder::new("USER").grant_all("project").create(db).await;
    let alice = UserBuilder::new("alice").with_role(&role).create(db).await;
    let a = principal(&alice, Some(&role));

    let projects = ProjectService::new(db, &files);
    let project = projects
        .create(&a, None, new_project("Folio"), Images::default())
        .await
        .unwrap();
    let updated = projects
        .update(&a, &project.id, rename("Folio v2"), Images::default())
        .await
        .unwrap();
    assert_eq!(updated.title, "Folio v2");
    projects.delete(&a, &project.id).await.unwrap();
}

#[tokio::test]
async fn test_list_is_scoped_to_caller_without_other_view() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let user_role = RoleBuilder::new("USER").grant_all("project").create(db).await;
    let admin_role = RoleBuilder::new("ADMIN")
        .level(0)
        .grant_all("project")
        .grant("project_other", Action::View)
        .create(db)
        .await;
    let alice = UserBuilder::new("alice").with_role(&user_role).create(db).await;
    let bob = UserBuilder::new("bob").with_role(&user_role).create(db).await;
    let root = UserBuilder::new("root").with_role(&admin_role).create(db).await;

    let projects = ProjectService::new(db, &files);
    let a = principal(&alice, Some(&user_role));
    let b = principal(&bob, Some(&user_role));
    for title in ["One", "Two"] {
        projects
            .create(&a, None, new_project(title), Images::default())
            .await
            .unwrap();
    }
    projects
        .create(&b, None, new_project("Three"), Images::default())
        .await
        .unwrap();

    let own = projects.list(&a, &ListQuery::default()).await.unwrap();
    assert_eq!(own.total, 2);
    assert!(own.items.iter().all(|p| p.user_id == alice.id));

    let all = projects
        .list(&principal(&root, Some(&admin_role)), &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);
}

#[tokio::test]
async fn test_missing_row_is_not_found_before_ownership() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let role = RoleBuilder::new("USER").grant("project", Action::Edit).create(db).await;
    let bob = UserBuilder::new("bob").with_role(&role).create(db).await;
    let b = principal(&bob, Some(&role));

    let err = ProjectService::new(db, &files)
        .update(&b, "no-such-project", rename("x"), Images::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::NotFound(_)));
    assert_eq!(err.to_string(), "Project not found");

    // without the base grant the answer is forbidden, whether or not the row exists
    let err = ProjectService::new(db, &files)
        .delete(&b, "no-such-project")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not allowed to delete");
}

#[tokio::test]
async fn test_creating_for_another_user_needs_other_grant() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let role = RoleBuilder::new("USER").grant("project", Action::Create).create(db).await;
    let alice = UserBuilder::new("alice").with_role(&role).create(db).await;
    let bob = UserBuilder::new("bob").with_role(&role).create(db).await;

    let err = ProjectService::new(db, &files)
        .create(
            &principal(&bob, Some(&role)),
            Some(&alice.id),
            new_project("For Alice"),
            Images::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Forbidden(_)));
}

#[tokio::test]
async fn test_education_requires_existing_school() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let role = RoleBuilder::new("USER")
        .grant_all("education")
        .grant("school", Action::Create)
        .create(db)
        .await;
    let alice = UserBuilder::new("alice").with_role(&role).create(db).await;
    let a = principal(&alice, Some(&role));

    let education = |school_id: &str| CreateEducation {
        user_id: None,
        education: NewEducation {
            school_id: school_id.to_string(),
            title: "Computer Science".to_string(),
            started_at: None,
            finished_at: None,
        },
    };

    let service = EducationService::new(db);
    let err = service.create(&a, education("missing")).await.unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
    assert_eq!(err.to_string(), "School not found");

    let school = CatalogService::new(db, &files, CatalogKind::School)
        .create(
            &a,
            NewCatalogItem {
                code: "ITB".to_string(),
                name: "Institut Teknologi Bandung".to_string(),
                ..Default::default()
            },
            Images::default(),
        )
        .await
        .unwrap();
    let row = service.create(&a, education(&school.id)).await.unwrap();
    assert_eq!(row.user_id, alice.id);
    assert_eq!(row.school_id, school.id);
}

#[tokio::test]
async fn test_catalog_writes_need_bare_grant_only() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let viewer = RoleBuilder::new("VIEWER").create(db).await;
    let editor = RoleBuilder::new("EDITOR").grant_all("company").create(db).await;
    let vera = UserBuilder::new("vera").with_role(&viewer).create(db).await;
    let eddie = UserBuilder::new("eddie").with_role(&editor).create(db).await;

    let companies = CatalogService::new(db, &files, CatalogKind::Company);
    let input = || NewCatalogItem {
        code: "ACME".to_string(),
        name: "Acme".to_string(),
        ..Default::default()
    };

    let err = companies
        .create(&principal(&vera, Some(&viewer)), input(), Images::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not allowed to create");

    let acme = companies
        .create(&principal(&eddie, Some(&editor)), input(), Images::default())
        .await
        .unwrap();

    let dup = companies
        .create(&principal(&eddie, Some(&editor)), input(), Images::default())
        .await
        .unwrap_err();
    assert_eq!(dup.to_string(), "Code already exist");

    // reads need a login only
    assert_eq!(companies.get(&acme.id).await.unwrap().name, "Acme");
}

#[tokio::test]
async fn test_role_in_use_cannot_be_deleted() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let admin_role = RoleBuilder::new("ADMIN").level(0).grant_all("role").create(db).await;
    let user_role = RoleBuilder::new("USER").create(db).await;
    let root = UserBuilder::new("root").with_role(&admin_role).create(db).await;
    let alice = UserBuilder::new("alice").with_role(&user_role).create(db).await;
    let admin = principal(&root, Some(&admin_role));

    let roles = RoleService::new(db);
    let err = roles.delete(&admin, user_role.id).await.unwrap_err();
    assert!(matches!(err, FolioError::IntegrityConstraint(_)));
    assert_eq!(
        err.to_string(),
        "Clear user with this role before deleting this role"
    );

    // moving the last holder to another role frees it
    let other_role = RoleBuilder::new("MEMBER").create(db).await;
    users::update_user(
        db,
        alice,
        UserUpdate {
            role_id: Some(other_role.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    roles.delete(&admin, user_role.id).await.unwrap();

    let err = roles.get(user_role.id).await.unwrap_err();
    assert!(matches!(err, FolioError::NotFound(_)));
}

#[tokio::test]
async fn test_role_code_and_name_are_unique() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let admin_role = RoleBuilder::new("ADMIN").level(0).grant_all("role").create(db).await;
    let root = UserBuilder::new("root").with_role(&admin_role).create(db).await;
    let admin = principal(&root, Some(&admin_role));
    let member = RoleBuilder::new("MEMBER").create(db).await;

    let roles = RoleService::new(db);
    let err = roles
        .create(
            &admin,
            NewRole {
                code: "member".to_string(),
                name: "Someone else".to_string(),
                level: 10,
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Code already exist");

    let err = roles
        .create(
            &admin,
            NewRole {
                code: "GUEST".to_string(),
                name: "MEMBER".to_string(),
                level: 10,
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
    assert_eq!(err.to_string(), "Name already exist");

    let guest = roles
        .create(
            &admin,
            NewRole {
                code: "GUEST".to_string(),
                name: "Guest".to_string(),
                level: 20,
                description: None,
            },
        )
        .await
        .unwrap();
    let err = folio::storage::roles::update_role(
        db,
        guest.id,
        RoleUpdate {
            name: Some(member.name.clone()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Name already exist");

    // keeping its own name is not a conflict
    folio::storage::roles::update_role(
        db,
        guest.id,
        RoleUpdate {
            name: Some("Guest".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_duplicate_grant_is_recorded_once() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let role = RoleBuilder::new("USER").create(db).await;

    let first = folio::storage::roles::grant(db, role.id, "project", Action::Edit, None)
        .await
        .unwrap();
    let second = folio::storage::roles::grant(db, role.id, "project", Action::Edit, None)
        .await
        .unwrap();
    assert!(first);
    assert!(!second);

    let rows = folio::storage::roles::list_authorities(db, role.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].feature, "project");
    assert_eq!(rows[0].action, "edit");
}

#[tokio::test]
async fn test_user_list_filters_by_role() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let admin_role = RoleBuilder::new("ADMIN")
        .level(0)
        .grant("user", Action::View)
        .create(db)
        .await;
    let user_role = RoleBuilder::new("USER").create(db).await;
    let root = UserBuilder::new("root").with_role(&admin_role).create(db).await;
    UserBuilder::new("alice").with_role(&user_role).create(db).await;
    UserBuilder::new("bob").with_role(&user_role).create(db).await;
    let admin = principal(&root, Some(&admin_role));

    let service = UserService::new(db, &files);
    let all = service
        .list(&admin, &ListQuery::default(), false, None)
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let page = service
        .list(&admin, &ListQuery::default(), false, Some(user_role.id))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|u| u.role_id == Some(user_role.id)));
}

#[tokio::test]
async fn test_deactivated_role_loses_its_grants() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let role = RoleBuilder::new("USER").grant("project", Action::View).create(db).await;
    let alice = UserBuilder::new("alice").with_role(&role).create(db).await;
    let a = principal(&alice, Some(&role));

    let engine = authz::engine(db);
    let permit = engine.permit(&a, Feature::Project, Action::View).await.unwrap();
    assert_eq!(permit.scope(), Scope::SelfOnly);

    folio::storage::roles::update_role(
        db,
        role.id,
        folio::storage::roles::RoleUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(engine.permit(&a, Feature::Project, Action::View).await.is_err());
}

#[tokio::test]
async fn test_translation_follows_parent_owner() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let dir = TempDir::new().unwrap();
    let files = file_store(&dir);

    let role = RoleBuilder::new("USER").grant_all("project").create(db).await;
    let alice = UserBuilder::new("alice").with_role(&role).create(db).await;
    let bob = UserBuilder::new("bob").with_role(&role).create(db).await;
    let (a, b) = (principal(&alice, Some(&role)), principal(&bob, Some(&role)));

    let project = ProjectService::new(db, &files)
        .create(&a, None, new_project("Folio"), Images::default())
        .await
        .unwrap();

    let texts = TranslationService::<project_translation::Model>::new(db);
    let input = || TitledInput {
        title: "Portofolio".to_string(),
        description: None,
    };

    let err = texts
        .create(&b, &project.id, Language::Id, input())
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Forbidden(_)));

    let err = texts
        .create(&a, "missing", Language::Id, input())
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::NotFound(_)));

    texts
        .create(&a, &project.id, Language::Id, input())
        .await
        .unwrap();
    let err = texts
        .get(&b, &project.id, Language::Id)
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Forbidden(_)));
}
