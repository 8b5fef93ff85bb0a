// Integration tests for KDL seeding
//
// Seeding twice must leave the database unchanged the second time, and a
// role's grants follow the seed file.

mod helpers;

use folio::authz::Action;
use folio::seed::{self, parse_seed_document, SyncCounts};
use folio::storage::{roles, users};
use helpers::TestDb;

const DEFAULT_SEED: &str = include_str!("../seed/default.kdl");

#[tokio::test]
async fn test_default_seed_is_idempotent() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();
    let parsed = parse_seed_document(DEFAULT_SEED).expect("default seed parses");

    let first = seed::apply(db, &parsed).await.expect("first sync");
    assert_eq!(
        first.roles,
        SyncCounts {
            created: 2,
            updated: 0,
            unchanged: 0
        }
    );
    assert_eq!(first.users.created, 1);

    let second = seed::apply(db, &parsed).await.expect("second sync");
    assert_eq!(second.roles.unchanged, 2);
    assert_eq!(second.users.unchanged, 1);

    let admin = users::get_user_by_username(db, "admin")
        .await
        .unwrap()
        .expect("admin seeded");
    let role = roles::get_role_by_code(db, "SUPER_ADMIN")
        .await
        .unwrap()
        .expect("role seeded");
    assert_eq!(admin.role_id, Some(role.id));
    assert!(users::verify_password(&admin.password_hash, "change-me-now").unwrap());
}

#[tokio::test]
async fn test_seed_replaces_role_grants() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let before = parse_seed_document(
        r#"
role "USER" level=10 {
    grants {
        - "project:view"
        - "project:edit"
    }
}
"#,
    )
    .unwrap();
    seed::apply(db, &before).await.unwrap();

    let after = parse_seed_document(
        r#"
role "USER" level=10 {
    grants {
        - "project:view"
        - "solution:view"
    }
}
"#,
    )
    .unwrap();
    let report = seed::apply(db, &after).await.unwrap();
    assert_eq!(report.roles.updated, 1);

    let role = roles::get_role_by_code(db, "USER").await.unwrap().unwrap();
    let grants: Vec<(String, String)> = roles::list_authorities(db, role.id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.feature, a.action))
        .collect();
    assert_eq!(
        grants,
        vec![
            ("project".to_string(), Action::View.as_str().to_string()),
            ("solution".to_string(), Action::View.as_str().to_string()),
        ]
    );
}

#[tokio::test]
async fn test_seed_user_without_role_is_detached() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let with_role = parse_seed_document(
        r#"
role "USER" level=10
user "alice" email="alice@example.com" name="Alice" password="password123" role="USER"
"#,
    )
    .unwrap();
    seed::apply(db, &with_role).await.unwrap();

    let role = roles::get_role_by_code(db, "user")
        .await
        .unwrap()
        .expect("code lookup ignores case");
    let alice = users::get_user_by_username(db, "alice").await.unwrap().unwrap();
    assert_eq!(alice.role_id, Some(role.id));

    let without_role = parse_seed_document(
        r#"
role "USER" level=10
user "alice" email="alice@example.com" name="Alice" password="password123"
"#,
    )
    .unwrap();
    let report = seed::apply(db, &without_role).await.unwrap();
    assert_eq!(report.users.updated, 1);
    let alice = users::get_user_by_username(db, "alice").await.unwrap().unwrap();
    assert_eq!(alice.role_id, None);

    let report = seed::apply(db, &without_role).await.unwrap();
    assert_eq!(report.users.unchanged, 1);
}
