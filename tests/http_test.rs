// End-to-end HTTP tests
//
// The full router is served on an ephemeral port and driven with reqwest to
// check envelopes, status codes, authentication and the public profile.

mod helpers;

use folio::authz::Action;
use folio::settings::Settings;
use folio::tokens::TokenSigner;
use folio::web::{self, AppState};
use helpers::{RoleBuilder, TestDb, UserBuilder};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestServer {
    base: String,
    client: reqwest::Client,
    _db: TestDb,
    _dir: TempDir,
}

impl TestServer {
    async fn start(db: TestDb) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut settings = Settings::default();
        settings.uploads.root = dir.path().join("static");
        settings.keys.private_key_path = dir.path().join("keys/private.json");
        std::fs::create_dir_all(&settings.uploads.root).unwrap();

        let tokens = TokenSigner::new(settings.keys.clone(), settings.tokens.clone())
            .await
            .expect("Failed to create token signer");
        let app = web::router(AppState::new(
            settings,
            db.connection().clone(),
            tokens,
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}/api/v1"),
            client: reqwest::Client::new(),
            _db: db,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn login(&self, username: &str) -> String {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": "password123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["data"]["access_token"]["token"]
            .as_str()
            .expect("access token in login response")
            .to_string()
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

async fn seeded_server() -> TestServer {
    let db = TestDb::new().await;
    let role = RoleBuilder::new("USER")
        .grant_all("education")
        .grant_all("school")
        .grant("project", Action::View)
        .create(db.connection())
        .await;
    UserBuilder::new("alice").with_role(&role).create(db.connection()).await;
    UserBuilder::new("ghost")
        .with_role(&role)
        .inactive()
        .create(db.connection())
        .await;
    TestServer::start(db).await
}

#[tokio::test]
async fn test_login_and_profile() {
    let server = seeded_server().await;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "ALICE", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.starts_with("access_token=") && c.contains("HttpOnly")));
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 200);
    assert_eq!(body["status"], "OK");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let token = body["data"]["access_token"]["token"].as_str().unwrap();
    let (status, body) = server.get("/auth/profile", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_login_failures() {
    let server = seeded_server().await;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "alice", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert_eq!(body["detail"], "Invalid username or password");

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "ghost", "password": "password123" }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "User is not active");
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let server = seeded_server().await;
    let (status, body) = server.get("/project", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn test_empty_list_is_not_found() {
    let server = seeded_server().await;
    let token = server.login("alice").await;

    let (status, body) = server.get("/project", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Data not found");

    // no grant at all on solutions
    let (status, body) = server.get("/solution", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not allowed to view");
}

#[tokio::test]
async fn test_create_school_and_education() {
    let server = seeded_server().await;
    let token = server.login("alice").await;

    let form = reqwest::multipart::Form::new()
        .text("code", "ITB")
        .text("name", "Institut Teknologi Bandung");
    let res = server
        .client
        .post(server.url("/school"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 201);
    let school_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = server
        .client
        .post(server.url("/education"))
        .bearer_auth(&token)
        .json(&json!({
            "school_id": "missing",
            "title": "Informatics",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "School not found");

    let res = server
        .client
        .post(server.url("/education"))
        .bearer_auth(&token)
        .json(&json!({
            "school_id": school_id,
            "title": "Informatics",
            "started_at": "2015-08-01",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let education_id = created["data"]["id"].as_str().unwrap();

    let (status, body) = server.get("/education?offset=1&size=10", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["total_pages"], 1);
    assert_eq!(body["data"][0]["id"], education_id);

    let res = server
        .client
        .post(server.url(&format!("/education-translation/{education_id}/id")))
        .bearer_auth(&token)
        .json(&json!({ "title": "Informatika" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let (status, body) = server.get("/alice/id/education", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["translation"]["title"], "Informatika");
    assert_eq!(body["data"][0]["school"]["code"], "ITB");
}

#[tokio::test]
async fn test_permitted_actions_resource() {
    let server = seeded_server().await;
    let token = server.login("alice").await;

    let (status, body) = server.get("/project-resource", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["project"], json!(["view"]));
    assert_eq!(body["data"]["project_other"], json!([]));

    let (status, body) = server.get("/skill-mapping-resource", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["skill_mapping"], json!([]));
}

#[tokio::test]
async fn test_public_profile() {
    let server = seeded_server().await;

    let (status, body) = server.get("/public-profile/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    let (status, _) = server.get("/public-profile/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.get("/public-profile/ghost", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "this user is not active");

    let (status, body) = server.get("/alice/fr/project", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid language `fr`. only allow id, en");
}

#[tokio::test]
async fn test_extractor_rejections_use_error_envelope() {
    let server = seeded_server().await;
    let token = server.login("alice").await;

    let res = server
        .client
        .post(server.url("/education"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert_eq!(body["status"], "Bad Request");
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));

    let (status, body) = server.get("/role/not-a-number", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(body["detail"].is_string());

    let (status, body) = server.get("/user?role_id=abc", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_translation_routes_and_public_schools() {
    let server = seeded_server().await;
    let token = server.login("alice").await;

    let mut school_ids = Vec::new();
    for (code, name) in [("ITB", "Institut Teknologi Bandung"), ("UI", "Universitas Indonesia")] {
        let form = reqwest::multipart::Form::new()
            .text("code", code)
            .text("name", name);
        let res = server
            .client
            .post(server.url("/school"))
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        school_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    // two educations share a school
    let mut education_ids = Vec::new();
    for (school_id, title) in [
        (&school_ids[0], "Informatics"),
        (&school_ids[0], "Master of Informatics"),
        (&school_ids[1], "Mathematics"),
    ] {
        let res = server
            .client
            .post(server.url("/education"))
            .bearer_auth(&token)
            .json(&json!({ "school_id": school_id, "title": title }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        education_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let path = format!("/education-translation/{}/en", education_ids[0]);
    let res = server
        .client
        .post(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "title": "Informatics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "degree": "Bachelor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = server.get(&path, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["degree"], "Bachelor");

    let (status, body) = server.get("/alice/en/education", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows {
        let expected = if row["title"] == "Mathematics" { "UI" } else { "ITB" };
        assert_eq!(row["school"]["code"], expected);
    }

    let res = server
        .client
        .delete(server.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let (status, body) = server.get(&path, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Translation not found");
}
