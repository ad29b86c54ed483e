//! Shared helpers for web API integration tests.

#![allow(dead_code)]

use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use serde_json::{json, Value};

use hireon::auth::{register_with_role, RegistrationRequest};
use hireon::chat::ChatService;
use hireon::web::WebServer;
use hireon::{Config, Database, Role, UserRepository};

pub const PASSWORD: &str = "password123";

/// A running app over an in-memory database.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub chat: ChatService,
}

/// Configuration for tests: fixed secret, relaxed rate limits.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.web.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.web.login_rate_limit = 1000;
    config.web.api_rate_limit = 10000;
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), false).await
}

/// Build an app. `http_transport` is needed for WebSocket tests.
pub async fn spawn_app_with(config: Config, http_transport: bool) -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let web = WebServer::new(&config, &db).expect("Failed to configure web server");
    let chat = web.chat().clone();

    let server = if http_transport {
        TestServer::builder()
            .http_transport()
            .build(web.router())
            .expect("Failed to create test server")
    } else {
        TestServer::new(web.router()).expect("Failed to create test server")
    };

    TestApp { server, db, chat }
}

/// A signed-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Log in and return the access token.
pub async fn login(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({"email": email, "password": PASSWORD}))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

/// Register through the API and log in.
pub async fn signup(server: &TestServer, name: &str, role: &str) -> TestUser {
    let email = format!("{}@example.com", name.to_lowercase());
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "fullname": name,
            "email": email,
            "password": PASSWORD,
            "role": role
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let id = response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("user id");

    TestUser {
        id,
        token: login(server, &email).await,
    }
}

/// Create the superadmin directly in the database and log in.
pub async fn superadmin(app: &TestApp) -> TestUser {
    let repo = UserRepository::new(app.db.pool());
    let user = register_with_role(
        &repo,
        RegistrationRequest::new("Admin", "admin@example.com", PASSWORD)
            .with_role(Role::SuperAdmin),
    )
    .await
    .expect("superadmin");

    TestUser {
        id: user.id,
        token: login(&app.server, "admin@example.com").await,
    }
}

/// A student, a recruiter, one job and the student's application to it.
pub struct ChatFixture {
    pub student: TestUser,
    pub recruiter: TestUser,
    pub job_id: i64,
    pub application_id: i64,
}

pub async fn create_job(server: &TestServer, recruiter: &TestUser, title: &str) -> i64 {
    let response = server
        .post("/api/jobs")
        .add_header(AUTHORIZATION, recruiter.bearer())
        .json(&json!({"title": title, "company_name": "Acme"}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().expect("job id")
}

pub async fn apply(server: &TestServer, student: &TestUser, job_id: i64) -> i64 {
    let response = server
        .post(&format!("/api/jobs/{job_id}/apply"))
        .add_header(AUTHORIZATION, student.bearer())
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("application id")
}

pub async fn set_status(
    server: &TestServer,
    recruiter: &TestUser,
    application_id: i64,
    status: &str,
) {
    server
        .patch(&format!("/api/applications/{application_id}/status"))
        .add_header(AUTHORIZATION, recruiter.bearer())
        .json(&json!({"status": status}))
        .await
        .assert_status_ok();
}

/// Fixture with the application still pending.
pub async fn pending_fixture(app: &TestApp) -> ChatFixture {
    let student = signup(&app.server, "Sam", "student").await;
    let recruiter = signup(&app.server, "Rita", "recruiter").await;
    let job_id = create_job(&app.server, &recruiter, "Backend Intern").await;
    let application_id = apply(&app.server, &student, job_id).await;

    ChatFixture {
        student,
        recruiter,
        job_id,
        application_id,
    }
}

/// Fixture with the application accepted, so chat is open.
pub async fn accepted_fixture(app: &TestApp) -> ChatFixture {
    let fixture = pending_fixture(app).await;
    set_status(
        &app.server,
        &fixture.recruiter,
        fixture.application_id,
        "accepted",
    )
    .await;
    fixture
}

/// Send a chat message through the service, as a WebSocket `send` would.
pub async fn send_message(
    app: &TestApp,
    from: &TestUser,
    application_id: i64,
    text: &str,
    reply_to: Option<i64>,
) -> Option<i64> {
    let view = app
        .chat
        .send(Some(&from.token), application_id, text, reply_to)
        .await;
    // Keep timestamps of consecutive operations distinct
    tokio::time::sleep(Duration::from_millis(5)).await;
    view.map(|v| v.id)
}

/// Fetch the history as `user` sees it.
pub async fn history(server: &TestServer, user: &TestUser, application_id: i64) -> Vec<Value> {
    let response = server
        .get(&format!("/api/chat/{application_id}"))
        .add_header(AUTHORIZATION, user.bearer())
        .await;
    response.assert_status_ok();
    response.json::<Value>()["data"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

pub fn texts(history: &[Value]) -> Vec<Option<String>> {
    history
        .iter()
        .map(|m| m["text"].as_str().map(str::to_string))
        .collect()
}
