//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An in-memory store seeded with the demo fixtures
//! - Fast password hashing so logins stay quick
//! - Request builders and a response reader

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::auth::password::CredentialVerifier;
use taskboard_shared::models::{
    CreateProject, CreateTask, CreateUser, Project, Role, Task, TaskPatch, TaskStatus, User,
};
use taskboard_shared::store::{MemoryStore, Store, UpdateCondition};
use tower::Service as _;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";
pub const ADMIN_PASSWORD: &str = "Passw0rd!";
pub const MEMBER_PASSWORD: &str = "password123";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub config: Config,
    pub admin: User,
    pub alice: User,
    pub bob: User,
    pub project: Project,
    /// "Design homepage" (alice), "Implement backend" (bob, in progress),
    /// "Write documentation" (alice)
    pub tasks: Vec<Task>,
}

/// Configuration with cheap Argon2 parameters
pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "memory"),
        ("JWT_SECRET", TEST_SECRET),
        ("PASSWORD_MEMORY_KIB", "1024"),
        ("PASSWORD_ITERATIONS", "1"),
        ("PASSWORD_PARALLELISM", "1"),
    ]);

    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test config should be valid")
}

impl TestContext {
    /// Creates a new test context with freshly seeded demo data
    pub async fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let verifier = CredentialVerifier::new(config.password).unwrap();

        let mut users = Vec::new();
        for (name, email, password, role) in [
            ("Admin", "admin@demo.test", ADMIN_PASSWORD, Role::Admin),
            ("Alice", "alice@demo.test", MEMBER_PASSWORD, Role::Member),
            ("Bob", "bob@demo.test", MEMBER_PASSWORD, Role::Member),
        ] {
            let user = store
                .create_user(CreateUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: verifier.hash(password).unwrap(),
                    role,
                })
                .await
                .unwrap();
            users.push(user);
        }
        let bob = users.pop().unwrap();
        let alice = users.pop().unwrap();
        let admin = users.pop().unwrap();

        let project = store
            .create_project(CreateProject {
                name: "Website Redesign".to_string(),
                description: Some("Complete overhaul of company website".to_string()),
            })
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for (title, assignee) in [
            ("Design homepage", alice.id),
            ("Implement backend", bob.id),
            ("Write documentation", alice.id),
        ] {
            let task = store
                .create_task(CreateTask {
                    project_id: project.id,
                    title: title.to_string(),
                    assignee_user_id: assignee,
                    due_date: None,
                })
                .await
                .unwrap();
            tasks.push(task);
        }

        let started = TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        let condition = UpdateCondition {
            expected_version: tasks[1].version,
            assignee: None,
        };
        tasks[1] = store
            .update_task_if(tasks[1].id, condition, &started)
            .await
            .unwrap()
            .unwrap();

        let state = AppState::new(store.clone(), config.clone()).unwrap();
        let app = build_router(state);

        TestContext {
            store,
            app,
            config,
            admin,
            alice,
            bob,
            project,
            tasks,
        }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Logs in and returns the access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/auth/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            ))
            .await;

        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login("admin@demo.test", ADMIN_PASSWORD).await
    }

    pub async fn alice_token(&self) -> String {
        self.login("alice@demo.test", MEMBER_PASSWORD).await
    }

    pub async fn bob_token(&self) -> String {
        self.login("bob@demo.test", MEMBER_PASSWORD).await
    }

    /// Reads a task straight from the store
    pub async fn stored_task(&self, index: usize) -> Task {
        self.store
            .find_task(self.tasks[index].id)
            .await
            .unwrap()
            .unwrap()
    }
}

/// Buffered response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Builds a request without a body
pub fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Builds a request with a JSON body
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
