#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use programs_metadata::auth::{generate_jwt, Claims, MemorySessionStore};
use programs_metadata::config::AppConfig;
use programs_metadata::courses::{MemoryCourseStore, MemoryEnrollmentStore};
use programs_metadata::{app, AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const COURSE_ID: &str = "course-v1:edX+DemoX+Demo_Course";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: AppConfig,
    pub sessions: Arc<MemorySessionStore>,
    pub courses: Arc<MemoryCourseStore>,
    pub enrollments: Arc<MemoryEnrollmentStore>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn metadata_url(&self, course_id: &str) -> String {
        format!("{}/api/programs/v1/metadata/{}", self.base_url, course_id)
    }

    pub fn lookup_url(&self) -> String {
        format!("{}/api/programs/v1/program-lookup/", self.base_url)
    }

    /// Signed token for the server's secret
    pub fn token(&self, user_id: u64, administrator: bool, roles: &[&str]) -> String {
        let claims = Claims::new(
            format!("user{}", user_id),
            user_id,
            administrator,
            roles.iter().map(|r| r.to_string()).collect(),
            &self.config.security,
        );
        generate_jwt(&claims, &self.config.security).expect("failed to sign test token")
    }

    pub fn admin_token(&self) -> String {
        self.token(1, true, &[])
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Development config with request logging off to keep test output tidy
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config
}

/// Start a fresh server with its own in-memory stores and throttle counters
pub async fn spawn_server(config: AppConfig) -> Result<TestServer> {
    let sessions = Arc::new(MemorySessionStore::new());
    let courses = Arc::new(MemoryCourseStore::new());
    let enrollments = Arc::new(MemoryEnrollmentStore::new());
    let state = AppState::new(config.clone(), courses.clone(), sessions.clone(), enrollments.clone())?;

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let handle = tokio::spawn(async move {
        let service = app(state).into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum::serve(listener, service).await;
    });

    let server = TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        config,
        sessions,
        courses,
        enrollments,
        handle,
    };
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

pub fn valid_payload() -> Value {
    json!({
        "trainer_type": 10,
        "Type_of_Activity": 155,
        "Mandatory": "01",
        "Program_ABROVE": "01",
        "Program_code": "TEST001",
    })
}
