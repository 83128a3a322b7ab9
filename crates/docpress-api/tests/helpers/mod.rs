//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs in-process: the memory ledger, a local artifact store in a
//! temp dir, and a scripted browser factory instead of Chrome. Run with
//! `cargo test -p docpress-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use docpress_api::setup::{routes, services, storage};
use docpress_api::AppState;
use docpress_core::{Config, ConverterConfig, RenderPoolMode};
use docpress_processing::testing::ScriptedBrowserFactory;
use docpress_processing::RendererPool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const BASE_URL: &str = "http://localhost:4000/files";

/// Test application: server plus the handles tests poke at.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub renderer: Arc<ScriptedBrowserFactory>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn upload(&self, user: &str, file_name: &str, content: &[u8]) -> TestResponse {
        let part = Part::bytes(bytes::Bytes::copy_from_slice(content))
            .file_name(file_name.to_string())
            .mime_type("application/octet-stream");
        self.server
            .post("/api/file/upload")
            .add_header("x-user-name", user.to_string())
            .add_header("x-user-id", format!("{}-id", user))
            .multipart(MultipartForm::new().add_part("file", part))
            .await
    }

    pub async fn convert(&self, user: &str) -> TestResponse {
        self.server
            .post("/api/file/convert")
            .add_header("x-user-name", user.to_string())
            .add_header("x-user-id", format!("{}-id", user))
            .await
    }
}

/// Test app with default settings.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Test app with settings adjusted by `customize` before wiring.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut ConverterConfig)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let mut inner = ConverterConfig::default();
    inner.storage.local_storage_path = temp_dir.path().join("artifacts");
    inner.storage.local_fallback_path = temp_dir.path().join("fallback");
    inner.storage.local_storage_base_url = BASE_URL.to_string();
    inner.ledger.dead_letter_path = temp_dir.path().join("dead-letter.jsonl");
    inner.ledger.retry_base_delay_ms = 1;
    inner.renderer.timeout_seconds = 5;
    customize(&mut inner);
    let config = Config::from(inner);

    let renderer = Arc::new(ScriptedBrowserFactory::new());
    let pool = RendererPool::new(
        renderer.clone(),
        RenderPoolMode::OneShot,
        Duration::from_secs(config.renderer().timeout_seconds),
        0,
    );

    let stores = storage::setup_storage(&config)
        .await
        .expect("Failed to set up storage");
    let state = services::initialize_services(&config, None, stores, pool)
        .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        renderer,
        _temp_dir: temp_dir,
    }
}
