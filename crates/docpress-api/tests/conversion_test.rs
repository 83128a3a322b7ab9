//! Upload -> convert -> download -> job listing over HTTP.
//!
//! Run with: `cargo test -p docpress-api --test conversion_test`

mod helpers;

use docpress_processing::testing::ScriptedRender;
use helpers::fixtures;
use helpers::{setup_test_app, setup_test_app_with, BASE_URL};
use serde_json::Value;
use std::time::Duration;

#[tokio::test]
async fn test_convert_requires_identity() {
    let app = setup_test_app().await;
    let response = app.client().post("/api/file/convert").await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_upload_response_shape() {
    let app = setup_test_app().await;

    let response = app
        .upload("alice", "report.md", fixtures::SAMPLE_MARKDOWN.as_bytes())
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["fileName"], "report.md");
    assert_eq!(body["mimeType"], "text/markdown");
    assert_eq!(body["fileSize"], fixtures::SAMPLE_MARKDOWN.len() as u64);
}

#[tokio::test]
async fn test_upload_rejects_unsupported_extension() {
    let app = setup_test_app().await;

    let response = app.upload("alice", "notes.txt", b"plain text").await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Unsupported file extension");
    assert!(app.state.staging.is_empty().await);
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let app = setup_test_app_with(|config| config.max_upload_size_bytes = 1024).await;

    let big = vec![b'a'; 4096];
    let response = app.upload("alice", "big.md", &big).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("File is too large"));
}

#[tokio::test]
async fn test_convert_markdown() {
    let app = setup_test_app().await;
    app.upload("alice", "report.md", fixtures::SAMPLE_MARKDOWN.as_bytes())
        .await
        .assert_status_ok();

    let response = app.convert("alice").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["message"], "File converted successfully");
    assert_eq!(body["originalFile"], "report.md");
    assert_eq!(body["convertedFile"], "report.pdf");
    assert!(body["jobId"].as_str().unwrap().starts_with("alice-md-"));
    assert!(body["downloadUrl"].as_str().unwrap().starts_with(BASE_URL));
    assert!(body["fileSize"].as_u64().unwrap() > 0);

    let page = app.renderer.last_page().unwrap();
    assert!(page.contains("<h1>Title</h1>"));
}

#[tokio::test]
async fn test_convert_docx_with_table() {
    let app = setup_test_app().await;
    app.upload("alice", "notes.docx", &fixtures::sample_docx_with_table())
        .await
        .assert_status_ok();

    let response = app.convert("alice").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["convertedFile"], "notes.pdf");
    assert!(app.renderer.last_page().unwrap().contains("<table"));
}

#[tokio::test]
async fn test_convert_without_upload() {
    let app = setup_test_app().await;

    let response = app.convert("alice").await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "NO_FILE_STAGED");
}

#[tokio::test]
async fn test_render_timeout_is_500_and_unrecorded() {
    let app = setup_test_app_with(|config| config.renderer.timeout_seconds = 1).await;
    app.renderer.push(ScriptedRender::Hang(Duration::from_secs(2)));
    app.upload("alice", "slow.md", b"# Slow").await.assert_status_ok();

    let response = app.convert("alice").await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "RENDER_TIMEOUT");

    let jobs = app
        .client()
        .get("/api/job/my")
        .add_header("x-user-name", "alice")
        .await;
    let jobs: Value = jobs.json();
    assert_eq!(jobs.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_download_link_and_file_serving() {
    let app = setup_test_app().await;
    app.upload("alice", "report.md", fixtures::SAMPLE_MARKDOWN.as_bytes())
        .await
        .assert_status_ok();
    app.convert("alice").await.assert_status_ok();

    let jobs: Value = app
        .client()
        .get("/api/job/my")
        .add_header("x-user-name", "alice")
        .await
        .json();
    let reference = jobs[0]["downloadReference"].as_str().unwrap().to_string();
    let file_name = reference.rsplit('/').next().unwrap().to_string();

    let response = app
        .client()
        .get(&reference)
        .add_header("x-user-name", "alice")
        .await;
    assert_eq!(response.status_code(), 200);
    let link: Value = response.json();
    assert_eq!(link["expiresInSeconds"], 3600);
    let url = link["downloadUrl"].as_str().unwrap().to_string();
    assert!(url.contains(&file_name));

    // Someone else's artifact is reported as missing.
    let response = app
        .client()
        .get(&reference)
        .add_header("x-user-name", "mallory")
        .await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "File not found");

    // The local link is served by the API itself.
    let path = url.trim_start_matches("http://localhost:4000");
    let pdf = app.client().get(path).await;
    assert_eq!(pdf.status_code(), 200);
    assert!(pdf.as_bytes().starts_with(b"%PDF"));

    let unsigned = app
        .client()
        .get(&format!("/files/conversions/{}", file_name))
        .await;
    assert_eq!(unsigned.status_code(), 404);
}

async fn convert_and_link(app: &helpers::TestApp, user: &str) -> (String, String) {
    app.upload(user, "report.md", fixtures::SAMPLE_MARKDOWN.as_bytes())
        .await
        .assert_status_ok();
    let converted: Value = app.convert(user).await.json();
    let url = converted["downloadUrl"].as_str().unwrap().to_string();
    let path = url.trim_start_matches("http://localhost:4000").to_string();
    let file_name = path
        .split('?')
        .next()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string();
    (file_name, path)
}

#[tokio::test]
async fn test_forged_and_tampered_links_are_rejected() {
    let app = setup_test_app().await;
    let (alice_file, alice_path) = convert_and_link(&app, "alice").await;
    let (bob_file, _) = convert_and_link(&app, "bob").await;

    assert_eq!(app.client().get(&alice_path).await.status_code(), 200);

    // Hand-written expiry with no signature.
    let forged = app
        .client()
        .get(&format!("/files/conversions/{}?expires=99999999999", alice_file))
        .await;
    assert_eq!(forged.status_code(), 404);

    // Valid signature, longer expiry.
    let (_, query) = alice_path.split_once('?').unwrap();
    let signature = query.split_once("&signature=").unwrap().1;
    let extended = app
        .client()
        .get(&format!(
            "/files/conversions/{}?expires=99999999999&signature={}",
            alice_file, signature
        ))
        .await;
    assert_eq!(extended.status_code(), 404);

    // Alice's signature replayed against Bob's artifact.
    let replayed = app
        .client()
        .get(&format!("/files/conversions/{}?{}", bob_file, query))
        .await;
    assert_eq!(replayed.status_code(), 404);
}

#[tokio::test]
async fn test_download_refused_for_prefix_named_user() {
    let app = setup_test_app().await;
    let (theirs, _) = convert_and_link(&app, "alice_x").await;

    let own = app
        .client()
        .get(&format!("/api/file/download/{}", theirs))
        .add_header("x-user-name", "alice_x")
        .await;
    assert_eq!(own.status_code(), 200);

    let other = app
        .client()
        .get(&format!("/api/file/download/{}", theirs))
        .add_header("x-user-name", "alice")
        .await;
    assert_eq!(other.status_code(), 404);
}

#[tokio::test]
async fn test_download_unknown_file() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get("/api/file/download/alice_md_1_00000000.pdf")
        .add_header("x-user-name", "alice")
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_job_listings() {
    let app = setup_test_app().await;
    for user in ["alice", "bob"] {
        app.upload(user, "page.html", fixtures::SAMPLE_HTML.as_bytes())
            .await
            .assert_status_ok();
        app.convert(user).await.assert_status_ok();
    }

    let mine: Value = app
        .client()
        .get("/api/job/my")
        .add_header("x-user-name", "alice")
        .await
        .json();
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["userName"], "alice");
    assert_eq!(mine[0]["result"], "success");
    assert_eq!(mine[0]["convertedFileName"], "page.pdf");

    let forbidden = app
        .client()
        .get("/api/job/all")
        .add_header("x-user-name", "alice")
        .await;
    assert_eq!(forbidden.status_code(), 403);
    let body: Value = forbidden.json();
    assert_eq!(body["message"], "Unauthorized");

    let all: Value = app
        .client()
        .get("/api/job/all")
        .add_header("x-user-name", "root")
        .add_header("x-user-role", "admin")
        .await
        .json();
    assert_eq!(all["jobs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_health_reports_renderer_pool() {
    let app = setup_test_app().await;
    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["renderer"]["mode"], "oneshot");
    assert_eq!(body["storage"], "local");
    assert_eq!(body["ledger"], "memory");
}

#[tokio::test]
async fn test_openapi_served() {
    let app = setup_test_app().await;
    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/api/file/convert"].is_object());
}
