//! End-to-end conversion through staging, adapters, a scripted renderer,
//! a local artifact store and the in-memory ledger.

use bytes::Bytes;
use docpress_core::{
    AppError, FileType, JobResult, RenderPoolMode, UploadedFile, UserContext, UserRole,
};
use docpress_db::{JobLedger, MemoryJobLedger};
use docpress_processing::testing::{
    sample_docx_with_table, ScriptedBrowserFactory, ScriptedRender,
};
use docpress_processing::RendererPool;
use docpress_services::{
    ArtifactService, ConversionError, ConversionService, DeadLetterLog, JobService, RecordOutcome,
    RetryPolicy, UploadStaging,
};
use docpress_storage::{ArtifactKeys, ArtifactStore, LocalStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    staging: Arc<UploadStaging>,
    ledger: Arc<MemoryJobLedger>,
    store: Arc<LocalStore>,
    jobs: Arc<JobService>,
    artifacts: Arc<ArtifactService>,
    service: ConversionService,
}

async fn harness_with(factory: Arc<ScriptedBrowserFactory>, timeout: Duration) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        LocalStore::new(
            dir.path().join("artifacts"),
            "http://localhost:4000/files".to_string(),
            b"conversion-test-link-secret-000000",
        )
        .await
        .unwrap(),
    );
    let ledger = Arc::new(MemoryJobLedger::new());
    let staging = Arc::new(UploadStaging::new());

    let artifacts = Arc::new(ArtifactService::new(
        store.clone(),
        None,
        ArtifactKeys::new("conversions".to_string()),
        Duration::from_secs(3600),
    ));
    let jobs = Arc::new(JobService::new(
        ledger.clone(),
        "docpress".to_string(),
        RetryPolicy {
            attempts: 1,
            base_delay: Duration::from_millis(1),
        },
        DeadLetterLog::new(dir.path().join("dead-letter.jsonl")),
    ));
    let pool = RendererPool::new(factory, RenderPoolMode::OneShot, timeout, 0);

    let service = ConversionService::new(staging.clone(), pool, artifacts.clone(), jobs.clone());

    Harness {
        _dir: dir,
        staging,
        ledger,
        store,
        jobs,
        artifacts,
        service,
    }
}

async fn harness() -> Harness {
    harness_with(Arc::new(ScriptedBrowserFactory::new()), Duration::from_secs(5)).await
}

fn user(name: &str) -> UserContext {
    UserContext {
        user_id: format!("{}-id", name),
        user_name: name.to_string(),
        role: UserRole::User,
        full_name: Some(format!("{} Example", name)),
    }
}

async fn stage(h: &Harness, who: &UserContext, name: &str, content: impl Into<Bytes>) {
    let file = UploadedFile::new(name, "application/octet-stream", content.into());
    h.staging.store(who.staging_key(), file).await;
}

#[tokio::test]
async fn test_markdown_converts_to_stored_pdf() {
    let h = harness().await;
    let alice = user("alice");
    stage(&h, &alice, "report.md", "# Q3\n\n| a | b |\n|---|---|\n| 1 | 2 |\n").await;

    let receipt = h.service.convert(&alice).await.unwrap();

    assert_eq!(receipt.job.original_file_name, "report.md");
    assert_eq!(receipt.job.converted_file_name, "report.pdf");
    assert_eq!(receipt.job.file_type, FileType::Md);
    assert_eq!(receipt.job.result, JobResult::Success);
    assert_eq!(receipt.job.owner_key, "docpress");
    assert!(receipt.job.job_id.starts_with("alice"));
    assert!(receipt.download_url.contains("?expires="));
    assert!(!receipt.stored_in_fallback);
    assert_eq!(receipt.ledger, RecordOutcome::Recorded);

    let file_name = receipt
        .job
        .download_reference
        .rsplit('/')
        .next()
        .unwrap()
        .to_string();
    let key = h.artifacts.keys().key_for(&file_name).unwrap();
    let pdf = h.store.get(&key).await.unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(receipt.job.output_size_bytes, pdf.len() as u64);
}

#[tokio::test]
async fn test_every_supported_format_renders() {
    let factory = Arc::new(ScriptedBrowserFactory::new());
    let h = harness_with(factory.clone(), Duration::from_secs(5)).await;
    let alice = user("alice");

    stage(&h, &alice, "page.html", "<html><body><h1>Hi</h1></body></html>").await;
    h.service.convert(&alice).await.unwrap();
    assert!(factory.last_page().unwrap().contains("<h1>Hi</h1>"));

    stage(&h, &alice, "notes.docx", sample_docx_with_table()).await;
    let receipt = h.service.convert(&alice).await.unwrap();
    assert_eq!(receipt.job.file_type, FileType::Docx);
    assert_eq!(receipt.job.converted_file_name, "notes.pdf");
    assert!(factory.last_page().unwrap().contains("<table"));

    let jobs = h.ledger.query_by_owner("docpress", "alice").await.unwrap();
    assert_eq!(jobs.len(), 2);
}

#[tokio::test]
async fn test_nothing_staged() {
    let h = harness().await;
    let err = h.service.convert(&user("alice")).await.unwrap_err();
    assert!(matches!(err, ConversionError::NoFileStaged));
    assert!(matches!(AppError::from(err), AppError::NoFileStaged));
}

#[tokio::test]
async fn test_unsupported_type_records_nothing() {
    let h = harness().await;
    let alice = user("alice");
    stage(&h, &alice, "notes.txt", "plain").await;

    let err = h.service.convert(&alice).await.unwrap_err();
    match err {
        ConversionError::UnsupportedFormat(ext) => assert_eq!(ext, "txt"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.ledger.scan_all().await.unwrap().is_empty());
    // The staged file is consumed either way.
    assert!(h.staging.is_empty().await);
}

#[tokio::test]
async fn test_latest_upload_wins() {
    let h = harness().await;
    let alice = user("alice");
    stage(&h, &alice, "first.md", "# A").await;
    stage(&h, &alice, "second.md", "# B").await;

    let receipt = h.service.convert(&alice).await.unwrap();
    assert_eq!(receipt.job.original_file_name, "second.md");

    let err = h.service.convert(&alice).await.unwrap_err();
    assert!(matches!(err, ConversionError::NoFileStaged));
    assert_eq!(h.ledger.scan_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_users_do_not_share_staging() {
    let h = harness().await;
    let alice = user("alice");
    let bob = user("bob");
    stage(&h, &alice, "a.md", "# A").await;
    stage(&h, &bob, "b.md", "# B").await;

    let (a, b) = tokio::join!(h.service.convert(&alice), h.service.convert(&bob));
    assert_eq!(a.unwrap().job.original_file_name, "a.md");
    assert_eq!(b.unwrap().job.original_file_name, "b.md");

    assert_eq!(h.jobs.my_jobs(&alice).await.unwrap().len(), 1);
    assert_eq!(h.jobs.my_jobs(&bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_render_timeout_records_nothing() {
    let factory = Arc::new(ScriptedBrowserFactory::new());
    factory.push(ScriptedRender::Hang(Duration::from_secs(2)));
    let h = harness_with(factory, Duration::from_millis(100)).await;
    let alice = user("alice");
    stage(&h, &alice, "slow.md", "# Slow").await;

    let err = h.service.convert(&alice).await.unwrap_err();
    assert!(matches!(err, ConversionError::Render(_)));
    assert!(matches!(AppError::from(err), AppError::RenderTimeout(_)));
    assert!(h.ledger.scan_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_render_failure_surfaces() {
    let factory = Arc::new(ScriptedBrowserFactory::new());
    factory.push(ScriptedRender::Fail("page crashed".to_string()));
    let h = harness_with(factory, Duration::from_secs(5)).await;
    let alice = user("alice");
    stage(&h, &alice, "crash.md", "# Crash").await;

    let err = h.service.convert(&alice).await.unwrap_err();
    assert!(matches!(AppError::from(err), AppError::RenderFailure(_)));
    assert!(h.ledger.scan_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_docx_is_an_adapter_failure() {
    let h = harness().await;
    let alice = user("alice");
    stage(&h, &alice, "broken.docx", "not a zip").await;

    let err = h.service.convert(&alice).await.unwrap_err();
    assert!(matches!(err, ConversionError::Adapter(_)));
    assert!(matches!(AppError::from(err), AppError::AdapterFailure(_)));
}

#[tokio::test]
async fn test_download_resolves_for_owner_only() {
    let h = harness().await;
    let alice = user("alice");
    stage(&h, &alice, "report.md", "# Report").await;
    let receipt = h.service.convert(&alice).await.unwrap();
    let file_name = receipt.job.download_reference.rsplit('/').next().unwrap();

    let link = h.service.resolve_download(&alice, file_name).await.unwrap();
    assert!(link.url.contains(file_name));
    assert_eq!(link.expires_in_seconds, 3600);

    let err = h
        .service
        .resolve_download(&user("mallory"), file_name)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let admin = UserContext {
        role: UserRole::Admin,
        ..user("root")
    };
    assert!(h.service.resolve_download(&admin, file_name).await.is_ok());
}

async fn convert_markdown(h: &Harness, who: &UserContext) -> String {
    stage(h, who, "report.md", "# Report").await;
    let receipt = h.service.convert(who).await.unwrap();
    receipt
        .job
        .download_reference
        .rsplit('/')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_download_refused_for_user_whose_name_is_a_prefix() {
    let h = harness().await;
    let alice = user("alice");
    let alice_x = user("alice_x");
    let theirs = convert_markdown(&h, &alice_x).await;

    assert!(h.service.resolve_download(&alice_x, &theirs).await.is_ok());
    assert!(matches!(
        h.service.resolve_download(&alice, &theirs).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_users_with_similar_names_get_distinct_artifacts() {
    let h = harness().await;
    let spaced = user("Jane Doe");
    let underscored = user("Jane_Doe");

    let spaced_file = convert_markdown(&h, &spaced).await;
    let underscored_file = convert_markdown(&h, &underscored).await;
    assert!(spaced_file.starts_with("Jane~20Doe_md_"));
    assert!(underscored_file.starts_with("Jane~5fDoe_md_"));

    assert!(h.service.resolve_download(&spaced, &spaced_file).await.is_ok());
    assert!(matches!(
        h.service.resolve_download(&spaced, &underscored_file).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.service.resolve_download(&underscored, &spaced_file).await,
        Err(AppError::NotFound(_))
    ));
}
