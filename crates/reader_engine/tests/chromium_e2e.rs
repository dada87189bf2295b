//! Drives a real headless Chromium against a local mock site.
//! Needs a Chromium binary on the machine: `cargo test -- --ignored`.

use std::sync::Arc;

use reader_engine::{
    CancellationToken, ChromiumBackend, ChromiumSettings, DirectoryStorage, EngineConfig,
    EngineEvent, Orchestrator, ProgressSink, RenderBackend,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}

const ARTICLE: &str = r#"<!doctype html>
<html><head><title>Mock Article</title></head>
<body>
  <nav>Home | About</nav>
  <article>
    <h2>Section</h2>
    <p>This is the first paragraph of a perfectly ordinary article.</p>
    <img src="" data-src="/pixel.png" alt="pixel">
  </article>
</body></html>"#;

// 1x1 transparent PNG.
const PIXEL: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires a local Chromium installation"]
async fn renders_mock_article_to_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE, "text/html; charset=utf-8"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pixel.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PIXEL, "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html><body></body></html>", "text/html"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = ChromiumBackend::launch(&ChromiumSettings::default())
        .await
        .unwrap();
    let storage = Arc::new(DirectoryStorage::open(temp.path()).unwrap());
    let orchestrator = Orchestrator::new(backend.clone(), storage, EngineConfig::default());

    let urls = vec![
        format!("{}/article", server.uri()),
        format!("{}/missing", server.uri()),
    ];
    let summary = orchestrator
        .run(urls, Arc::new(NullSink), CancellationToken::new())
        .await;
    backend.shutdown().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    let pdf_path = summary.reports[0].result.as_ref().unwrap();
    let bytes = std::fs::read(pdf_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(pdf_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("0001-Mock_Article--"));
    assert!(summary.reports[1].result.is_err());
}
