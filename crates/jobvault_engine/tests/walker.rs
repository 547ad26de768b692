use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use jobvault_core::{keys, RunStats};
use jobvault_engine::{
    AssetFetcher, AssetWalker, CancellationToken, FailureKind, FetchError, FetchSettings,
    ReqwestAssetFetcher,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    jobvault_logging::initialize_for_tests();
}

/// Writes a fixed body for every URL, or fails for URLs listed in `failures`.
#[derive(Default)]
struct FakeFetcher {
    calls: Mutex<Vec<String>>,
    failures: Vec<(String, FailureKind)>,
}

impl FakeFetcher {
    fn failing(url: &str, kind: FailureKind) -> Self {
        Self {
            failures: vec![(url.to_string(), kind)],
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AssetFetcher for FakeFetcher {
    async fn download(&self, url: &str, target: &Path) -> Result<u64, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some((_, kind)) = self.failures.iter().find(|(u, _)| u == url) {
            return Err(FetchError::new(kind.clone(), "scripted failure"));
        }
        fs::write(target, b"img").map_err(|e| FetchError::new(FailureKind::Io, e.to_string()))?;
        Ok(3)
    }
}

fn write_metadata(root: &Path, stem: &str, job: Value) -> PathBuf {
    let dir = root.join("2024").join("2024-01").join("2024-01-02");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{stem}.json"));
    fs::write(&path, serde_json::to_vec_pretty(&job).unwrap()).unwrap();
    path
}

fn types(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn end_to_end_download_over_http() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/y.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"\x89PNG-bytes".to_vec(), "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let meta = write_metadata(
        temp.path(),
        "20240102-030405_J1",
        json!({
            "id": "J1",
            "enqueue_time": "2024-01-02 03:04:05",
            "type": "upscale",
            "image_paths": [format!("{}/y.png", server.uri())],
        }),
    );

    let fetcher = ReqwestAssetFetcher::new(&FetchSettings::default()).unwrap();
    let walker = AssetWalker::new(&fetcher, types(&["upscale"]), CancellationToken::new());
    let mut stats = RunStats::new();
    let summary = walker.complete(temp.path(), &mut stats).await;

    let image = meta.with_file_name("20240102-030405_J1.png");
    assert_eq!(fs::read(&image).unwrap(), b"\x89PNG-bytes");
    assert_eq!(stats.get(keys::DOWNLOADED_SUCCESSFULLY), 1);
    assert_eq!(stats.get("processed_type_upscale"), 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.metadata_files, 1);
    assert!(!stats.is_degraded());
}

#[tokio::test]
async fn multiple_images_are_numbered_and_rerun_fetches_nothing() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let meta = write_metadata(
        temp.path(),
        "20240102-030405_J2",
        json!({
            "id": "J2",
            "type": "grid",
            "image_paths": ["https://x/1.png", "https://x/2.png", "https://x/3"],
        }),
    );

    let fetcher = FakeFetcher::default();
    let walker = AssetWalker::new(&fetcher, BTreeSet::new(), CancellationToken::new());
    let mut stats = RunStats::new();
    walker.complete(temp.path(), &mut stats).await;

    for name in [
        "20240102-030405_J2-1.png",
        "20240102-030405_J2-2.png",
        "20240102-030405_J2-3.png",
    ] {
        assert!(meta.with_file_name(name).is_file(), "{name}");
    }
    assert_eq!(fetcher.calls().len(), 3);
    assert_eq!(stats.get(keys::DOWNLOADED_SUCCESSFULLY), 3);

    let mut second = RunStats::new();
    let summary = walker.complete(temp.path(), &mut second).await;
    assert_eq!(fetcher.calls().len(), 3);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(second.get(keys::DOWNLOADED_SUCCESSFULLY), 0);
    assert_eq!(second.get(keys::SKIPPED_ALREADY_EXISTS), 3);
}

#[tokio::test]
async fn extension_rules_decide_what_is_fetched() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let meta = write_metadata(
        temp.path(),
        "stem",
        json!({
            "id": "J3",
            "type": "upscale",
            "image_paths": ["https://cdn.example/abc123", "https://cdn.example/anim.gif"],
        }),
    );

    let fetcher = FakeFetcher::default();
    let walker = AssetWalker::new(&fetcher, BTreeSet::new(), CancellationToken::new());
    let mut stats = RunStats::new();
    walker.complete(temp.path(), &mut stats).await;

    assert_eq!(fetcher.calls(), ["https://cdn.example/abc123"]);
    assert!(meta.with_file_name("stem-1.png").is_file());
    assert!(!meta.with_file_name("stem-2.gif").exists());
    assert_eq!(stats.get("skipped_unsupported_extension_gif"), 1);
}

#[tokio::test]
async fn type_filter_and_bad_records_are_counted() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_metadata(
        root,
        "a_grid",
        json!({"id": "a", "type": "grid", "image_paths": ["https://x/a.png"]}),
    );
    write_metadata(root, "b_notype", json!({"id": "b", "image_paths": ["https://x/b.png"]}));
    write_metadata(root, "c_noimages", json!({"id": "c", "type": "upscale", "image_paths": []}));
    write_metadata(
        root,
        "d_badlist",
        json!({"id": "d", "type": "upscale", "image_paths": "https://x/d.png"}),
    );
    write_metadata(
        root,
        "e_badurl",
        json!({"id": "e", "type": "upscale", "image_paths": [42, "ftp://x/e.png"]}),
    );
    let broken = root.join("2024").join("broken.json");
    fs::write(&broken, "{ nope").unwrap();

    let fetcher = FakeFetcher::default();
    let walker = AssetWalker::new(&fetcher, types(&["upscale"]), CancellationToken::new());
    let mut stats = RunStats::new();
    let summary = walker.complete(temp.path(), &mut stats).await;

    assert!(fetcher.calls().is_empty());
    assert_eq!(summary.metadata_files, 6);
    assert_eq!(stats.get("skipped_type_grid"), 1);
    assert_eq!(stats.get(keys::SKIPPED_MISSING_TYPE), 1);
    assert_eq!(stats.get(keys::SKIPPED_NO_IMAGE_PATHS), 1);
    assert_eq!(stats.get(keys::SKIPPED_INVALID_IMAGE_PATHS_FORMAT), 1);
    assert_eq!(stats.get(keys::SKIPPED_INVALID_IMAGE_URL), 2);
    assert_eq!(stats.get(keys::ERROR_JSON_DECODE), 1);
    assert!(stats.is_degraded());
}

#[tokio::test]
async fn failures_are_counted_and_walk_continues() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let meta = write_metadata(
        temp.path(),
        "stem",
        json!({
            "id": "J4",
            "type": "upscale",
            "image_paths": ["https://x/missing.png", "https://x/ok.png"],
        }),
    );

    let fetcher = FakeFetcher::failing("https://x/missing.png", FailureKind::HttpStatus(404));
    let walker = AssetWalker::new(&fetcher, BTreeSet::new(), CancellationToken::new());
    let mut stats = RunStats::new();
    walker.complete(temp.path(), &mut stats).await;

    assert_eq!(fetcher.calls().len(), 2);
    assert!(!meta.with_file_name("stem-1.png").exists());
    assert!(meta.with_file_name("stem-2.png").is_file());
    assert_eq!(stats.get(keys::ERROR_HTTP), 1);
    assert_eq!(stats.get(keys::DOWNLOADED_SUCCESSFULLY), 1);
}

#[tokio::test]
async fn http_error_leaves_no_file() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let meta = write_metadata(
        temp.path(),
        "stem",
        json!({
            "id": "J5",
            "type": "upscale",
            "image_paths": [format!("{}/gone.png", server.uri())],
        }),
    );

    let fetcher = ReqwestAssetFetcher::new(&FetchSettings::default()).unwrap();
    let walker = AssetWalker::new(&fetcher, BTreeSet::new(), CancellationToken::new());
    let mut stats = RunStats::new();
    walker.complete(temp.path(), &mut stats).await;

    assert_eq!(stats.get(keys::ERROR_HTTP), 1);
    let entries: Vec<_> = fs::read_dir(meta.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, ["stem.json"]);
}

#[tokio::test]
async fn cancelled_walk_fetches_nothing() {
    init_logging();
    let temp = TempDir::new().unwrap();
    write_metadata(
        temp.path(),
        "stem",
        json!({"id": "J6", "type": "upscale", "image_paths": ["https://x/a.png"]}),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let fetcher = FakeFetcher::default();
    let walker = AssetWalker::new(&fetcher, BTreeSet::new(), cancel);
    let summary = walker.complete(temp.path(), &mut RunStats::new()).await;

    assert!(summary.cancelled);
    assert!(fetcher.calls().is_empty());
}
