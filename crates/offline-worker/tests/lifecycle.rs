//! End-to-end lifecycle scenarios: install, activate, then fetch.

use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};
use offline_worker::prelude::*;
use tokio::sync::mpsc;
use url::Url;

const ORIGIN: &str = "https://notes.example";

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

fn config(version: &str) -> OfflineConfig {
    OfflineConfig::new(version, Url::parse(ORIGIN).unwrap())
}

fn shell_network() -> Arc<StaticNetwork> {
    let mut network = StaticNetwork::new();
    for path in DEFAULT_SHELL {
        network = network.with_route(*path, Response::ok(format!("<html>{}</html>", path)));
    }
    Arc::new(network)
}

async fn activated(network: Arc<StaticNetwork>) -> OfflineWorker {
    let worker = OfflineWorker::builder(config("thynkah-v3"), network)
        .build()
        .unwrap();
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    worker
}

struct ChannelHook(mpsc::UnboundedSender<RevalidationOutcome>);

impl RevalidationHook for ChannelHook {
    fn on_settled(&self, _key: &RequestKey, outcome: &RevalidationOutcome) {
        let _ = self.0.send(outcome.clone());
    }
}

/// Memory storage whose `delete` fails for one store name.
struct StickyStorage {
    inner: MemoryCacheStorage,
    sticky: String,
}

#[async_trait]
impl CacheStorage for StickyStorage {
    async fn open(&self, name: &str) -> CacheResult<()> {
        self.inner.open(name).await
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        if name == self.sticky {
            return Err(CacheError::Storage(format!("{} is locked", name)));
        }
        self.inner.delete(name).await
    }

    async fn match_entry(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> CacheResult<Option<CachedResponse>> {
        self.inner.match_entry(name, key).await
    }

    async fn put(&self, name: &str, key: RequestKey, response: Response) -> CacheResult<()> {
        self.inner.put(name, key, response).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>) -> CacheResult<()> {
        self.inner.put_all(name, entries).await
    }

    async fn entry_keys(&self, name: &str) -> CacheResult<Vec<RequestKey>> {
        self.inner.entry_keys(name).await
    }
}

#[tokio::test]
async fn test_install_caches_eight_shell_entries() {
    let worker = OfflineWorker::builder(config("thynkah-v3"), shell_network())
        .build()
        .unwrap();

    let report = worker.install().await.unwrap();

    assert_eq!(report.entries, 8);
    assert_eq!(worker.store().len().await.unwrap(), 8);
    assert_eq!(worker.state(), WorkerState::Installed);
}

#[tokio::test]
async fn test_install_is_all_or_nothing() {
    let network = shell_network();
    network.set_route("/icons/icon-512.png", Response::new(StatusCode::BAD_GATEWAY));
    let storage = Arc::new(MemoryCacheStorage::new());
    let worker = OfflineWorker::builder(config("thynkah-v3"), network)
        .storage(storage.clone())
        .build()
        .unwrap();

    let err = worker.install().await.unwrap_err();

    assert!(matches!(
        err,
        WorkerError::Install(InstallError::Status { status: StatusCode::BAD_GATEWAY, .. })
    ));
    assert!(storage.entry_keys("thynkah-v3").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_activate_deletes_only_previous_version() {
    let storage = Arc::new(MemoryCacheStorage::new());
    storage
        .put("thynkah-v2", RequestKey::get(&url("/")), Response::ok("old home"))
        .await
        .unwrap();

    let clients = Arc::new(ClientRegistry::new());
    let tab = clients.open_controlled(CacheVersion::new("thynkah-v2"));

    let worker = OfflineWorker::builder(config("thynkah-v3"), shell_network())
        .storage(storage.clone())
        .clients(clients.clone())
        .build()
        .unwrap();
    worker.install().await.unwrap();

    let report = worker.activate().await.unwrap();

    assert_eq!(report.deleted, vec!["thynkah-v2".to_string()]);
    assert_eq!(report.claimed, 1);
    assert_eq!(storage.keys().await.unwrap(), vec!["thynkah-v3".to_string()]);
    assert_eq!(clients.controller(tab), Some(CacheVersion::new("thynkah-v3")));
}

#[tokio::test]
async fn test_reconcile_twice_deletes_nothing_the_second_time() {
    let storage = Arc::new(MemoryCacheStorage::new());
    for name in ["thynkah-v1", "thynkah-v2", "thynkah-v3"] {
        storage.open(name).await.unwrap();
    }
    let reconciler = VersionReconciler::new(storage, CacheVersion::new("thynkah-v3"));

    let first = reconciler.reconcile().await.unwrap();
    let second = reconciler.reconcile().await.unwrap();

    assert_eq!(first.deleted.len(), 2);
    assert!(second.deleted.is_empty());
    assert!(second.failed.is_empty());
}

#[tokio::test]
async fn test_deletion_failure_does_not_stop_reconciliation() {
    let storage = Arc::new(StickyStorage {
        inner: MemoryCacheStorage::new(),
        sticky: "thynkah-v1".to_string(),
    });
    for name in ["thynkah-v1", "thynkah-v2", "thynkah-v3"] {
        storage.open(name).await.unwrap();
    }
    let reconciler = VersionReconciler::new(storage.clone(), CacheVersion::new("thynkah-v3"));

    let report = reconciler.reconcile().await.unwrap();

    assert_eq!(report.deleted, vec!["thynkah-v2".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "thynkah-v1");
    assert!(!report.is_clean());
    assert_eq!(
        storage.keys().await.unwrap(),
        vec!["thynkah-v1".to_string(), "thynkah-v3".to_string()]
    );
}

#[tokio::test]
async fn test_offline_dashboard_navigation_serves_browse() {
    let network = shell_network();
    let worker = activated(network.clone()).await;
    network.set_online(false);

    let response = worker
        .handle_fetch(&InterceptedRequest::navigate(url("/dashboard")))
        .await
        .unwrap();

    assert_eq!(response.body, "<html>/browse</html>");
}

#[tokio::test]
async fn test_online_navigation_returns_live_page_and_updates_cache() {
    let network = shell_network();
    let worker = activated(network.clone()).await;
    network.set_route("/browse", Response::ok("<html>new list</html>"));

    let response = worker
        .handle_fetch(&InterceptedRequest::navigate(url("/browse")))
        .await
        .unwrap();
    assert_eq!(response.body, "<html>new list</html>");

    network.set_online(false);
    let response = worker
        .handle_fetch(&InterceptedRequest::navigate(url("/browse")))
        .await
        .unwrap();
    assert_eq!(response.body, "<html>new list</html>");
}

#[tokio::test]
async fn test_offline_non_get_returns_json_stub() {
    let network = shell_network();
    let worker = activated(network.clone()).await;
    network.set_online(false);

    let request = InterceptedRequest::new(Method::POST, url("/api/notes"))
        .with_body(r#"{"text":"draft"}"#);
    let response = worker.handle_fetch(&request).await.unwrap();

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(&response.body[..], OFFLINE_BODY.as_bytes());
}

#[tokio::test]
async fn test_stylesheet_round_trip_offline() {
    let network = shell_network();
    let worker = activated(network.clone()).await;
    network.set_online(false);

    let response = worker
        .handle_fetch(&InterceptedRequest::get(url("/css/style.css")))
        .await
        .unwrap();

    assert_eq!(response.body, "<html>/css/style.css</html>");
}

#[tokio::test]
async fn test_stale_asset_is_refreshed_in_background() {
    let network = shell_network();
    let (tx, mut settled) = mpsc::unbounded_channel();
    let worker = OfflineWorker::builder(config("thynkah-v3"), network.clone())
        .revalidation_hook(Arc::new(ChannelHook(tx)))
        .build()
        .unwrap();
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    network.set_route("/css/style.css", Response::ok("body{color:red}"));

    let first = worker
        .handle_fetch(&InterceptedRequest::get(url("/css/style.css")))
        .await
        .unwrap();
    assert_eq!(first.body, "<html>/css/style.css</html>");

    assert!(settled.recv().await.unwrap().is_updated());

    let second = worker
        .handle_fetch(&InterceptedRequest::get(url("/css/style.css")))
        .await
        .unwrap();
    assert_eq!(second.body, "body{color:red}");
    assert_eq!(worker.metrics().snapshot().revalidated, 1);
}

#[tokio::test]
async fn test_isolated_versions_do_not_share_entries() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let network = shell_network();

    let old = OfflineWorker::builder(config("thynkah-v2"), network.clone())
        .storage(storage.clone())
        .build()
        .unwrap();
    old.install().await.unwrap();

    let new = OfflineWorker::builder(config("thynkah-v3"), network.clone())
        .storage(storage.clone())
        .build()
        .unwrap();
    new.install().await.unwrap();
    new.activate().await.unwrap();
    network.set_online(false);

    let err = new
        .handle_fetch(&InterceptedRequest::get(url("/api/notes")))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Resolve(ResolveError::CacheMiss { .. })));
    assert!(!storage.has("thynkah-v2").await.unwrap());
}

/// Serves the shell, then hangs every fetch once `stall` is set.
struct StallingNetwork {
    inner: Arc<StaticNetwork>,
    stalled: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl Network for StallingNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, FetchError> {
        if self.stalled.load(std::sync::atomic::Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.fetch(request).await
    }
}

#[tokio::test]
async fn test_timeout_counts_as_network_failure() {
    let network = Arc::new(StallingNetwork {
        inner: shell_network(),
        stalled: std::sync::atomic::AtomicBool::new(false),
    });
    let worker = OfflineWorker::builder(
        config("thynkah-v3").with_network_timeout(std::time::Duration::from_millis(50)),
        network.clone(),
    )
    .build()
    .unwrap();
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    network
        .stalled
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let response = worker
        .handle_fetch(&InterceptedRequest::navigate(url("/browse")))
        .await
        .unwrap();
    assert_eq!(response.body, "<html>/browse</html>");

    let err = worker
        .handle_fetch(&InterceptedRequest::get(url("/api/notes")))
        .await
        .unwrap_err();
    match err {
        WorkerError::Resolve(err) => assert!(matches!(err.fetch_error(), FetchError::Timeout(_))),
        other => panic!("unexpected error: {other}"),
    }
}
