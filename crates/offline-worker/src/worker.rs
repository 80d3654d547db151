//! Lifecycle facade: one worker instance per cache version.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use offline_cache::{
    should_include_debug_headers, CacheError, CacheExplainHeaders, CacheStorage, CacheStore,
    MemoryCacheStorage, RequestKey,
};
use offline_core::{
    ConfigError, InterceptedRequest, LifecycleEvent, LifecycleObserver, OfflineConfig, Response,
    WorkerState,
};
use offline_fetch::{Network, TimeoutNetwork};
use offline_observability::ResolutionMetrics;
use offline_router::Router;
use offline_strategy::{
    Resolution, ResolveError, Resolver, RevalidationHook, RevalidationOutcome, Spawner,
    StrategyContext,
};
use tracing::{debug, info, warn};

use crate::activate::{ReconcileReport, VersionReconciler};
use crate::clients::Clients;
use crate::install::{InstallError, InstallReport, ShellPreloader};

/// Worker errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Cannot handle {event} while {state}")]
    InvalidState {
        event: LifecycleEvent,
        state: WorkerState,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Install failed: {0}")]
    Install(#[from] InstallError),

    #[error("Failed to enumerate caches: {0}")]
    Reconcile(#[source] CacheError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Counts settled background writes, then forwards to the user hook.
struct MetricsHook {
    metrics: Arc<ResolutionMetrics>,
    inner: Option<Arc<dyn RevalidationHook>>,
}

impl RevalidationHook for MetricsHook {
    fn on_settled(&self, key: &RequestKey, outcome: &RevalidationOutcome) {
        self.metrics.record_revalidation(outcome.is_updated());
        if let Some(inner) = &self.inner {
            inner.on_settled(key, outcome);
        }
    }
}

/// Builder for `OfflineWorker`.
pub struct OfflineWorkerBuilder {
    config: OfflineConfig,
    network: Arc<dyn Network>,
    storage: Option<Arc<dyn CacheStorage>>,
    clients: Option<Arc<dyn Clients>>,
    spawner: Option<Arc<dyn Spawner>>,
    hook: Option<Arc<dyn RevalidationHook>>,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl OfflineWorkerBuilder {
    /// Set the cache backend (in-memory by default).
    pub fn storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the client sessions claimed on activate.
    pub fn clients(mut self, clients: Arc<dyn Clients>) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Set the executor for background writes.
    pub fn spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Observe settled background writes.
    pub fn revalidation_hook(mut self, hook: Arc<dyn RevalidationHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Observe lifecycle transitions.
    pub fn observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate the configuration and assemble the worker.
    pub fn build(self) -> Result<OfflineWorker, WorkerError> {
        let config = self.config;
        config.validate()?;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryCacheStorage::new()));
        let store = CacheStore::new(storage.clone(), config.cache_version.clone());

        let network: Arc<dyn Network> = match config.network_timeout() {
            Some(limit) => Arc::new(TimeoutNetwork::new(self.network, limit)),
            None => self.network,
        };

        let metrics = Arc::new(ResolutionMetrics::new());
        let fallbacks = config
            .fallback_urls()?
            .iter()
            .map(RequestKey::get)
            .collect();

        let mut ctx = StrategyContext::new(network.clone(), store.clone())
            .with_fallbacks(fallbacks)
            .with_hook(Arc::new(MetricsHook {
                metrics: metrics.clone(),
                inner: self.hook,
            }));
        if let Some(spawner) = self.spawner {
            ctx = ctx.with_spawner(spawner);
        }

        let preloader = ShellPreloader::from_config(&config, network, store.clone())?;

        let mut reconciler = VersionReconciler::new(storage, config.cache_version.clone());
        if let Some(clients) = self.clients {
            reconciler = reconciler.with_clients(clients);
        }

        Ok(OfflineWorker {
            resolver: Resolver::new(Router::from_config(&config), ctx),
            config,
            store,
            preloader,
            reconciler,
            metrics,
            state: Mutex::new(WorkerState::Parsed),
            observer: self.observer,
        })
    }
}

/// A worker bound to one cache version.
///
/// Drives the lifecycle `install → activate → fetch`. Fetch events are
/// only accepted once the worker is activated.
pub struct OfflineWorker {
    config: OfflineConfig,
    store: CacheStore,
    preloader: ShellPreloader,
    reconciler: VersionReconciler,
    resolver: Resolver,
    metrics: Arc<ResolutionMetrics>,
    state: Mutex<WorkerState>,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl OfflineWorker {
    /// Start building a worker.
    pub fn builder(config: OfflineConfig, network: Arc<dyn Network>) -> OfflineWorkerBuilder {
        OfflineWorkerBuilder {
            config,
            network,
            storage: None,
            clients: None,
            spawner: None,
            hook: None,
            observer: None,
        }
    }

    /// Configuration.
    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// Current-version store.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Request router.
    pub fn router(&self) -> &Router {
        self.resolver.router()
    }

    /// Resolution counters.
    pub fn metrics(&self) -> &Arc<ResolutionMetrics> {
        &self.metrics
    }

    /// Lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(WorkerState::Redundant)
    }

    /// Move to `next` if the current state accepts `event`.
    fn begin(&self, event: LifecycleEvent, next: WorkerState) -> Result<(), WorkerError> {
        let current = self.state();
        if !current.accepts(event) {
            if current.is_terminal() {
                warn!(event = %event, cache = self.store.name(), "worker is redundant");
            }
            return Err(WorkerError::InvalidState {
                event,
                state: current,
            });
        }
        if current != next {
            self.transition(next);
        }
        Ok(())
    }

    fn transition(&self, to: WorkerState) {
        let from = match self.state.lock() {
            Ok(mut state) => std::mem::replace(&mut *state, to),
            Err(_) => return,
        };
        debug!(from = %from, to = %to, cache = self.store.name(), "worker state changed");
        if let Some(observer) = &self.observer {
            observer.on_transition(from, to);
        }
    }

    /// Handle the install event: preload the shell.
    ///
    /// On failure the worker becomes redundant and its store stays without a shell.
    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        self.begin(LifecycleEvent::Install, WorkerState::Installing)?;

        match self.preloader.preload().await {
            Ok(report) => {
                self.transition(WorkerState::Installed);
                Ok(report)
            }
            Err(err) => {
                warn!(cache = self.store.name(), error = %err, "install failed");
                self.transition(WorkerState::Redundant);
                Err(err.into())
            }
        }
    }

    /// Handle the activate event: drop stale stores and claim clients.
    pub async fn activate(&self) -> Result<ReconcileReport, WorkerError> {
        self.begin(LifecycleEvent::Activate, WorkerState::Activating)?;

        match self.reconciler.reconcile().await {
            Ok(report) => {
                info!(
                    cache = self.store.name(),
                    deleted = report.deleted.len(),
                    failed = report.failed.len(),
                    claimed = report.claimed,
                    "worker activated"
                );
                self.transition(WorkerState::Activated);
                Ok(report)
            }
            Err(err) => {
                self.transition(WorkerState::Installed);
                Err(WorkerError::Reconcile(err))
            }
        }
    }

    /// Resolve an intercepted request, keeping the resolution details.
    pub async fn resolve(&self, request: &InterceptedRequest) -> Result<Resolution, WorkerError> {
        let state = self.state();
        if !state.can_intercept_fetch() {
            return Err(WorkerError::InvalidState {
                event: LifecycleEvent::Fetch,
                state,
            });
        }

        let started = Instant::now();
        let strategy = self.resolver.router().classify(request);
        let result = self.resolver.resolve(request).await;

        match result {
            Ok(mut resolution) => {
                self.metrics.record_resolution(
                    strategy,
                    Some(resolution.source),
                    started.elapsed(),
                );
                if self.config.debug_headers || should_include_debug_headers(&request.headers) {
                    self.explain(request, &mut resolution);
                }
                Ok(resolution)
            }
            Err(err) => {
                self.metrics
                    .record_resolution(strategy, None, started.elapsed());
                Err(err.into())
            }
        }
    }

    /// Handle a fetch event.
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> Result<Response, WorkerError> {
        Ok(self.resolve(request).await?.into_response())
    }

    fn explain(&self, request: &InterceptedRequest, resolution: &mut Resolution) {
        let mut headers = CacheExplainHeaders::new()
            .with_strategy(resolution.strategy.name())
            .with_source(resolution.source)
            .with_cache(self.store.name())
            .with_request_id(&request.id);
        if let Some(age) = resolution.age_secs() {
            headers = headers.with_age(age);
        }
        headers.apply(&mut resolution.response);
    }
}

impl std::fmt::Debug for OfflineWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineWorker")
            .field("cache", &self.store.name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use http::StatusCode;
    use offline_fetch::StaticNetwork;
    use offline_router::Strategy;
    use url::Url;

    fn config() -> OfflineConfig {
        OfflineConfig::new("thynkah-v3", Url::parse("https://notes.example").unwrap())
    }

    fn online() -> Arc<StaticNetwork> {
        let mut network = StaticNetwork::new();
        for path in offline_core::DEFAULT_SHELL {
            network = network.with_route(*path, Response::ok(*path));
        }
        Arc::new(network)
    }

    fn url(path: &str) -> Url {
        Url::parse("https://notes.example").unwrap().join(path).unwrap()
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(WorkerState, WorkerState)>>);

    impl LifecycleObserver for Recorder {
        fn on_transition(&self, from: WorkerState, to: WorkerState) {
            self.0.lock().unwrap().push((from, to));
        }
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let recorder = Arc::new(Recorder::default());
        let worker = OfflineWorker::builder(config(), online())
            .observer(recorder.clone())
            .build()
            .unwrap();

        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        assert_eq!(worker.state(), WorkerState::Activated);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                (WorkerState::Parsed, WorkerState::Installing),
                (WorkerState::Installing, WorkerState::Installed),
                (WorkerState::Installed, WorkerState::Activating),
                (WorkerState::Activating, WorkerState::Activated),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_before_activation_is_rejected() {
        let worker = OfflineWorker::builder(config(), online()).build().unwrap();

        let err = worker
            .handle_fetch(&InterceptedRequest::get(url("/browse")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkerError::InvalidState {
                event: LifecycleEvent::Fetch,
                state: WorkerState::Parsed
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_install_makes_worker_redundant() {
        let worker = OfflineWorker::builder(config(), Arc::new(StaticNetwork::offline()))
            .build()
            .unwrap();

        assert!(matches!(worker.install().await, Err(WorkerError::Install(_))));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(matches!(
            worker.activate().await,
            Err(WorkerError::InvalidState { .. })
        ));
        assert!(matches!(
            worker.install().await,
            Err(WorkerError::InvalidState {
                state: WorkerState::Redundant,
                ..
            })
        ));
        assert!(matches!(
            worker.handle_fetch(&InterceptedRequest::get(url("/"))).await,
            Err(WorkerError::InvalidState {
                event: LifecycleEvent::Fetch,
                state: WorkerState::Redundant
            })
        ));
    }

    #[tokio::test]
    async fn test_installed_worker_does_not_intercept_fetch() {
        let worker = OfflineWorker::builder(config(), online()).build().unwrap();
        worker.install().await.unwrap();

        let err = worker
            .resolve(&InterceptedRequest::get(url("/browse")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkerError::InvalidState {
                event: LifecycleEvent::Fetch,
                state: WorkerState::Installed
            }
        ));
        assert_eq!(worker.metrics().snapshot().requests, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = config().with_navigation_fallbacks(["browse"]);

        let result = OfflineWorker::builder(config, online()).build();

        assert!(matches!(result, Err(WorkerError::Config(_))));
    }

    #[tokio::test]
    async fn test_debug_header_request_gets_explain_headers() {
        let network = online();
        let worker = OfflineWorker::builder(config(), network.clone()).build().unwrap();
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        network.set_online(false);

        let mut request = InterceptedRequest::get(url("/css/style.css"));
        request
            .headers
            .insert("x-debug-cache", HeaderValue::from_static("1"));
        let response = worker.handle_fetch(&request).await.unwrap();

        assert_eq!(response.headers.get("x-offline-strategy").unwrap(), "cache-first-revalidate");
        assert_eq!(response.headers.get("x-offline-source").unwrap(), "cache");
        assert_eq!(response.headers.get("x-offline-cache").unwrap(), "thynkah-v3");
        assert!(response.headers.get("age").is_some());

        let plain = worker
            .handle_fetch(&InterceptedRequest::get(url("/css/style.css")))
            .await
            .unwrap();
        assert!(plain.headers.get("x-offline-strategy").is_none());
    }

    #[tokio::test]
    async fn test_metrics_follow_resolutions() {
        let network = online();
        let worker = OfflineWorker::builder(config(), network.clone()).build().unwrap();
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        network.set_online(false);

        let stub = worker
            .resolve(&InterceptedRequest::new(http::Method::POST, url("/api/notes")))
            .await
            .unwrap();
        assert_eq!(stub.strategy, Strategy::NetworkOnlyWithStub);
        assert_eq!(stub.response.status, StatusCode::SERVICE_UNAVAILABLE);

        worker
            .handle_fetch(&InterceptedRequest::navigate(url("/dashboard")))
            .await
            .unwrap();
        assert!(worker
            .handle_fetch(&InterceptedRequest::get(url("/api/tags")))
            .await
            .is_err());

        let snap = worker.metrics().snapshot();
        assert_eq!(snap.requests, 3);
        assert_eq!(snap.by_source.synthetic, 1);
        assert_eq!(snap.by_source.cache, 1);
        assert_eq!(snap.failures, 1);
    }
}
