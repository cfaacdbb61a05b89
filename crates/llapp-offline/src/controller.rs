//! The offline cache controller: install, activate and fetch handlers.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use http::Method;
use llapp_core::OfflineConfig;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheEntry, CacheStorage};
use crate::manifest::AssetManifest;
use crate::network::{FetchRequest, FetchResponse, Network};
use crate::registration::{Clients, WorkerId, WorkerRegistration, WorkerState};
use crate::{OfflineError, Result};

// ==================== Environment ====================

/// Browser-managed state that outlives any single worker version: cache
/// storage, the registration for the scope and the open pages.
#[derive(Clone)]
pub struct WorkerEnvironment {
    pub caches: Arc<RwLock<CacheStorage>>,
    pub registration: Arc<RwLock<WorkerRegistration>>,
    pub clients: Arc<RwLock<Clients>>,
    event_tx: mpsc::UnboundedSender<OfflineEvent>,
}

impl WorkerEnvironment {
    /// Create an empty environment for `scope`.
    pub fn new(scope: Url) -> (Self, mpsc::UnboundedReceiver<OfflineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        (
            Self {
                caches: Arc::new(RwLock::new(CacheStorage::new())),
                registration: Arc::new(RwLock::new(WorkerRegistration::new(scope))),
                clients: Arc::new(RwLock::new(Clients::new())),
                event_tx,
            },
            event_rx,
        )
    }

    /// Open a page in the scope. It is controlled by the active worker, if any.
    pub async fn open_client(&self, url: Url) -> String {
        let controller = self.registration.read().await.get_active().map(|w| w.id);
        self.clients.write().await.open(url, controller).id
    }

    fn emit(&self, event: OfflineEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Events published by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineEvent {
    /// A worker changed state.
    StateChange {
        worker_id: WorkerId,
        cache_name: String,
        new_state: WorkerState,
    },
    /// Stale cache generations were deleted.
    CachesPruned { kept: String, deleted: Vec<String> },
    /// The active worker took control of open pages.
    ClientsClaimed { worker_id: WorkerId, count: usize },
    /// A live fetch failed and the cached root document was served.
    OfflineFallback { url: String },
}

// ==================== Lifecycle ====================

/// Names of the lifecycle hooks a worker answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    Install,
    Activate,
    Fetch,
}

impl LifecycleHook {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleHook::Install => "install",
            LifecycleHook::Activate => "activate",
            LifecycleHook::Fetch => "fetch",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request addressed to a lifecycle hook.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
}

impl LifecycleEvent {
    pub fn hook(&self) -> LifecycleHook {
        match self {
            LifecycleEvent::Install => LifecycleHook::Install,
            LifecycleEvent::Activate => LifecycleHook::Activate,
            LifecycleEvent::Fetch(_) => LifecycleHook::Fetch,
        }
    }
}

/// The response of a lifecycle hook.
#[derive(Debug, Clone)]
pub enum LifecycleReply {
    Installed(InstallReport),
    Activated(ActivationReport),
    Fetched(FetchOutcome),
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub worker_id: WorkerId,
    pub cache_name: String,
    /// URLs committed to the cache, in manifest order.
    pub cached: Vec<String>,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub worker_id: WorkerId,
    /// Cache generations deleted, oldest first.
    pub deleted_caches: Vec<String>,
    /// Pages whose controller changed to this worker.
    pub claimed_clients: usize,
}

/// What the fetch hook did with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not intercepted; the request goes to the default network handling.
    Passthrough,
    /// Answered by the worker.
    Respond(FetchResponse),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&FetchResponse> {
        match self {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::Passthrough => None,
        }
    }
}

// ==================== Controller ====================

/// One worker version: keeps exactly one cache generation live and answers
/// requests from it.
pub struct OfflineCacheController<N> {
    cache_name: String,
    origin: Url,
    manifest: AssetManifest,
    offline_fallback: Url,
    network: N,
    env: WorkerEnvironment,
    /// Worker produced by this version's last successful install.
    installed: RwLock<Option<WorkerId>>,
}

impl<N: Network> OfflineCacheController<N> {
    /// Create a controller for the configured cache generation.
    pub fn new(config: &OfflineConfig, network: N, env: WorkerEnvironment) -> Result<Self> {
        config.validate()?;
        let manifest = AssetManifest::from_config(config)?;
        let offline_fallback = config.resolve(&config.offline_fallback)?;

        Ok(Self {
            cache_name: config.cache_name.clone(),
            origin: config.origin.clone(),
            manifest,
            offline_fallback,
            network,
            env,
            installed: RwLock::new(None),
        })
    }

    /// Name of the cache generation this version owns.
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn environment(&self) -> &WorkerEnvironment {
        &self.env
    }

    /// Route a lifecycle event to its hook.
    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<LifecycleReply> {
        debug!(hook = %event.hook(), cache = %self.cache_name, "Dispatching lifecycle event");
        match event {
            LifecycleEvent::Install => self.install().await.map(LifecycleReply::Installed),
            LifecycleEvent::Activate => self.activate().await.map(LifecycleReply::Activated),
            LifecycleEvent::Fetch(request) => {
                self.handle_fetch(&request).await.map(LifecycleReply::Fetched)
            }
        }
    }

    /// Install then activate, as a freshly registered version does.
    pub async fn start(&self) -> Result<ActivationReport> {
        self.install().await?;
        self.activate().await
    }

    /// Install hook: populate this version's cache generation with every
    /// manifest asset, or with nothing at all.
    ///
    /// An install superseded by a newer one before it commits fails without
    /// writing anything.
    pub async fn install(&self) -> Result<InstallReport> {
        let worker_id = self
            .env
            .registration
            .write()
            .await
            .begin_install(&self.cache_name);
        self.emit_state(worker_id, WorkerState::Installing);

        info!(cache = %self.cache_name, assets = self.manifest.len(), "Installing");

        let result = match self.fetch_manifest().await {
            Ok(entries) => self.commit(worker_id, entries).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(cached) => {
                *self.installed.write().await = Some(worker_id);
                self.emit_state(worker_id, WorkerState::Installed);
                info!(cache = %self.cache_name, cached = cached.len(), "Install complete");

                Ok(InstallReport {
                    worker_id,
                    cache_name: self.cache_name.clone(),
                    cached,
                })
            }
            Err(err) => {
                let reason = err.to_string();
                let superseded = !self
                    .env
                    .registration
                    .write()
                    .await
                    .install_failed(worker_id, reason.clone());
                self.emit_state(worker_id, WorkerState::Redundant);
                warn!(cache = %self.cache_name, error = %reason, superseded, "Install failed");

                Err(OfflineError::InstallFailed {
                    cache_name: self.cache_name.clone(),
                    reason,
                })
            }
        }
    }

    /// Fetch the whole manifest. The named cache is opened first.
    async fn fetch_manifest(&self) -> Result<Vec<CacheEntry>> {
        self.env.caches.write().await.open(&self.cache_name);

        let urls = self.manifest.resolve(&self.origin)?;
        join_all(urls.iter().map(|url| self.fetch_asset(url)))
            .await
            .into_iter()
            .collect()
    }

    /// Move `worker_id` to waiting and write its entries, under the
    /// registration lock so a superseded install commits nothing.
    async fn commit(&self, worker_id: WorkerId, entries: Vec<CacheEntry>) -> Result<Vec<String>> {
        let mut registration = self.env.registration.write().await;
        registration.install_complete(worker_id)?;
        registration.skip_waiting();

        let cached = entries.iter().map(|e| e.url.clone()).collect();
        self.env
            .caches
            .write()
            .await
            .open(&self.cache_name)
            .put_all(entries);
        Ok(cached)
    }

    async fn fetch_asset(&self, url: &Url) -> Result<CacheEntry> {
        let response = self.network.fetch(&FetchRequest::get(url.clone())).await?;
        if !response.ok() {
            return Err(OfflineError::Network(format!(
                "{url} responded with status {}",
                response.status
            )));
        }
        Ok(CacheEntry::from_response(url, &response))
    }

    /// Activate hook: delete every other cache generation, then claim open
    /// pages.
    ///
    /// Only the worker this version installed may activate; a waiting worker
    /// from another version is left alone and nothing is deleted.
    pub async fn activate(&self) -> Result<ActivationReport> {
        let installed = *self.installed.read().await;
        let worker_id = installed.ok_or_else(|| {
            OfflineError::State(format!("{} has not been installed", self.cache_name))
        })?;

        {
            let mut registration = self.env.registration.write().await;
            let current = registration.active.as_ref().map(|w| w.id);
            let controlled = match current {
                Some(id) => self.env.clients.read().await.controlled_by(id),
                None => 0,
            };
            if !registration.can_activate(controlled) {
                return Err(OfflineError::State(format!(
                    "{} cannot activate: no waiting worker or {controlled} pages still controlled",
                    self.cache_name
                )));
            }
            registration.begin_activation(worker_id)?;
        }
        self.emit_state(worker_id, WorkerState::Activating);

        let deleted_caches = {
            let mut caches = self.env.caches.write().await;
            let stale: Vec<String> = caches
                .keys()
                .into_iter()
                .filter(|name| *name != self.cache_name)
                .map(str::to_string)
                .collect();
            for name in &stale {
                caches.delete(name);
            }
            stale
        };
        if !deleted_caches.is_empty() {
            info!(kept = %self.cache_name, deleted = ?deleted_caches, "Deleted stale caches");
        }
        self.env.emit(OfflineEvent::CachesPruned {
            kept: self.cache_name.clone(),
            deleted: deleted_caches.clone(),
        });

        self.env
            .registration
            .write()
            .await
            .activation_complete(worker_id)?;
        self.emit_state(worker_id, WorkerState::Activated);

        let claimed_clients = self.env.clients.write().await.claim(worker_id);
        self.env.emit(OfflineEvent::ClientsClaimed {
            worker_id,
            count: claimed_clients,
        });

        Ok(ActivationReport {
            worker_id,
            deleted_caches,
            claimed_clients,
        })
    }

    /// Fetch hook: cache, else network, else the cached root document.
    ///
    /// Only GET requests are intercepted, and only once this version is the
    /// active one. Nothing is ever written to the cache here.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        if request.method != Method::GET {
            debug!(url = %request.url, method = %request.method, "Not intercepting");
            return Ok(FetchOutcome::Passthrough);
        }
        if !self.is_active().await {
            debug!(url = %request.url, cache = %self.cache_name, "Worker not active, not intercepting");
            return Ok(FetchOutcome::Passthrough);
        }

        if let Some(response) = self.match_cached(&request.url).await? {
            debug!(url = %request.url, "Served from cache");
            return Ok(FetchOutcome::Respond(response));
        }

        match self.network.fetch(request).await {
            Ok(response) => Ok(FetchOutcome::Respond(response)),
            Err(err) => {
                warn!(url = %request.url, error = %err, "Network fetch failed, serving offline fallback");
                let fallback = {
                    let caches = self.env.caches.read().await;
                    caches
                        .match_url(&self.offline_fallback)
                        .map(FetchResponse::offline_fallback)
                        .transpose()?
                };
                match fallback {
                    Some(response) => {
                        self.env.emit(OfflineEvent::OfflineFallback {
                            url: request.url.to_string(),
                        });
                        Ok(FetchOutcome::Respond(response))
                    }
                    None => Err(OfflineError::OfflineFallbackMissing {
                        url: request.url.to_string(),
                    }),
                }
            }
        }
    }

    async fn match_cached(&self, url: &Url) -> Result<Option<FetchResponse>> {
        let caches = self.env.caches.read().await;
        caches.match_url(url).map(FetchResponse::from_cache).transpose()
    }

    async fn is_active(&self) -> bool {
        self.env
            .registration
            .read()
            .await
            .get_active()
            .is_some_and(|w| w.is_active() && w.cache_name == self.cache_name)
    }

    fn emit_state(&self, worker_id: WorkerId, new_state: WorkerState) {
        self.env.emit(OfflineEvent::StateChange {
            worker_id,
            cache_name: self.cache_name.clone(),
            new_state,
        });
    }
}
