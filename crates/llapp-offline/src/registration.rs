//! Worker versions, their registration slots and the pages they control.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{OfflineError, Result};

/// Unique identifier for a worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkerState {
    /// Created, nothing run yet.
    #[default]
    Parsed,
    /// Install hook running.
    Installing,
    /// Installed but waiting for activation.
    Installed,
    /// Activate hook running.
    Activating,
    /// Active and controlling pages.
    Activated,
    /// Replaced, or install failed.
    Redundant,
}

/// One version of the offline worker, identified by its cache generation.
#[derive(Debug, Clone)]
pub struct Worker {
    pub id: WorkerId,

    /// Cache generation this version installs and keeps.
    pub cache_name: String,

    pub state: WorkerState,

    /// Activate without waiting for pages controlled by the old version to close.
    pub skip_waiting: bool,

    /// Error message if install failed.
    pub error: Option<String>,

    /// Time of last state change.
    pub state_changed_at: Instant,
}

impl Worker {
    pub fn new(cache_name: &str) -> Self {
        Self {
            id: WorkerId::new(),
            cache_name: cache_name.to_string(),
            state: WorkerState::Parsed,
            skip_waiting: false,
            error: None,
            state_changed_at: Instant::now(),
        }
    }

    pub fn set_state(&mut self, state: WorkerState) {
        self.state = state;
        self.state_changed_at = Instant::now();
    }

    pub fn is_active(&self) -> bool {
        self.state == WorkerState::Activated
    }

    pub fn is_redundant(&self) -> bool {
        self.state == WorkerState::Redundant
    }
}

/// Redundant workers kept on a registration.
pub const MAX_RETIRED: usize = 8;

/// The installing, waiting and active slots for one scope.
#[derive(Debug)]
pub struct WorkerRegistration {
    /// Scope URL.
    pub scope: Url,

    /// Installing worker.
    pub installing: Option<Worker>,

    /// Waiting worker (installed but not active).
    pub waiting: Option<Worker>,

    /// Active worker.
    pub active: Option<Worker>,

    /// Workers that became redundant, most recent last, at most
    /// `MAX_RETIRED` of them.
    pub retired: Vec<Worker>,
}

impl WorkerRegistration {
    pub fn new(scope: Url) -> Self {
        Self {
            scope,
            installing: None,
            waiting: None,
            active: None,
            retired: Vec::new(),
        }
    }

    pub fn get_active(&self) -> Option<&Worker> {
        self.active.as_ref()
    }

    /// Put a new version in the installing slot. A version still installing
    /// is superseded.
    pub fn begin_install(&mut self, cache_name: &str) -> WorkerId {
        let mut worker = Worker::new(cache_name);
        worker.set_state(WorkerState::Installing);
        let id = worker.id;
        if let Some(previous) = self.installing.replace(worker) {
            self.retire(previous);
        }
        id
    }

    /// Whether `id` still holds the installing slot.
    pub fn is_installing(&self, id: WorkerId) -> bool {
        self.installing.as_ref().is_some_and(|w| w.id == id)
    }

    /// Transition worker `id` from installing to waiting.
    pub fn install_complete(&mut self, id: WorkerId) -> Result<()> {
        if !self.is_installing(id) {
            return Err(OfflineError::State(format!(
                "worker {} is no longer installing",
                id.raw()
            )));
        }
        let Some(mut worker) = self.installing.take() else {
            return Err(OfflineError::State("no worker is installing".to_string()));
        };
        worker.set_state(WorkerState::Installed);

        if let Some(previous) = self.waiting.replace(worker) {
            self.retire(previous);
        }
        Ok(())
    }

    /// Install of worker `id` failed: it becomes redundant and the active
    /// worker stays in control. Returns false if `id` had already been
    /// superseded by a newer install.
    pub fn install_failed(&mut self, id: WorkerId, error: impl Into<String>) -> bool {
        if !self.is_installing(id) {
            return false;
        }
        let Some(mut worker) = self.installing.take() else {
            return false;
        };
        worker.error = Some(error.into());
        self.retire(worker);
        true
    }

    /// Let the waiting worker activate without waiting for old clients.
    pub fn skip_waiting(&mut self) {
        if let Some(ref mut worker) = self.waiting {
            worker.skip_waiting = true;
        }
    }

    /// Whether the waiting worker may activate while `controlled_clients`
    /// pages are still controlled by the current active worker.
    pub fn can_activate(&self, controlled_clients: usize) -> bool {
        match self.waiting {
            Some(ref worker) => {
                worker.skip_waiting || self.active.is_none() || controlled_clients == 0
            }
            None => false,
        }
    }

    /// Move waiting worker `id` into the active slot in the Activating
    /// state. The previous active worker becomes redundant.
    pub fn begin_activation(&mut self, id: WorkerId) -> Result<()> {
        match self.waiting {
            Some(ref worker) if worker.id == id => {}
            Some(ref worker) => {
                return Err(OfflineError::State(format!(
                    "worker {} is not waiting (waiting: {} for {})",
                    id.raw(),
                    worker.id.raw(),
                    worker.cache_name
                )))
            }
            None => {
                return Err(OfflineError::State(
                    "no worker is waiting to activate".to_string(),
                ))
            }
        }
        let Some(mut worker) = self.waiting.take() else {
            return Err(OfflineError::State("no worker is waiting to activate".to_string()));
        };
        worker.set_state(WorkerState::Activating);

        if let Some(old) = self.active.replace(worker) {
            self.retire(old);
        }
        Ok(())
    }

    /// Finish activation of worker `id`.
    pub fn activation_complete(&mut self, id: WorkerId) -> Result<()> {
        match self.active {
            Some(ref mut worker) if worker.id == id && worker.state == WorkerState::Activating => {
                worker.set_state(WorkerState::Activated);
                Ok(())
            }
            _ => Err(OfflineError::State(format!(
                "worker {} is not activating",
                id.raw()
            ))),
        }
    }

    /// Keep the most recent redundant workers for inspection.
    fn retire(&mut self, mut worker: Worker) {
        worker.set_state(WorkerState::Redundant);
        self.retired.push(worker);
        if self.retired.len() > MAX_RETIRED {
            let excess = self.retired.len() - MAX_RETIRED;
            self.retired.drain(..excess);
        }
    }
}

// ==================== Clients ====================

/// A page within the scope.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: String,

    pub url: Url,

    /// Worker currently controlling the page.
    pub controller: Option<WorkerId>,
}

/// Open pages known to the worker environment.
#[derive(Debug, Default)]
pub struct Clients {
    clients: HashMap<String, Client>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Client> {
        self.clients.get(id)
    }

    /// Register a newly opened page. Pages opened before any worker is
    /// active start uncontrolled.
    pub fn open(&mut self, url: Url, controller: Option<WorkerId>) -> Client {
        let client = Client {
            id: format!("client-{}", next_client_number()),
            url,
            controller,
        };
        self.clients.insert(client.id.clone(), client.clone());
        client
    }

    pub fn remove(&mut self, id: &str) -> Option<Client> {
        self.clients.remove(id)
    }

    /// Take control of every open page. Returns the number of pages whose
    /// controller changed.
    pub fn claim(&mut self, worker: WorkerId) -> usize {
        let mut changed = 0;
        for client in self.clients.values_mut() {
            if client.controller != Some(worker) {
                client.controller = Some(worker);
                changed += 1;
            }
        }
        changed
    }

    /// Number of pages controlled by `worker`.
    pub fn controlled_by(&self, worker: WorkerId) -> usize {
        self.clients
            .values()
            .filter(|c| c.controller == Some(worker))
            .count()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

fn next_client_number() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
