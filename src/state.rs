use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::data::acceptance::AcceptanceStore;
use crate::services::backend_service::BackendHandle;
use crate::services::task_client::TaskClient;

pub struct AppState {
    /// Exclusively owned backend process reference; taken once on shutdown.
    pub backend: Mutex<Option<BackendHandle>>,
    pub client: TaskClient,
    pub acceptance: AcceptanceStore,
    scan_cancel_flag: Arc<AtomicBool>,
    scan_active: AtomicBool,
}

impl AppState {
    pub fn new(client: TaskClient, acceptance: AcceptanceStore) -> Self {
        Self {
            backend: Mutex::new(None),
            client,
            acceptance,
            scan_cancel_flag: Arc::new(AtomicBool::new(false)),
            scan_active: AtomicBool::new(false),
        }
    }

    pub fn set_backend(&self, handle: BackendHandle) {
        *self
            .backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
    }

    pub fn take_backend(&self) -> Option<BackendHandle> {
        self.backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Claims the single poller slot and hands back a cleared cancel flag.
    /// Returns None when a poll loop is already active so two concurrent
    /// bootstraps cannot race into duplicate pollers.
    pub fn begin_scan_poll(&self) -> Option<Arc<AtomicBool>> {
        if self.scan_active.swap(true, Ordering::AcqRel) {
            return None;
        }
        self.scan_cancel_flag.store(false, Ordering::Relaxed);
        Some(self.scan_cancel_flag.clone())
    }

    pub fn end_scan_poll(&self) {
        self.scan_active.store(false, Ordering::Release);
    }

    pub fn cancel_scan_poll(&self) {
        self.scan_cancel_flag.store(true, Ordering::Relaxed);
    }
}
