//! Best-effort persistence off the request path.

use crate::error::{Error, Result};
use crate::store::record::UploadRecord;
use std::sync::Arc;
use tracing::{debug, warn};

/// Destination for classified uploads.
///
/// Implementations are synchronous; the [`Recorder`] invokes them off the
/// request path and a failure is logged rather than surfaced.
pub trait PredictionStore: Send + Sync {
    /// Store name used in logs.
    fn name(&self) -> &'static str;

    /// Persist one record.
    fn save(&self, record: &UploadRecord) -> Result<()>;
}

/// Hands records to a store without blocking classification.
///
/// Owns a single-worker runtime so saves run detached; dropping the
/// recorder shuts the runtime down.
pub struct Recorder {
    store: Arc<dyn PredictionStore>,
    runtime: tokio::runtime::Runtime,
}

impl Recorder {
    /// Build a recorder around a store.
    pub fn new(store: Arc<dyn PredictionStore>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("anura-store")
            .enable_all()
            .build()
            .map_err(|e| Error::Internal {
                message: format!("Failed to create store runtime: {e}"),
            })?;
        Ok(Self { store, runtime })
    }

    /// Queue a record for persistence and return immediately.
    pub fn record(&self, record: UploadRecord) {
        let store = Arc::clone(&self.store);
        debug!(
            store = store.name(),
            filename = %record.storage_filename,
            "queueing prediction record"
        );
        self.runtime.spawn_blocking(move || {
            if let Err(e) = store.save(&record) {
                warn!(
                    store = store.name(),
                    "failed to persist prediction record: {e}"
                );
            }
        });
    }
}
