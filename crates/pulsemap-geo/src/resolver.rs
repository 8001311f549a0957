//! The resolver handle and its asynchronous load lifecycle.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use pulsemap_types::Attributes;
use tokio::task::JoinHandle;

use crate::dataset::{GeoEntry, GeoTable};
use crate::error::GeoError;

/// Best-effort origin-to-attributes lookup over a prefix table.
///
/// A fresh resolver is immediately usable but not ready: every lookup
/// returns `None` until [`load`](Self::load) has completed successfully.
/// Readiness flips exactly once; after that the table is shared read-only
/// across clones without locking.
#[derive(Debug, Clone, Default)]
pub struct GeoResolver {
    table: Arc<OnceLock<GeoTable>>,
}

impl GeoResolver {
    /// Creates a resolver with no dataset. All lookups return `None` until
    /// a dataset is loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a dataset has been loaded.
    pub fn is_ready(&self) -> bool {
        self.table.get().is_some()
    }

    /// Number of prefix rows in the loaded table, or 0 before readiness.
    pub fn entry_count(&self) -> usize {
        self.table.get().map(GeoTable::len).unwrap_or(0)
    }

    /// Resolves an origin to its attributes.
    ///
    /// Returns `None` when the dataset is not loaded yet, when the origin is
    /// not a parseable IP address, or when no prefix covers it. Never errors.
    pub fn resolve(&self, origin: &str) -> Option<Attributes> {
        let table = self.table.get()?;
        let ip: IpAddr = match origin.parse() {
            Ok(ip) => ip,
            Err(_) => {
                tracing::debug!(origin = %origin, "origin is not an IP address, skipping lookup");
                return None;
            }
        };
        table.lookup(ip).cloned()
    }

    /// Reads and parses the dataset file, then marks the resolver ready.
    ///
    /// Returns the number of rows loaded. Fails without changing readiness
    /// when the file cannot be read or parsed; fails with
    /// [`GeoError::AlreadyLoaded`] on a second call that raced a successful
    /// first load.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<usize, GeoError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let rows: Vec<GeoEntry> = serde_json::from_str(&raw)?;
        let table = GeoTable::from_rows(rows)?;
        let count = table.len();
        self.table.set(table).map_err(|_| GeoError::AlreadyLoaded)?;
        Ok(count)
    }

    /// Spawns the dataset load as a background task and logs the outcome.
    ///
    /// This is the intended startup path: the process comes up serving
    /// placeholders and upgrades to real attributes once the load finishes.
    /// A failed load is logged and leaves the resolver permanently
    /// unavailable.
    pub fn spawn_load(&self, path: PathBuf) -> JoinHandle<()> {
        let resolver = self.clone();
        tokio::spawn(async move {
            match resolver.load(&path).await {
                Ok(count) => {
                    tracing::info!(path = %path.display(), entries = count, "geo dataset loaded");
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "geo dataset unavailable, serving placeholders");
                }
            }
        })
    }
}
