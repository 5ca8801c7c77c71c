//! Catalog snapshot cache.
//!
//! Holds the latest snapshot behind an RwLock. Refresh replaces the whole
//! snapshot on success; a failed refresh keeps the previous snapshot so
//! search keeps answering against stale data.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use bazaar_core::error::Result;
use bazaar_core::types::CatalogSnapshot;

use crate::source::CatalogSource;

/// Shared, read-mostly holder of the current catalog snapshot.
///
/// Starts empty; all identities read the same snapshot.
#[derive(Debug, Default)]
pub struct CatalogCache {
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull a fresh snapshot from the source.
    ///
    /// On failure the previous snapshot is left intact and the error is
    /// returned after being logged; callers may ignore it and keep serving.
    pub fn refresh(&self, source: &dyn CatalogSource) -> Result<()> {
        match source.fetch() {
            Ok(snapshot) => {
                info!(
                    products = snapshot.products.len(),
                    categories = snapshot.categories.len(),
                    "Catalog refreshed"
                );
                let mut current = self
                    .snapshot
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                *current = Arc::new(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!("Catalog refresh failed, keeping previous snapshot: {}", e);
                Err(e)
            }
        }
    }

    /// The current snapshot. Cheap to call; clones an Arc.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Category names from the current snapshot.
    pub fn categories(&self) -> Vec<String> {
        self.snapshot().categories.clone()
    }
}
