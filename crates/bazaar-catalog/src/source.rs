//! Catalog source contract.
//!
//! The engine never manages catalog persistence; it pulls point-in-time
//! snapshots from an externally owned source.

use bazaar_core::error::Result;
use bazaar_core::types::CatalogSnapshot;

/// A pull-based supplier of catalog snapshots.
///
/// `fetch` must be idempotent and safe to call repeatedly; each call
/// returns a complete snapshot (products plus category names).
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> Result<CatalogSnapshot>;
}

/// A source that always returns a fixed snapshot.
///
/// Used by tests and by hosts that load the catalog once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: CatalogSnapshot,
}

impl StaticSource {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }
}

impl CatalogSource for StaticSource {
    fn fetch(&self) -> Result<CatalogSnapshot> {
        Ok(self.snapshot.clone())
    }
}
