//! Product catalog access for the bazaar engine.
//!
//! Provides the pull-based catalog source contract, the wholesale-replace
//! snapshot cache, category resolution from free text, and the search and
//! ranking engine over the cached snapshot.

pub mod cache;
pub mod category;
pub mod search;
pub mod source;

pub use cache::CatalogCache;
pub use category::CategoryFilter;
pub use search::SearchEngine;
pub use source::{CatalogSource, StaticSource};
