//! Product search and ranking over the cached catalog snapshot.
//!
//! Scores candidates per search term across name, category, brand, and
//! description, with deterministic tie-breaks (rating, then price), so a
//! fixed snapshot and query always produce the same ordered result.

use std::sync::Arc;

use bazaar_core::types::{PriceRange, Product};

use crate::cache::CatalogCache;
use crate::category::CategoryFilter;

// Words stripped from queries before term matching: comparison and currency
// vocabulary that belongs to price extraction, not product relevance.
static PRICE_WORDS: &[&str] = &[
    "under", "below", "over", "above", "between", "less", "more", "than", "max", "maximum", "min",
    "minimum", "budget", "around", "about", "dollar", "dollars", "bucks", "usd", "price", "prices",
    "priced", "cost", "costs", "cheap", "cheaper", "cheapest", "expensive", "affordable",
];

// Generic filler stripped alongside price tokens; none of these words ever
// name a product.
static STOP_WORDS: &[&str] = &[
    "a", "an", "the", "i", "im", "me", "my", "we", "us", "you", "your", "it", "is", "are", "was",
    "be", "do", "does", "did", "can", "could", "would", "should", "will", "please", "for", "to",
    "of", "in", "on", "at", "by", "with", "and", "or", "some", "any", "show", "find", "looking",
    "look", "searching", "search", "want", "wanted", "need", "needed", "buy", "purchase", "get",
    "have", "has", "recommend", "suggest", "suggestion", "suggestions", "what", "whats", "which",
    "how", "much", "many", "something", "anything", "good", "best", "new", "help", "hi", "hello",
    "hey",
];

// Relevance weights per matched field.
const NAME_WEIGHT: u32 = 10;
const NAME_WORD_BONUS: u32 = 15;
const CATEGORY_WEIGHT: u32 = 8;
const BRAND_WEIGHT: u32 = 6;
const DESCRIPTION_WEIGHT: u32 = 3;
const DESCRIPTION_WORD_BONUS: u32 = 2;

/// Search and ranking engine over a shared [`CatalogCache`].
#[derive(Debug, Clone)]
pub struct SearchEngine {
    cache: Arc<CatalogCache>,
}

impl SearchEngine {
    pub fn new(cache: Arc<CatalogCache>) -> Self {
        Self { cache }
    }

    /// Rank products relevant to a free-text query.
    ///
    /// Price tokens are stripped from the query to form search terms; the
    /// category filter is resolved from the original text. An utterance
    /// with no usable terms delegates to [`SearchEngine::trending`].
    pub fn search(
        &self,
        text: &str,
        limit: usize,
        price_range: Option<&PriceRange>,
    ) -> Vec<Product> {
        let terms = extract_terms(text);
        if terms.is_empty() {
            return self.trending(limit);
        }

        let filter = CategoryFilter::resolve(text);
        let snapshot = self.cache.snapshot();

        let mut scored: Vec<(u32, &Product)> = snapshot
            .products
            .iter()
            .filter(|p| p.is_active)
            .filter(|p| price_range.is_none_or(|range| range.contains(p.price)))
            .filter(|p| filter.is_none_or(|f| f.matches(&p.category)))
            .filter_map(|p| {
                let score = score_product(p, &terms);
                (score > 0).then_some((score, p))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.rating.total_cmp(&a.1.rating))
                .then_with(|| a.1.price.total_cmp(&b.1.price))
        });

        scored.into_iter().take(limit).map(|(_, p)| p.clone()).collect()
    }

    /// Active products in a category (case-insensitive), best-rated first.
    pub fn by_category(&self, category: &str, limit: usize) -> Vec<Product> {
        let snapshot = self.cache.snapshot();
        let mut products: Vec<Product> = snapshot
            .products
            .iter()
            .filter(|p| p.is_active && p.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect();

        products.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.price.total_cmp(&b.price))
        });
        products.truncate(limit);
        products
    }

    /// Active products by review momentum (`rating * num_reviews`).
    pub fn trending(&self, limit: usize) -> Vec<Product> {
        let snapshot = self.cache.snapshot();
        let mut products: Vec<Product> = snapshot
            .products
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect();

        products.sort_by(|a, b| {
            let momentum_a = a.rating * f64::from(a.num_reviews);
            let momentum_b = b.rating * f64::from(b.num_reviews);
            momentum_b
                .total_cmp(&momentum_a)
                .then_with(|| a.price.total_cmp(&b.price))
        });
        products.truncate(limit);
        products
    }
}

// =============================================================================
// Term extraction and scoring
// =============================================================================

/// Split a query into lowercase search terms, dropping price tokens,
/// numbers, and filler words.
pub fn extract_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|w| {
            let clean = w
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if clean.len() < 2 {
                return None;
            }
            if is_numeric_token(&clean) {
                return None;
            }
            if PRICE_WORDS.contains(&clean.as_str()) {
                return None;
            }
            if STOP_WORDS.contains(&clean.as_str()) {
                return None;
            }
            Some(clean)
        })
        .collect()
}

/// An amount-like token: digits with optional thousands separators and cents.
fn is_numeric_token(token: &str) -> bool {
    !token.is_empty()
        && token.chars().next().is_some_and(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

/// Accumulate the relevance score of a product over all search terms.
///
/// Substring matches count everywhere (tolerates partial product names);
/// whole-word matches earn the extra name/description bonuses.
fn score_product(product: &Product, terms: &[String]) -> u32 {
    let name = product.name.to_lowercase();
    let category = product.category.to_lowercase();
    let brand = product.brand.to_lowercase();
    let description = product.description.to_lowercase();

    let mut score = 0;
    for term in terms {
        if name.contains(term.as_str()) {
            score += NAME_WEIGHT;
            if contains_word(&name, term) {
                score += NAME_WORD_BONUS;
            }
        }
        if category.contains(term.as_str()) {
            score += CATEGORY_WEIGHT;
        }
        if brand.contains(term.as_str()) {
            score += BRAND_WEIGHT;
        }
        if description.contains(term.as_str()) {
            score += DESCRIPTION_WEIGHT;
            if contains_word(&description, term) {
                score += DESCRIPTION_WORD_BONUS;
            }
        }
    }
    score
}

/// Whether `needle` occurs in `haystack` bounded by non-alphanumerics.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = start + needle.len().max(1);
    }
    false
}

// =============================================================================
// Tests
// =============================================================================
