//! Reply generation.
//!
//! Builds a structured [`Reply`] for a classified utterance: one branch per
//! intent, each reading the extracted price range and entities and calling
//! into the search engine. Product replies never carry an empty list; the
//! empty-result branches fall back to category or trending picks instead.

use std::sync::{Arc, LazyLock};

use rand::seq::SliceRandom;
use regex::Regex;

use bazaar_catalog::category::CategoryFilter;
use bazaar_catalog::{CatalogCache, SearchEngine};
use bazaar_core::config::SearchConfig;
use bazaar_core::error::Result;
use bazaar_core::types::{Intent, PriceRange, Reply};

use crate::parser::{extract_entities, extract_price_range};

// =============================================================================
// Fixed copy
// =============================================================================

/// Greeting pool. Live greetings pick randomly; seeded conversations always
/// open with the first entry so session loads stay deterministic.
pub static GREETING_POOL: &[&str] = &[
    "Hi there! What can I help you find today?",
    "Hello! Looking for anything in particular?",
    "Hey! Tell me what you're shopping for and I'll pull up some options.",
    "Welcome! Ask me about products, prices, or what's in stock.",
];

/// The assistant message every fresh conversation is seeded with.
pub fn seeded_greeting() -> &'static str {
    GREETING_POOL[0]
}

/// Fixed reply sent when reply generation itself fails.
pub static FAILURE_ESCALATION: &str =
    "I'm having trouble answering right now. Would you like me to connect you with a human agent?";

static HELP_TEXT: &str = "I can help you find products, compare options, check prices, and see \
     what's in stock. Try something like \"find wireless headphones\", \
     \"compare laptops\", or \"is the hoodie in stock?\".";

static HUMAN_REQUEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:human|agent|person|representative|real\s+person|customer\s+service|operator|someone\s+from\s+support)\b",
    )
    .unwrap()
});

fn default_suggestions() -> Vec<String> {
    vec![
        "Show me what's trending".to_string(),
        "Browse categories".to_string(),
        "Find a laptop under $900".to_string(),
        "Help".to_string(),
    ]
}

fn help_suggestions() -> Vec<String> {
    vec![
        "Find wireless headphones".to_string(),
        "Compare laptops".to_string(),
        "What's in stock?".to_string(),
    ]
}

// =============================================================================
// ResponseGenerator
// =============================================================================

/// Builds replies from classified utterances and search results.
pub struct ResponseGenerator {
    search: SearchEngine,
    cache: Arc<CatalogCache>,
    config: SearchConfig,
}

impl ResponseGenerator {
    pub fn new(search: SearchEngine, cache: Arc<CatalogCache>, config: SearchConfig) -> Self {
        Self {
            search,
            cache,
            config,
        }
    }

    /// Build the reply for one utterance.
    ///
    /// Fallible by contract: any failure is converted by the engine into the
    /// fixed escalation reply rather than surfacing to the shopper.
    pub fn generate(&self, utterance: &str, intent: Intent) -> Result<Reply> {
        let price_range = extract_price_range(utterance);
        let reply = match intent {
            Intent::Greeting => self.greeting(),
            Intent::ProductSearch => self.product_search(utterance, price_range.as_ref()),
            Intent::CategoryBrowse => self.category_browse(utterance),
            Intent::PriceInquiry => self.price_inquiry(utterance, price_range.as_ref()),
            Intent::Comparison => self.comparison(utterance, price_range.as_ref()),
            Intent::Availability => self.availability(utterance, price_range.as_ref()),
            Intent::Help => self.help(),
            Intent::General => self.general(utterance, price_range.as_ref()),
        };
        Ok(reply)
    }

    // -----------------------------------------------------------------
    // Intent branches
    // -----------------------------------------------------------------

    fn greeting(&self) -> Reply {
        let message = GREETING_POOL
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_else(seeded_greeting);
        Reply::text(message, default_suggestions())
    }

    fn product_search(&self, utterance: &str, price_range: Option<&PriceRange>) -> Reply {
        let results = self
            .search
            .search(utterance, self.config.default_limit, price_range);

        if !results.is_empty() {
            let mut message = format!(
                "I found {} {}",
                results.len(),
                plural(results.len(), "product", "products")
            );
            if let Some(filter) = CategoryFilter::resolve(utterance) {
                message.push_str(&format!(" in {}", filter.name()));
            }
            if let Some(range) = price_range {
                message.push(' ');
                message.push_str(&range.describe());
            }
            message.push('.');
            return Reply::products(message, results);
        }

        self.no_match_fallback(utterance)
    }

    fn category_browse(&self, utterance: &str) -> Reply {
        let entities = extract_entities(utterance);
        if !entities.is_empty() {
            if let Some(filter) = CategoryFilter::resolve(utterance) {
                let results = self
                    .search
                    .by_category(filter.name(), self.config.default_limit);
                if !results.is_empty() {
                    return Reply::products(
                        format!("Here are our top picks in {}:", filter.name()),
                        results,
                    );
                }
            }
        }

        let categories = self.cache.categories();
        let message = if categories.is_empty() {
            "We're restocking the shelves right now. Check back shortly!".to_string()
        } else {
            format!("You can browse these categories: {}.", categories.join(", "))
        };
        Reply::text(message, default_suggestions())
    }

    fn price_inquiry(&self, utterance: &str, price_range: Option<&PriceRange>) -> Reply {
        let results = self
            .search
            .search(utterance, self.config.default_limit, price_range);

        if results.is_empty() {
            return Reply::text(
                "What kind of product are you curious about? Name one and I'll check prices.",
                default_suggestions(),
            );
        }

        let top: Vec<_> = results.into_iter().take(self.config.price_top_n).collect();
        let mean = top.iter().map(|p| p.price).sum::<f64>() / top.len() as f64;
        Reply::products(
            format!(
                "Prices for matching {} average ${:.2}. A few options:",
                plural(top.len(), "product", "products"),
                mean
            ),
            top,
        )
    }

    fn comparison(&self, utterance: &str, price_range: Option<&PriceRange>) -> Reply {
        let results = self
            .search
            .search(utterance, self.config.comparison_limit, price_range);

        if results.len() >= 2 {
            Reply::products(
                format!(
                    "Here are {} options side by side - compare these:",
                    results.len()
                ),
                results,
            )
        } else {
            Reply::text(
                "Which products would you like to compare? Give me two names or a product type.",
                default_suggestions(),
            )
        }
    }

    fn availability(&self, utterance: &str, price_range: Option<&PriceRange>) -> Reply {
        let results = self
            .search
            .search(utterance, self.config.default_limit, price_range);
        let found_any = !results.is_empty();
        let in_stock: Vec<_> = results
            .into_iter()
            .filter(|p| p.count_in_stock > 0)
            .collect();

        if !in_stock.is_empty() {
            Reply::products(
                format!(
                    "{} of these {} in stock right now:",
                    in_stock.len(),
                    plural(in_stock.len(), "is", "are")
                ),
                in_stock,
            )
        } else if found_any {
            Reply::text(
                "Those are currently out of stock. Want me to suggest similar alternatives?",
                default_suggestions(),
            )
        } else {
            Reply::text(
                "Which product should I check stock for?",
                default_suggestions(),
            )
        }
    }

    fn help(&self) -> Reply {
        Reply::text(HELP_TEXT, help_suggestions())
    }

    fn general(&self, utterance: &str, price_range: Option<&PriceRange>) -> Reply {
        if HUMAN_REQUEST_RE.is_match(utterance) {
            return Reply::escalate(
                "Of course - let me connect you with a member of our team. One moment.",
            );
        }

        let results = self
            .search
            .search(utterance, self.config.general_limit, price_range);
        if !results.is_empty() {
            return Reply::products(
                "I'm not completely sure what you're after, but these might be close:",
                results,
            );
        }

        Reply::text(
            "I didn't quite catch that. You can ask me to find products, compare options, or check prices.",
            default_suggestions(),
        )
    }

    // -----------------------------------------------------------------
    // Fallbacks
    // -----------------------------------------------------------------

    /// Empty search results: prefer category picks, then trending, and only
    /// answer with text when the catalog itself has nothing to offer.
    fn no_match_fallback(&self, utterance: &str) -> Reply {
        if let Some(filter) = CategoryFilter::resolve(utterance) {
            let picks = self
                .search
                .by_category(filter.name(), self.config.default_limit);
            if !picks.is_empty() {
                return Reply::products(
                    format!(
                        "I couldn't find an exact match, but here are popular picks from {}:",
                        filter.name()
                    ),
                    picks,
                );
            }
        }

        let trending = self.search.trending(self.config.default_limit);
        if !trending.is_empty() {
            return Reply::products(
                "I couldn't find an exact match. Here's what other shoppers are loving:",
                trending,
            );
        }

        Reply::text(
            "I couldn't find anything matching that. Could you try different words?",
            default_suggestions(),
        )
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

// =============================================================================
// Tests
// =============================================================================
