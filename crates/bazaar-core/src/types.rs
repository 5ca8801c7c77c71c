use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Catalog
// =============================================================================

/// A single product from the catalog source.
///
/// Products are externally owned and read-only: the engine never mutates
/// them, and never surfaces one whose `is_active` flag is false.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Product {
    /// Catalog identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category tag (e.g. "Electronics").
    pub category: String,
    /// Brand name.
    pub brand: String,
    /// Free-text description.
    pub description: String,
    /// Unit price, non-negative.
    pub price: f64,
    /// Units currently in stock.
    pub count_in_stock: u32,
    /// Average review rating, 0 to 5.
    pub rating: f64,
    /// Number of reviews behind the rating.
    pub num_reviews: u32,
    /// Whether the product may be surfaced at all.
    pub is_active: bool,
}

/// A point-in-time view of the catalog.
///
/// Created empty at engine start and replaced wholesale on refresh; never
/// partially mutated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub categories: Vec<String>,
}

// =============================================================================
// Conversation
// =============================================================================

/// Who produced a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

/// A single conversation entry. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub author: Author,
    pub body: String,
    /// Epoch seconds.
    pub timestamp: i64,
    /// Products attached to an assistant reply; empty when none.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Whether the user message came from tapping a suggestion chip.
    #[serde(default)]
    pub from_suggestion: bool,
}

impl Message {
    /// Build a message stamped with the current time.
    pub fn now(author: Author, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            body: body.into(),
            timestamp: Utc::now().timestamp(),
            products: Vec::new(),
            from_suggestion: false,
        }
    }

    /// Build an assistant message carrying attached products.
    pub fn with_products(body: impl Into<String>, products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::now(Author::Assistant, body)
        }
    }
}

/// Per-identity conversation state.
///
/// `messages` is append-only and chronological. Seeded with a single
/// assistant greeting when no prior stored state exists for an identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub has_interacted: bool,
    pub should_escalate: bool,
}

// =============================================================================
// Identity
// =============================================================================

/// The identity a conversation is stored under.
///
/// Anonymous visitors share the `guest` sentinel; signed-in users get their
/// own key. No two identities share stored state except through the
/// one-time guest migration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Guest,
    User(String),
}

impl Identity {
    /// The string this identity's storage keys are derived from.
    pub fn storage_key(&self) -> &str {
        match self {
            Identity::Guest => "guest",
            Identity::User(id) => id,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }
}

impl Default for Identity {
    fn default() -> Self {
        Identity::Guest
    }
}

// =============================================================================
// Query artifacts
// =============================================================================

/// An extracted price constraint. An absent bound is unconstrained.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn max(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn min(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether a price satisfies both bounds.
    pub fn contains(&self, price: f64) -> bool {
        if let Some(min) = self.min {
            if price < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if price > max {
                return false;
            }
        }
        true
    }

    /// Human-readable rendering for reply templates.
    pub fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("between ${:.0} and ${:.0}", min, max),
            (Some(min), None) => format!("over ${:.0}", min),
            (None, Some(max)) => format!("under ${:.0}", max),
            (None, None) => String::new(),
        }
    }
}

/// Classified purpose of a single utterance.
///
/// The variant order is the classification order: the parser scans this
/// vocabulary top to bottom and the first matching intent wins, so a phrase
/// present in two keyword lists always resolves to the earlier variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    ProductSearch,
    CategoryBrowse,
    PriceInquiry,
    Comparison,
    Availability,
    Help,
    /// Fallback when no keyword list matches.
    General,
}

// =============================================================================
// Replies
// =============================================================================

/// The shape of an assistant reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Plain text, possibly with suggestion chips.
    Text,
    /// Text plus a non-empty product list.
    ProductSuggestions,
    /// Hand the conversation to a human operator.
    EscalateToAdmin,
}

/// A structured assistant reply.
///
/// Invariant: `kind == ProductSuggestions` implies `products` is non-empty;
/// empty-result branches fall back to trending or category listings instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
    pub kind: ReplyKind,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Reply {
    /// A plain text reply with suggestion chips.
    pub fn text(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            message: message.into(),
            kind: ReplyKind::Text,
            products: Vec::new(),
            suggestions,
        }
    }

    /// A product-suggestions reply. `products` must be non-empty.
    pub fn products(message: impl Into<String>, products: Vec<Product>) -> Self {
        debug_assert!(!products.is_empty(), "product reply with no products");
        Self {
            message: message.into(),
            kind: ReplyKind::ProductSuggestions,
            products,
            suggestions: Vec::new(),
        }
    }

    /// An escalation reply.
    pub fn escalate(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ReplyKind::EscalateToAdmin,
            products: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
