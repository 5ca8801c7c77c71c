//! Category resolution from free text.
//!
//! Two disjoint keyword sets decide whether an utterance points at
//! Electronics or Clothing. Matching is word-boundary-safe, so "pc" does
//! not fire inside "epic". When both sets match, or neither does, no
//! filter is applied; ambiguity and absence are treated identically.

use std::sync::LazyLock;

use regex::Regex;

/// Product-type nouns that indicate the Electronics category.
pub static ELECTRONICS_KEYWORDS: &[&str] = &[
    "laptop",
    "laptops",
    "phone",
    "phones",
    "smartphone",
    "computer",
    "computers",
    "pc",
    "tablet",
    "tablets",
    "headphones",
    "earbuds",
    "camera",
    "cameras",
    "tv",
    "television",
    "monitor",
    "monitors",
    "keyboard",
    "mouse",
    "speaker",
    "speakers",
    "console",
    "charger",
    "electronics",
    "gadget",
    "gadgets",
];

/// Product-type nouns that indicate the Clothing category.
pub static CLOTHING_KEYWORDS: &[&str] = &[
    "shirt",
    "shirts",
    "t-shirt",
    "tshirt",
    "pants",
    "jeans",
    "dress",
    "dresses",
    "jacket",
    "jackets",
    "coat",
    "shoes",
    "sneakers",
    "boots",
    "socks",
    "hat",
    "hats",
    "hoodie",
    "sweater",
    "shorts",
    "skirt",
    "clothing",
    "clothes",
    "apparel",
    "outfit",
];

fn keyword_alternation(keywords: &[&str]) -> Regex {
    let alts: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alts.join("|"))).expect("Invalid keyword regex")
}

static ELECTRONICS_RE: LazyLock<Regex> =
    LazyLock::new(|| keyword_alternation(ELECTRONICS_KEYWORDS));

static CLOTHING_RE: LazyLock<Regex> = LazyLock::new(|| keyword_alternation(CLOTHING_KEYWORDS));

/// A resolved category filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    Electronics,
    Clothing,
}

impl CategoryFilter {
    /// The canonical catalog category name.
    pub fn name(&self) -> &'static str {
        match self {
            CategoryFilter::Electronics => "Electronics",
            CategoryFilter::Clothing => "Clothing",
        }
    }

    /// Resolve a filter from free text.
    ///
    /// Exactly one keyword set must match; both or neither yields `None`.
    pub fn resolve(text: &str) -> Option<CategoryFilter> {
        let electronics = ELECTRONICS_RE.is_match(text);
        let clothing = CLOTHING_RE.is_match(text);
        match (electronics, clothing) {
            (true, false) => Some(CategoryFilter::Electronics),
            (false, true) => Some(CategoryFilter::Clothing),
            _ => None,
        }
    }

    /// Whether a product's category tag satisfies this filter, directly or
    /// through the fixed synonym table.
    pub fn matches(&self, product_category: &str) -> bool {
        let category = product_category.to_lowercase();
        if category == self.name().to_lowercase() {
            return true;
        }
        self.synonyms().contains(&category.as_str())
    }

    fn synonyms(&self) -> &'static [&'static str] {
        match self {
            CategoryFilter::Electronics => &["gaming", "tech"],
            CategoryFilter::Clothing => &[
                "shirts", "pants", "shoes", "footwear", "apparel", "fashion",
            ],
        }
    }
}
