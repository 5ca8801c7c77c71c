//! Utterance parsing.
//!
//! Classifies intent against a fixed, ordered vocabulary and extracts price
//! ranges and category entities from raw shopper input. Everything here is
//! pure: no catalog or session state, no I/O.

use std::sync::LazyLock;

use regex::Regex;

use bazaar_core::types::{Intent, PriceRange};
use bazaar_catalog::category::{CLOTHING_KEYWORDS, ELECTRONICS_KEYWORDS};

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

struct IntentPatterns {
    greeting: Vec<Regex>,
    product_search: Vec<Regex>,
    category_browse: Vec<Regex>,
    price_inquiry: Vec<Regex>,
    comparison: Vec<Regex>,
    availability: Vec<Regex>,
    help: Vec<Regex>,
}

static INTENT_PATTERNS: LazyLock<IntentPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    IntentPatterns {
        greeting: mk(&[
            r"(?i)\bhello\b",
            r"(?i)\bhi\b",
            r"(?i)\bhey\b",
            r"(?i)\bhowdy\b",
            r"(?i)\bgreetings\b",
            r"(?i)\bgood\s+(?:morning|afternoon|evening)\b",
        ]),
        product_search: mk(&[
            r"(?i)\blooking\s+for\b",
            r"(?i)\bshow\s+me\b",
            r"(?i)\bfind\b",
            r"(?i)\bsearch(?:ing)?\b",
            r"(?i)\bi\s+(?:want|need)\b",
            r"(?i)\bbuy(?:ing)?\b",
            r"(?i)\bpurchase\b",
            r"(?i)\brecommend\b",
            r"(?i)\bsuggest\b",
            r"(?i)\bdo\s+you\s+have\b",
            r"(?i)\bshop(?:ping)?\s+for\b",
        ]),
        category_browse: mk(&[
            r"(?i)\bcategor(?:y|ies)\b",
            r"(?i)\bbrowse\b",
            r"(?i)\bwhat\s+do\s+you\s+sell\b",
            r"(?i)\bwhat\s+kinds?\s+of\b",
            r"(?i)\btypes\s+of\b",
            r"(?i)\bdepartments?\b",
            r"(?i)\bselection\b",
        ]),
        price_inquiry: mk(&[
            r"(?i)\bhow\s+much\b",
            r"(?i)\bprice[sd]?\b",
            r"(?i)\bcost[s]?\b",
            r"(?i)\bexpensive\b",
            r"(?i)\bcheap(?:er|est)?\b",
            r"(?i)\baffordable\b",
            r"(?i)\bbudget\b",
        ]),
        comparison: mk(&[
            r"(?i)\bcompare\b",
            r"(?i)\bcomparison\b",
            r"(?i)\bdifference\b",
            r"(?i)\bversus\b",
            r"(?i)\bvs\.?\b",
            r"(?i)\bwhich\s+(?:one\s+)?is\s+better\b",
            r"(?i)\bbetter\b",
        ]),
        availability: mk(&[
            r"(?i)\bin\s+stock\b",
            r"(?i)\bavailab(?:le|ility)\b",
            r"(?i)\bstock\b",
            r"(?i)\binventory\b",
            r"(?i)\bsold\s+out\b",
        ]),
        help: mk(&[
            r"(?i)\bhelp\b",
            r"(?i)\bhow\s+do\s+(?:i|you)\b",
            r"(?i)\bhow\s+does\s+this\s+work\b",
            r"(?i)\bsupport\b",
            r"(?i)\bfaq\b",
            r"(?i)\bassist(?:ance)?\b",
        ]),
    }
});

// Price extraction patterns. An amount is digits with optional thousands
// separators and optional cents.
const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)";

static UNDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:under|below|less\s+than|maximum\s+of)\s*\$?\s*{}",
        AMOUNT
    ))
    .unwrap()
});

static OVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:over|above|more\s+than|minimum\s+of)\s*\$?\s*{}",
        AMOUNT
    ))
    .unwrap()
});

static BETWEEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bbetween\s*\$?\s*{}\s*(?:and|to|-)\s*\$?\s*{}",
        AMOUNT, AMOUNT
    ))
    .unwrap()
});

static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\$?\s*{}\s*(?:-|to)\s*\$?\s*{}", AMOUNT, AMOUNT)).unwrap()
});

static BARE_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:\${}|{}\s*dollars?\b)", AMOUNT, AMOUNT)).unwrap()
});

static BUDGET_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:budget|under|below|less|maximum|max)\b").unwrap());

// =============================================================================
// Intent classification
// =============================================================================

/// Classify an utterance against the fixed intent vocabulary.
///
/// Scans the vocabulary in canonical order and returns the FIRST intent
/// whose pattern list matches; the ordering is a contract, so a phrase in
/// two lists always resolves to the earlier intent. Falls back to
/// [`Intent::General`].
pub fn classify_intent(utterance: &str) -> Intent {
    let pats = &*INTENT_PATTERNS;

    let vocabulary: [(&[Regex], Intent); 7] = [
        (&pats.greeting, Intent::Greeting),
        (&pats.product_search, Intent::ProductSearch),
        (&pats.category_browse, Intent::CategoryBrowse),
        (&pats.price_inquiry, Intent::PriceInquiry),
        (&pats.comparison, Intent::Comparison),
        (&pats.availability, Intent::Availability),
        (&pats.help, Intent::Help),
    ];

    for (patterns, intent) in vocabulary {
        if patterns.iter().any(|re| re.is_match(utterance)) {
            return intent;
        }
    }

    Intent::General
}

// =============================================================================
// Price extraction
// =============================================================================

/// Extract a price constraint from an utterance, if one is present.
///
/// Patterns apply in precedence order and exactly one fires:
/// 1. `under|below|less than|maximum of N` sets a maximum;
/// 2. `over|above|more than|minimum of N` sets a minimum;
/// 3. `between A and B` (or `A - B` / `A to B`) sets both bounds;
/// 4. a bare `$N` / `N dollars` is a maximum when budget wording is nearby,
///    otherwise an approximate target widened by 20% each way.
pub fn extract_price_range(utterance: &str) -> Option<PriceRange> {
    if let Some(caps) = UNDER_RE.captures(utterance) {
        let amount = parse_amount(caps.get(1)?.as_str())?;
        return Some(PriceRange::max(amount));
    }

    if let Some(caps) = OVER_RE.captures(utterance) {
        let amount = parse_amount(caps.get(1)?.as_str())?;
        return Some(PriceRange::min(amount));
    }

    if let Some(caps) = BETWEEN_RE.captures(utterance) {
        let a = parse_amount(caps.get(1)?.as_str())?;
        let b = parse_amount(caps.get(2)?.as_str())?;
        return Some(PriceRange::between(a.min(b), a.max(b)));
    }

    if let Some(caps) = SPAN_RE.captures(utterance) {
        let a = parse_amount(caps.get(1)?.as_str())?;
        let b = parse_amount(caps.get(2)?.as_str())?;
        return Some(PriceRange::between(a.min(b), a.max(b)));
    }

    if let Some(caps) = BARE_AMOUNT_RE.captures(utterance) {
        let matched = caps.get(1).or_else(|| caps.get(2))?;
        let amount = parse_amount(matched.as_str())?;
        if BUDGET_HINT_RE.is_match(utterance) {
            return Some(PriceRange::max(amount));
        }
        // Approximate target: widen to a 20% band either side.
        return Some(PriceRange::between(amount * 0.8, amount * 1.2));
    }

    None
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

// =============================================================================
// Entity extraction
// =============================================================================

/// Collect the category-noun keywords present in an utterance.
///
/// Used by the category-browse branch to decide whether the shopper named a
/// product type at all.
pub fn extract_entities(utterance: &str) -> Vec<String> {
    static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
        let alts: Vec<String> = ELECTRONICS_KEYWORDS
            .iter()
            .chain(CLOTHING_KEYWORDS.iter())
            .map(|k| regex::escape(k))
            .collect();
        Regex::new(&format!(r"(?i)\b(?:{})\b", alts.join("|"))).unwrap()
    });

    let mut entities: Vec<String> = Vec::new();
    for m in ENTITY_RE.find_iter(utterance) {
        let entity = m.as_str().to_lowercase();
        if !entities.contains(&entity) {
            entities.push(entity);
        }
    }
    entities
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Intent classification: greeting ----

    #[test]
    fn test_intent_hello() {
        assert_eq!(classify_intent("hello"), Intent::Greeting);
    }

    #[test]
    fn test_intent_hi_there() {
        assert_eq!(classify_intent("hi there"), Intent::Greeting);
    }

    #[test]
    fn test_intent_good_morning() {
        assert_eq!(classify_intent("good morning"), Intent::Greeting);
    }

    #[test]
    fn test_intent_hi_word_boundary() {
        // "hi" must not fire inside "shirt".
        assert_eq!(classify_intent("a shirt in medium"), Intent::General);
    }

    // ---- Intent classification: product search ----

    #[test]
    fn test_intent_looking_for() {
        assert_eq!(classify_intent("looking for a laptop"), Intent::ProductSearch);
    }

    #[test]
    fn test_intent_show_me() {
        assert_eq!(classify_intent("show me jackets"), Intent::ProductSearch);
    }

    #[test]
    fn test_intent_find() {
        assert_eq!(classify_intent("find wireless earbuds"), Intent::ProductSearch);
    }

    #[test]
    fn test_intent_i_need() {
        assert_eq!(classify_intent("I need a phone case"), Intent::ProductSearch);
    }

    #[test]
    fn test_intent_recommend() {
        assert_eq!(classify_intent("recommend a camera"), Intent::ProductSearch);
    }

    #[test]
    fn test_intent_do_you_have() {
        assert_eq!(classify_intent("do you have sneakers"), Intent::ProductSearch);
    }

    // ---- Intent classification: category browse ----

    #[test]
    fn test_intent_categories() {
        assert_eq!(classify_intent("what categories are there"), Intent::CategoryBrowse);
    }

    #[test]
    fn test_intent_browse() {
        assert_eq!(classify_intent("let me browse electronics"), Intent::CategoryBrowse);
    }

    #[test]
    fn test_intent_what_do_you_sell() {
        assert_eq!(classify_intent("what do you sell"), Intent::CategoryBrowse);
    }

    // ---- Intent classification: price inquiry ----

    #[test]
    fn test_intent_how_much() {
        assert_eq!(classify_intent("how much is a tablet"), Intent::PriceInquiry);
    }

    #[test]
    fn test_intent_price() {
        assert_eq!(classify_intent("what's the price of headphones"), Intent::PriceInquiry);
    }

    #[test]
    fn test_intent_cheap() {
        assert_eq!(classify_intent("any cheap monitors"), Intent::PriceInquiry);
    }

    // ---- Intent classification: comparison ----

    #[test]
    fn test_intent_compare() {
        assert_eq!(classify_intent("compare these two laptops"), Intent::Comparison);
    }

    #[test]
    fn test_intent_versus() {
        assert_eq!(classify_intent("iphone versus pixel"), Intent::Comparison);
    }

    #[test]
    fn test_intent_which_is_better() {
        assert_eq!(classify_intent("which one is better"), Intent::Comparison);
    }

    // ---- Intent classification: availability ----

    #[test]
    fn test_intent_in_stock() {
        assert_eq!(classify_intent("is the hoodie in stock"), Intent::Availability);
    }

    #[test]
    fn test_intent_availability() {
        assert_eq!(classify_intent("check availability please"), Intent::Availability);
    }

    // ---- Intent classification: help ----

    #[test]
    fn test_intent_help() {
        assert_eq!(classify_intent("help"), Intent::Help);
    }

    #[test]
    fn test_intent_how_do_i() {
        assert_eq!(classify_intent("how do I track my order"), Intent::Help);
    }

    // ---- Intent classification: general / fallback ----

    #[test]
    fn test_intent_fallback_general() {
        assert_eq!(classify_intent("laptop under 900"), Intent::General);
        assert_eq!(classify_intent("ramblings with no keywords"), Intent::General);
    }

    #[test]
    fn test_intent_empty_string() {
        assert_eq!(classify_intent(""), Intent::General);
    }

    #[test]
    fn test_intent_talk_to_human_is_general() {
        assert_eq!(classify_intent("can I talk to a human"), Intent::General);
    }

    // ---- Intent classification: first match wins ----

    #[test]
    fn test_intent_order_greeting_beats_search() {
        // Both lists match; greeting is declared earlier.
        assert_eq!(classify_intent("hi, show me laptops"), Intent::Greeting);
    }

    #[test]
    fn test_intent_order_search_beats_price() {
        assert_eq!(
            classify_intent("find a cheap laptop"),
            Intent::ProductSearch
        );
    }

    #[test]
    fn test_intent_order_price_beats_comparison() {
        assert_eq!(
            classify_intent("which price is better"),
            Intent::PriceInquiry
        );
    }

    #[test]
    fn test_intent_case_insensitive() {
        assert_eq!(classify_intent("HELLO"), Intent::Greeting);
        assert_eq!(classify_intent("COMPARE LAPTOPS"), Intent::Comparison);
    }

    // ---- Price extraction: qualified maxima ----

    #[test]
    fn test_price_under() {
        let range = extract_price_range("laptop under 900").unwrap();
        assert_eq!(range.max, Some(900.0));
        assert_eq!(range.min, None);
    }

    #[test]
    fn test_price_below_with_dollar_sign() {
        let range = extract_price_range("anything below $250").unwrap();
        assert_eq!(range.max, Some(250.0));
    }

    #[test]
    fn test_price_less_than() {
        let range = extract_price_range("less than 75.50").unwrap();
        assert_eq!(range.max, Some(75.5));
    }

    #[test]
    fn test_price_maximum_of() {
        let range = extract_price_range("maximum of $1,200").unwrap();
        assert_eq!(range.max, Some(1200.0));
    }

    // ---- Price extraction: qualified minima ----

    #[test]
    fn test_price_over() {
        let range = extract_price_range("over 500").unwrap();
        assert_eq!(range.min, Some(500.0));
        assert_eq!(range.max, None);
    }

    #[test]
    fn test_price_above() {
        let range = extract_price_range("above $1,000").unwrap();
        assert_eq!(range.min, Some(1000.0));
    }

    #[test]
    fn test_price_more_than() {
        let range = extract_price_range("more than 49.99").unwrap();
        assert_eq!(range.min, Some(49.99));
    }

    #[test]
    fn test_price_minimum_of() {
        let range = extract_price_range("minimum of 30 dollars").unwrap();
        assert_eq!(range.min, Some(30.0));
    }

    // ---- Price extraction: ranges ----

    #[test]
    fn test_price_between_and() {
        let range = extract_price_range("between 100 and 300").unwrap();
        assert_eq!(range.min, Some(100.0));
        assert_eq!(range.max, Some(300.0));
    }

    #[test]
    fn test_price_between_reversed_operands() {
        let range = extract_price_range("between 300 and 100").unwrap();
        assert_eq!(range.min, Some(100.0));
        assert_eq!(range.max, Some(300.0));
    }

    #[test]
    fn test_price_between_to() {
        let range = extract_price_range("between $50 to $80").unwrap();
        assert_eq!(range.min, Some(50.0));
        assert_eq!(range.max, Some(80.0));
    }

    #[test]
    fn test_price_dash_span() {
        let range = extract_price_range("headphones 100-200").unwrap();
        assert_eq!(range.min, Some(100.0));
        assert_eq!(range.max, Some(200.0));
    }

    #[test]
    fn test_price_to_span() {
        let range = extract_price_range("$100 to $200").unwrap();
        assert_eq!(range.min, Some(100.0));
        assert_eq!(range.max, Some(200.0));
    }

    // ---- Price extraction: bare amounts ----

    #[test]
    fn test_price_bare_dollar_is_approximate() {
        let range = extract_price_range("a phone around $500").unwrap();
        assert_eq!(range.min, Some(400.0));
        assert_eq!(range.max, Some(600.0));
    }

    #[test]
    fn test_price_bare_dollars_word() {
        let range = extract_price_range("something for 50 dollars").unwrap();
        assert_eq!(range.min, Some(40.0));
        assert_eq!(range.max, Some(60.0));
    }

    #[test]
    fn test_price_bare_with_budget_hint_is_max() {
        let range = extract_price_range("my budget is $500").unwrap();
        assert_eq!(range.min, None);
        assert_eq!(range.max, Some(500.0));
    }

    #[test]
    fn test_price_bare_with_max_hint() {
        let range = extract_price_range("$300 max").unwrap();
        assert_eq!(range.max, Some(300.0));
        assert_eq!(range.min, None);
    }

    #[test]
    fn test_price_thousands_separator() {
        let range = extract_price_range("under $1,299.99").unwrap();
        assert_eq!(range.max, Some(1299.99));
    }

    // ---- Price extraction: precedence and absence ----

    #[test]
    fn test_price_under_beats_bare_amount() {
        // Both patterns could fire; rule 1 wins and only one fires.
        let range = extract_price_range("under $900 for my $900 build").unwrap();
        assert_eq!(range.max, Some(900.0));
        assert_eq!(range.min, None);
    }

    #[test]
    fn test_price_no_pattern_is_none() {
        assert!(extract_price_range("show me laptops").is_none());
        assert!(extract_price_range("").is_none());
    }

    #[test]
    fn test_price_plain_number_without_currency_is_none() {
        // A bare number with no $ or "dollars" and no qualifier is not a price.
        assert!(extract_price_range("the 500 series").is_none());
    }

    // ---- Entity extraction ----

    #[test]
    fn test_entities_single() {
        assert_eq!(extract_entities("show me laptops"), vec!["laptops"]);
    }

    #[test]
    fn test_entities_multiple_deduplicated() {
        let entities = extract_entities("a laptop, a jacket, and another laptop");
        assert_eq!(entities, vec!["laptop", "jacket"]);
    }

    #[test]
    fn test_entities_case_normalized() {
        assert_eq!(extract_entities("LAPTOP deals"), vec!["laptop"]);
    }

    #[test]
    fn test_entities_word_boundary() {
        assert!(extract_entities("that was epic").is_empty());
    }

    #[test]
    fn test_entities_none() {
        assert!(extract_entities("what do you sell").is_empty());
    }
}
