//! Deterministic intent classification over a static regex pattern bank.
//!
//! Pattern authoring is configuration, not computed state: the bank and the
//! tie-break priority live in plain tables so tests can enumerate them, and
//! the compiled form is a process-lifetime static shared by every resolution.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tie-break order: when two intents score equally, the one earlier in this
/// list wins. Ordering-food outranks contact outranks browse-menu outranks
/// the informational intents.
pub const INTENT_PRIORITY: &[&str] = &[
    "order_food",
    "contact",
    "menu",
    "hours",
    "location",
    "about_us",
];

/// Canonical pattern bank, one row per intent. Patterns are word-boundary
/// anchored and matched case-insensitively anywhere in the input.
pub const INTENT_PATTERNS: &[(&str, &[&str])] = &[
    (
        "order_food",
        &[
            r"\b(how\s*to\s*order)\b",
            r"\b(start\s*ordering)\b",
            r"\b(place\s*an?\s*order)\b",
            r"\b(delivery|deliver|take\s*away|takeaway|pick[\s-]?up|pickup|to\s*go)\b",
            r"\b(checkout|bill|check\s*please)\b",
            r"\b(grabfood|gofood|shopeefood|uber\s*eats|doordash|deliveroo)\b",
        ],
    ),
    (
        "menu",
        &[
            r"\b(show\s*(me)?\s*the\s*menu|see\s*the\s*menu)\b",
            r"\b(food\s*list|drink\s*list|wine\s*list)\b",
            r"\b(full\s*menu|all\s*menu)\b",
        ],
    ),
    (
        "hours",
        &[
            r"\b(opening\s*hours?|business\s*hours?|operating\s*hours?)\b",
            r"\b(what\s*time\s*(do\s*you|does\s*it)\s*(open|close))\b",
            r"\b(when\s*(do\s*you|are\s*you)\s*(open|close))\b",
            r"\b(are\s*you\s*open|is\s*it\s*open)\b",
        ],
    ),
    (
        "location",
        &[
            r"\b(where\s*(are\s*you|is\s*the\s*restaurant|is\s*it))\b",
            r"\b(address|location|directions?|google\s*map(s)?)\b",
            r"\b(parking|car\s*park)\b",
        ],
    ),
    (
        "contact",
        &[
            r"\b(contact|phone|call|whatsapp|wa|email)\b",
            r"\b(reserve|reservation|book(ing)?|table|seat)\b",
            r"\b(book\s*a\s*table|get\s*a\s*table)\b",
        ],
    ),
    (
        "about_us",
        &[
            r"\b(about\s*us|tell\s*me\s*about\s*(you|this\s*place))\b",
            r"\b(wifi|internet|password)\b",
            r"\b(halal|pork|lard)\b",
        ],
    ),
];

static COMPILED: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    INTENT_PATTERNS
        .iter()
        .map(|(intent, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){}", p)).expect("intent pattern"))
                .collect();
            (*intent, compiled)
        })
        .collect()
});

/// Scores `text` against the pattern bank and returns the winning intent.
///
/// Score per intent = number of its patterns that match anywhere. Intents
/// with score zero are discarded; ties at the maximum resolve through
/// [`INTENT_PRIORITY`], then bank order. Empty or whitespace-only input
/// returns `None` without scoring. Same input always yields the same intent.
pub fn classify(text: &str) -> Option<&'static str> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let mut scored: Vec<(&'static str, usize)> = Vec::new();
    for (intent, patterns) in COMPILED.iter() {
        let score = patterns.iter().filter(|p| p.is_match(&needle)).count();
        if score > 0 {
            scored.push((*intent, score));
        }
    }

    let best = scored.iter().map(|(_, s)| *s).max()?;
    let tied: Vec<&'static str> = scored
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(i, _)| *i)
        .collect();

    for intent in INTENT_PRIORITY.iter().copied() {
        if tied.contains(&intent) {
            return Some(intent);
        }
    }
    tied.first().copied()
}
