//! Availability guard: answers "do you have X" questions from the literal
//! catalog so the generation stage can never affirm items that don't exist.
//!
//! This is a hard precondition gate ahead of the LLM stage, not a ranking
//! convenience: if the question is about availability, the answer comes from
//! the catalog here, or as an explicit not-found with nearby suggestions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{flatten, format_price};
use crate::response::{Button, ResolutionResult};
use crate::tenant::TenantContext;

/// Max catalog entries listed in a positive answer.
pub const MAX_LISTED: usize = 5;

/// Max close-name suggestions included in a not-found answer.
pub const MAX_SUGGESTIONS: usize = 3;

static AVAILABILITY_GATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(do\s+you\s+(have|sell|serve|offer)|have\s+you\s+got|is\s+there|are\s+there|got\s+any|do\s+you\s+guys\s+have)\b",
    )
    .expect("availability gate pattern")
});

/// Tokens carrying no item information, dropped before keyword scoring.
const STOPWORDS: &[&str] = &[
    "do", "you", "guys", "have", "sell", "serve", "offer", "got", "any", "is", "there", "are",
    "a", "an", "the", "some", "please", "i", "want", "can", "get", "me", "my", "your", "of",
    "and", "or", "with", "without", "on", "in", "for", "to", "at", "today", "tonight", "still",
    "available", "menu", "something", "anything", "like",
];

/// Small bidirectional synonym table expanding common item aliases.
const SYNONYMS: &[(&str, &str)] = &[
    ("shrimp", "prawn"),
    ("prawn", "shrimp"),
    ("fries", "chips"),
    ("chips", "fries"),
    ("coke", "cola"),
    ("cola", "coke"),
    ("veggie", "vegetarian"),
    ("vegetarian", "veggie"),
    ("calamari", "squid"),
    ("squid", "calamari"),
];

/// Extracts content keywords: lowercase tokens minus stopwords, expanded
/// through the synonym table, order preserved, no duplicates.
fn content_keywords(message: &str) -> Vec<String> {
    fn push_unique(keywords: &mut Vec<String>, word: String) {
        if !keywords.contains(&word) {
            keywords.push(word);
        }
    }

    let mut keywords: Vec<String> = Vec::new();
    for token in message
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .filter(|t| !STOPWORDS.contains(t))
    {
        push_unique(&mut keywords, token.to_string());
        for (from, to) in SYNONYMS {
            if *from == token {
                push_unique(&mut keywords, (*to).to_string());
            }
        }
    }
    keywords
}

/// Answers an availability question from the catalog, or returns `None` when
/// the message is not an availability question. Total on empty catalogs.
pub fn try_answer_availability(ctx: &TenantContext, message: &str) -> Option<ResolutionResult> {
    let msg = message.trim();
    if msg.is_empty() || !AVAILABILITY_GATE.is_match(msg) {
        return None;
    }

    let keywords = content_keywords(msg);
    if keywords.is_empty() {
        return None;
    }

    let entries = flatten(&ctx.catalog);
    let mut scored: Vec<(usize, usize)> = Vec::new(); // (hits, entry index)
    for (idx, fe) in entries.iter().enumerate() {
        let haystack = format!("{} {}", fe.entry.name, fe.entry.desc).to_lowercase();
        let hits = keywords.iter().filter(|k| haystack.contains(k.as_str())).count();
        if hits >= 1 {
            scored.push((hits, idx));
        }
    }

    if scored.is_empty() {
        return Some(not_found(ctx, &keywords));
    }

    // Stable sort keeps catalog order within equal scores.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let currency = ctx.catalog.currency();
    let mut body = String::from("Yes — here's what I found on our menu:\n");
    for (_, idx) in scored.iter().take(MAX_LISTED) {
        let fe = &entries[*idx];
        let price = fe
            .entry
            .price
            .map(format_price)
            .unwrap_or_else(|| "Ask".to_string());
        body.push_str(&format!(
            "- {} ({}) : {} {}\n",
            fe.entry.name.trim(),
            fe.category_label,
            currency,
            price
        ));
    }
    body.push_str("\nAnything else I can check for you?");

    Some(ResolutionResult::single_text(
        body,
        vec![
            Button::new("Menu & price", "menu"),
            Button::new("Order Food", "order_food"),
        ],
    ))
}

/// Not-found answer with up to [`MAX_SUGGESTIONS`] closest catalog names and
/// a browse-the-menu nudge. Works on empty catalogs (no suggestions).
fn not_found(ctx: &TenantContext, keywords: &[String]) -> ResolutionResult {
    let entries = flatten(&ctx.catalog);
    let mut ranked: Vec<(f64, &str)> = entries
        .iter()
        .map(|fe| {
            let name = fe.entry.name.trim();
            let lowered = name.to_lowercase();
            let best = keywords
                .iter()
                .map(|k| strsim::jaro_winkler(k, &lowered))
                .fold(0.0_f64, f64::max);
            (best, name)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut suggestions: Vec<&str> = Vec::new();
    for (_, name) in ranked {
        if !suggestions.contains(&name) {
            suggestions.push(name);
        }
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }

    let asked = keywords.join(" ");
    let mut body = format!("Sorry — we don't have \"{}\" on the menu right now.", asked);
    if !suggestions.is_empty() {
        body.push_str(&format!("\nWere you thinking of: {}?", suggestions.join(", ")));
    }
    body.push_str("\nFeel free to browse the menu for everything we do have 😊");

    ResolutionResult::single_text(body, vec![Button::new("Menu & price", "menu")])
}
