//! Fuzzy catalog search: approximate partial-string matching over category
//! labels, item names, and item descriptions. Pro-tier pipeline stage.
//!
//! A category hit returns that category's full listing; an item hit returns
//! a one-item detail card. Anything below the threshold is "no match" and
//! the pipeline moves on.

use crate::catalog::{asset_url, format_price, Category, MenuEntry};
use crate::menu::menu_category;
use crate::response::{Button, MessageFragment, ResolutionResult};
use crate::tenant::TenantContext;

/// Minimum similarity (0–100) for a fuzzy hit to count. Business policy,
/// kept public so it can be tuned against real catalogs.
pub const SCORE_THRESHOLD: u32 = 80;

enum BestMatch<'a> {
    Category(&'a Category),
    Item(&'a MenuEntry),
}

/// Partial-ratio similarity on a 0–100 scale: the shorter string is slid
/// across equal-length windows of the longer one and the best window's
/// normalized Levenshtein similarity wins. An exact substring scores 100.
fn partial_ratio(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };
    let short_str: String = short.iter().collect();
    let n = short.len();

    let mut best = 0.0_f64;
    for window in long.windows(n) {
        let candidate: String = window.iter().collect();
        let score = strsim::normalized_levenshtein(&short_str, &candidate);
        if score > best {
            best = score;
        }
        if best >= 1.0 {
            break;
        }
    }
    (best * 100.0).round() as u32
}

/// Scans the whole catalog for the single best approximate match to `query`.
/// Ties keep the first occurrence in catalog order. Returns `None` below the
/// threshold or on an empty catalog; never errors.
pub fn search_catalog(ctx: &TenantContext, query: &str) -> Option<ResolutionResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || ctx.catalog.categories.is_empty() {
        return None;
    }

    let mut best_score = 0u32;
    let mut best: Option<BestMatch<'_>> = None;

    for cat in &ctx.catalog.categories {
        let score = partial_ratio(&needle, &cat.label.to_lowercase());
        if score > best_score {
            best_score = score;
            best = Some(BestMatch::Category(cat));
        }

        for item in &cat.items {
            if item.name.trim().is_empty() {
                continue;
            }
            let name_score = partial_ratio(&needle, &item.name.to_lowercase());
            let desc_score = if item.desc.trim().is_empty() {
                0
            } else {
                partial_ratio(&needle, &item.desc.to_lowercase())
            };
            let score = name_score.max(desc_score);
            if score > best_score {
                best_score = score;
                best = Some(BestMatch::Item(item));
            }
        }
    }

    if best_score < SCORE_THRESHOLD {
        return None;
    }
    tracing::debug!(
        target: "bistro::search",
        tenant_id = %ctx.id,
        score = best_score,
        "fuzzy catalog hit"
    );

    match best? {
        BestMatch::Category(cat) => Some(menu_category(ctx, &cat.id)),
        BestMatch::Item(item) => Some(item_detail(ctx, item)),
    }
}

/// One-item detail card: optional image first, then name, description,
/// price, allergen notes, with a single way back to the menu.
fn item_detail(ctx: &TenantContext, item: &MenuEntry) -> ResolutionResult {
    let mut messages = Vec::new();

    if let Some(image) = item.image.as_deref().filter(|v| !v.trim().is_empty()) {
        messages.push(MessageFragment::image(asset_url(&ctx.id, image), item.name.trim()));
    }

    let desc = if item.desc.trim().is_empty() {
        "No description available."
    } else {
        item.desc.trim()
    };
    let price = match item.price {
        Some(p) => format!("{} {}", ctx.catalog.currency(), format_price(p)),
        None => "Ask".to_string(),
    };
    let mut body = format!("**{}**\n{}\nPrice: {}", item.name.trim(), desc, price);
    if !item.allergens.is_empty() {
        body.push_str(&format!("\nAllergens: {}", item.allergens.join(", ")));
    }
    if !item.may_contain.is_empty() {
        body.push_str(&format!("\nMay contain: {}", item.may_contain.join(", ")));
    }
    messages.push(MessageFragment::text(body));

    ResolutionResult::new(messages, vec![Button::new("Back to Menu", "menu")])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pro_tenant() -> TenantContext {
        serde_json::from_str(
            r#"{
                "id": "demo",
                "name": "Demo Kitchen",
                "plan": "pro",
                "catalog": {
                    "currency": "AUD",
                    "categories": [
                        { "id": "ramen", "label": "Ramen", "items": [
                            { "name": "Tonkotsu Ramen", "price": 18.99, "desc": "Rich pork broth" },
                            { "name": "Shoyu Ramen", "price": 16.5, "desc": "Soy-based broth" }
                        ]},
                        { "id": "desserts", "label": "Desserts", "items": [
                            { "name": "Matcha Ice Cream", "price": 7.0, "desc": "House made", "allergens": ["dairy"] }
                        ]}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn exact_item_name_scores_a_hit() {
        let ctx = pro_tenant();
        let result = search_catalog(&ctx, "Tonkotsu Ramen").unwrap();
        let body = result.messages[0].as_text().unwrap();
        assert!(body.contains("**Tonkotsu Ramen**"));
        assert!(body.contains("AUD 18.99"));
        assert_eq!(result.buttons, vec![Button::new("Back to Menu", "menu")]);
    }

    #[test]
    fn partial_query_finds_the_item() {
        let ctx = pro_tenant();
        let result = search_catalog(&ctx, "tonkotsu").unwrap();
        assert!(result.messages[0].as_text().unwrap().contains("Tonkotsu Ramen"));
    }

    #[test]
    fn category_label_query_returns_the_listing() {
        let ctx = pro_tenant();
        let result = search_catalog(&ctx, "desserts").unwrap();
        let all_text: Vec<&str> = result.messages.iter().filter_map(|m| m.as_text()).collect();
        assert!(all_text.iter().any(|t| t.contains("Matcha Ice Cream")));
        assert!(result.buttons.iter().any(|b| b.intent == "menu:ramen"));
    }

    #[test]
    fn dissimilar_query_returns_none() {
        let ctx = pro_tenant();
        assert!(search_catalog(&ctx, "zzzzqqqq").is_none());
    }

    #[test]
    fn empty_catalog_never_errors() {
        let ctx: TenantContext =
            serde_json::from_str(r#"{ "id": "t1", "name": "Empty" }"#).unwrap();
        assert!(search_catalog(&ctx, "tonkotsu").is_none());
        assert!(search_catalog(&ctx, "").is_none());
    }

    #[test]
    fn ties_keep_the_first_occurrence() {
        let ctx: TenantContext = serde_json::from_str(
            r#"{
                "id": "t1", "name": "Twins",
                "catalog": { "categories": [
                    { "id": "a", "label": "A", "items": [
                        { "name": "Duplicate Dish", "price": 10.0 },
                        { "name": "Duplicate Dish", "price": 99.0 }
                    ]}
                ]}
            }"#,
        )
        .unwrap();
        let result = search_catalog(&ctx, "duplicate dish").unwrap();
        assert!(result.messages[0].as_text().unwrap().contains("Price: AUD 10"));
    }

    #[test]
    fn partial_ratio_basics() {
        assert_eq!(partial_ratio("tonkotsu", "tonkotsu ramen"), 100);
        assert_eq!(partial_ratio("", "anything"), 0);
        assert!(partial_ratio("pizza", "sushi") < SCORE_THRESHOLD);
    }
}
