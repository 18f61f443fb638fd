//! Structured menu catalog and its projections.
//!
//! Two read paths feed the rest of the pipeline: [`project_to_text`] renders
//! the whole catalog into the grounding block handed to the generation stage,
//! and [`flatten`] yields the ordered entry list used by fuzzy search and the
//! availability guard. Order is the catalog's declared order in both cases so
//! tie-breaking stays deterministic.

use serde::{Deserialize, Serialize};

/// Fallback currency code when the catalog leaves it empty.
pub const DEFAULT_CURRENCY: &str = "AUD";

/// Returned by [`project_to_text`] when the catalog has zero categories.
pub const NO_MENU_SENTINEL: &str = "No menu data available.";

/// Returned when categories exist but none has a renderable entry.
pub const NO_CATEGORIES_SENTINEL: &str = "No categories found in menu.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub promo: Option<Promotion>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Promotion {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub valid_until: String,
    #[serde(default)]
    pub terms: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    /// Stable identifier, referenced by `menu:<id>` button intents.
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub items: Vec<MenuEntry>,
}

/// One sellable item. Only `name` is guaranteed non-empty; every other field
/// renders with a defensive default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuEntry {
    pub name: String,
    /// `None` means "ask staff".
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub may_contain: Vec<String>,
}

impl Catalog {
    /// Currency code, falling back to [`DEFAULT_CURRENCY`] when unset.
    pub fn currency(&self) -> &str {
        let cur = self.currency.trim();
        if cur.is_empty() {
            DEFAULT_CURRENCY
        } else {
            cur
        }
    }

    /// Active promotion, if any. Disabled promos are invisible to rendering.
    pub fn active_promo(&self) -> Option<&Promotion> {
        self.promo.as_ref().filter(|p| p.enabled)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        let wanted = id.trim();
        self.categories.iter().find(|c| c.id.trim() == wanted)
    }
}

impl Category {
    /// Display label with a defensive default.
    pub fn display_label(&self) -> &str {
        let label = self.label.trim();
        if label.is_empty() {
            "General"
        } else {
            label
        }
    }
}

/// A catalog entry paired with the category it came from, in declared order.
#[derive(Debug, Clone)]
pub struct FlatEntry<'a> {
    pub category_id: &'a str,
    pub category_label: &'a str,
    pub entry: &'a MenuEntry,
}

/// Flattens the catalog into an ordered entry list. Entries with an empty
/// name are skipped; everything else is preserved in declared order.
pub fn flatten(catalog: &Catalog) -> Vec<FlatEntry<'_>> {
    let mut out = Vec::new();
    for cat in &catalog.categories {
        for entry in &cat.items {
            if entry.name.trim().is_empty() {
                continue;
            }
            out.push(FlatEntry {
                category_id: &cat.id,
                category_label: cat.display_label(),
                entry,
            });
        }
    }
    out
}

/// Renders the catalog into the grounding text block: an active-promo banner
/// when one exists, then one line per entry as
/// `- <name> (<label>) : <currency> <price or "Ask">. <desc>`.
///
/// Returns [`NO_MENU_SENTINEL`] for a catalog with zero categories and
/// [`NO_CATEGORIES_SENTINEL`] when categories exist but none has a renderable
/// entry. Both are valid non-error outputs.
pub fn project_to_text(catalog: &Catalog) -> String {
    if catalog.categories.is_empty() {
        return NO_MENU_SENTINEL.to_string();
    }

    let currency = catalog.currency();
    let mut item_lines = Vec::new();
    for fe in flatten(catalog) {
        let price = fe
            .entry
            .price
            .map(format_price)
            .unwrap_or_else(|| "Ask".to_string());
        item_lines.push(format!(
            "- {} ({}) : {} {}. {}",
            fe.entry.name.trim(),
            fe.category_label,
            currency,
            price,
            fe.entry.desc.trim()
        ));
    }
    if item_lines.is_empty() {
        return NO_CATEGORIES_SENTINEL.to_string();
    }

    let mut lines = Vec::new();
    if let Some(promo) = catalog.active_promo() {
        lines.push(format!(
            "🔥 ACTIVE PROMO: {} - {} (Code: {})",
            promo.title.trim(),
            promo.text.trim(),
            promo.code.trim()
        ));
        lines.push("-".repeat(20));
    }
    lines.extend(item_lines);
    lines.join("\n")
}

/// Formats a price with trailing zeros trimmed: `18.0` -> `"18"`,
/// `18.99` -> `"18.99"`, `18.50` -> `"18.5"`.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        let s = format!("{:.2}", price);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Normalizes an image reference into a servable URL:
/// - `"dessert_01.jpg"` -> `"/tenant-assets/<tenant_id>/dessert_01.jpg?v=1"`
/// - `"/tenant-assets/..."` and `"http(s)://..."` pass through unchanged
pub fn asset_url(tenant_id: &str, value: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        return String::new();
    }
    if v.starts_with("http://") || v.starts_with("https://") || v.starts_with("/tenant-assets/") {
        return v.to_string();
    }
    format!("/tenant-assets/{}/{}?v=1", tenant_id, v.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        serde_json::from_str(
            r#"{
                "currency": "AUD",
                "promo": { "title": "Happy Hour", "text": "2-for-1 gyoza", "code": "HH2", "enabled": true },
                "categories": [
                    { "id": "ramen", "label": "Ramen", "items": [
                        { "name": "Tonkotsu Ramen", "price": 18.99, "desc": "Pork broth, chashu, egg" },
                        { "name": "Shoyu Ramen", "price": 16.5 }
                    ]},
                    { "id": "sides", "label": "Sides", "items": [
                        { "name": "Gyoza", "desc": "Pan-fried dumplings" }
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn projection_has_one_line_per_item() {
        let text = project_to_text(&sample_catalog());
        assert!(text.contains("🔥 ACTIVE PROMO: Happy Hour"));
        assert!(text.contains("- Tonkotsu Ramen (Ramen) : AUD 18.99. Pork broth, chashu, egg"));
        assert!(text.contains("- Shoyu Ramen (Ramen) : AUD 16.5. "));
        assert!(text.contains("- Gyoza (Sides) : AUD Ask. Pan-fried dumplings"));
        let item_lines = text.lines().filter(|l| l.starts_with("- ")).count();
        assert_eq!(item_lines, 3);
    }

    #[test]
    fn empty_catalog_returns_sentinel() {
        assert_eq!(project_to_text(&Catalog::default()), NO_MENU_SENTINEL);
    }

    #[test]
    fn categories_without_entries_return_distinct_sentinel() {
        let catalog: Catalog = serde_json::from_str(
            r#"{ "categories": [ { "id": "empty", "label": "Empty", "items": [] } ] }"#,
        )
        .unwrap();
        assert_eq!(project_to_text(&catalog), NO_CATEGORIES_SENTINEL);
    }

    #[test]
    fn flatten_preserves_declared_order() {
        let catalog = sample_catalog();
        let names: Vec<&str> = flatten(&catalog).iter().map(|f| f.entry.name.as_str()).collect();
        assert_eq!(names, vec!["Tonkotsu Ramen", "Shoyu Ramen", "Gyoza"]);
        assert_eq!(flatten(&catalog)[2].category_label, "Sides");
    }

    #[test]
    fn price_formatting_trims_zeros() {
        assert_eq!(format_price(18.0), "18");
        assert_eq!(format_price(18.99), "18.99");
        assert_eq!(format_price(18.5), "18.5");
    }

    #[test]
    fn asset_url_normalizes_bare_filenames() {
        assert_eq!(
            asset_url("t1", "dessert.jpg"),
            "/tenant-assets/t1/dessert.jpg?v=1"
        );
        assert_eq!(asset_url("t1", "https://cdn.example/x.jpg"), "https://cdn.example/x.jpg");
        assert_eq!(asset_url("t1", "/tenant-assets/t1/x.jpg"), "/tenant-assets/t1/x.jpg");
        assert_eq!(asset_url("t1", "  "), "");
    }
}
