//! Canonical intent handlers: greeting, menu browsing, category listings,
//! ordering channels, and canned-block lookup.
//!
//! Handlers build bubbles directly from the tenant snapshot; canned blocks
//! are hydrated here so the missing-key policy is applied in one place.

use crate::catalog::{asset_url, format_price};
use crate::hydrate::hydrate_result;
use crate::response::{Button, MessageFragment, ResolutionResult};
use crate::tenant::TenantContext;

/// Intent name of the tenant's last-resort canned block.
pub const FALLBACK_INTENT: &str = "fallback";

/// Reply used when a tenant has no `fallback` block configured.
const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I didn't get that.";

/// Max promo images rendered before the menu intro.
const MAX_PROMO_IMAGES: usize = 4;

/// Top-level navigation buttons offered alongside generated and gated replies.
pub fn main_buttons() -> Vec<Button> {
    vec![
        Button::new("About us", "about_us"),
        Button::new("Menu & price", "menu"),
        Button::new("Opening hours", "hours"),
        Button::new("Location", "location"),
        Button::new("Contact / Reservation", "contact"),
    ]
}

/// Category buttons plus the ordering and back actions.
pub fn nav_buttons(ctx: &TenantContext) -> Vec<Button> {
    let mut buttons: Vec<Button> = Vec::new();
    for cat in &ctx.catalog.categories {
        let id = cat.id.trim();
        if !id.is_empty() {
            buttons.push(Button::new(cat.display_label(), format!("menu:{}", id)));
        }
    }
    buttons.push(Button::new("Order Food", "order_food"));
    buttons.push(Button::new("Back", "main_menu"));
    buttons
}

/// Welcome turn, built from the tenant's `greeting` canned block and
/// hydrated. Tenants without one get a generic welcome.
pub fn greeting(ctx: &TenantContext) -> ResolutionResult {
    let result = match ctx.responses.get("greeting") {
        Some(block) => block.to_result(),
        None => ResolutionResult::single_text(
            format!("Welcome to {}! How can I help you today?", ctx.name),
            main_buttons(),
        ),
    };
    hydrate_result(result, &ctx.channels)
}

/// Canned block lookup by intent name, falling back to the tenant's
/// `fallback` entry and then to a built-in default. Hydrated.
pub fn canned(ctx: &TenantContext, intent: &str) -> ResolutionResult {
    let result = ctx
        .responses
        .get(intent)
        .or_else(|| ctx.responses.get(FALLBACK_INTENT))
        .map(|block| block.to_result())
        .unwrap_or_else(|| ResolutionResult::single_text(DEFAULT_FALLBACK_REPLY, Vec::new()));
    hydrate_result(result, &ctx.channels)
}

/// Menu landing view (`menu` intent): promo block, intro texts, category
/// buttons. The last fragment is always text so buttons attach to prose.
pub fn menu_entry(ctx: &TenantContext) -> ResolutionResult {
    if ctx.catalog.categories.is_empty() {
        let messages = vec![
            MessageFragment::text(
                "Menu is being updated right now 😊\nFor the latest options, please use Order Food or Contact / Reservation.",
            ),
            MessageFragment::text("Choose an option below:"),
        ];
        let buttons = vec![
            Button::new("Order Food", "order_food"),
            Button::new("Contact / Reservation", "contact"),
            Button::new("Back", "main_menu"),
        ];
        return ResolutionResult::new(messages, buttons);
    }

    let mut messages = Vec::new();
    if let Some(promo) = ctx.catalog.active_promo() {
        let mut promo_text = if promo.title.trim().is_empty() {
            "🔥 Promo".to_string()
        } else {
            promo.title.trim().to_string()
        };
        if !promo.text.trim().is_empty() {
            promo_text.push_str(&format!("\n{}", promo.text.trim()));
        }
        if !promo.code.trim().is_empty() {
            promo_text.push_str(&format!("\n\nCode: {}", promo.code.trim()));
        }
        if !promo.valid_until.trim().is_empty() {
            promo_text.push_str(&format!("\nValid until: {}", promo.valid_until.trim()));
        }
        if !promo.terms.trim().is_empty() {
            promo_text.push_str(&format!("\n\n*{}*", promo.terms.trim()));
        }
        messages.push(MessageFragment::text(promo_text));

        for (i, img) in promo
            .images
            .iter()
            .filter(|img| !img.trim().is_empty())
            .take(MAX_PROMO_IMAGES)
            .enumerate()
        {
            messages.push(MessageFragment::image(
                asset_url(&ctx.id, img),
                format!("Promo {}", i + 1),
            ));
        }
    }

    messages.push(MessageFragment::text(
        "Here's everything we have for you today — take your time and pick your favorite!",
    ));
    messages.push(MessageFragment::text("Choose a category below:"));

    ResolutionResult::new(messages, nav_buttons(ctx))
}

/// Category listing (`menu:<id>` intent). Unknown ids fall back to the menu
/// landing view instead of erroring.
pub fn menu_category(ctx: &TenantContext, category_id: &str) -> ResolutionResult {
    let Some(cat) = ctx.catalog.category(category_id) else {
        return menu_entry(ctx);
    };

    let currency = ctx.catalog.currency();
    let mut messages = Vec::new();

    if cat.items.is_empty() {
        messages.push(MessageFragment::text("No items available right now."));
        messages.push(MessageFragment::text("Choose a category below:"));
        return ResolutionResult::new(messages, nav_buttons(ctx));
    }

    for item in &cat.items {
        let name = item.name.trim();
        if name.is_empty() {
            continue;
        }
        let mut text = name.to_string();
        if let Some(price) = item.price {
            text.push_str(&format!(" — {} {}", currency, format_price(price)));
        }
        if !item.desc.trim().is_empty() {
            text.push_str(&format!("\n{}", item.desc.trim()));
        }
        messages.push(MessageFragment::text(text));

        if let Some(image) = item.image.as_deref().filter(|v| !v.trim().is_empty()) {
            messages.push(MessageFragment::image(asset_url(&ctx.id, image), name));
        }
    }

    // Last fragment must be text so buttons attach cleanly.
    messages.push(MessageFragment::text("Choose a category below:"));
    ResolutionResult::new(messages, nav_buttons(ctx))
}

/// Ordering-channel listing (`order_food` intent), built from the tenant's
/// channel map with a graceful no-channels branch.
pub fn order_food(ctx: &TenantContext) -> ResolutionResult {
    let mut msg = String::from("You can order your food from our official ordering channels! 😊✨\n\n");

    let lines: [(&str, Option<&str>); 8] = [
        ("Phone", ctx.channel("phone")),
        ("WhatsApp", ctx.channel_alias(&["whatsapp", "wa"])),
        ("GoFood", ctx.channel_alias(&["gofood", "go_food"])),
        ("GrabFood", ctx.channel_alias(&["grabfood", "grab_food"])),
        ("UberEats", ctx.channel_alias(&["ubereats", "uber_eats", "uberfood"])),
        ("DoorDash", ctx.channel_alias(&["doordash", "door_dash"])),
        ("Deliveroo", ctx.channel("deliveroo")),
        ("Website order", ctx.channel_alias(&["order_url", "website"])),
    ];

    let mut any_line = false;
    for (label, value) in lines {
        if let Some(v) = value {
            msg.push_str(&format!("{}: {}\n", label, v));
            any_line = true;
        }
    }
    if !any_line {
        msg.push_str(
            "Ordering links are not available right now. Please contact us and we'll help you order 😊\n",
        );
    }
    msg.push_str("\nJust choose whichever works best for you!");

    let messages = vec![
        MessageFragment::text(msg),
        MessageFragment::text("Want me to help you with anything else? 😄"),
    ];
    let buttons = vec![
        Button::new("About us", "about_us"),
        Button::new("Opening hours", "hours"),
        Button::new("Location", "location"),
        Button::new("Contact / Reservation", "contact"),
        Button::new("No, I'm all good", "goodbye"),
        Button::new("Back", "menu"),
    ];
    ResolutionResult::new(messages, buttons)
}
