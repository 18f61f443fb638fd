//! Ordered resolution cascade: explicit intent, classified intent, fuzzy
//! catalog search, availability guard, grounded generation, fallback.
//!
//! The first stage to produce a result short-circuits the rest. Every stage
//! is total: internal misses degrade to "try the next stage", never to an
//! error. The only propagating failure in the system is tenant-not-found,
//! which belongs to the store, not to this pipeline.

use std::sync::Arc;

use crate::availability::try_answer_availability;
use crate::generate::{GroundedGenerator, LlmBackend};
use crate::intent::classify;
use crate::menu;
use crate::response::ResolutionResult;
use crate::search::search_catalog;
use crate::tenant::TenantContext;

/// Reply when a Basic-tier tenant has the LLM flag set.
pub const PRO_FEATURE_LOCKED: &str = "AI Chat is a Pro feature 🔒";

/// Reply when the tier allows generation but no backend is configured.
pub const LLM_NOT_CONFIGURED: &str =
    "AI chat is not configured yet. Please use the menu buttons 😊";

/// Stateless resolver over immutable tenant snapshots. Safe to share across
/// concurrent requests; the only blocking call is the generation backend's,
/// which carries its own bounded timeout.
pub struct Resolver {
    generator: GroundedGenerator,
}

impl Resolver {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            generator: GroundedGenerator::new(backend),
        }
    }

    /// Resolves one user turn into messages plus buttons.
    ///
    /// `intent` comes from a button click, `message` from free text; with
    /// neither present the tenant's fallback block is returned.
    pub async fn resolve(
        &self,
        ctx: &TenantContext,
        message: Option<&str>,
        intent: Option<&str>,
    ) -> ResolutionResult {
        // 1) Explicit intent from a button click.
        if let Some(explicit) = intent.map(str::trim).filter(|s| !s.is_empty()) {
            return dispatch_intent(ctx, explicit);
        }

        let message = message.map(str::trim).filter(|s| !s.is_empty());

        if let Some(msg) = message {
            // 2) Classified intent: classify, then dispatch. Two explicit
            // phases keep the terminal states obvious.
            if let Some(matched) = classify(msg) {
                tracing::debug!(
                    target: "bistro::pipeline",
                    tenant_id = %ctx.id,
                    intent = matched,
                    "classifier hit"
                );
                return dispatch_intent(ctx, matched);
            }

            // 3) Fuzzy catalog search, Pro tier only.
            if ctx.plan.is_pro() {
                if let Some(hit) = search_catalog(ctx, msg) {
                    return hit;
                }
            }

            // 4) Availability guard, gated on the menu feature.
            if ctx.features.menu_enabled {
                if let Some(hit) = try_answer_availability(ctx, msg) {
                    return hit;
                }
            }

            // 5) Grounded generation.
            if ctx.features.llm_enabled {
                if !ctx.plan.is_pro() {
                    return ResolutionResult::single_text(PRO_FEATURE_LOCKED, menu::main_buttons());
                }
                if !self.generator.is_configured() {
                    return ResolutionResult::single_text(LLM_NOT_CONFIGURED, menu::main_buttons());
                }
                let text = self.generator.answer(ctx, msg).await;
                return ResolutionResult::single_text(text, menu::main_buttons());
            }
        }

        // 6) Nothing matched (or nothing was asked): canned fallback.
        menu::canned(ctx, menu::FALLBACK_INTENT)
    }
}

/// Routes an intent name to its canonical handler. Unknown intents fall
/// through to the canned-response lookup, which has its own fallback.
pub fn dispatch_intent(ctx: &TenantContext, intent: &str) -> ResolutionResult {
    match intent {
        "greeting" => menu::greeting(ctx),
        "menu" => menu::menu_entry(ctx),
        "order_food" => menu::order_food(ctx),
        other => match other.strip_prefix("menu:") {
            Some(category_id) => menu::menu_category(ctx, category_id),
            None => menu::canned(ctx, other),
        },
    }
}

/// Entry point for the initial welcome turn.
pub fn render_greeting(ctx: &TenantContext) -> ResolutionResult {
    menu::greeting(ctx)
}
