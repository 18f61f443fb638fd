//! Grounded generation: backend trait plus the prompt assembly that pins the
//! model to tenant facts.
//!
//! The composed system prompt has four blocks: persona, read-only tenant
//! context, the live catalog projection, and anti-hallucination rules. Any
//! backend failure collapses into one fixed user-safe apology; the raw error
//! only ever reaches the logs.

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::project_to_text;
use crate::tenant::TenantContext;

/// Fixed user-safe reply when the generation backend fails for any reason.
pub const GENERATION_APOLOGY: &str =
    "Sorry — the AI service is temporarily unavailable. Please use the menu buttons 😊";

const DEFAULT_PERSONA: &str = "You are a friendly and helpful restaurant assistant. \
Be polite, concise, and inviting. Keep responses under 80 words.";

/// Implemented by the generation collaborator (live API client or mock).
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Whether the backend has everything it needs to serve a live call.
    fn is_configured(&self) -> bool;

    /// Generates a completion for the system/user pair. May fail; callers
    /// must convert failures into user-safe text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Assembles the full grounding prompt for one tenant.
pub fn build_system_prompt(ctx: &TenantContext) -> String {
    let persona = ctx
        .persona
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PERSONA);

    let context_lines = [
        ("Opening hours", ctx.channel_alias(&["hours", "opening_hours"])),
        ("Address", ctx.channel_alias(&["address", "location"])),
        ("Phone", ctx.channel("phone")),
        ("WhatsApp", ctx.channel_alias(&["whatsapp", "wa"])),
        ("Email", ctx.channel("email")),
        ("Instagram", ctx.channel("instagram")),
        ("Website", ctx.channel_alias(&["website", "order_url"])),
        ("WiFi", ctx.channel("wifi")),
        ("Parking", ctx.channel("parking")),
        ("Payment methods", ctx.channel("payment")),
        ("House policy", ctx.channel("policy")),
    ]
    .into_iter()
    .map(|(label, value)| format!("- {}: {}", label, value.unwrap_or("Not specified")))
    .collect::<Vec<_>>()
    .join("\n");

    let menu_text = project_to_text(&ctx.catalog);

    format!(
        "{persona}\n\n\
        CONTEXT (read-only facts about {name}):\n{context_lines}\n\n\
        --- 🟢 REAL-TIME MENU DATA 🟢 ---\n\
        (This is the ONLY valid menu. Use it to answer menu questions.)\n\n\
        {menu_text}\n\n\
        --- RULES ---\n\
        1. Answer strictly based on the context and menu data above.\n\
        2. You must ONLY recommend items listed above.\n\
        3. If the user asks for an item that is NOT in the list, politely say \
        we don't have it, then suggest one or two items that ARE listed.\n\
        4. Do NOT make up facts, prices, or menu items.",
        persona = persona,
        name = ctx.name,
        context_lines = context_lines,
        menu_text = menu_text,
    )
}

/// Wraps a backend with grounding and failure recovery.
pub struct GroundedGenerator {
    backend: Arc<dyn LlmBackend>,
}

impl GroundedGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_configured()
    }

    /// Generates a grounded answer. Never fails: backend errors and empty
    /// completions both collapse into [`GENERATION_APOLOGY`].
    pub async fn answer(&self, ctx: &TenantContext, message: &str) -> String {
        let system_prompt = build_system_prompt(ctx);
        match self.backend.complete(&system_prompt, message).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(
                    target: "bistro::generate",
                    tenant_id = %ctx.id,
                    "generation backend returned an empty completion"
                );
                GENERATION_APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!(
                    target: "bistro::generate",
                    tenant_id = %ctx.id,
                    error = %e,
                    "generation backend failed"
                );
                GENERATION_APOLOGY.to_string()
            }
        }
    }
}
