//! bistro-core: multi-tenant chatbot core (tenant model, catalog
//! projections, message-resolution pipeline, grounding, tenant store).
//!
//! The resolution pipeline is an ordered cascade; the first stage to
//! produce a result wins:
//!
//! | Stage | Component            | Gate                     |
//! |-------|----------------------|--------------------------|
//! | 1     | Explicit intent      | button click             |
//! | 2     | Intent classifier    | free text                |
//! | 3     | Fuzzy catalog search | Pro tier                 |
//! | 4     | Availability guard   | `menu_enabled`           |
//! | 5     | Grounded generation  | `llm_enabled` + Pro tier |
//! | 6     | Canned fallback      | always                   |

mod availability;
mod catalog;
mod config;
mod generate;
mod hydrate;
mod intent;
mod menu;
mod pipeline;
mod response;
mod search;
mod store;
mod tenant;

pub use availability::{try_answer_availability, MAX_LISTED, MAX_SUGGESTIONS};
pub use catalog::{
    asset_url, flatten, format_price, project_to_text, Catalog, Category, FlatEntry, MenuEntry,
    Promotion, DEFAULT_CURRENCY, NO_CATEGORIES_SENTINEL, NO_MENU_SENTINEL,
};
pub use config::GatewayConfig;
pub use generate::{build_system_prompt, GroundedGenerator, LlmBackend, GENERATION_APOLOGY};
pub use hydrate::{hydrate_result, hydrate_text};
pub use intent::{classify, INTENT_PATTERNS, INTENT_PRIORITY};
pub use menu::{
    canned, greeting, main_buttons, menu_category, menu_entry, nav_buttons, order_food,
    FALLBACK_INTENT,
};
pub use pipeline::{
    dispatch_intent, render_greeting, Resolver, LLM_NOT_CONFIGURED, PRO_FEATURE_LOCKED,
};
pub use response::{Button, CannedResponse, MessageFragment, ResolutionResult};
pub use search::{search_catalog, SCORE_THRESHOLD};
pub use store::{demo_tenant, EventRecord, StoreError, TenantStore};
pub use tenant::{FeatureFlags, PlanTier, TenantContext};
