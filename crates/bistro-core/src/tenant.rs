//! Shared tenant types used across all bistro crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::response::CannedResponse;

/// Subscription tier. Gates which pipeline stages are reachable: fuzzy
/// catalog search and grounded generation require [`PlanTier::Pro`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Basic,
    Pro,
}

impl PlanTier {
    #[inline]
    pub fn is_pro(&self) -> bool {
        matches!(self, PlanTier::Pro)
    }
}

/// Per-tenant feature switches. Every field carries a declared default so
/// downstream code never branches on "attribute might be missing".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Unlocks the grounded-generation stage (Pro tier still required).
    #[serde(default)]
    pub llm_enabled: bool,
    /// Gates the availability guard and menu handlers.
    #[serde(default = "default_true")]
    pub menu_enabled: bool,
    /// Gates the gateway's post-resolution event logging.
    #[serde(default = "default_true")]
    pub analytics_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            llm_enabled: false,
            menu_enabled: true,
            analytics_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Immutable snapshot of one tenant's configuration, constructed once per
/// resolution call. Concurrent resolutions share nothing mutable: each call
/// gets its own owned snapshot and the pattern banks are process statics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    /// Unique tenant identifier.
    pub id: String,
    /// Display name shown in metadata and the generator persona.
    pub name: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub plan: PlanTier,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub catalog: Catalog,
    /// Canned response blocks keyed by intent name.
    #[serde(default)]
    pub responses: BTreeMap<String, CannedResponse>,
    /// Contact channel values keyed by channel name (phone, whatsapp,
    /// email, instagram, website, ...). BTreeMap keeps iteration order
    /// deterministic for prompt assembly.
    #[serde(default)]
    pub channels: BTreeMap<String, String>,
    /// Tenant-authored persona paragraph for the grounded generator.
    #[serde(default)]
    pub persona: Option<String>,
}

impl TenantContext {
    /// Channel value by name; empty and whitespace-only values count as absent.
    pub fn channel(&self, name: &str) -> Option<&str> {
        self.channels
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First non-empty value among several channel aliases
    /// (e.g. `whatsapp` / `wa`, `order_url` / `website`).
    pub fn channel_alias(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.channel(n))
    }
}
