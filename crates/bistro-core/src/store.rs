//! Sled-backed tenant configuration store and analytics event log.
//!
//! One tree holds tenant snapshots as JSON keyed by tenant id; a second
//! append-only tree holds resolution events keyed
//! `events/{tenant_id}/{timestamp_ms}_{uuid}` so recent history is a prefix
//! scan. The store is the system's only source of tenant-not-found, which is
//! deliberately distinct from "tenant found but empty": empty configuration
//! is valid and the pipeline degrades over it.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sled::Db;
use uuid::Uuid;

use crate::tenant::TenantContext;

const TENANTS_TREE: &str = "tenants";
const EVENTS_TREE: &str = "events";

/// Store failures. `NotFound` is a client-facing condition; the rest are
/// internal.
#[derive(Debug)]
pub enum StoreError {
    /// No configuration record exists for this tenant id.
    NotFound(String),
    Backend(sled::Error),
    /// A record exists but can no longer be decoded.
    Corrupt {
        tenant_id: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "tenant not found: {}", id),
            Self::Backend(e) => write!(f, "tenant store backend error: {}", e),
            Self::Corrupt { tenant_id, source } => {
                write!(f, "corrupt tenant record {}: {}", tenant_id, source)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        Self::Backend(e)
    }
}

/// One analytics event appended after a resolution. Written by the calling
/// layer, never from inside the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub tenant_id: String,
    /// Event kind, e.g. "chat" or "greeting".
    pub kind: String,
    pub user_id: String,
    pub message: Option<String>,
    pub intent: Option<String>,
    /// First text fragment of the reply.
    pub reply: String,
    pub timestamp_ms: i64,
}

impl EventRecord {
    pub fn now(tenant_id: &str, kind: &str, user_id: &str) -> Self {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self {
            id: Uuid::new_v4().simple().to_string(),
            tenant_id: tenant_id.to_string(),
            kind: kind.to_string(),
            user_id: user_id.to_string(),
            message: None,
            intent: None,
            reply: String::new(),
            timestamp_ms: ts,
        }
    }

    pub fn with_message(mut self, message: Option<&str>) -> Self {
        self.message = message.map(str::to_string);
        self
    }

    pub fn with_intent(mut self, intent: Option<&str>) -> Self {
        self.intent = intent.map(str::to_string);
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }
}

pub struct TenantStore {
    db: Db,
}

impl TenantStore {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Loads a tenant snapshot. Missing id is a distinct, client-facing
    /// error; a present-but-empty configuration is not an error.
    pub fn get(&self, tenant_id: &str) -> Result<TenantContext, StoreError> {
        let tree = self.db.open_tree(TENANTS_TREE)?;
        let bytes = tree
            .get(tenant_id)?
            .ok_or_else(|| StoreError::NotFound(tenant_id.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            tenant_id: tenant_id.to_string(),
            source,
        })
    }

    pub fn put(&self, ctx: &TenantContext) -> Result<(), StoreError> {
        let tree = self.db.open_tree(TENANTS_TREE)?;
        let bytes = serde_json::to_vec(ctx).map_err(|source| StoreError::Corrupt {
            tenant_id: ctx.id.clone(),
            source,
        })?;
        tree.insert(ctx.id.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn tenant_ids(&self) -> Vec<String> {
        let tree = match self.db.open_tree(TENANTS_TREE) {
            Ok(t) => t,
            Err(_) => return Vec::new(),
        };
        tree.iter()
            .filter_map(|kv| kv.ok())
            .filter_map(|(k, _)| String::from_utf8(k.to_vec()).ok())
            .collect()
    }

    /// Seeds the demo tenant when the store is empty so a fresh gateway has
    /// something to serve. Returns true when seeding happened.
    pub fn ensure_demo_tenant(&self) -> Result<bool, StoreError> {
        let tree = self.db.open_tree(TENANTS_TREE)?;
        if !tree.is_empty() {
            return Ok(false);
        }
        self.put(&demo_tenant())?;
        Ok(true)
    }

    /// Appends one analytics event. Key layout keeps per-tenant history a
    /// prefix scan.
    pub fn append_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        let tree = self.db.open_tree(EVENTS_TREE)?;
        let key = format!(
            "events/{}/{}_{}",
            event.tenant_id, event.timestamp_ms, event.id
        );
        let bytes = serde_json::to_vec(event).map_err(|source| StoreError::Corrupt {
            tenant_id: event.tenant_id.clone(),
            source,
        })?;
        tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Most recent events for a tenant, newest first.
    pub fn recent_events(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let tree = self.db.open_tree(EVENTS_TREE)?;
        let prefix = format!("events/{}/", tenant_id);
        let mut events: Vec<EventRecord> = tree
            .scan_prefix(prefix.as_bytes())
            .filter_map(|kv| kv.ok())
            .filter_map(|(_, v)| serde_json::from_slice(&v).ok())
            .collect();
        events.sort_by(|a: &EventRecord, b: &EventRecord| b.timestamp_ms.cmp(&a.timestamp_ms));
        events.truncate(limit);
        Ok(events)
    }
}

/// Built-in demo restaurant used for first-boot seeding and tests.
pub fn demo_tenant() -> TenantContext {
    serde_json::from_str(
        r#"{
            "id": "demo",
            "name": "Kumo Ramen Bar",
            "locale": "en-AU",
            "plan": "pro",
            "features": { "llm_enabled": true, "menu_enabled": true, "analytics_enabled": true },
            "persona": "You are the friendly virtual waiter of Kumo Ramen Bar, a casual Japanese eatery in Sydney.",
            "channels": {
                "phone": "+61 2 9000 1234",
                "whatsapp": "+61 400 123 456",
                "email": "hello@kumoramen.example",
                "instagram": "@kumoramenbar",
                "website": "https://kumoramen.example",
                "hours": "Tue-Sun 11:30-21:30",
                "address": "12 Lantern Lane, Sydney NSW"
            },
            "responses": {
                "greeting": {
                    "reply": "Hey there! 👋 Welcome to Kumo Ramen Bar. What can I do for you today?",
                    "buttons": [
                        { "label": "About us", "intent": "about_us" },
                        { "label": "Menu & price", "intent": "menu" },
                        { "label": "Opening hours", "intent": "hours" },
                        { "label": "Location", "intent": "location" },
                        { "label": "Contact / Reservation", "intent": "contact" }
                    ]
                },
                "about_us": {
                    "reply": "We're a small family-run ramen bar slinging rich broths since 2016. Find us on Instagram at {instagram}!",
                    "buttons": [ { "label": "Back", "intent": "main_menu" } ]
                },
                "hours": {
                    "reply": "We're open {hours}. Kitchen closes 30 minutes before we do!",
                    "buttons": [ { "label": "Back", "intent": "main_menu" } ]
                },
                "location": {
                    "reply": "You'll find us at {address}. Street parking after 6pm.",
                    "buttons": [ { "label": "Back", "intent": "main_menu" } ]
                },
                "contact": {
                    "reply": "Call {phone} or WhatsApp {whatsapp} for bookings. We answer fast! 😊",
                    "buttons": [ { "label": "Back", "intent": "main_menu" } ]
                },
                "main_menu": {
                    "reply": "What else can I help you with?",
                    "buttons": [
                        { "label": "About us", "intent": "about_us" },
                        { "label": "Menu & price", "intent": "menu" },
                        { "label": "Opening hours", "intent": "hours" },
                        { "label": "Location", "intent": "location" },
                        { "label": "Contact / Reservation", "intent": "contact" }
                    ]
                },
                "goodbye": {
                    "reply": "Thanks for stopping by — see you soon! 🍜"
                },
                "fallback": {
                    "reply": "Sorry, I didn't quite get that. Try one of the buttons below!",
                    "buttons": [
                        { "label": "Menu & price", "intent": "menu" },
                        { "label": "Opening hours", "intent": "hours" },
                        { "label": "Contact / Reservation", "intent": "contact" }
                    ]
                }
            },
            "catalog": {
                "currency": "AUD",
                "promo": {
                    "title": "🔥 Lunar New Year Special",
                    "text": "Free gyoza with every large ramen",
                    "code": "LNY24",
                    "valid_until": "2026-02-28",
                    "images": ["promo_lny.jpg"],
                    "enabled": true
                },
                "categories": [
                    { "id": "ramen", "label": "Ramen", "items": [
                        { "name": "Tonkotsu Ramen", "price": 18.99, "desc": "18-hour pork broth, chashu, ajitama egg", "image": "tonkotsu.jpg", "allergens": ["egg", "gluten"] },
                        { "name": "Shoyu Ramen", "price": 16.5, "desc": "Clear soy broth, bamboo shoots, nori" },
                        { "name": "Spicy Miso Ramen", "price": 19.5, "desc": "Miso broth, chilli oil, minced pork", "may_contain": ["peanut"] }
                    ]},
                    { "id": "sides", "label": "Sides", "items": [
                        { "name": "Gyoza", "price": 9.0, "desc": "Pan-fried pork dumplings, 5 pieces" },
                        { "name": "Karaage Chicken", "price": 11.5, "desc": "Crispy fried chicken, yuzu mayo" },
                        { "name": "Prawn Tempura", "price": 12.0, "desc": "Three king prawns, light batter", "allergens": ["shellfish"] }
                    ]},
                    { "id": "drinks", "label": "Drinks", "items": [
                        { "name": "Yuzu Lemonade", "price": 6.5, "desc": "House made, lightly sparkling" },
                        { "name": "Green Tea", "price": 4.0, "desc": "" },
                        { "name": "Ramune", "desc": "Ask for today's flavours" }
                    ]}
                ]
            }
        }"#,
    )
    .expect("demo tenant json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, TenantStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TenantStore::open_path(dir.path().join("tenants")).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get_roundtrips() {
        let (_dir, store) = temp_store();
        store.put(&demo_tenant()).unwrap();
        let loaded = store.get("demo").unwrap();
        assert_eq!(loaded.name, "Kumo Ramen Bar");
        assert!(loaded.plan.is_pro());
        assert_eq!(loaded.catalog.categories.len(), 3);
    }

    #[test]
    fn missing_tenant_is_a_distinct_error() {
        let (_dir, store) = temp_store();
        match store.get("ghost") {
            Err(StoreError::NotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected NotFound, got {:?}", other.map(|c| c.id)),
        }
    }

    #[test]
    fn seeding_happens_only_once() {
        let (_dir, store) = temp_store();
        assert!(store.ensure_demo_tenant().unwrap());
        assert!(!store.ensure_demo_tenant().unwrap());
        assert_eq!(store.tenant_ids(), vec!["demo".to_string()]);
    }

    #[test]
    fn events_scan_newest_first_per_tenant() {
        let (_dir, store) = temp_store();
        let mut first = EventRecord::now("demo", "chat", "u1").with_reply("one");
        first.timestamp_ms = 1000;
        let mut second = EventRecord::now("demo", "chat", "u1").with_reply("two");
        second.timestamp_ms = 2000;
        let mut other = EventRecord::now("other", "chat", "u2").with_reply("elsewhere");
        other.timestamp_ms = 3000;

        store.append_event(&first).unwrap();
        store.append_event(&second).unwrap();
        store.append_event(&other).unwrap();

        let events = store.recent_events("demo", 10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].reply, "two");
        assert_eq!(events[1].reply, "one");
    }

    #[test]
    fn demo_tenant_has_the_blocks_the_pipeline_needs() {
        let demo = demo_tenant();
        assert!(demo.responses.contains_key("greeting"));
        assert!(demo.responses.contains_key("fallback"));
        assert!(demo.channel("phone").is_some());
    }
}
