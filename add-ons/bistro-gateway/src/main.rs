//! Axum-based HTTP gateway for the bistro chatbot. Config-driven via
//! GatewayConfig.
//!
//! Routes: health check, the greeting turn, and the chat resolution
//! endpoint. Tenant lookup failures map to 404; everything the pipeline
//! produces is a 200 with `{reply, messages, buttons, meta}` where `reply`
//! mirrors the first text bubble for older widget clients.

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bistro_core::{
    render_greeting, EventRecord, GatewayConfig, ResolutionResult, Resolver, StoreError,
    TenantContext, TenantStore,
};
use bistro_llm::ChatClient;

#[tokio::main]
async fn main() {
    // Load .env if present (before any env::var calls).
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[bistro-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(GatewayConfig::load().expect("load GatewayConfig"));
    let storage = Path::new(&config.storage_path);
    let store = Arc::new(
        TenantStore::open_path(storage.join("bistro_tenants")).expect("open tenant store"),
    );

    match store.ensure_demo_tenant() {
        Ok(true) => tracing::info!("Seeded demo tenant into empty store"),
        Ok(false) => tracing::debug!("Tenant store already populated"),
        Err(e) => tracing::warn!("Failed to seed demo tenant: {}", e),
    }

    let backend = Arc::new(ChatClient::from_config(&config));
    let resolver = Arc::new(Resolver::new(backend));

    let app = build_app(AppState {
        config: Arc::clone(&config),
        store,
        resolver,
    });

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("{} listening on {}", config.app_name, addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/greeting", get(greeting))
        .route("/api/v1/chat", post(chat))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
struct AppState {
    config: Arc<GatewayConfig>,
    store: Arc<TenantStore>,
    resolver: Arc<Resolver>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

/// GET /api/v1/health – liveness check for widgets and scripts.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "app_name": state.config.app_name,
        "llm_mode": state.config.llm_mode,
    }))
}

#[derive(serde::Deserialize)]
struct GreetingQuery {
    tenant_id: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /api/v1/greeting – the initial welcome turn for a tenant's widget.
async fn greeting(
    State(state): State<AppState>,
    Query(q): Query<GreetingQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ctx = load_tenant(&state, &q.tenant_id)?;
    let result = render_greeting(&ctx);
    track(&state, &ctx, "greeting", q.user_id.as_deref(), None, None, &result);
    tracing::info!(
        target: "bistro::gateway",
        tenant_id = %ctx.id,
        "greeting rendered"
    );
    Ok(Json(response_body(&ctx, &result)))
}

/// One user turn: either free text or a button intent; with neither the
/// pipeline resolves to the tenant's fallback block.
#[derive(serde::Deserialize)]
struct ChatRequest {
    tenant_id: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// POST /api/v1/chat – resolves one turn through the pipeline.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ctx = load_tenant(&state, &req.tenant_id)?;
    let result = state
        .resolver
        .resolve(&ctx, req.message.as_deref(), req.intent.as_deref())
        .await;
    track(
        &state,
        &ctx,
        "chat",
        req.user_id.as_deref(),
        req.message.as_deref(),
        req.intent.as_deref(),
        &result,
    );
    tracing::info!(
        target: "bistro::gateway",
        tenant_id = %ctx.id,
        fragments = result.messages.len(),
        "chat resolved"
    );
    Ok(Json(response_body(&ctx, &result)))
}

fn response_body(ctx: &TenantContext, result: &ResolutionResult) -> serde_json::Value {
    serde_json::json!({
        "reply": result.first_text(),
        "messages": result.messages,
        "buttons": result.buttons,
        "meta": { "tenant": ctx.name },
    })
}

fn load_tenant(state: &AppState, tenant_id: &str) -> Result<TenantContext, ApiError> {
    state.store.get(tenant_id).map_err(|e| match e {
        StoreError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("tenant not found: {}", id) })),
        ),
        other => {
            tracing::error!(target: "bistro::gateway", error = %other, "tenant store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "internal error" })),
            )
        }
    })
}

/// Appends an analytics event after resolution. Failures only warn; the
/// user-facing reply is never blocked on the event log.
fn track(
    state: &AppState,
    ctx: &TenantContext,
    kind: &str,
    user_id: Option<&str>,
    message: Option<&str>,
    intent: Option<&str>,
    result: &ResolutionResult,
) {
    if !ctx.features.analytics_enabled {
        return;
    }
    let event = EventRecord::now(&ctx.id, kind, user_id.unwrap_or("anonymous"))
        .with_message(message)
        .with_intent(intent)
        .with_reply(result.first_text());
    if let Err(e) = state.store.append_event(&event) {
        tracing::warn!(
            target: "bistro::gateway",
            tenant_id = %ctx.id,
            error = %e,
            "failed to append analytics event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use bistro_core::{demo_tenant, PlanTier};
    use tower::ServiceExt;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            app_name: "Test Gateway".to_string(),
            port: 8004,
            storage_path: "./data".to_string(),
            llm_mode: "mock".to_string(),
            llm_base_url: String::new(),
            llm_model: String::new(),
            llm_timeout_secs: 5,
        }
    }

    fn test_app(dir: &tempfile::TempDir) -> Router {
        let store = Arc::new(TenantStore::open_path(dir.path().join("tenants")).unwrap());
        store.put(&demo_tenant()).unwrap();

        let mut basic = demo_tenant();
        basic.id = "basic-cafe".to_string();
        basic.name = "Basic Cafe".to_string();
        basic.plan = PlanTier::Basic;
        basic.features.llm_enabled = false;
        store.put(&basic).unwrap();

        let resolver = Arc::new(Resolver::new(Arc::new(ChatClient::mock())));
        build_app(AppState {
            config: Arc::new(test_config()),
            store,
            resolver,
        })
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_chat(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["llm_mode"], "mock");
    }

    #[tokio::test]
    async fn greeting_returns_hydrated_welcome() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/greeting?tenant_id=demo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert!(json["reply"].as_str().unwrap().contains("Kumo Ramen Bar"));
        assert!(json["buttons"].as_array().unwrap().len() >= 3);
        assert_eq!(json["meta"]["tenant"], "Kumo Ramen Bar");
    }

    #[tokio::test]
    async fn unknown_tenant_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(post_chat(serde_json::json!({ "tenant_id": "ghost", "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let json = body_json(res).await;
        assert!(json["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn chat_without_message_or_intent_returns_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(post_chat(serde_json::json!({ "tenant_id": "demo" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert!(json["reply"].as_str().unwrap().contains("didn't quite get that"));
    }

    #[tokio::test]
    async fn basic_tier_delivery_question_routes_to_order_food() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(post_chat(serde_json::json!({
                "tenant_id": "basic-cafe",
                "message": "do you deliver?"
            })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert!(json["reply"]
            .as_str()
            .unwrap()
            .contains("official ordering channels"));
    }

    #[tokio::test]
    async fn pro_tenant_fuzzy_search_finds_item_detail() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(post_chat(serde_json::json!({
                "tenant_id": "demo",
                "message": "tonkotsu"
            })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        let messages = json["messages"].as_array().unwrap();
        let texts: Vec<&str> = messages
            .iter()
            .filter(|m| m["type"] == "text")
            .filter_map(|m| m["text"].as_str())
            .collect();
        assert!(texts.iter().any(|t| t.contains("Tonkotsu Ramen")));
        assert!(texts.iter().any(|t| t.contains("AUD 18.99")));
    }

    #[tokio::test]
    async fn button_intent_returns_category_listing() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(post_chat(serde_json::json!({
                "tenant_id": "demo",
                "intent": "menu:sides"
            })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        let messages = json["messages"].as_array().unwrap();
        assert!(messages
            .iter()
            .filter_map(|m| m["text"].as_str())
            .any(|t| t.contains("Gyoza")));
        // Last fragment is text so the buttons attach to prose.
        assert_eq!(messages.last().unwrap()["type"], "text");
    }

    #[tokio::test]
    async fn pro_tenant_unconfigured_llm_gets_fixed_notice() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let res = app
            .oneshot(post_chat(serde_json::json!({
                "tenant_id": "demo",
                "message": "is the broth gluten free"
            })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["reply"], bistro_core::LLM_NOT_CONFIGURED);
    }
}
