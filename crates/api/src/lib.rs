mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use suraksha_agents::{AiChatError, AiChatInput, ChatOrchestrator, WizardInput};
use suraksha_core::estimate::{estimate, validate_utilization};
use suraksha_core::models::{PlanId, UtilizationInput};
use suraksha_core::recommend::recommend;
use suraksha_core::{PlanCatalog, WizardSession};
use suraksha_llm::{GatewayClient, GatewayConfig, LlmError, SearchClient, SearchConfig};
use suraksha_observability::AppMetrics;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::rate_limit::IpRateLimiter;

const SESSION_PURGE_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<ChatOrchestrator>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: suraksha_observability::MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    ai_chat: bool,
    web_search: bool,
}

#[derive(Debug, Deserialize)]
struct RecommendationRequest {
    family_size: u32,
    monthly_income: f64,
}

#[derive(Debug, Deserialize)]
struct EstimateRequest {
    plan_id: String,
    #[serde(default)]
    utilization: Option<UtilizationInput>,
}

pub async fn build_app() -> Result<Router> {
    let metrics = AppMetrics::shared();
    let catalog = PlanCatalog::standard();

    let gateway = match GatewayConfig::from_env() {
        Some(config) => Some(GatewayClient::new(config).context("failed to build gateway client")?),
        None => None,
    };
    let search = SearchConfig::from_env().map(|config| {
        let http = reqwest_client();
        SearchClient::new(http, config)
    });

    let agent = Arc::new(ChatOrchestrator::new(
        catalog,
        gateway,
        search,
        metrics.clone(),
    ));

    {
        let agent = agent.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = agent.purge_expired();
                if removed > 0 {
                    tracing::info!(removed, "purged expired chat sessions");
                }
            }
        });
    }

    let api_key = env::var("SURAKSHA_API_KEY").unwrap_or_else(|_| "dev-suraksha-key".to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("SURAKSHA_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("SURAKSHA_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(80);

    let state = ApiState {
        agent,
        metrics,
        api_key,
        limiter: IpRateLimiter::new(rate_limit_window, rate_limit_max),
        allowed_origins: Arc::new(parse_allowed_origins()),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/plans", get(plans))
        .route("/v1/recommendations", post(recommendations))
        .route("/v1/estimate", post(estimate_cost))
        .route("/v1/wizard", post(wizard))
        .route("/v1/ai/chat", post(ai_chat))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            ai_chat: state.agent.ai_mode_enabled(),
            web_search: state.agent.search_enabled(),
        },
    };
    (StatusCode::OK, Json(payload))
}

async fn plans(State(state): State<ApiState>) -> impl IntoResponse {
    state.metrics.inc_request();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "plans": state.agent.catalog().plans(),
            "greeting": WizardSession::greeting(),
        })),
    )
}

async fn recommendations(
    State(state): State<ApiState>,
    Json(request): Json<RecommendationRequest>,
) -> impl IntoResponse {
    state.metrics.inc_request();

    if request.family_size < 1 {
        return bad_request("invalid_family_size", "family_size must be at least 1");
    }
    if request.monthly_income < 0.0 || !request.monthly_income.is_finite() {
        return bad_request(
            "invalid_income",
            "monthly_income must be a non-negative number",
        );
    }

    let result = recommend(
        state.agent.catalog(),
        request.family_size,
        request.monthly_income,
    );
    (StatusCode::OK, Json(result)).into_response()
}

async fn estimate_cost(
    State(state): State<ApiState>,
    Json(request): Json<EstimateRequest>,
) -> impl IntoResponse {
    state.metrics.inc_request();

    let Some(plan_id) = PlanId::parse(&request.plan_id) else {
        return bad_request("unknown_plan", "plan_id does not match any catalog plan");
    };
    let Some(plan) = state.agent.catalog().get(plan_id) else {
        return bad_request("unknown_plan", "plan_id does not match any catalog plan");
    };

    let utilization = request.utilization.unwrap_or_default();
    if let Err(error) = validate_utilization(&utilization) {
        return bad_request("invalid_utilization", &error.to_string());
    }

    let breakdown = estimate(plan, &utilization);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "plan": plan,
            "utilization": utilization,
            "breakdown": breakdown,
        })),
    )
        .into_response()
}

async fn wizard(
    State(state): State<ApiState>,
    Json(input): Json<WizardInput>,
) -> impl IntoResponse {
    let reply = state.agent.handle_wizard(input);
    (StatusCode::OK, Json(reply))
}

async fn ai_chat(
    State(state): State<ApiState>,
    Json(input): Json<AiChatInput>,
) -> impl IntoResponse {
    match state.agent.handle_ai_chat(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => ai_chat_error_response(error),
    }
}

fn ai_chat_error_response(error: AiChatError) -> Response {
    let (status, message) = match &error {
        AiChatError::Busy => (
            StatusCode::CONFLICT,
            "A response is already being generated. Please wait for it to finish.",
        ),
        AiChatError::Disabled => (
            StatusCode::SERVICE_UNAVAILABLE,
            "AI chat is not configured on this server.",
        ),
        AiChatError::Llm(llm) => {
            let status = match llm {
                LlmError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                LlmError::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, llm.user_message())
        }
    };

    (
        status,
        Json(serde_json::json!({
            "error": message,
        })),
    )
        .into_response()
}

fn bad_request(code: &str, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": code,
            "message": message,
        })),
    )
        .into_response()
}

fn is_public_endpoint(path: &str) -> bool {
    path == "/health"
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if request.method() == Method::OPTIONS || is_public_endpoint(path) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_allowed_origins() -> Vec<String> {
    env::var("SURAKSHA_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:5500")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}

fn reqwest_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(6))
        .timeout(Duration::from_secs(20))
        .build()
        .unwrap_or_default()
}
