use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::AppResult,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{CulturalInsights, OpenAiClient, QlooClient, RecommendationProvider},
};

pub mod openai;
pub mod qloo;
pub mod response;

/// Shared application state: the two upstream clients
#[derive(Clone)]
pub struct AppState {
    pub insights: Arc<dyn CulturalInsights>,
    pub recommendations: Arc<dyn RecommendationProvider>,
}

impl AppState {
    pub fn new(
        insights: Arc<dyn CulturalInsights>,
        recommendations: Arc<dyn RecommendationProvider>,
    ) -> Self {
        Self {
            insights,
            recommendations,
        }
    }

    /// Builds the real OpenAI and Qloo clients from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let insights = OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_api_url.clone(),
            config.openai_model.clone(),
            timeout,
        )?;
        let recommendations = QlooClient::new(
            config.qloo_api_key.clone(),
            config.qloo_api_url.clone(),
            timeout,
        )?;

        Ok(Self::new(Arc::new(insights), Arc::new(recommendations)))
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/openai/cultural-growth", post(openai::cultural_growth))
        .route("/openai/discovery", post(openai::discovery))
        .route("/openai/evolution", post(openai::evolution))
        .route("/openai/test", get(openai::test_connection))
        .route("/qloo/recommendations", post(qloo::recommendations))
        .route("/qloo/search", get(qloo::search))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
