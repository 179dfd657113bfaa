use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    error::{ApiError, ApiResult},
    middleware::RequestId,
    models::{
        CulturalProfile, DiscoveryParams, EvolutionParams, GrowthChallengeParams,
        DEFAULT_CHALLENGE_COUNT, DEFAULT_DISCOVERY_COUNT, DEFAULT_TIMEFRAME,
    },
    routes::{
        response::{list_envelope, present_str},
        AppState,
    },
};

const PROFILE_REQUIRED: &str = "Cultural profile is required";
const MAX_ITEMS: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthChallengesRequest {
    pub cultural_profile: Option<CulturalProfile>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    pub cultural_profile: Option<CulturalProfile>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionRequest {
    pub cultural_profile: Option<CulturalProfile>,
    pub timeframe: Option<String>,
}

fn require_profile(profile: Option<CulturalProfile>) -> ApiResult<CulturalProfile> {
    profile.ok_or_else(|| ApiError::missing(PROFILE_REQUIRED, vec!["culturalProfile"]))
}

fn item_count(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_ITEMS)
}

/// Handler for cultural growth challenge generation
pub async fn cultural_growth(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<GrowthChallengesRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let params = GrowthChallengeParams {
        profile: require_profile(request.cultural_profile)?,
        focus_areas: request.focus_areas,
        count: item_count(request.count, DEFAULT_CHALLENGE_COUNT),
    };

    tracing::info!(
        request_id = %request_id,
        count = params.count,
        focus_areas = params.focus_areas.len(),
        "Generating cultural growth challenges"
    );

    let challenges = state
        .insights
        .generate_growth_challenges(&params)
        .await
        .map_err(ApiError::upstream("Failed to generate cultural growth challenges"))?;

    Ok(list_envelope("challenges", &challenges, request_id, Map::new()))
}

/// Handler for discovery recommendation generation
pub async fn discovery(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<DiscoveryRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let params = DiscoveryParams {
        profile: require_profile(request.cultural_profile)?,
        exclude: request.exclude,
        count: item_count(request.count, DEFAULT_DISCOVERY_COUNT),
    };

    tracing::info!(
        request_id = %request_id,
        count = params.count,
        excluded = params.exclude.len(),
        "Generating discovery recommendations"
    );

    let recommendations = state
        .insights
        .generate_discovery_recommendations(&params)
        .await
        .map_err(ApiError::upstream("Failed to generate discovery recommendations"))?;

    Ok(list_envelope(
        "recommendations",
        &recommendations,
        request_id,
        Map::new(),
    ))
}

/// Handler for taste evolution predictions
pub async fn evolution(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<EvolutionRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let params = EvolutionParams {
        profile: require_profile(request.cultural_profile)?,
        timeframe: present_str(request.timeframe).unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string()),
    };

    tracing::info!(
        request_id = %request_id,
        timeframe = %params.timeframe,
        "Generating evolution predictions"
    );

    let predictions = state
        .insights
        .generate_evolution_predictions(&params)
        .await
        .map_err(ApiError::upstream("Failed to generate evolution predictions"))?;

    let mut context = Map::new();
    context.insert("timeframe".to_string(), json!(params.timeframe));

    Ok(list_envelope("predictions", &predictions, request_id, context))
}

/// Handler for the LLM connectivity check
pub async fn test_connection(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<Value>> {
    tracing::info!(request_id = %request_id, "Testing OpenAI connection");

    let status = state
        .insights
        .test_connection()
        .await
        .map_err(ApiError::upstream("OpenAI connection test failed"))?;

    Ok(Json(json!({
        "connected": status.connected,
        "success": true,
        "metadata": {
            "model": status.model,
            "latencyMs": status.latency_ms,
            "generatedAt": Utc::now().to_rfc3339(),
            "requestId": request_id.as_str(),
        },
    })))
}
