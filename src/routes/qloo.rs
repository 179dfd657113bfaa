use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    error::{ApiError, ApiResult},
    middleware::RequestId,
    models::{clamp_take, EntitySearch, RecommendationQuery},
    routes::{
        response::{list_envelope, present_list, present_str},
        AppState,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsRequest {
    pub entity_ids: Option<Vec<String>>,
    pub target_type: Option<String>,
    pub take: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    /// Comma-separated entity type URNs
    pub types: Option<String>,
    pub take: Option<u32>,
}

/// Handler for Qloo recommendations seeded by known entities
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationsRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;

    let entity_ids = present_list(request.entity_ids);
    let target_type = present_str(request.target_type);
    let (entity_ids, target_type) = match (entity_ids, target_type) {
        (Some(ids), Some(target)) => (ids, target),
        (ids, target) => {
            let mut missing = Vec::new();
            if ids.is_none() {
                missing.push("entityIds");
            }
            if target.is_none() {
                missing.push("targetType");
            }
            return Err(ApiError::missing(
                "Entity IDs and target type are required",
                missing,
            ));
        }
    };

    let query = RecommendationQuery {
        entity_ids,
        target_type,
        take: clamp_take(request.take),
    };

    tracing::info!(
        request_id = %request_id,
        seeds = query.entity_ids.len(),
        target_type = %query.target_type,
        provider = state.recommendations.name(),
        "Fetching recommendations"
    );

    let entities = state
        .recommendations
        .get_recommendations(&query)
        .await
        .map_err(ApiError::upstream("Failed to fetch recommendations"))?;

    let mut context = Map::new();
    context.insert("targetType".to_string(), json!(query.target_type));

    Ok(list_envelope("recommendations", &entities, request_id, context))
}

/// Handler for free-text entity search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;

    let query = present_str(params.query)
        .ok_or_else(|| ApiError::missing("Search query is required", vec!["query"]))?;

    let types = params
        .types
        .map(|types| {
            types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let search = EntitySearch {
        query: query.trim().to_string(),
        types,
        take: clamp_take(params.take),
    };

    tracing::info!(
        request_id = %request_id,
        query = %search.query,
        provider = state.recommendations.name(),
        "Searching entities"
    );

    let entities = state
        .recommendations
        .search_entities(&search)
        .await
        .map_err(ApiError::upstream("Failed to search entities"))?;

    let mut context = Map::new();
    context.insert("query".to_string(), json!(search.query));

    Ok(list_envelope("entities", &entities, request_id, context))
}
