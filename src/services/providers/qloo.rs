/// Qloo Taste AI provider
///
/// API Flow:
/// 1. Entity Search: /search → free-text lookup returning entity IDs
/// 2. Insights: /v2/insights → recommendations of a target type seeded by entity IDs
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{Entity, EntitySearch, RecommendationQuery},
    services::providers::RecommendationProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct InsightsResponse {
    results: InsightsResults,
}

#[derive(Debug, Deserialize)]
struct InsightsResults {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Clone)]
pub struct QlooClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl QlooClient {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issues an authenticated GET and returns the raw body of a 2xx response
    async fn get(&self, path: &str, params: &[(&str, String)]) -> AppResult<String> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Qloo API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.text().await?)
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, response = %body, "Failed to deserialize Qloo response");
        AppError::InvalidResponse(format!("Failed to parse Qloo response: {}", e))
    })
}

#[async_trait::async_trait]
impl RecommendationProvider for QlooClient {
    async fn get_recommendations(&self, query: &RecommendationQuery) -> AppResult<Vec<Entity>> {
        if query.entity_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one seed entity is required".to_string(),
            ));
        }

        let params = [
            ("filter.type", query.target_type.clone()),
            ("signal.interests.entities", query.entity_ids.join(",")),
            ("take", query.take.to_string()),
        ];

        let body = self.get("/v2/insights", &params).await?;
        let insights: InsightsResponse = parse_body(&body)?;

        tracing::info!(
            seeds = query.entity_ids.len(),
            target_type = %query.target_type,
            results = insights.results.entities.len(),
            provider = "qloo",
            "Recommendations fetched"
        );

        Ok(insights.results.entities)
    }

    async fn search_entities(&self, search: &EntitySearch) -> AppResult<Vec<Entity>> {
        if search.query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let mut params = vec![
            ("query", search.query.trim().to_string()),
            ("take", search.take.to_string()),
        ];
        if !search.types.is_empty() {
            params.push(("types", search.types.join(",")));
        }

        let body = self.get("/search", &params).await?;
        let found: SearchResponse = parse_body(&body)?;

        tracing::info!(
            query = %search.query,
            results = found.results.len(),
            provider = "qloo",
            "Entity search completed"
        );

        Ok(found.results)
    }

    fn name(&self) -> &'static str {
        "qloo"
    }
}
