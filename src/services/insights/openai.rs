//! OpenAI chat completions client

use std::time::{Duration, Instant};

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{
        ConnectionStatus, DiscoveryParams, DiscoveryRecommendation, EvolutionParams,
        EvolutionPrediction, GrowthChallenge, GrowthChallengeParams,
    },
    services::{insights::CulturalInsights, prompts},
};

const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for the OpenAI chat completions API
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, api_url: String, model: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Runs one JSON-mode completion and decodes the array stored under `key`
    async fn complete_list<T: DeserializeOwned>(
        &self,
        user_prompt: String,
        key: &str,
    ) -> AppResult<Vec<T>> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(prompts::SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user_prompt),
                },
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenAI API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            AppError::InvalidResponse(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::InvalidResponse("No content in OpenAI response".to_string()))?;

        parse_list(&content, key)
    }
}

/// Extracts `key` from the model's JSON answer
///
/// A bare top-level array is accepted as well, since models occasionally skip the wrapper.
fn parse_list<T: DeserializeOwned>(content: &str, key: &str) -> AppResult<Vec<T>> {
    let value: serde_json::Value = serde_json::from_str(content.trim()).map_err(|e| {
        tracing::error!(error = %e, content = %content, "Model answer is not JSON");
        AppError::InvalidResponse(format!("Model answer is not valid JSON: {}", e))
    })?;

    let items = match value {
        array @ serde_json::Value::Array(_) => array,
        serde_json::Value::Object(mut map) => map.remove(key).ok_or_else(|| {
            AppError::InvalidResponse(format!("Model answer is missing \"{}\"", key))
        })?,
        _ => {
            return Err(AppError::InvalidResponse(format!(
                "Model answer has no \"{}\" list",
                key
            )))
        }
    };

    serde_json::from_value(items).map_err(|e| {
        AppError::InvalidResponse(format!("Unexpected shape for \"{}\": {}", key, e))
    })
}

#[async_trait::async_trait]
impl CulturalInsights for OpenAiClient {
    async fn generate_growth_challenges(
        &self,
        params: &GrowthChallengeParams,
    ) -> AppResult<Vec<GrowthChallenge>> {
        let mut challenges: Vec<GrowthChallenge> = self
            .complete_list(prompts::growth_challenges(params), "challenges")
            .await?;
        challenges.truncate(params.count);

        tracing::info!(
            requested = params.count,
            generated = challenges.len(),
            model = %self.model,
            "Growth challenges generated"
        );

        Ok(challenges)
    }

    async fn generate_discovery_recommendations(
        &self,
        params: &DiscoveryParams,
    ) -> AppResult<Vec<DiscoveryRecommendation>> {
        let mut recommendations: Vec<DiscoveryRecommendation> = self
            .complete_list(prompts::discovery_recommendations(params), "recommendations")
            .await?;
        recommendations.retain(|r| {
            !params
                .exclude
                .iter()
                .any(|known| known.eq_ignore_ascii_case(&r.name))
        });
        recommendations.truncate(params.count);

        tracing::info!(
            requested = params.count,
            generated = recommendations.len(),
            model = %self.model,
            "Discovery recommendations generated"
        );

        Ok(recommendations)
    }

    async fn generate_evolution_predictions(
        &self,
        params: &EvolutionParams,
    ) -> AppResult<Vec<EvolutionPrediction>> {
        let predictions: Vec<EvolutionPrediction> = self
            .complete_list(prompts::evolution_predictions(params), "predictions")
            .await?;

        tracing::info!(
            timeframe = %params.timeframe,
            generated = predictions.len(),
            model = %self.model,
            "Evolution predictions generated"
        );

        Ok(predictions)
    }

    async fn test_connection(&self) -> AppResult<ConnectionStatus> {
        let started = Instant::now();

        let response = self
            .http_client
            .get(format!("{}/v1/models", self.api_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenAI API returned status {}: {}",
                status, body
            )));
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(latency_ms, "OpenAI connection verified");

        Ok(ConnectionStatus {
            connected: true,
            model: self.model.clone(),
            latency_ms,
        })
    }
}
