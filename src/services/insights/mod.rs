/// LLM-backed cultural insight generation
use crate::{
    error::AppResult,
    models::{
        ConnectionStatus, DiscoveryParams, DiscoveryRecommendation, EvolutionParams,
        EvolutionPrediction, GrowthChallenge, GrowthChallengeParams,
    },
};

pub mod openai;

pub use openai::OpenAiClient;

/// Trait for insight generators
///
/// Each generation method returns at most the requested number of items; the
/// connectivity check fails with an error rather than returning `connected: false`.
#[async_trait::async_trait]
pub trait CulturalInsights: Send + Sync {
    async fn generate_growth_challenges(
        &self,
        params: &GrowthChallengeParams,
    ) -> AppResult<Vec<GrowthChallenge>>;

    async fn generate_discovery_recommendations(
        &self,
        params: &DiscoveryParams,
    ) -> AppResult<Vec<DiscoveryRecommendation>>;

    async fn generate_evolution_predictions(
        &self,
        params: &EvolutionParams,
    ) -> AppResult<Vec<EvolutionPrediction>>;

    async fn test_connection(&self) -> AppResult<ConnectionStatus>;
}
