pub mod insights;
pub mod prompts;
pub mod providers;

pub use insights::{CulturalInsights, OpenAiClient};
pub use providers::{QlooClient, RecommendationProvider};
