/// Cultural recommendation provider abstraction
///
/// Route handlers and the debounced search only see this trait, so the Qloo client
/// can be swapped for a test double or another catalogue.
use crate::{
    error::AppResult,
    models::{Entity, EntitySearch, RecommendationQuery},
};

pub mod qloo;

pub use qloo::QlooClient;

/// Trait for recommendation providers
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Recommend entities of `query.target_type` seeded by the given entity IDs
    async fn get_recommendations(&self, query: &RecommendationQuery) -> AppResult<Vec<Entity>>;

    /// Free-text entity lookup, used for autocomplete
    async fn search_entities(&self, search: &EntitySearch) -> AppResult<Vec<Entity>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
