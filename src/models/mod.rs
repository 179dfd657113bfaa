use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Cultural Profile
// ============================================================================

/// A user's cultural taste profile as sent by the browser
///
/// Only the well-known keys are typed; anything else the client sends is kept in
/// `extra` and forwarded to the prompts untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CulturalProfile {
    #[serde(default)]
    pub entities: Vec<ProfileEntity>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An entity the user has signalled affinity for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEntity {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

// ============================================================================
// Generation Inputs
// ============================================================================

pub const DEFAULT_CHALLENGE_COUNT: usize = 5;
pub const DEFAULT_DISCOVERY_COUNT: usize = 8;
pub const DEFAULT_TIMEFRAME: &str = "6 months";

/// Parameters for growth challenge generation
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthChallengeParams {
    pub profile: CulturalProfile,
    pub focus_areas: Vec<String>,
    pub count: usize,
}

/// Parameters for discovery recommendation generation
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryParams {
    pub profile: CulturalProfile,
    /// Names the user already knows and should not be recommended again
    pub exclude: Vec<String>,
    pub count: usize,
}

/// Parameters for taste evolution predictions
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionParams {
    pub profile: CulturalProfile,
    pub timeframe: String,
}

// ============================================================================
// Generation Outputs
// ============================================================================

/// A challenge nudging the user outside their usual cultural territory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrowthChallenge {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub suggested_entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRecommendation {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionPrediction {
    pub trend: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
}

/// Outcome of a connectivity check against the LLM API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub model: String,
    pub latency_ms: u64,
}

// ============================================================================
// Qloo API Types
// ============================================================================

pub const DEFAULT_TAKE: u32 = 10;
pub const MAX_TAKE: u32 = 50;

/// An entity as returned by Qloo search and insights endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub entity_id: String,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

/// Request for recommendations seeded by known entities
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub entity_ids: Vec<String>,
    /// Qloo entity type URN to recommend, e.g. `urn:entity:movie`
    pub target_type: String,
    pub take: u32,
}

/// Free-text entity search
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySearch {
    pub query: String,
    pub types: Vec<String>,
    pub take: u32,
}

impl EntitySearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            types: Vec::new(),
            take: DEFAULT_TAKE,
        }
    }
}

/// Clamps a client-supplied page size into the range Qloo accepts
pub fn clamp_take(take: Option<u32>) -> u32 {
    take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE)
}
