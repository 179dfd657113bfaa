use crate::models::{CulturalProfile, DiscoveryParams, EvolutionParams, GrowthChallengeParams};

pub const SYSTEM_PROMPT: &str = "You are a cultural intelligence analyst. You study a person's \
tastes across music, film, books, food and travel and give specific, grounded suggestions. \
Always answer with a single JSON object and nothing else.";

/// Renders a profile as plain prompt text
pub fn describe_profile(profile: &CulturalProfile) -> String {
    let mut lines = Vec::new();

    if !profile.entities.is_empty() {
        let entities: Vec<String> = profile
            .entities
            .iter()
            .map(|entity| match &entity.entity_type {
                Some(kind) => format!("{} ({})", entity.name, short_type(kind)),
                None => entity.name.clone(),
            })
            .collect();
        lines.push(format!("Favourite entities: {}", entities.join(", ")));
    }

    if !profile.interests.is_empty() {
        lines.push(format!("Interests: {}", profile.interests.join(", ")));
    }

    if !profile.extra.is_empty() {
        // serde_json::Map always serializes
        let extra = serde_json::to_string(&profile.extra).unwrap_or_default();
        lines.push(format!("Additional profile data: {}", extra));
    }

    if lines.is_empty() {
        "The profile is empty; assume broad mainstream tastes.".to_string()
    } else {
        lines.join("\n")
    }
}

/// `urn:entity:movie` → `movie`
fn short_type(urn: &str) -> &str {
    urn.rsplit(':').next().unwrap_or(urn)
}

pub fn growth_challenges(params: &GrowthChallengeParams) -> String {
    let focus = if params.focus_areas.is_empty() {
        "any domain where the profile is narrow".to_string()
    } else {
        params.focus_areas.join(", ")
    };

    format!(
        "{profile}\n\n\
         Design {count} cultural growth challenges that push this person just outside their \
         comfort zone. Focus on: {focus}.\n\
         Respond as {{\"challenges\": [{{\"title\": string, \"description\": string, \
         \"category\": string, \"difficulty\": \"easy\"|\"medium\"|\"hard\", \
         \"suggestedEntities\": [string], \"estimatedDuration\": string}}]}}",
        profile = describe_profile(&params.profile),
        count = params.count,
        focus = focus,
    )
}

pub fn discovery_recommendations(params: &DiscoveryParams) -> String {
    let exclude = if params.exclude.is_empty() {
        String::new()
    } else {
        format!("\nDo not recommend any of: {}.", params.exclude.join(", "))
    };

    format!(
        "{profile}\n\n\
         Recommend {count} things this person has probably not discovered yet but is likely \
         to love, spread across different domains.{exclude}\n\
         Respond as {{\"recommendations\": [{{\"name\": string, \"type\": string, \
         \"reason\": string, \"confidence\": number between 0 and 1}}]}}",
        profile = describe_profile(&params.profile),
        count = params.count,
        exclude = exclude,
    )
}

pub fn evolution_predictions(params: &EvolutionParams) -> String {
    format!(
        "{profile}\n\n\
         Predict how this person's tastes are likely to evolve over the next {timeframe}. \
         Give 3 to 5 distinct trends.\n\
         Respond as {{\"predictions\": [{{\"trend\": string, \"description\": string, \
         \"likelihood\": number between 0 and 1, \"timeframe\": string}}]}}",
        profile = describe_profile(&params.profile),
        timeframe = params.timeframe,
    )
}
