//! Shapes of a playthrough as the model produces them.
//!
//! Nothing in here is computed locally: every `GameState` comes out of a parsed
//! model reply and is replaced wholesale on the next successful one. Parsing is
//! the validation step, so required fields stay non-optional and enums are closed.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use serde::Deserializer;

pub mod endpoints;
pub mod session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Realistic,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Realistic => "realistic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ChoiceType {
    Diplomacy,
    Military,
    Economy,
    Technology,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum AiPersonality {
    Aggressor,
    Diplomat,
    Trader,
    Scientist,
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum DiplomacyStatus {
    Hostile,
    Neutral,
    Friendly,
    Allied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Terrain {
    Plains,
    Mountains,
    Forests,
    Desert,
    Coastal,
    Urban,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum IntelType {
    Military,
    Economic,
    Technological,
    Territorial,
    Diplomatic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum MissionType {
    Spy,
    Sabotage,
    Counterintel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum MissionStatus {
    Planning,
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum TradeRouteStatus {
    Active,
    Disrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum PolicyType {
    Expansionism,
    Pacifism,
    IndustrialRevolution,
    Conscription,
    Propaganda,
    FreeTrade,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Resources {
    #[serde(default, deserialize_with = "whole_number")]
    pub food: i64,
    #[serde(default, deserialize_with = "whole_number")]
    pub iron: i64,
    #[serde(default, deserialize_with = "whole_number")]
    pub gold: i64,
    #[serde(default, deserialize_with = "whole_number")]
    pub knowledge: i64,
}

/// A partial resource amount, used for costs and policy effects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ResourceCost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iron: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct TradeRoute {
    pub id: String,
    pub connected_territories: Vec<String>,
    pub passive_income: f64,
    pub diplomacy_boost: f64,
    /// Chance of disruption, 0-100.
    pub vulnerability: f64,
    pub status: TradeRouteStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PolicyEffects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub military: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diplomacy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Policy {
    pub id: String,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub effects: PolicyEffects,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MitigationTool {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub cost: ResourceCost,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct RivalCivilization {
    pub name: String,
    pub personality: AiPersonality,
    #[serde(default)]
    pub territories: Vec<String>,
    #[serde(deserialize_with = "whole_number")]
    pub military: i64,
    #[serde(deserialize_with = "whole_number")]
    pub economy: i64,
    #[serde(deserialize_with = "whole_number")]
    pub technology: i64,
    pub diplomacy_status: DiplomacyStatus,
    #[serde(default)]
    pub last_known_activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct TerritoryInfo {
    pub name: String,
    pub terrain: Terrain,
    #[serde(default)]
    pub resources: Vec<String>,
    /// 1-10.
    #[serde(deserialize_with = "whole_number")]
    pub strategic_value: i64,
    /// Percentage.
    #[serde(deserialize_with = "whole_number")]
    pub defense_bonus: i64,
    #[serde(deserialize_with = "whole_number")]
    pub supply_cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct IntelligenceReport {
    /// Name of the rival civilization the report is about.
    pub target: String,
    pub intel_type: IntelType,
    /// 0-100.
    pub accuracy: f64,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct EspionageMission {
    pub id: String,
    #[serde(rename = "type")]
    pub mission_type: MissionType,
    pub target: String,
    pub risk: f64,
    pub reward: f64,
    /// In turns.
    #[serde(deserialize_with = "whole_number")]
    pub duration: i64,
    pub status: MissionStatus,
}

/// Full snapshot of a playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct GameState {
    #[serde(deserialize_with = "whole_number")]
    pub year: i64,
    pub ruler_title: String,
    pub country_name: String,
    /// Millions.
    pub population: f64,
    #[serde(deserialize_with = "whole_number")]
    pub military: i64,
    #[serde(deserialize_with = "whole_number")]
    pub economy: i64,
    #[serde(deserialize_with = "whole_number")]
    pub technology: i64,
    pub territories: Vec<String>,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default)]
    pub trade_routes: Vec<TradeRoute>,
    #[serde(default)]
    pub active_policies: Vec<Policy>,
    #[serde(default)]
    pub available_policies: Vec<Policy>,
    #[serde(default)]
    pub mitigation_tools: Vec<MitigationTool>,
    #[serde(default)]
    pub rival_civilizations: Vec<RivalCivilization>,
    #[serde(default)]
    pub intelligence_reports: Vec<IntelligenceReport>,
    #[serde(default)]
    pub active_missions: Vec<EspionageMission>,
    #[serde(default)]
    pub world_territories: Vec<TerritoryInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StabilityRange {
    pub min: f64,
    pub max: f64,
}

/// A selectable action for the current turn. Discarded once a choice is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub choice_type: ChoiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_range: Option<StabilityRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_tools: Option<Vec<MitigationTool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ScoreDetails {
    #[serde(deserialize_with = "whole_number")]
    pub score: i64,
    pub title: String,
    pub analysis: String,
}

/// Reply to both game initialization and turn processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct TurnResponse {
    pub description: String,
    pub summary: Vec<String>,
    pub game_state: GameState,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StartingCivilizations {
    pub civilizations: Vec<String>,
}

impl TurnResponse {
    /// Checks that go beyond what the type system enforces on parse.
    pub fn check(&self) -> Result<(), String> {
        if self.choices.is_empty() {
            return Err("reply offered no choices".to_string());
        }
        if let Some(choice) = self.choices.iter().find(|c| c.text.trim().is_empty()) {
            return Err(format!("choice {} has no text", choice.id));
        }
        Ok(())
    }

    pub fn find_choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }
}

/// Accepts any finite JSON number and rounds it; the model is not reliable about
/// emitting integers where the schema says NUMBER.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("number is not finite"));
    }
    Ok(value.round() as i64)
}
