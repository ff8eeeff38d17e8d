//! Fixed reference data for the world map.

use std::time::Duration;

use crate::game::{GameState, Terrain, TerritoryInfo};

/// Wall-clock length of one playthrough.
pub const GAME_DURATION: Duration = Duration::from_secs(15 * 60);

pub const WORLD_REGIONS: [&str; 15] = [
    "Western Europe",
    "Eastern Europe",
    "North America",
    "South America",
    "North Africa",
    "Sub-Saharan Africa",
    "Middle East",
    "Central Asia",
    "East Asia",
    "South Asia",
    "Southeast Asia",
    "Oceania",
    "The Caribbean",
    "Siberia",
    "The Andes",
];

/// Static description of one region, in the same order as [`WORLD_REGIONS`].
pub struct RegionData {
    pub name: &'static str,
    pub terrain: Terrain,
    pub resources: &'static [&'static str],
    pub strategic_value: i64,
    pub defense_bonus: i64,
    pub supply_cost: i64,
}

pub const TERRITORY_DATA: [RegionData; 15] = [
    RegionData {
        name: "Western Europe",
        terrain: Terrain::Plains,
        resources: &["Agriculture", "Industry", "Trade"],
        strategic_value: 9,
        defense_bonus: 15,
        supply_cost: 8,
    },
    RegionData {
        name: "Eastern Europe",
        terrain: Terrain::Plains,
        resources: &["Agriculture", "Minerals"],
        strategic_value: 7,
        defense_bonus: 10,
        supply_cost: 6,
    },
    RegionData {
        name: "North America",
        terrain: Terrain::Forests,
        resources: &["Agriculture", "Industry", "Oil"],
        strategic_value: 8,
        defense_bonus: 12,
        supply_cost: 7,
    },
    RegionData {
        name: "South America",
        terrain: Terrain::Mountains,
        resources: &["Minerals", "Agriculture", "Oil"],
        strategic_value: 6,
        defense_bonus: 20,
        supply_cost: 9,
    },
    RegionData {
        name: "North Africa",
        terrain: Terrain::Desert,
        resources: &["Oil", "Minerals"],
        strategic_value: 7,
        defense_bonus: 8,
        supply_cost: 5,
    },
    RegionData {
        name: "Sub-Saharan Africa",
        terrain: Terrain::Plains,
        resources: &["Minerals", "Agriculture"],
        strategic_value: 5,
        defense_bonus: 5,
        supply_cost: 4,
    },
    RegionData {
        name: "Middle East",
        terrain: Terrain::Desert,
        resources: &["Oil", "Trade"],
        strategic_value: 9,
        defense_bonus: 10,
        supply_cost: 6,
    },
    RegionData {
        name: "Central Asia",
        terrain: Terrain::Mountains,
        resources: &["Minerals", "Trade"],
        strategic_value: 6,
        defense_bonus: 18,
        supply_cost: 8,
    },
    RegionData {
        name: "East Asia",
        terrain: Terrain::Plains,
        resources: &["Industry", "Agriculture"],
        strategic_value: 8,
        defense_bonus: 12,
        supply_cost: 7,
    },
    RegionData {
        name: "South Asia",
        terrain: Terrain::Plains,
        resources: &["Agriculture", "Industry"],
        strategic_value: 7,
        defense_bonus: 8,
        supply_cost: 6,
    },
    RegionData {
        name: "Southeast Asia",
        terrain: Terrain::Forests,
        resources: &["Agriculture", "Trade"],
        strategic_value: 6,
        defense_bonus: 15,
        supply_cost: 7,
    },
    RegionData {
        name: "Oceania",
        terrain: Terrain::Coastal,
        resources: &["Trade", "Minerals"],
        strategic_value: 4,
        defense_bonus: 6,
        supply_cost: 3,
    },
    RegionData {
        name: "The Caribbean",
        terrain: Terrain::Coastal,
        resources: &["Trade", "Agriculture"],
        strategic_value: 5,
        defense_bonus: 8,
        supply_cost: 4,
    },
    RegionData {
        name: "Siberia",
        terrain: Terrain::Mountains,
        resources: &["Minerals", "Oil"],
        strategic_value: 4,
        defense_bonus: 25,
        supply_cost: 12,
    },
    RegionData {
        name: "The Andes",
        terrain: Terrain::Mountains,
        resources: &["Minerals", "Agriculture"],
        strategic_value: 5,
        defense_bonus: 22,
        supply_cost: 10,
    },
];

pub struct PersonalityProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub priorities: [&'static str; 3],
    pub risk_tolerance: &'static str,
}

pub const AI_PERSONALITIES: [PersonalityProfile; 5] = [
    PersonalityProfile {
        name: "Aggressor",
        description: "Focuses on rapid military expansion and conquest",
        priorities: ["military", "expansion", "intimidation"],
        risk_tolerance: "high",
    },
    PersonalityProfile {
        name: "Diplomat",
        description: "Builds alliances and uses negotiation over force",
        priorities: ["diplomacy", "trade", "stability"],
        risk_tolerance: "low",
    },
    PersonalityProfile {
        name: "Trader",
        description: "Prioritizes economic development and mercantile networks",
        priorities: ["economy", "trade", "infrastructure"],
        risk_tolerance: "medium",
    },
    PersonalityProfile {
        name: "Scientist",
        description: "Invests heavily in technological advancement",
        priorities: ["technology", "research", "innovation"],
        risk_tolerance: "medium",
    },
    PersonalityProfile {
        name: "Wildcard",
        description: "Unpredictable strategy with random tactical shifts",
        priorities: ["random", "opportunism", "surprise"],
        risk_tolerance: "variable",
    },
];

pub fn is_world_region(name: &str) -> bool {
    WORLD_REGIONS.contains(&name)
}

/// Comma-separated region list as it is embedded into prompts.
pub fn region_list() -> String {
    WORLD_REGIONS.join(", ")
}

/// Territories held by the player that are not part of the fixed map.
pub fn unknown_territories(state: &GameState) -> Vec<&str> {
    state
        .territories
        .iter()
        .map(String::as_str)
        .filter(|name| !is_world_region(name))
        .collect()
}

impl RegionData {
    pub fn to_territory_info(&self) -> TerritoryInfo {
        TerritoryInfo {
            name: self.name.to_string(),
            terrain: self.terrain.clone(),
            resources: self.resources.iter().map(|r| r.to_string()).collect(),
            strategic_value: self.strategic_value,
            defense_bonus: self.defense_bonus,
            supply_cost: self.supply_cost,
        }
    }
}

/// Reference territory sheet, handed to the model so it has the map's baseline stats.
pub fn territory_sheet() -> Vec<TerritoryInfo> {
    TERRITORY_DATA
        .iter()
        .map(RegionData::to_territory_info)
        .collect()
}
