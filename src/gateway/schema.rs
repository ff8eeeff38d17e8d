//! Declared output schemas, in the model's own schema dialect.

use serde_json::{json, Value};

use crate::world::region_list;

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn resource_cost() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "food": { "type": "NUMBER" },
            "iron": { "type": "NUMBER" },
            "gold": { "type": "NUMBER" },
            "knowledge": { "type": "NUMBER" }
        }
    })
}

fn mitigation_tool() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING" },
            "name": { "type": "STRING" },
            "description": { "type": "STRING" },
            "cost": resource_cost(),
            "available": { "type": "BOOLEAN" }
        },
        "required": ["id", "name", "description", "available"]
    })
}

fn policy() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING" },
            "type": {
                "type": "STRING",
                "enum": ["expansionism", "pacifism", "industrial_revolution",
                         "conscription", "propaganda", "free_trade"]
            },
            "name": { "type": "STRING" },
            "description": { "type": "STRING" },
            "effects": {
                "type": "OBJECT",
                "properties": {
                    "military": { "type": "NUMBER" },
                    "economy": { "type": "NUMBER" },
                    "technology": { "type": "NUMBER" },
                    "diplomacy": { "type": "NUMBER" },
                    "resources": resource_cost()
                }
            }
        },
        "required": ["id", "type", "name", "description"]
    })
}

pub fn game_state() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "year": { "type": "NUMBER" },
            "rulerTitle": { "type": "STRING" },
            "countryName": { "type": "STRING" },
            "population": { "type": "NUMBER", "description": "Total population in millions" },
            "military": { "type": "NUMBER", "description": "Military strength score from 1 to 1000" },
            "economy": { "type": "NUMBER", "description": "Economic power score from 1 to 1000" },
            "technology": { "type": "NUMBER", "description": "Technology level score from 1 to 1000" },
            "territories": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": format!("A list of regions controlled. Must be a subset of: {}.", region_list())
            },
            "resources": {
                "type": "OBJECT",
                "properties": {
                    "food": { "type": "NUMBER" },
                    "iron": { "type": "NUMBER" },
                    "gold": { "type": "NUMBER" },
                    "knowledge": { "type": "NUMBER" }
                },
                "required": ["food", "iron", "gold", "knowledge"]
            },
            "tradeRoutes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "connectedTerritories": string_array(),
                        "passiveIncome": { "type": "NUMBER" },
                        "diplomacyBoost": { "type": "NUMBER" },
                        "vulnerability": { "type": "NUMBER", "description": "0-100, chance of disruption" },
                        "status": { "type": "STRING", "enum": ["active", "disrupted"] }
                    },
                    "required": ["id", "connectedTerritories", "passiveIncome",
                                 "diplomacyBoost", "vulnerability", "status"]
                }
            },
            "activePolicies": { "type": "ARRAY", "items": policy() },
            "availablePolicies": { "type": "ARRAY", "items": policy() },
            "mitigationTools": { "type": "ARRAY", "items": mitigation_tool() },
            "rivalCivilizations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "personality": {
                            "type": "STRING",
                            "enum": ["aggressor", "diplomat", "trader", "scientist", "wildcard"]
                        },
                        "territories": string_array(),
                        "military": { "type": "NUMBER" },
                        "economy": { "type": "NUMBER" },
                        "technology": { "type": "NUMBER" },
                        "diplomacyStatus": {
                            "type": "STRING",
                            "enum": ["hostile", "neutral", "friendly", "allied"]
                        },
                        "lastKnownActivity": { "type": "STRING" }
                    },
                    "required": ["name", "personality", "territories", "military",
                                 "economy", "technology", "diplomacyStatus"]
                }
            },
            "intelligenceReports": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "target": { "type": "STRING" },
                        "intelType": {
                            "type": "STRING",
                            "enum": ["military", "economic", "technological", "territorial", "diplomatic"]
                        },
                        "accuracy": { "type": "NUMBER" },
                        "lastUpdated": { "type": "STRING" }
                    },
                    "required": ["target", "intelType", "accuracy"]
                }
            },
            "activeMissions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "type": { "type": "STRING", "enum": ["spy", "sabotage", "counterintel"] },
                        "target": { "type": "STRING" },
                        "risk": { "type": "NUMBER" },
                        "reward": { "type": "NUMBER" },
                        "duration": { "type": "NUMBER" },
                        "status": {
                            "type": "STRING",
                            "enum": ["planning", "active", "completed", "failed"]
                        }
                    },
                    "required": ["id", "type", "target", "risk", "reward", "duration", "status"]
                }
            },
            "worldTerritories": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "terrain": {
                            "type": "STRING",
                            "enum": ["plains", "mountains", "forests", "desert", "coastal", "urban"]
                        },
                        "resources": string_array(),
                        "strategicValue": { "type": "NUMBER" },
                        "defenseBonus": { "type": "NUMBER" },
                        "supplyCost": { "type": "NUMBER" }
                    },
                    "required": ["name", "terrain", "strategicValue", "defenseBonus", "supplyCost"]
                }
            }
        },
        "required": ["year", "rulerTitle", "countryName", "population",
                     "military", "economy", "technology", "territories"]
    })
}

pub fn choices() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING", "description": "A unique identifier like 'choice_1'" },
                "text": { "type": "STRING", "description": "The text for the choice presented to the player." },
                "type": { "type": "STRING", "enum": ["diplomacy", "military", "economy", "technology"] },
                "stabilityRange": {
                    "type": "OBJECT",
                    "properties": {
                        "min": { "type": "NUMBER" },
                        "max": { "type": "NUMBER" }
                    },
                    "required": ["min", "max"]
                },
                "mitigationTools": { "type": "ARRAY", "items": mitigation_tool() }
            },
            "required": ["id", "text", "type"]
        }
    })
}

/// Shared by game initialization and turn processing.
pub fn turn() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": { "type": "STRING" },
            "summary": string_array(),
            "gameState": game_state(),
            "choices": choices()
        },
        "required": ["description", "summary", "gameState", "choices"]
    })
}

pub fn score() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER" },
            "title": { "type": "STRING" },
            "analysis": { "type": "STRING" }
        },
        "required": ["score", "title", "analysis"]
    })
}

pub fn starting_civilizations() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "civilizations": string_array()
        },
        "required": ["civilizations"]
    })
}
