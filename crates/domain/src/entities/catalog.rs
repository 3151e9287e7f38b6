//! Enemy, item, stage and definition records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnemyExcel {
    pub enemy_id: String,
    pub enemy_index: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enemy {
    pub excel: EnemyExcel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemData {
    pub item_id: String,
    pub name: String,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub rarity: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub data: ItemData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageExcel {
    pub stage_id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub ap_cost: u32,
    pub danger_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    pub excel: StageExcel,
}

/// Which stage table to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageDifficulty {
    #[default]
    Normal,
    Challenge,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Definition {
    pub term_name: String,
    pub description: String,
}
