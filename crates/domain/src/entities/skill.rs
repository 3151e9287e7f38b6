//! Skill records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackboardEntry {
    pub key: String,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpData {
    pub sp_type: Value,
    pub sp_cost: u32,
    pub init_sp: u32,
}

impl SpData {
    /// Recovery label; the upstream data uses both numeric and named forms.
    pub fn recovery_label(&self) -> Option<&'static str> {
        match &self.sp_type {
            Value::Number(n) => match n.as_u64() {
                Some(1) => Some("Per Second"),
                Some(2) => Some("Offensive"),
                Some(4) => Some("Defensive"),
                Some(8) => Some("Passive"),
                _ => None,
            },
            Value::String(s) => match s.as_str() {
                "INCREASE_WITH_TIME" => Some("Per Second"),
                "INCREASE_WHEN_ATTACK" => Some("Offensive"),
                "INCREASE_WHEN_TAKEN_DAMAGE" => Some("Defensive"),
                "8" => Some("Passive"),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillLevel {
    pub name: String,
    pub description: Option<String>,
    pub skill_type: Value,
    pub sp_data: SpData,
    pub duration: f64,
    pub blackboard: Vec<BlackboardEntry>,
}

impl SkillLevel {
    /// Activation label (`Passive`, `Manual Trigger`, `Auto Trigger`).
    pub fn activation_label(&self) -> Option<&'static str> {
        let index = match &self.skill_type {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => match s.as_str() {
                "PASSIVE" => Some(0),
                "MANUAL" => Some(1),
                "AUTO" => Some(2),
                _ => None,
            },
            _ => None,
        };
        match index {
            Some(0) => Some("Passive"),
            Some(1) => Some("Manual Trigger"),
            Some(2) => Some("Auto Trigger"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub skill_id: String,
    pub icon_id: Option<String>,
    pub levels: Vec<SkillLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_accept_numeric_and_named_forms() {
        let numeric: SkillLevel = serde_json::from_value(serde_json::json!({
            "skillType": 1,
            "spData": { "spType": 2, "spCost": 30, "initSp": 10 }
        }))
        .unwrap();
        assert_eq!(numeric.activation_label(), Some("Manual Trigger"));
        assert_eq!(numeric.sp_data.recovery_label(), Some("Offensive"));

        let named: SkillLevel = serde_json::from_value(serde_json::json!({
            "skillType": "AUTO",
            "spData": { "spType": "INCREASE_WITH_TIME" }
        }))
        .unwrap();
        assert_eq!(named.activation_label(), Some("Auto Trigger"));
        assert_eq!(named.sp_data.recovery_label(), Some("Per Second"));
    }
}
