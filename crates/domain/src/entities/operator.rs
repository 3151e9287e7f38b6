//! Operator records as served by the upstream game-data API.

use serde::{Deserialize, Deserializer, Serialize};

use super::skill::Skill;

/// An item id with a count, used by every upgrade cost list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCost {
    pub id: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Phase {
    pub evolve_cost: Option<Vec<ItemCost>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillLevelUp {
    pub lvl_up_cost: Option<Vec<ItemCost>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryCost {
    pub level_up_cost: Option<Vec<ItemCost>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorSkillRef {
    pub skill_id: Option<String>,
    pub level_up_cost_cond: Vec<MasteryCost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorData {
    pub name: String,
    #[serde(deserialize_with = "deserialize_rarity")]
    pub rarity: u8,
    pub sub_profession_id: String,
    pub phases: Vec<Phase>,
    pub all_skill_lvlup: Vec<SkillLevelUp>,
    pub skills: Vec<OperatorSkillRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleInfo {
    pub uni_equip_name: String,
    /// Costs keyed by module stage ("1", "2", "3").
    pub item_cost: Option<std::collections::BTreeMap<String, Vec<ItemCost>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Module {
    pub info: ModuleInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BattleSkin {
    pub skin_or_prefab_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySkin {
    pub skin_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skin {
    pub skin_id: String,
    pub battle_skin: BattleSkin,
    pub display_skin: DisplaySkin,
}

impl Skin {
    /// Name shown to users; the base skin has no display name.
    pub fn display_name(&self) -> &str {
        self.display_skin.skin_name.as_deref().unwrap_or("Default")
    }

    fn matches(&self, query: &str) -> bool {
        let by_prefab = self
            .battle_skin
            .skin_or_prefab_id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(query));
        let by_name = self
            .display_skin
            .skin_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(query));
        by_prefab || by_name
    }
}

/// An operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operator {
    pub id: String,
    pub data: OperatorData,
    pub skins: Vec<Skin>,
    pub skills: Vec<Skill>,
    pub modules: Vec<Module>,
}

/// Sub-profession whose battle skeleton only has a front side.
const FRONT_ONLY_SUB_PROFESSION: &str = "bard";

impl Operator {
    /// Find a skin by battle prefab id or display name, case-insensitively.
    pub fn find_skin(&self, query: &str) -> Option<&Skin> {
        self.skins.iter().find(|s| s.matches(query))
    }

    /// Storage id of the battle skeleton for a skin query.
    ///
    /// `None` or `"default"` selects the operator's own id. Returns `None`
    /// when the skin does not exist.
    pub fn battle_skeleton_id(&self, skin: Option<&str>) -> Option<String> {
        match skin.map(str::trim) {
            None | Some("") => Some(self.id.to_lowercase()),
            Some(s) if s.eq_ignore_ascii_case("default") => Some(self.id.to_lowercase()),
            Some(s) => self.find_skin(s).map(|skin| {
                skin.battle_skin
                    .skin_or_prefab_id
                    .as_deref()
                    .unwrap_or(&self.id)
                    .to_lowercase()
            }),
        }
    }

    /// Whether only the front battle skeleton exists for this operator.
    pub fn front_only(&self) -> bool {
        self.data.sub_profession_id == FRONT_ONLY_SUB_PROFESSION
    }

    /// Whether the operator has any upgrade costs at all. One and two star
    /// operators can neither promote nor level skills.
    pub fn has_upgrades(&self) -> bool {
        self.data.rarity > 2
    }
}

/// Accepts `"TIER_6"` as well as the 0-based numeric form (`5`).
fn deserialize_rarity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Tier(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n.saturating_add(1)),
        Raw::Tier(tier) => tier
            .trim_start_matches("TIER_")
            .parse::<u8>()
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thorns() -> Operator {
        serde_json::from_value(serde_json::json!({
            "id": "char_293_thorns",
            "data": { "name": "Thorns", "rarity": "TIER_6", "subProfessionId": "fearless" },
            "skins": [
                { "skinId": "char_293_thorns#1", "battleSkin": { "skinOrPrefabId": null }, "displaySkin": { "skinName": null } },
                { "skinId": "char_293_thorns@sale#7", "battleSkin": { "skinOrPrefabId": "char_293_thorns_sale#7" }, "displaySkin": { "skinName": "Coral Coast" } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn parses_tier_rarity() {
        assert_eq!(thorns().data.rarity, 6);
    }

    #[test]
    fn parses_numeric_rarity_as_zero_based() {
        let op: Operator =
            serde_json::from_value(serde_json::json!({ "id": "x", "data": { "rarity": 0 } })).unwrap();
        assert_eq!(op.data.rarity, 1);
        assert!(!op.has_upgrades());
    }

    #[test]
    fn default_skin_uses_operator_id() {
        assert_eq!(
            thorns().battle_skeleton_id(Some("default")).as_deref(),
            Some("char_293_thorns")
        );
        assert_eq!(thorns().battle_skeleton_id(None).as_deref(), Some("char_293_thorns"));
    }

    #[test]
    fn skin_found_by_display_name_or_prefab() {
        let op = thorns();
        assert_eq!(
            op.battle_skeleton_id(Some("coral coast")).as_deref(),
            Some("char_293_thorns_sale#7")
        );
        assert_eq!(
            op.battle_skeleton_id(Some("CHAR_293_THORNS_SALE#7")).as_deref(),
            Some("char_293_thorns_sale#7")
        );
        assert_eq!(op.battle_skeleton_id(Some("summer")), None);
    }
}
