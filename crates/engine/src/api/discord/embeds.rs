//! Embed builders.
//!
//! Text is assembled by plain functions so it can be tested without a
//! gateway; the `*_body` functions wrap it into serenity builders.

use std::collections::HashMap;
use std::sync::LazyLock;

use hellabot_domain::{
    CostPage, Definition, Item, ItemCost, Operator, SkillLevel, Stage, SKILL_LEVEL_LABELS,
};
use poise::serenity_prelude as serenity;
use regex_lite::Regex;

use crate::infrastructure::artifacts::RenderedArtifact;
use crate::use_cases::spine::RenderedSpine;

pub const EMBED_COLOUR: u32 = 0xebca60;
const AUTHOR: &str = "Hellabot";
const DESCRIPTION_LIMIT: usize = 4096;

/// Rich-text tags and zero-format suffixes in game text.
static SKILL_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<.ba\..{2,7}>|</>|:0\.0%|:0%|:0").expect("valid regex")
});

/// Any `<@tag>` / `<$tag>` style markup in definitions and stage text.
static RICH_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[@$][^>]*>|</>").expect("valid regex"));

/// One message worth of content: an embed and the files it references.
#[derive(Debug, Clone)]
pub struct MessageBody {
    pub embed: serenity::CreateEmbed,
    pub attachments: Vec<serenity::CreateAttachment>,
}

impl MessageBody {
    pub fn new(embed: serenity::CreateEmbed) -> Self {
        Self {
            embed,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: serenity::CreateAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

fn base_embed(title: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .colour(EMBED_COLOUR)
        .author(serenity::CreateEmbedAuthor::new(AUTHOR))
        .title(title)
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn strip_rich_text(text: &str) -> String {
    RICH_TEXT.replace_all(text, "").into_owned()
}

// =============================================================================
// Skills
// =============================================================================

/// `value` the way the game client shows it: integers without a fraction.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn skill_title(level: &SkillLevel, index: usize) -> String {
    let label = SKILL_LEVEL_LABELS.get(index).copied().unwrap_or("?");
    format!("{} - {}", level.name, label)
}

/// Skill description with blackboard placeholders filled in.
///
/// `{key}` becomes the blackboard value in backticks. Keys written as
/// `{key:0%}` in the raw text are shown as rounded percentages.
pub fn skill_description(level: &SkillLevel) -> String {
    let raw = level.description.as_deref().unwrap_or_default();

    let values: HashMap<String, String> = level
        .blackboard
        .iter()
        .map(|entry| {
            let is_percent = raw
                .find(&entry.key)
                .and_then(|at| raw[at + entry.key.len()..].chars().next())
                == Some(':');
            let shown = if is_percent {
                format!("{}%", (entry.value * 100.0).round() as i64)
            } else {
                format_number(entry.value)
            };
            (entry.key.to_lowercase(), shown)
        })
        .collect();

    let header = format!(
        "**{} - {}**\n***Cost:* {} SP - *Initial:* {} SP**\n",
        level.sp_data.recovery_label().unwrap_or("Unknown"),
        level.activation_label().unwrap_or("Unknown"),
        level.sp_data.sp_cost,
        level.sp_data.init_sp,
    );
    let text = format!("{header}{}", SKILL_MARKUP.replace_all(raw, ""));

    text.split(['{', '}'])
        .map(|part| match values.get(&part.to_lowercase()) {
            Some(value) => format!("`{value}`"),
            None => part.to_string(),
        })
        .collect()
}

pub fn skill_body(level: &SkillLevel, index: usize) -> MessageBody {
    MessageBody::new(
        base_embed(skill_title(level, index))
            .description(truncate(&skill_description(level), DESCRIPTION_LIMIT)),
    )
}

// =============================================================================
// Costs
// =============================================================================

/// Named groups of item costs shown on one cost page.
pub fn cost_sections(op: &Operator, page: CostPage) -> Vec<(String, Vec<ItemCost>)> {
    match page {
        CostPage::Promotions => op
            .data
            .phases
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, phase)| Some((format!("Elite {i}"), phase.evolve_cost.clone()?)))
            .collect(),
        CostPage::Skills => op
            .data
            .all_skill_lvlup
            .iter()
            .enumerate()
            .filter_map(|(i, level)| {
                Some((format!("Level {} → {}", i + 1, i + 2), level.lvl_up_cost.clone()?))
            })
            .collect(),
        CostPage::Masteries => op
            .data
            .skills
            .iter()
            .filter_map(|skill_ref| {
                let id = skill_ref.skill_id.as_deref()?;
                let name = op
                    .skills
                    .iter()
                    .find(|s| s.skill_id == id)
                    .and_then(|s| s.levels.first())
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| id.to_string());
                Some(
                    skill_ref
                        .level_up_cost_cond
                        .iter()
                        .enumerate()
                        .filter_map(move |(m, cond)| {
                            Some((format!("{name} M{}", m + 1), cond.level_up_cost.clone()?))
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .collect(),
        CostPage::Modules => op
            .modules
            .iter()
            .filter_map(|module| {
                let costs = module.info.item_cost.as_ref()?;
                Some(
                    costs
                        .iter()
                        .map(|(stage, items)| {
                            (
                                format!("{} Stage {stage}", module.info.uni_equip_name),
                                items.clone(),
                            )
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .collect(),
    }
}

pub fn cost_lines(items: &[ItemCost], names: &HashMap<String, String>) -> String {
    items
        .iter()
        .map(|cost| {
            let name = names.get(&cost.id).map(String::as_str).unwrap_or(&cost.id);
            format!("{name} ×{}", cost.count)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn cost_body(op: &Operator, page: CostPage, names: &HashMap<String, String>) -> MessageBody {
    let sections = cost_sections(op, page);
    let mut embed = base_embed(format!("{} - {}", op.data.name, page.label()));
    if sections.is_empty() {
        embed = embed.description("No costs for this page.");
    }
    for (title, items) in sections.iter().take(25) {
        embed = embed.field(title, truncate(&cost_lines(items, names), 1024), true);
    }
    MessageBody::new(embed)
}

// =============================================================================
// Stages, items, definitions
// =============================================================================

pub fn stage_label(stage: &Stage) -> String {
    format!("{} - {}", stage.excel.code, stage.excel.name)
}

pub fn stage_body(stage: &Stage) -> MessageBody {
    let excel = &stage.excel;
    let mut embed = base_embed(stage_label(stage)).field(
        "Sanity",
        excel.ap_cost.to_string(),
        true,
    );
    if let Some(danger) = excel.danger_level.as_deref().filter(|d| !d.is_empty()) {
        embed = embed.field("Recommended", danger, true);
    }
    if let Some(description) = excel.description.as_deref() {
        embed = embed.description(truncate(&strip_rich_text(description), DESCRIPTION_LIMIT));
    }
    MessageBody::new(embed)
}

pub fn stage_select_body(stages: &[Stage]) -> MessageBody {
    let code = stages
        .first()
        .map(|s| s.excel.code.as_str())
        .unwrap_or_default();
    MessageBody::new(
        base_embed(code).description("Multiple stages share this code, select one below."),
    )
}

pub fn item_description(item: &Item) -> String {
    let data = &item.data;
    [data.usage.as_deref(), data.description.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .map(strip_rich_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn item_body(item: &Item) -> MessageBody {
    let mut embed = base_embed(&item.data.name);
    let description = item_description(item);
    if !description.is_empty() {
        embed = embed.description(truncate(&description, DESCRIPTION_LIMIT));
    }
    MessageBody::new(embed)
}

pub fn define_body(definition: &Definition) -> MessageBody {
    MessageBody::new(base_embed(&definition.term_name).description(truncate(
        &strip_rich_text(&definition.description),
        DESCRIPTION_LIMIT,
    )))
}

pub fn define_list(definitions: &[Definition]) -> String {
    let mut terms: Vec<&str> = definitions.iter().map(|d| d.term_name.as_str()).collect();
    terms.sort_unstable_by_key(|t| t.to_lowercase());
    terms.dedup();
    terms
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn define_list_body(definitions: &[Definition]) -> MessageBody {
    MessageBody::new(
        base_embed("In-game terms").description(truncate(&define_list(definitions), DESCRIPTION_LIMIT)),
    )
}

// =============================================================================
// Spine
// =============================================================================

pub fn spine_title(rendered: &RenderedSpine) -> String {
    format!("{} - {}", rendered.subject.display_name(), rendered.clip)
}

pub fn spine_body(rendered: &RenderedSpine) -> MessageBody {
    let RenderedArtifact { file_name, bytes } = &rendered.artifact;
    let mut embed = base_embed(spine_title(rendered))
        .image(format!("attachment://{file_name}"));
    if let Some(direction) = rendered.subject.direction() {
        embed = embed.field("Direction", direction.as_str(), true);
    }
    MessageBody::new(embed).with_attachment(serenity::CreateAttachment::bytes(
        bytes.clone(),
        file_name.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hellabot_domain::{BlackboardEntry, SpData};

    fn level(description: &str, blackboard: &[(&str, f64)]) -> SkillLevel {
        SkillLevel {
            name: "Thorns' Skill 3".into(),
            description: Some(description.into()),
            skill_type: serde_json::json!(1),
            sp_data: SpData {
                sp_type: serde_json::json!(1),
                sp_cost: 25,
                init_sp: 15,
            },
            duration: 0.0,
            blackboard: blackboard
                .iter()
                .map(|(k, v)| BlackboardEntry {
                    key: k.to_string(),
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn fills_percent_and_plain_placeholders() {
        let level = level(
            "ATK <@ba.vup>+{atk:0%}</>, attack interval reduced by {base_attack_time}",
            &[("atk", 0.6), ("base_attack_time", 2.0)],
        );
        assert_eq!(
            skill_description(&level),
            "**Per Second - Manual Trigger**\n***Cost:* 25 SP - *Initial:* 15 SP**\nATK +`60%`, attack interval reduced by `2`"
        );
    }

    #[test]
    fn unknown_placeholders_keep_their_text() {
        let level = level("Deals damage {mystery}", &[]);
        assert!(skill_description(&level).ends_with("Deals damage mystery"));
    }

    #[test]
    fn decimal_percent_suffix_is_stripped() {
        let level = level("DEF +{def:0.0%}", &[("def", 0.125)]);
        assert!(skill_description(&level).ends_with("DEF +`13%`"));
    }

    #[test]
    fn skill_title_uses_level_label() {
        assert_eq!(skill_title(&level("", &[]), 8), "Thorns' Skill 3 - M2");
    }

    #[test]
    fn cost_pages_group_items() {
        let op: Operator = serde_json::from_value(serde_json::json!({
            "id": "char_293_thorns",
            "data": {
                "name": "Thorns",
                "rarity": "TIER_6",
                "phases": [
                    { "evolveCost": null },
                    { "evolveCost": [{ "id": "3242", "count": 5 }] },
                    { "evolveCost": [{ "id": "3243", "count": 4 }] }
                ],
                "allSkillLvlup": [{ "lvlUpCost": [{ "id": "3301", "count": 4 }] }],
                "skills": [{ "skillId": "skchr_thorns_3", "levelUpCostCond": [
                    { "levelUpCost": [{ "id": "3303", "count": 6 }] }
                ] }]
            },
            "skills": [{ "skillId": "skchr_thorns_3", "levels": [{ "name": "Destreza" }] }]
        }))
        .unwrap();

        let promotions = cost_sections(&op, CostPage::Promotions);
        assert_eq!(promotions.len(), 2);
        assert_eq!(promotions[0].0, "Elite 1");

        let masteries = cost_sections(&op, CostPage::Masteries);
        assert_eq!(masteries[0].0, "Destreza M1");
        assert!(cost_sections(&op, CostPage::Modules).is_empty());

        let names = HashMap::from([("3301".to_string(), "Skill Summary - 3".to_string())]);
        let skills = cost_sections(&op, CostPage::Skills);
        assert_eq!(cost_lines(&skills[0].1, &names), "Skill Summary - 3 ×4");
        assert_eq!(cost_lines(&promotions[0].1, &names), "3242 ×5");
    }

    #[test]
    fn define_list_is_sorted_and_deduplicated() {
        let defs = vec![
            Definition { term_name: "Stun".into(), description: String::new() },
            Definition { term_name: "Bind".into(), description: String::new() },
            Definition { term_name: "Stun".into(), description: String::new() },
        ];
        assert_eq!(define_list(&defs), "`Bind`, `Stun`");
    }

    #[test]
    fn rich_text_is_removed() {
        assert_eq!(
            strip_rich_text("Cannot <@cc.kw>move</> or attack"),
            "Cannot move or attack"
        );
    }

    #[test]
    fn long_text_is_truncated() {
        let text = "a".repeat(5000);
        assert_eq!(truncate(&text, 4096).chars().count(), 4096);
    }
}
