//! `/skill`: skill effect with level buttons.

use async_trait::async_trait;
use hellabot_domain::{skill_level_table, ChoiceTable, ControlLayout, Skill};

use super::{autocomplete_skill, not_found};
use crate::api::discord::channel::DiscordChannel;
use crate::api::discord::embeds::{self, MessageBody};
use crate::api::discord::{Context, Error};
use crate::use_cases::selection::{SelectionController, SelectionError, StateRenderer};

struct SkillRenderer {
    skill: Skill,
}

#[async_trait]
impl StateRenderer<usize, MessageBody> for SkillRenderer {
    async fn render(&self, level: &usize) -> Result<MessageBody, SelectionError> {
        self.skill
            .levels
            .get(*level)
            .map(|data| embeds::skill_body(data, *level))
            .ok_or_else(|| SelectionError::render("That skill level doesn't exist!"))
    }
}

/// Level buttons for the levels this skill actually has.
fn level_table(skill: &Skill) -> Result<ChoiceTable<usize>, Error> {
    let choices = skill_level_table()
        .choices()
        .iter()
        .take(skill.levels.len())
        .cloned()
        .collect();
    Ok(ChoiceTable::new(choices)?)
}

/// Show a skill's effect at every level
#[poise::command(slash_command)]
pub async fn skill(
    ctx: Context<'_>,
    #[description = "Skill name"]
    #[autocomplete = "autocomplete_skill"]
    name: String,
) -> Result<(), Error> {
    let app = &ctx.data().app;
    let skill = match app.game_data.skill(&name).await? {
        Some(skill) if !skill.levels.is_empty() => skill,
        _ => return not_found(ctx, "skill").await,
    };

    let controller = SelectionController::new(
        level_table(&skill)?,
        app.config.interaction_window,
        ControlLayout::Buttons { per_row: 5 },
    );
    let mut channel = DiscordChannel::new(ctx);
    let summary = controller
        .run(&mut channel, &SkillRenderer { skill }, 0)
        .await?;

    tracing::debug!(skill = %name, transitions = summary.transitions, "Skill view closed");
    Ok(())
}
