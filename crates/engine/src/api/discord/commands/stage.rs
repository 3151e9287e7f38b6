//! `/stage`: stage info, with a variant picker when codes collide.

use async_trait::async_trait;
use hellabot_domain::{Choice, ChoiceTable, ControlLayout, Stage, StageDifficulty};

use super::{autocomplete_stage, not_found};
use crate::api::discord::channel::DiscordChannel;
use crate::api::discord::embeds::{self, MessageBody};
use crate::api::discord::view;
use crate::api::discord::{Context, Error};
use crate::use_cases::selection::{SelectionController, SelectionError, StateRenderer};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum Difficulty {
    #[name = "normal"]
    Normal,
    #[name = "challenge"]
    Challenge,
}

impl From<Difficulty> for StageDifficulty {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Normal => StageDifficulty::Normal,
            Difficulty::Challenge => StageDifficulty::Challenge,
        }
    }
}

/// `None` is the picker prompt; `Some(i)` shows the i-th variant.
struct StageRenderer {
    stages: Vec<Stage>,
}

#[async_trait]
impl StateRenderer<Option<usize>, MessageBody> for StageRenderer {
    async fn render(&self, state: &Option<usize>) -> Result<MessageBody, SelectionError> {
        match state {
            None => Ok(embeds::stage_select_body(&self.stages)),
            Some(index) => self
                .stages
                .get(*index)
                .map(embeds::stage_body)
                .ok_or_else(|| SelectionError::render("That stage doesn't exist!")),
        }
    }
}

fn variant_table(stages: &[Stage]) -> Result<ChoiceTable<Option<usize>>, Error> {
    let choices = stages
        .iter()
        .enumerate()
        .map(|(index, stage)| Choice::new(index.to_string(), embeds::stage_label(stage), Some(index)))
        .collect();
    Ok(ChoiceTable::new(choices)?)
}

/// Show information on a stage
#[poise::command(slash_command)]
pub async fn stage(
    ctx: Context<'_>,
    #[description = "Stage code"]
    #[autocomplete = "autocomplete_stage"]
    code: String,
    #[description = "Stage Difficulty"] difficulty: Option<Difficulty>,
) -> Result<(), Error> {
    let app = &ctx.data().app;
    let difficulty = StageDifficulty::from(difficulty.unwrap_or(Difficulty::Normal));
    let stages = app.game_data.stages(&code, difficulty).await?;

    match stages.as_slice() {
        [] => not_found(ctx, "stage").await,
        [stage] => {
            ctx.send(view::body_reply(&embeds::stage_body(stage))).await?;
            Ok(())
        }
        _ => {
            let controller = SelectionController::new(
                variant_table(&stages)?,
                app.config.interaction_window,
                ControlLayout::Menu {
                    custom_id: "stage-variant".into(),
                    placeholder: "Select a stage".into(),
                },
            );
            let mut channel = DiscordChannel::new(ctx);
            controller
                .run(&mut channel, &StageRenderer { stages }, None)
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hellabot_domain::StageExcel;

    fn stage(id: &str, name: &str) -> Stage {
        Stage {
            excel: StageExcel {
                stage_id: id.into(),
                code: "1-7".into(),
                name: name.into(),
                ap_cost: 6,
                ..Default::default()
            },
        }
    }

    #[test]
    fn variant_tokens_are_indices() {
        let table = variant_table(&[stage("main_01-07", "Dark"), stage("tough_01-07", "Dark")])
            .expect("table");
        assert_eq!(table.resolve("1"), Some(&Some(1)));
        assert_eq!(table.resolve("2"), None);
    }

    #[tokio::test]
    async fn prompt_state_renders_without_a_variant() {
        let renderer = StageRenderer {
            stages: vec![stage("main_01-07", "Dark")],
        };
        assert!(renderer.render(&None).await.is_ok());
        assert!(renderer.render(&Some(0)).await.is_ok());
        assert!(matches!(
            renderer.render(&Some(3)).await,
            Err(SelectionError::Render(_))
        ));
    }
}
