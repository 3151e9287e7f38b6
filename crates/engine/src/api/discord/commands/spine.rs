//! `/spine`: animated skeleton renders with clip re-selection.

use std::sync::Arc;

use async_trait::async_trait;
use hellabot_domain::{clip_table, ControlLayout, Direction, Subject};

use super::{autocomplete_enemy, autocomplete_operator, autocomplete_skin, reply_ephemeral};
use crate::api::discord::channel::DiscordChannel;
use crate::api::discord::embeds::{self, MessageBody};
use crate::api::discord::view;
use crate::api::discord::{Context, Error};
use crate::use_cases::selection::{SelectionController, SelectionError, StateRenderer};
use crate::use_cases::spine::{PreparedSpine, RenderSpine, SpineError};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SpineDirection {
    #[name = "front"]
    Front,
    #[name = "back"]
    Back,
}

impl From<SpineDirection> for Direction {
    fn from(value: SpineDirection) -> Self {
        match value {
            SpineDirection::Front => Direction::Front,
            SpineDirection::Back => Direction::Back,
        }
    }
}

/// Renders one clip of a fixed subject per state.
struct SpineRenderer {
    render: Arc<RenderSpine>,
    subject: Subject,
}

#[async_trait]
impl StateRenderer<String, MessageBody> for SpineRenderer {
    async fn render(&self, clip: &String) -> Result<MessageBody, SelectionError> {
        match self.render.execute(&self.subject, clip).await {
            Ok(rendered) => Ok(embeds::spine_body(&rendered)),
            Err(e) => {
                tracing::warn!(
                    subject_id = %self.subject.id(),
                    clip = %clip,
                    error = %e,
                    "Spine render failed"
                );
                Err(SelectionError::render(e.user_message()))
            }
        }
    }

    fn pending_notice(&self, clip: &String) -> Option<String> {
        Some(format!("Generating `{clip}` gif..."))
    }
}

/// Render spine animations
#[poise::command(slash_command, subcommands("operator", "enemy"), subcommand_required)]
pub async fn spine(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Render an operator's spine animations
#[poise::command(slash_command)]
pub async fn operator(
    ctx: Context<'_>,
    #[description = "Operator name"]
    #[autocomplete = "autocomplete_operator"]
    name: String,
    #[description = "Operator skin"]
    #[autocomplete = "autocomplete_skin"]
    skin: Option<String>,
    #[description = "Operator spine type"] direction: Option<SpineDirection>,
) -> Result<(), Error> {
    let direction = Direction::from(direction.unwrap_or(SpineDirection::Front));
    let prepared = ctx
        .data()
        .app
        .use_cases
        .spine
        .prepare
        .operator(&name, skin.as_deref(), direction)
        .await;
    present(ctx, prepared).await
}

/// Render an enemy's spine animations
#[poise::command(slash_command)]
pub async fn enemy(
    ctx: Context<'_>,
    #[description = "Enemy name"]
    #[autocomplete = "autocomplete_enemy"]
    name: String,
) -> Result<(), Error> {
    let prepared = ctx.data().app.use_cases.spine.prepare.enemy(&name).await;
    present(ctx, prepared).await
}

/// Render the first clip, then keep the clip menu open.
///
/// Lookup failures are answered privately before the reply is deferred;
/// render failures after that go into the public reply.
async fn present(
    ctx: Context<'_>,
    prepared: Result<PreparedSpine, SpineError>,
) -> Result<(), Error> {
    let PreparedSpine { subject, clips } = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::debug!(error = %e, "Spine request rejected");
            return reply_ephemeral(ctx, e.user_message()).await;
        }
    };
    let Some(first) = clips.first().cloned() else {
        let err = SpineError::NoAnimations(subject.kind().as_str().into());
        return reply_ephemeral(ctx, err.user_message()).await;
    };

    ctx.defer().await?;

    let app = &ctx.data().app;
    let renderer = SpineRenderer {
        render: app.use_cases.spine.render.clone(),
        subject,
    };

    if clips.len() == 1 {
        match renderer.render(&first).await {
            Ok(body) => ctx.send(view::body_reply(&body)).await?,
            Err(e) => ctx.say(e.to_string()).await?,
        };
        return Ok(());
    }

    let controller = SelectionController::new(
        clip_table(&clips)?,
        app.config.interaction_window,
        ControlLayout::Menu {
            custom_id: "spine-clip".into(),
            placeholder: "Select an animation".into(),
        },
    );
    let mut channel = DiscordChannel::new(ctx);
    match controller.run(&mut channel, &renderer, first).await {
        Ok(summary) => {
            tracing::debug!(
                clip = %summary.final_state,
                transitions = summary.transitions,
                "Spine view closed"
            );
            Ok(())
        }
        Err(SelectionError::Render(message)) => {
            ctx.say(message).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
