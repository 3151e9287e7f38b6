//! Discord component interactions as a selection channel.

use std::time::Duration;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use super::embeds::MessageBody;
use super::view;
use super::Context;
use crate::infrastructure::ports::InteractionError;
use crate::use_cases::selection::{InteractionChannel, SelectionView};

/// Token carried by a component interaction: the custom id of a button, or
/// the selected value of a select menu.
fn choice_token(interaction: &serenity::ComponentInteraction) -> String {
    match &interaction.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().cloned().unwrap_or_default()
        }
        _ => interaction.data.custom_id.clone(),
    }
}

/// One reply message and the component interactions aimed at it.
pub struct DiscordChannel<'a> {
    ctx: Context<'a>,
    reply: Option<poise::ReplyHandle<'a>>,
    message_id: Option<serenity::MessageId>,
    pending: Option<serenity::ComponentInteraction>,
}

impl<'a> DiscordChannel<'a> {
    pub fn new(ctx: Context<'a>) -> Self {
        Self {
            ctx,
            reply: None,
            message_id: None,
            pending: None,
        }
    }

    async fn edit(&mut self, view: &SelectionView<MessageBody>) -> Result<(), InteractionError> {
        let reply = self.reply.as_ref().ok_or(InteractionError::NotPresented)?;
        reply
            .edit(self.ctx, view::reply(view, true))
            .await
            .map_err(InteractionError::transport)
    }
}

#[async_trait]
impl InteractionChannel<MessageBody> for DiscordChannel<'_> {
    async fn present(&mut self, view: &SelectionView<MessageBody>) -> Result<(), InteractionError> {
        let reply = self
            .ctx
            .send(view::reply(view, false))
            .await
            .map_err(InteractionError::transport)?;
        let message = reply.message().await.map_err(InteractionError::transport)?;
        self.message_id = Some(message.id);
        self.reply = Some(reply);
        Ok(())
    }

    async fn await_choice(
        &mut self,
        window: Duration,
    ) -> Result<Option<String>, InteractionError> {
        let message_id = self.message_id.ok_or(InteractionError::NotPresented)?;
        let collected = serenity::ComponentInteractionCollector::new(self.ctx.serenity_context())
            .message_id(message_id)
            .timeout(window)
            .await;

        Ok(collected.map(|interaction| {
            let token = choice_token(&interaction);
            tracing::debug!(
                token = %token,
                user_id = %interaction.user.id,
                message_id = %message_id,
                "Component interaction received"
            );
            self.pending = Some(interaction);
            token
        }))
    }

    async fn acknowledge(&mut self, notice: Option<&str>) -> Result<(), InteractionError> {
        let Some(interaction) = self.pending.take() else {
            return Ok(());
        };
        let response = match notice {
            Some(text) => serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .content(text)
                    .components(Vec::new()),
            ),
            None => serenity::CreateInteractionResponse::Acknowledge,
        };
        interaction
            .create_response(self.ctx.http(), response)
            .await
            .map_err(InteractionError::transport)
    }

    async fn show(&mut self, view: &SelectionView<MessageBody>) -> Result<(), InteractionError> {
        self.edit(view).await
    }

    async fn freeze(&mut self, view: &SelectionView<MessageBody>) -> Result<(), InteractionError> {
        self.edit(view).await
    }
}
