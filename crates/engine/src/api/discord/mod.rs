//! Discord gateway surface: slash commands, component interactions, embeds.

pub mod channel;
pub mod commands;
pub mod embeds;
pub mod view;

use std::sync::Arc;

use poise::serenity_prelude as serenity;

use crate::app::App;

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command.
pub struct Data {
    pub app: Arc<App>,
}

const COMMAND_FAILED: &str = "There was an error while executing this command!";

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::costs::costs(),
        commands::define::define(),
        commands::item::item(),
        commands::skill::skill(),
        commands::spine::spine(),
        commands::stage::stage(),
    ]
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                user_id = %ctx.author().id,
                error = ?error,
                "Command failed"
            );
            let reply = poise::CreateReply::default()
                .content(COMMAND_FAILED)
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::warn!(error = %e, "Failed to report command error");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!(error = %e, "Failed to handle framework error");
            }
        }
    }
}

/// Framework with every command registered globally on first ready.
pub fn framework(app: Arc<App>) -> poise::Framework<Data, Error> {
    poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands(),
            on_error: |error| Box::pin(on_error(error)),
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::info!(
                        command = %ctx.command().qualified_name,
                        user_id = %ctx.author().id,
                        "Command invoked"
                    );
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!(
                    user = %ready.user.name,
                    commands = framework.options().commands.len(),
                    "Slash commands registered"
                );
                Ok(Data { app })
            })
        })
        .build()
}

/// Gateway intents: slash commands and component interactions need no
/// privileged intents.
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::non_privileged()
}
