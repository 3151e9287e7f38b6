//! `/define`: in-game term lookup.

use super::{autocomplete_term, not_found};
use crate::api::discord::embeds;
use crate::api::discord::view;
use crate::api::discord::{Context, Error};

/// Term that lists every definition instead of looking one up.
const LIST_TERM: &str = "list";

/// Show definitions for in-game terms (use 'list' to display all in-game terms)
#[poise::command(slash_command)]
pub async fn define(
    ctx: Context<'_>,
    #[description = "Term"]
    #[autocomplete = "autocomplete_term"]
    term: String,
) -> Result<(), Error> {
    let game_data = &ctx.data().app.game_data;

    let body = if term.trim().eq_ignore_ascii_case(LIST_TERM) {
        embeds::define_list_body(&game_data.definitions().await?)
    } else {
        match game_data.definition(&term).await? {
            Some(definition) => embeds::define_body(&definition),
            None => return not_found(ctx, "term").await,
        }
    };

    ctx.send(view::body_reply(&body)).await?;
    Ok(())
}
