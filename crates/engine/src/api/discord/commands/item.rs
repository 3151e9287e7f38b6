//! `/item`: item usage and description.

use super::{autocomplete_item, not_found};
use crate::api::discord::embeds;
use crate::api::discord::view;
use crate::api::discord::{Context, Error};

/// Show information on an item
#[poise::command(slash_command)]
pub async fn item(
    ctx: Context<'_>,
    #[description = "Item name"]
    #[autocomplete = "autocomplete_item"]
    name: String,
) -> Result<(), Error> {
    let Some(item) = ctx.data().app.game_data.item(&name).await? else {
        return not_found(ctx, "item").await;
    };
    ctx.send(view::body_reply(&embeds::item_body(&item))).await?;
    Ok(())
}
