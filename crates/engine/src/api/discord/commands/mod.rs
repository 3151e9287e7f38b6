//! Slash commands and their autocomplete handlers.

pub mod costs;
pub mod define;
pub mod item;
pub mod skill;
pub mod spine;
pub mod stage;

use poise::serenity_prelude as serenity;

use super::{Context, Error};
use crate::infrastructure::ports::{CatalogKind, TAG_UPGRADABLE};
use crate::use_cases::autocomplete::Suggestion;

/// Ephemeral one-line reply.
pub(crate) async fn reply_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

pub(crate) async fn not_found(ctx: Context<'_>, entity: &str) -> Result<(), Error> {
    reply_ephemeral(ctx, format!("That {entity} doesn't exist!")).await
}

/// String value of another option in the same (sub)command.
fn sibling_option(ctx: Context<'_>, name: &str) -> Option<String> {
    let poise::Context::Application(app_ctx) = ctx else {
        return None;
    };
    find_string(&app_ctx.interaction.data.options(), name)
}

fn find_string(options: &[serenity::ResolvedOption<'_>], name: &str) -> Option<String> {
    options.iter().find_map(|option| match &option.value {
        serenity::ResolvedValue::SubCommand(inner)
        | serenity::ResolvedValue::SubCommandGroup(inner) => find_string(inner, name),
        serenity::ResolvedValue::String(value) if option.name == name => Some(value.to_string()),
        serenity::ResolvedValue::Autocomplete { value, .. } if option.name == name => {
            Some(value.to_string())
        }
        _ => None,
    })
}

fn into_choices(
    suggestions: Vec<Suggestion>,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    suggestions
        .into_iter()
        .map(|s| serenity::AutocompleteChoice::new(s.label, s.value))
}

async fn catalog_choices(
    ctx: Context<'_>,
    kind: CatalogKind,
    partial: &str,
    tag: Option<&str>,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let suggestions = ctx
        .data()
        .app
        .use_cases
        .autocomplete
        .suggest(kind, partial, tag)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, ?kind, "Autocomplete lookup failed");
            Vec::new()
        });
    into_choices(suggestions)
}

pub(crate) async fn autocomplete_operator(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    catalog_choices(ctx, CatalogKind::Operator, partial, None).await
}

pub(crate) async fn autocomplete_upgradable_operator(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    catalog_choices(ctx, CatalogKind::Operator, partial, Some(TAG_UPGRADABLE)).await
}

pub(crate) async fn autocomplete_enemy(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    catalog_choices(ctx, CatalogKind::Enemy, partial, None).await
}

pub(crate) async fn autocomplete_skill(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    catalog_choices(ctx, CatalogKind::Skill, partial, None).await
}

pub(crate) async fn autocomplete_item(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    catalog_choices(ctx, CatalogKind::Item, partial, None).await
}

pub(crate) async fn autocomplete_term(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    catalog_choices(ctx, CatalogKind::Definition, partial, None).await
}

/// Stage codes from the table matching the chosen difficulty.
pub(crate) async fn autocomplete_stage(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let kind = match sibling_option(ctx, "difficulty").as_deref() {
        Some("challenge") => CatalogKind::ToughStage,
        _ => CatalogKind::Stage,
    };
    catalog_choices(ctx, kind, partial, None).await
}

/// Skins of the operator already entered in the `name` option.
pub(crate) async fn autocomplete_skin(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let suggestions = match sibling_option(ctx, "name") {
        Some(name) => ctx
            .data()
            .app
            .use_cases
            .autocomplete
            .skins(&name, partial)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, operator = %name, "Skin autocomplete failed");
                Vec::new()
            }),
        None => Vec::new(),
    };
    into_choices(suggestions)
}
