//! `/costs`: operator upgrade costs, one page per upgrade kind.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use hellabot_domain::{cost_page_table, ControlLayout, CostPage, Operator};
use tokio::sync::Mutex;

use super::{autocomplete_upgradable_operator, not_found, reply_ephemeral};
use crate::api::discord::channel::DiscordChannel;
use crate::api::discord::embeds::{self, MessageBody};
use crate::api::discord::{Context, Error};
use crate::infrastructure::ports::GameDataPort;
use crate::use_cases::selection::{SelectionController, SelectionError, StateRenderer};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum CostType {
    #[name = "promotions"]
    Promotions,
    #[name = "skills"]
    Skills,
    #[name = "masteries"]
    Masteries,
    #[name = "modules"]
    Modules,
}

impl From<CostType> for CostPage {
    fn from(value: CostType) -> Self {
        match value {
            CostType::Promotions => CostPage::Promotions,
            CostType::Skills => CostPage::Skills,
            CostType::Masteries => CostPage::Masteries,
            CostType::Modules => CostPage::Modules,
        }
    }
}

/// Renders cost pages, resolving item names as pages are opened.
struct CostRenderer {
    game_data: Arc<dyn GameDataPort>,
    op: Operator,
    names: Mutex<HashMap<String, String>>,
}

impl CostRenderer {
    async fn resolve_names(&self, ids: HashSet<String>) -> HashMap<String, String> {
        let mut names = self.names.lock().await;
        let missing: Vec<String> = ids.into_iter().filter(|id| !names.contains_key(id)).collect();

        let lookups = missing.iter().map(|id| async move {
            match self.game_data.item(id).await {
                Ok(Some(item)) if !item.data.name.is_empty() => item.data.name,
                Ok(_) => id.clone(),
                Err(e) => {
                    tracing::warn!(error = %e, item_id = %id, "Item name lookup failed");
                    id.clone()
                }
            }
        });
        for (id, name) in missing.iter().zip(join_all(lookups).await) {
            names.insert(id.clone(), name);
        }
        names.clone()
    }
}

#[async_trait]
impl StateRenderer<CostPage, MessageBody> for CostRenderer {
    async fn render(&self, page: &CostPage) -> Result<MessageBody, SelectionError> {
        let ids = embeds::cost_sections(&self.op, *page)
            .into_iter()
            .flat_map(|(_, items)| items.into_iter().map(|i| i.id))
            .collect();
        let names = self.resolve_names(ids).await;
        Ok(embeds::cost_body(&self.op, *page, &names))
    }
}

/// Show an operator's elite, skill, mastery, and module level costs
#[poise::command(slash_command)]
pub async fn costs(
    ctx: Context<'_>,
    #[description = "Operator name"]
    #[autocomplete = "autocomplete_upgradable_operator"]
    name: String,
    #[description = "Cost type"]
    #[rename = "type"]
    cost_type: Option<CostType>,
) -> Result<(), Error> {
    let app = &ctx.data().app;
    let Some(op) = app.game_data.operator(&name).await? else {
        return not_found(ctx, "operator").await;
    };
    if !op.has_upgrades() {
        return reply_ephemeral(ctx, "That operator has no upgrades!").await;
    }

    let initial = cost_type.map(CostPage::from).unwrap_or(CostPage::Promotions);
    let renderer = CostRenderer {
        game_data: app.game_data.clone(),
        op,
        names: Mutex::new(HashMap::new()),
    };
    let controller = SelectionController::new(
        cost_page_table(),
        app.config.interaction_window,
        ControlLayout::Buttons { per_row: 4 },
    );
    let mut channel = DiscordChannel::new(ctx);
    controller.run(&mut channel, &renderer, initial).await?;
    Ok(())
}
