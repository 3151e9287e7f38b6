//! Autocomplete suggestions for command options.

use std::collections::HashSet;
use std::sync::Arc;

use hellabot_domain::Operator;

use crate::infrastructure::ports::{CatalogEntry, CatalogKind, GameDataError, GameDataPort};

/// Discord shows at most this many suggestions comfortably.
pub const SUGGESTION_LIMIT: usize = 6;

/// A suggestion: what the user sees and what the option receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub value: String,
}

impl From<&CatalogEntry> for Suggestion {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            label: entry.label.clone(),
            value: entry.value.clone(),
        }
    }
}

/// Case-insensitive substring match, also tried with apostrophes removed.
pub fn split_match(candidate: &str, query: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let query = query.trim().to_lowercase();
    if candidate.contains(&query) {
        return true;
    }
    let strip = |s: &str| s.replace(['\'', '\u{2019}'], "");
    strip(&candidate).contains(&strip(&query))
}

/// Entries matching `query`, first occurrence of each value only.
pub fn filter_entries<'a>(
    entries: &'a [CatalogEntry],
    query: &str,
    limit: usize,
) -> Vec<&'a CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| e.keywords.iter().any(|k| split_match(k, query)))
        .filter(|e| seen.insert(e.value.as_str()))
        .take(limit)
        .collect()
}

/// Skin choices for an operator; the base skin is offered as `default`.
pub fn skin_suggestions(op: &Operator, query: &str, limit: usize) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    op.skins
        .iter()
        .map(|skin| {
            let value = match (&skin.display_skin.skin_name, &skin.battle_skin.skin_or_prefab_id) {
                (Some(_), Some(prefab)) => prefab.to_lowercase(),
                _ => "default".to_string(),
            };
            Suggestion {
                label: skin.display_name().to_string(),
                value,
            }
        })
        .filter(|s| split_match(&s.label, query))
        .filter(|s| seen.insert(s.value.clone()))
        .take(limit)
        .collect()
}

pub struct Autocomplete {
    game_data: Arc<dyn GameDataPort>,
}

impl Autocomplete {
    pub fn new(game_data: Arc<dyn GameDataPort>) -> Self {
        Self { game_data }
    }

    /// Suggestions from one catalog, optionally restricted to tagged entries.
    pub async fn suggest(
        &self,
        kind: CatalogKind,
        query: &str,
        required_tag: Option<&str>,
    ) -> Result<Vec<Suggestion>, GameDataError> {
        let mut entries = self.game_data.catalog(kind).await?;
        if let Some(tag) = required_tag {
            entries.retain(|e| e.has_tag(tag));
        }
        Ok(filter_entries(&entries, query, SUGGESTION_LIMIT)
            .into_iter()
            .map(Suggestion::from)
            .collect())
    }

    /// Skin suggestions for the operator named in another option.
    pub async fn skins(&self, operator: &str, query: &str) -> Result<Vec<Suggestion>, GameDataError> {
        Ok(match self.game_data.operator(operator).await? {
            Some(op) => skin_suggestions(&op, query, SUGGESTION_LIMIT),
            None => Vec::new(),
        })
    }
}
