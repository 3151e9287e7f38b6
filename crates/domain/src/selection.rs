//! Choice tables for interactive selections.
//!
//! A [`ChoiceTable`] is the fixed token → state lookup behind one interactive
//! view. It also decides which controls are actionable: the control of the
//! current state is disabled, every other control stays enabled, and a frozen
//! view disables everything.

use std::collections::HashSet;
use std::fmt;

use crate::error::DomainError;

/// Discord caps select menus at this many options.
pub const MAX_MENU_OPTIONS: usize = 25;

/// One selectable entry: the token a control sends, its label, and the state
/// it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice<S> {
    pub token: String,
    pub label: String,
    pub state: S,
}

impl<S> Choice<S> {
    pub fn new(token: impl Into<String>, label: impl Into<String>, state: S) -> Self {
        Self {
            token: token.into(),
            label: label.into(),
            state,
        }
    }
}

/// A rendered control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub token: String,
    pub label: String,
    pub disabled: bool,
}

/// How controls are laid out by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlLayout {
    /// Rows of buttons, each control its own button.
    Buttons { per_row: usize },
    /// One select menu; disabled controls are left out of the options.
    Menu {
        custom_id: String,
        placeholder: String,
    },
}

/// Fixed mapping from control tokens to states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceTable<S> {
    choices: Vec<Choice<S>>,
}

impl<S: Clone + PartialEq> ChoiceTable<S> {
    /// Build a table.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the table is empty or two choices
    /// share a token.
    pub fn new(choices: Vec<Choice<S>>) -> Result<Self, DomainError> {
        if choices.is_empty() {
            return Err(DomainError::validation("Choice table cannot be empty"));
        }
        let mut seen = HashSet::new();
        for choice in &choices {
            if !seen.insert(choice.token.as_str()) {
                return Err(DomainError::validation(format!(
                    "Duplicate choice token: {}",
                    choice.token
                )));
            }
        }
        Ok(Self { choices })
    }

    /// Map a token to its state. Unknown tokens yield `None`.
    pub fn resolve(&self, token: &str) -> Option<&S> {
        self.choices
            .iter()
            .find(|c| c.token == token)
            .map(|c| &c.state)
    }

    /// Controls for a view showing `current`.
    pub fn controls(&self, current: &S, enabled: bool) -> Vec<Control> {
        self.choices
            .iter()
            .map(|c| Control {
                token: c.token.clone(),
                label: c.label.clone(),
                disabled: !enabled || c.state == *current,
            })
            .collect()
    }

    pub fn choices(&self) -> &[Choice<S>] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

// =============================================================================
// Skill levels
// =============================================================================

/// Button tokens for the ten skill levels, in level order.
pub const SKILL_LEVEL_TOKENS: [&str; 10] = ["l1", "l2", "l3", "l4", "l5", "l6", "l7", "m1", "m2", "m3"];

/// Display labels for the ten skill levels.
pub const SKILL_LEVEL_LABELS: [&str; 10] = [
    "Lv1", "Lv2", "Lv3", "Lv4", "Lv5", "Lv6", "Lv7", "M1", "M2", "M3",
];

/// Token table for skill level cycling: `l1..l7, m1..m3` → 0..9.
pub fn skill_level_table() -> ChoiceTable<usize> {
    ChoiceTable {
        choices: SKILL_LEVEL_TOKENS
            .iter()
            .zip(SKILL_LEVEL_LABELS)
            .enumerate()
            .map(|(index, (token, label))| Choice::new(*token, label, index))
            .collect(),
    }
}

// =============================================================================
// Cost pages
// =============================================================================

/// Pages of the operator upgrade cost view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostPage {
    Promotions,
    Skills,
    Masteries,
    Modules,
}

impl CostPage {
    pub const ALL: [CostPage; 4] = [
        CostPage::Promotions,
        CostPage::Skills,
        CostPage::Masteries,
        CostPage::Modules,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Self::Promotions => "promotions",
            Self::Skills => "skills",
            Self::Masteries => "masteries",
            Self::Modules => "modules",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Promotions => "Promotions",
            Self::Skills => "Skills",
            Self::Masteries => "Masteries",
            Self::Modules => "Modules",
        }
    }
}

impl fmt::Display for CostPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Token table for cost pagination.
pub fn cost_page_table() -> ChoiceTable<CostPage> {
    ChoiceTable {
        choices: CostPage::ALL
            .iter()
            .map(|page| Choice::new(page.token(), page.label(), *page))
            .collect(),
    }
}

// =============================================================================
// Clip tables
// =============================================================================

/// Token table for animation re-selection; each clip is its own token.
///
/// # Errors
///
/// Returns `DomainError::Validation` when there are no clips.
pub fn clip_table(clips: &[String]) -> Result<ChoiceTable<String>, DomainError> {
    ChoiceTable::new(
        clips
            .iter()
            .map(|clip| Choice::new(clip.clone(), clip.clone(), clip.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_tokens<S: Clone + PartialEq>(table: &ChoiceTable<S>, current: &S) -> Vec<String> {
        table
            .controls(current, true)
            .into_iter()
            .filter(|c| c.disabled)
            .map(|c| c.token)
            .collect()
    }

    #[test]
    fn skill_table_maps_mastery_tokens() {
        let table = skill_level_table();
        assert_eq!(table.len(), 10);
        assert_eq!(table.resolve("l1"), Some(&0));
        assert_eq!(table.resolve("l7"), Some(&6));
        assert_eq!(table.resolve("m2"), Some(&8));
        assert_eq!(table.resolve("m4"), None);
    }

    #[test]
    fn only_current_control_is_disabled() {
        let table = skill_level_table();
        assert_eq!(disabled_tokens(&table, &8), vec!["m2".to_string()]);
    }

    #[test]
    fn frozen_controls_are_all_disabled() {
        let table = cost_page_table();
        assert!(table
            .controls(&CostPage::Skills, false)
            .iter()
            .all(|c| c.disabled));
    }

    #[test]
    fn duplicate_tokens_are_rejected() {
        let result = ChoiceTable::new(vec![Choice::new("a", "A", 0), Choice::new("a", "B", 1)]);
        assert!(result.is_err());
    }

    #[test]
    fn clip_table_uses_clip_names_as_tokens() {
        let clips = vec!["Attack".to_string(), "Skill".to_string()];
        let table = clip_table(&clips).unwrap();
        assert_eq!(table.resolve("Skill"), Some(&"Skill".to_string()));
        assert!(clip_table(&[]).is_err());
    }
}
