//! Selection views → Discord message builders.

use hellabot_domain::{Control, ControlLayout, MAX_MENU_OPTIONS};
use poise::serenity_prelude as serenity;

use super::embeds::MessageBody;
use crate::use_cases::selection::SelectionView;

/// Discord rejects longer button and option labels.
const LABEL_LIMIT: usize = 80;

fn label(text: &str) -> String {
    text.chars().take(LABEL_LIMIT).collect()
}

/// Action rows for a set of controls.
///
/// Menus list only the enabled controls; a menu with nothing left to pick
/// is dropped entirely.
pub fn components(controls: &[Control], layout: &ControlLayout) -> Vec<serenity::CreateActionRow> {
    match layout {
        ControlLayout::Buttons { per_row } => controls
            .chunks((*per_row).clamp(1, 5))
            .map(|row| {
                serenity::CreateActionRow::Buttons(
                    row.iter()
                        .map(|c| {
                            serenity::CreateButton::new(c.token.clone())
                                .label(label(&c.label))
                                .style(serenity::ButtonStyle::Secondary)
                                .disabled(c.disabled)
                        })
                        .collect(),
                )
            })
            .collect(),
        ControlLayout::Menu {
            custom_id,
            placeholder,
        } => {
            let (shown, dropped) = menu_choices(controls);
            if dropped > 0 {
                tracing::debug!(
                    menu = %custom_id,
                    dropped,
                    limit = MAX_MENU_OPTIONS,
                    "Menu options past the limit are not selectable"
                );
            }
            let options: Vec<serenity::CreateSelectMenuOption> = shown
                .into_iter()
                .map(|c| serenity::CreateSelectMenuOption::new(label(&c.label), c.token.clone()))
                .collect();
            if options.is_empty() {
                return Vec::new();
            }
            vec![serenity::CreateActionRow::SelectMenu(
                serenity::CreateSelectMenu::new(
                    custom_id.clone(),
                    serenity::CreateSelectMenuKind::String { options },
                )
                .placeholder(placeholder.clone()),
            )]
        }
    }
}
/// Enabled controls that fit in one menu, and how many did not.
fn menu_choices(controls: &[Control]) -> (Vec<&Control>, usize) {
    let enabled: Vec<&Control> = controls.iter().filter(|c| !c.disabled).collect();
    let dropped = enabled.len().saturating_sub(MAX_MENU_OPTIONS);
    (enabled.into_iter().take(MAX_MENU_OPTIONS).collect(), dropped)
}

/// Reply builder for a view.
///
/// Edits always set the content so a pending notice from an earlier
/// acknowledgement is cleared.
pub fn reply(view: &SelectionView<MessageBody>, is_edit: bool) -> poise::CreateReply {
    let mut reply =
        body_reply(&view.body).components(components(&view.controls, &view.layout));
    match &view.notice {
        Some(notice) => reply = reply.content(notice.clone()),
        None if is_edit => reply = reply.content(String::new()),
        None => {}
    }
    reply
}

/// Reply carrying just a body, for results with nothing to select.
pub fn body_reply(body: &MessageBody) -> poise::CreateReply {
    body.attachments.iter().fold(
        poise::CreateReply::default().embed(body.embed.clone()),
        |reply, attachment| reply.attachment(attachment.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(token: &str, disabled: bool) -> Control {
        Control {
            token: token.into(),
            label: token.to_uppercase(),
            disabled,
        }
    }

    #[test]
    fn buttons_are_split_into_rows() {
        let controls: Vec<Control> = (0..10).map(|i| control(&format!("l{i}"), i == 0)).collect();
        let rows = components(&controls, &ControlLayout::Buttons { per_row: 5 });
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn menu_counts_options_past_the_limit() {
        let controls: Vec<Control> = (0..MAX_MENU_OPTIONS + 3)
            .map(|i| control(&format!("Clip_{i}"), i == 0))
            .collect();
        let (shown, dropped) = menu_choices(&controls);
        assert_eq!(shown.len(), MAX_MENU_OPTIONS);
        assert_eq!(dropped, 2);
        assert_eq!(shown[0].token, "Clip_1");

        let (shown, dropped) = menu_choices(&controls[..5]);
        assert_eq!((shown.len(), dropped), (4, 0));
    }

    #[test]
    fn menu_without_choices_is_dropped() {
        let layout = ControlLayout::Menu {
            custom_id: "spine-clip".into(),
            placeholder: "Select an animation".into(),
        };
        assert!(components(&[control("Idle", true)], &layout).is_empty());
        assert_eq!(
            components(&[control("Idle", true), control("Attack", false)], &layout).len(),
            1
        );
    }
}
