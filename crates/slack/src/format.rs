//! Pure rendering of project records into Slack blocks.

use projector_core::domain::{
    priority_emoji, priority_rank, status_emoji, ProjectFields, ProjectFilters,
};
use projector_core::page::{page_window, PageCursor, PAGE_SIZE};

use crate::blocks::{ButtonElement, ButtonStyle, MessageBuilder, MessageTemplate};
use crate::interactions::{
    ACTION_DELETE_PROJECT, ACTION_EDIT_PROJECT, ACTION_EDIT_PROJECTS_NEXT,
    ACTION_EDIT_PROJECTS_PREV, ACTION_OPEN_FILTER, ACTION_PROJECTS_NEXT, ACTION_PROJECTS_PREV,
};

/// A fetched record paired with its Airtable record id, the unit every
/// renderer works on.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectCard {
    pub record_id: String,
    pub fields: ProjectFields,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// List rows: status, priority, owners, business units, target date.
    Compact,
    /// Adds the full OKR list, next milestone, KPIs and risks.
    Full,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedProject {
    pub short_id: String,
    pub title: String,
    pub text: String,
    pub description: String,
    pub priority_rank: u32,
}

pub fn short_id(record_id: &str) -> String {
    let trimmed = record_id.strip_prefix("rec").unwrap_or(record_id);
    trimmed.chars().take(6).collect::<String>().to_uppercase()
}

/// Renders one record. Never fails: unknown status/priority values fall back
/// to the neutral emoji and rank 999.
pub fn format_project(card: &ProjectCard, mode: RenderMode) -> FormattedProject {
    let fields = &card.fields;
    let title = if fields.initiative.trim().is_empty() {
        "(untitled)".to_owned()
    } else {
        fields.initiative.trim().to_owned()
    };

    let mut lines = vec![format!(
        "{} *Status:* {} · {} *Priority:* {}",
        status_emoji(&fields.status),
        display_or_dash(&fields.status),
        priority_emoji(&fields.priority),
        display_or_dash(&fields.priority),
    )];

    if !fields.owners_display.trim().is_empty() {
        lines.push(format!("👥 *Owner(s):* {}", fields.owners_display.trim()));
    }
    if !fields.related_bu.is_empty() {
        lines.push(format!("🏢 *BU:* {}", fields.related_bu.join(", ")));
    }
    if let Some(target_date) = fields.target_date {
        lines.push(format!("🗓️ *Target:* {target_date}"));
    }

    if mode == RenderMode::Full {
        if !fields.related_okr.is_empty() {
            lines.push(format!("🎯 *OKRs:* {}", fields.related_okr.join(", ")));
        }
        if !fields.next_milestone.trim().is_empty() {
            lines.push(format!("🧭 *Next milestone:* {}", fields.next_milestone.trim()));
        }
        if !fields.kpis.trim().is_empty() {
            lines.push(format!("📈 *KPIs:* {}", fields.kpis.trim()));
        }
        if !fields.risks_blockers.trim().is_empty() {
            lines.push(format!("🚧 *Risks/Blockers:* {}", fields.risks_blockers.trim()));
        }
    }

    FormattedProject {
        short_id: short_id(&card.record_id),
        title,
        text: lines.join("\n"),
        description: fields.description.trim().to_owned(),
        priority_rank: priority_rank(&fields.priority),
    }
}

fn display_or_dash(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "—"
    } else {
        trimmed
    }
}

fn filters_summary(filters: &ProjectFilters) -> String {
    let mut parts = Vec::new();
    if let Some(search) = filters.search.as_deref() {
        parts.push(format!("search \"{search}\""));
    }
    if let Some(status) = filters.status.as_deref() {
        parts.push(format!("status {status}"));
    }
    if let Some(priority) = filters.priority.as_deref() {
        parts.push(format!("priority {priority}"));
    }
    if let Some(business_unit) = filters.business_unit.as_deref() {
        parts.push(format!("BU {business_unit}"));
    }
    if let Some(objective) = filters.objective.as_deref() {
        parts.push(format!("OKR {objective}"));
    }
    if let Some(owner) = filters.owner.as_deref() {
        parts.push(format!("owner {owner}"));
    }
    if parts.is_empty() {
        "no filters".to_owned()
    } else {
        parts.join(", ")
    }
}

fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

/// Read-only paginated listing. `visible` is the already-sliced window for
/// `cursor.page`; `total` is the size of the whole filtered result set.
pub fn project_list_message(
    visible: &[ProjectCard],
    cursor: &PageCursor,
    total: usize,
) -> MessageTemplate {
    paged_message(visible, cursor, total, PagedVariant::List)
}

/// Edit/delete pick list: the same pagination, plus per-record Edit and
/// Delete buttons carrying the record id.
pub fn project_manage_message(
    visible: &[ProjectCard],
    cursor: &PageCursor,
    total: usize,
) -> MessageTemplate {
    paged_message(visible, cursor, total, PagedVariant::Manage)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PagedVariant {
    List,
    Manage,
}

fn paged_message(
    visible: &[ProjectCard],
    cursor: &PageCursor,
    total: usize,
    variant: PagedVariant,
) -> MessageTemplate {
    let window = page_window(total, cursor.page);
    let heading = match variant {
        PagedVariant::List => "Projects",
        PagedVariant::Manage => "Manage projects",
    };

    if total == 0 {
        return MessageBuilder::new(format!("{heading}: no matches"))
            .header("project.list.header", heading)
            .section("project.list.empty", |section| {
                section.plain("No projects match the current filters.");
            })
            .context("project.list.filters", |context| {
                context.plain(filters_summary(&cursor.filters));
            })
            .actions("project.list.controls", |actions| {
                actions.button(
                    ButtonElement::new(ACTION_OPEN_FILTER, "🔍 Filter").value(cursor.encode()),
                );
            })
            .build();
    }

    // The page index comes from an untrusted button payload, so the
    // one-based display must not overflow.
    let page_display = cursor.page.saturating_add(1);
    let mut builder = MessageBuilder::new(format!(
        "{heading}: page {page_display} of {} ({} total)",
        page_count(total),
        total
    ))
    .header("project.list.header", heading)
    .context("project.list.filters", |context| {
        context.plain(format!(
            "Page {page_display} of {} · {} project(s) · {}",
            page_count(total),
            total,
            filters_summary(&cursor.filters)
        ));
    });

    for (index, card) in visible.iter().enumerate() {
        let formatted = format_project(card, RenderMode::Compact);
        let mut body = format!("*{}*\n{}", formatted.title, formatted.text);
        if !formatted.description.is_empty() {
            body.push_str(&format!("\n_{}_", formatted.description));
        }
        builder = builder.divider().section(format!("project.list.item.{}", index + 1), |section| {
            section.mrkdwn(body);
        });

        if variant == PagedVariant::Manage {
            let record_id = card.record_id.clone();
            builder = builder.actions(format!("project.list.item.{}.controls", index + 1), |actions| {
                actions
                    .button(
                        ButtonElement::new(ACTION_EDIT_PROJECT, "✏️ Edit")
                            .style(ButtonStyle::Primary)
                            .value(record_id.clone()),
                    )
                    .button(
                        ButtonElement::new(ACTION_DELETE_PROJECT, "🗑️ Delete")
                            .style(ButtonStyle::Danger)
                            .value(record_id),
                    );
            });
        }
    }

    let (prev_action, next_action) = match variant {
        PagedVariant::List => (ACTION_PROJECTS_PREV, ACTION_PROJECTS_NEXT),
        PagedVariant::Manage => (ACTION_EDIT_PROJECTS_PREV, ACTION_EDIT_PROJECTS_NEXT),
    };

    builder
        .actions("project.list.controls", |actions| {
            actions.button(
                ButtonElement::new(ACTION_OPEN_FILTER, "🔍 Filter").value(cursor.encode()),
            );
            if window.has_prev {
                actions.button(
                    ButtonElement::new(prev_action, "◀️ Previous").value(cursor.prev().encode()),
                );
            }
            if window.has_next {
                actions.button(
                    ButtonElement::new(next_action, "Next ▶️").value(cursor.next().encode()),
                );
            }
        })
        .build()
}

/// Full-detail rendering of one or more matching projects.
pub fn project_detail_message(cards: &[ProjectCard], search: Option<&str>) -> MessageTemplate {
    let scope = search.map(|term| format!(" matching \"{term}\"")).unwrap_or_default();

    if cards.is_empty() {
        return MessageBuilder::new(format!("No projects{scope}"))
            .section("project.detail.empty", |section| {
                section.plain(format!("No projects{scope}."));
            })
            .build();
    }

    let mut builder = MessageBuilder::new(format!("{} project(s){scope}", cards.len()));
    for (index, card) in cards.iter().enumerate() {
        let formatted = format_project(card, RenderMode::Full);
        if index > 0 {
            builder = builder.divider();
        }
        builder = builder
            .section(format!("project.detail.{}.title", index + 1), |section| {
                section.mrkdwn(format!("*{}*  `{}`", formatted.title, formatted.short_id));
            })
            .section(format!("project.detail.{}.body", index + 1), |section| {
                section.mrkdwn(formatted.text.clone());
            });
        if !formatted.description.is_empty() {
            builder = builder.context(format!("project.detail.{}.description", index + 1), |context| {
                context.plain(formatted.description.clone());
            });
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use projector_core::domain::{ProjectFields, UNKNOWN_RANK};

    use super::*;
    use crate::blocks::{Block, TextObject};

    fn card(id: &str, initiative: &str) -> ProjectCard {
        ProjectCard {
            record_id: id.to_owned(),
            fields: ProjectFields {
                initiative: initiative.to_owned(),
                status: "In progress".to_owned(),
                priority: "High".to_owned(),
                ..ProjectFields::default()
            },
        }
    }

    #[test]
    fn unknown_priority_formats_with_rank_999_and_neutral_emoji() {
        let mut sample = card("recXYZ", "Mystery");
        sample.fields.priority = "Blocker".to_owned();

        let formatted = format_project(&sample, RenderMode::Compact);
        assert_eq!(formatted.priority_rank, UNKNOWN_RANK);
        assert!(formatted.text.contains("⚪ *Priority:* Blocker"));
    }

    #[test]
    fn compact_mode_excludes_milestone_and_okrs() {
        let mut sample = card("recXYZ", "Mint migration");
        sample.fields.next_milestone = "Beta cut".to_owned();
        sample.fields.related_okr = vec!["O1.1 Grow enterprise revenue".to_owned()];

        let compact = format_project(&sample, RenderMode::Compact);
        assert!(!compact.text.contains("Beta cut"));
        assert!(!compact.text.contains("OKRs"));

        let full = format_project(&sample, RenderMode::Full);
        assert!(full.text.contains("🧭 *Next milestone:* Beta cut"));
        assert!(full.text.contains("🎯 *OKRs:* O1.1 Grow enterprise revenue"));
    }

    #[test]
    fn short_id_strips_record_prefix() {
        assert_eq!(short_id("recAbCdEf123"), "ABCDEF");
        assert_eq!(short_id("xyz"), "XYZ");
    }

    fn nav_buttons(message: &MessageTemplate) -> Vec<String> {
        message
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Actions { block_id, elements } if block_id == "project.list.controls" => {
                    Some(elements.iter().map(|button| button.action_id.clone()))
                }
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn first_page_shows_next_but_not_previous() {
        let visible: Vec<ProjectCard> =
            (0..8).map(|i| card(&format!("rec{i:03}"), &format!("P{i}"))).collect();
        let message = project_list_message(&visible, &PageCursor::default(), 20);

        let buttons = nav_buttons(&message);
        assert!(buttons.contains(&ACTION_PROJECTS_NEXT.to_owned()));
        assert!(!buttons.contains(&ACTION_PROJECTS_PREV.to_owned()));
    }

    #[test]
    fn last_page_shows_previous_but_not_next() {
        let visible = vec![card("rec016", "P16")];
        let cursor = PageCursor::new(Default::default(), 2);
        let message = project_list_message(&visible, &cursor, 17);

        let buttons = nav_buttons(&message);
        assert!(buttons.contains(&ACTION_PROJECTS_PREV.to_owned()));
        assert!(!buttons.contains(&ACTION_PROJECTS_NEXT.to_owned()));
    }

    #[test]
    fn nav_buttons_carry_adjacent_page_cursors_with_filters() {
        let visible = vec![card("rec008", "P8")];
        let mut cursor = PageCursor::default();
        cursor.filters.search = Some("mint".to_owned());
        cursor.page = 1;
        let message = project_list_message(&visible, &cursor, 24);

        let buttons: Vec<ButtonElement> = message
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Actions { block_id, elements } if block_id == "project.list.controls" => {
                    Some(elements.clone())
                }
                _ => None,
            })
            .flatten()
            .collect();

        let next = buttons
            .iter()
            .find(|button| button.action_id == ACTION_PROJECTS_NEXT)
            .expect("next button");
        let decoded =
            PageCursor::decode(next.value.as_deref().expect("value")).expect("decode");
        assert_eq!(decoded.page, 2);
        assert_eq!(decoded.filters.search.as_deref(), Some("mint"));

        let prev = buttons
            .iter()
            .find(|button| button.action_id == ACTION_PROJECTS_PREV)
            .expect("prev button");
        let decoded =
            PageCursor::decode(prev.value.as_deref().expect("value")).expect("decode");
        assert_eq!(decoded.page, 0);
    }

    #[test]
    fn forged_maximal_page_cursor_renders_without_overflow() {
        let cursor = PageCursor::new(Default::default(), usize::MAX);
        let message = project_list_message(&[], &cursor, 20);

        assert!(message.fallback_text.contains(&format!("page {}", usize::MAX)));
        let buttons = nav_buttons(&message);
        assert!(buttons.contains(&ACTION_PROJECTS_PREV.to_owned()));
        assert!(!buttons.contains(&ACTION_PROJECTS_NEXT.to_owned()));
    }

    #[test]
    fn manage_variant_adds_edit_and_delete_buttons_per_record() {
        let visible = vec![card("recAAA", "Alpha"), card("recBBB", "Beta")];
        let message = project_manage_message(&visible, &PageCursor::default(), 2);

        let per_record: Vec<&ButtonElement> = message
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Actions { block_id, elements }
                    if block_id.starts_with("project.list.item.") =>
                {
                    Some(elements.iter())
                }
                _ => None,
            })
            .flatten()
            .collect();

        assert_eq!(per_record.len(), 4);
        assert!(per_record.iter().any(|button| {
            button.action_id == ACTION_EDIT_PROJECT && button.value.as_deref() == Some("recAAA")
        }));
        assert!(per_record.iter().any(|button| {
            button.action_id == ACTION_DELETE_PROJECT && button.value.as_deref() == Some("recBBB")
        }));
        // Pagination of the manage list uses its own action ids.
        let buttons = nav_buttons(&message);
        assert!(!buttons.contains(&ACTION_PROJECTS_NEXT.to_owned()));
    }

    #[test]
    fn empty_result_set_renders_empty_state() {
        let message = project_list_message(&[], &PageCursor::default(), 0);
        assert!(message.blocks.iter().any(|block| matches!(
            block,
            Block::Section { text: TextObject::Plain { text }, .. }
                if text.contains("No projects match")
        )));
        let buttons = nav_buttons(&message);
        assert_eq!(buttons, vec![ACTION_OPEN_FILTER.to_owned()]);
    }

    #[test]
    fn detail_message_renders_full_mode_with_short_id() {
        let mut sample = card("recAbCdEf", "Mint migration");
        sample.fields.description = "Move billing to Mint".to_owned();
        let message = project_detail_message(&[sample], Some("mint"));

        assert!(message.fallback_text.contains("matching \"mint\""));
        assert!(message.blocks.iter().any(|block| matches!(
            block,
            Block::Section { text: TextObject::Mrkdwn { text }, .. } if text.contains("ABCDEF")
        )));
    }
}
