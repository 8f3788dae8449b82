//! Interactivity payload parsing and classification.
//!
//! Slack posts every modal submission and button click to one endpoint as a
//! form-encoded `payload` field holding JSON. This module decodes that JSON
//! into [`InteractionPayload`] and classifies it into an [`InteractionEvent`]
//! the service layer can act on without knowing any Slack wire details.

use projector_core::domain::{ProjectFields, ProjectFilters};
use projector_core::page::{CursorError, PageCursor};
use serde::Deserialize;
use thiserror::Error;

use crate::modals::{
    filters_from_state, project_fields_from_state, ModalError, ViewState, CALLBACK_CREATE,
    CALLBACK_EDIT, CALLBACK_FILTER,
};

pub const ACTION_EDIT_PROJECT: &str = "edit_project";
pub const ACTION_DELETE_PROJECT: &str = "delete_project";
pub const ACTION_PROJECTS_NEXT: &str = "projects_next_page";
pub const ACTION_PROJECTS_PREV: &str = "projects_prev_page";
pub const ACTION_EDIT_PROJECTS_NEXT: &str = "edit_projects_next_page";
pub const ACTION_EDIT_PROJECTS_PREV: &str = "edit_projects_prev_page";
pub const ACTION_OPEN_FILTER: &str = "open_filter_modal";

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("interaction payload could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Modal(#[from] ModalError),
    #[error(transparent)]
    Cursor(#[from] CursorError),
    #[error("interaction {action_id} is missing its value")]
    MissingValue { action_id: String },
    #[error("block_actions payload carries no actions")]
    EmptyActions,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SlackUser {
    #[serde(default)]
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SubmittedView {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub private_metadata: String,
    #[serde(default)]
    pub state: ViewState,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// The raw interactivity payload, covering both `view_submission` and
/// `block_actions` shapes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub user: SlackUser,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub view: Option<SubmittedView>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    #[serde(default)]
    pub channel: Option<Channel>,
}

impl InteractionPayload {
    pub fn parse(json: &str) -> Result<Self, InteractionError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Who clicked and where to reply, common to every event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionContext {
    pub user_id: String,
    pub trigger_id: Option<String>,
    pub response_url: Option<String>,
    pub channel_id: Option<String>,
    /// Raw `private_metadata` of the submitted view, when one is present.
    pub view_metadata: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    /// Filter modal applied: rebuild the listing at page zero.
    FilterSubmitted { filters: ProjectFilters },
    CreateSubmitted { fields: ProjectFields },
    EditSubmitted { record_id: String, fields: ProjectFields },
    /// Edit button on a record row: open the prefilled edit modal.
    EditRequested { record_id: String },
    DeleteRequested { record_id: String },
    /// Previous/Next click; `manage` distinguishes the edit/delete pick list
    /// from the read-only listing.
    PageTurn { cursor: PageCursor, manage: bool },
    /// Filter button: open the filter modal prefilled from this cursor.
    OpenFilter { cursor: PageCursor },
    /// Payload types and action ids this bot does not handle.
    Unsupported { detail: String },
}

/// Turns a decoded payload into context plus one event. Unknown payload kinds
/// and action ids classify as [`InteractionEvent::Unsupported`] rather than
/// failing, so Slack retries are never triggered by feature drift.
pub fn classify(payload: InteractionPayload) -> Result<(InteractionContext, InteractionEvent), InteractionError> {
    let context = InteractionContext {
        user_id: payload.user.id.clone(),
        trigger_id: payload.trigger_id.clone(),
        response_url: payload.response_url.clone(),
        channel_id: payload.channel.as_ref().map(|channel| channel.id.clone()),
        view_metadata: payload.view.as_ref().map(|view| view.private_metadata.clone()),
    };

    let event = match payload.kind.as_str() {
        "view_submission" => classify_view_submission(payload.view.unwrap_or_default())?,
        "block_actions" => {
            let action = payload.actions.into_iter().next().ok_or(InteractionError::EmptyActions)?;
            classify_block_action(action)?
        }
        other => InteractionEvent::Unsupported { detail: format!("payload type {other}") },
    };

    Ok((context, event))
}

fn classify_view_submission(view: SubmittedView) -> Result<InteractionEvent, InteractionError> {
    match view.callback_id.as_str() {
        CALLBACK_FILTER => {
            Ok(InteractionEvent::FilterSubmitted { filters: filters_from_state(&view.state) })
        }
        CALLBACK_CREATE => {
            Ok(InteractionEvent::CreateSubmitted { fields: project_fields_from_state(&view.state)? })
        }
        CALLBACK_EDIT => Ok(InteractionEvent::EditSubmitted {
            record_id: view.private_metadata,
            fields: project_fields_from_state(&view.state)?,
        }),
        other => Ok(InteractionEvent::Unsupported { detail: format!("callback {other}") }),
    }
}

fn classify_block_action(action: BlockAction) -> Result<InteractionEvent, InteractionError> {
    let require_value = |action: &BlockAction| {
        action.value.clone().ok_or_else(|| InteractionError::MissingValue {
            action_id: action.action_id.clone(),
        })
    };

    match action.action_id.as_str() {
        ACTION_EDIT_PROJECT => Ok(InteractionEvent::EditRequested { record_id: require_value(&action)? }),
        ACTION_DELETE_PROJECT => {
            Ok(InteractionEvent::DeleteRequested { record_id: require_value(&action)? })
        }
        ACTION_PROJECTS_NEXT | ACTION_PROJECTS_PREV => Ok(InteractionEvent::PageTurn {
            cursor: PageCursor::decode(&require_value(&action)?)?,
            manage: false,
        }),
        ACTION_EDIT_PROJECTS_NEXT | ACTION_EDIT_PROJECTS_PREV => Ok(InteractionEvent::PageTurn {
            cursor: PageCursor::decode(&require_value(&action)?)?,
            manage: true,
        }),
        ACTION_OPEN_FILTER => Ok(InteractionEvent::OpenFilter {
            cursor: action
                .value
                .as_deref()
                .map(PageCursor::decode)
                .transpose()?
                .unwrap_or_default(),
        }),
        other => Ok(InteractionEvent::Unsupported { detail: format!("action {other}") }),
    }
}
