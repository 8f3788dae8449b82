use async_trait::async_trait;
use projector_core::domain::ProjectFilters;
use projector_core::page::PageCursor;
use thiserror::Error;

use crate::blocks::{self, MessageTemplate};

/// The slash command as Slack delivers it, already form-decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub trigger_id: String,
    pub response_url: String,
    pub request_id: String,
}

/// Normalized invocation context handed to every service call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub channel_id: String,
    pub user_id: String,
    pub trigger_id: String,
    pub response_url: String,
    pub request_id: String,
}

impl CommandEnvelope {
    pub fn from_payload(payload: &SlashCommandPayload) -> Self {
        Self {
            channel_id: payload.channel_id.clone(),
            user_id: payload.user_id.clone(),
            trigger_id: payload.trigger_id.clone(),
            response_url: payload.response_url.clone(),
            request_id: payload.request_id.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectCommand {
    /// Paginated listing, optionally narrowed by a search term.
    List { search: Option<String> },
    /// Full-detail rendering of matching projects.
    View { search: Option<String> },
    /// Pick list with Edit/Delete controls per record.
    Manage { search: Option<String> },
    /// Opens the creation modal.
    Create,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("{0}")]
    Service(String),
}

/// Splits the text after `/project` on whitespace: the first token selects
/// the action, the remainder is a free-text search term. Empty input and
/// unrecognized verbs both fall back to listing, the latter treating the
/// entire text as the search term.
pub fn parse_project_command(input: &str) -> ProjectCommand {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ProjectCommand::List { search: None };
    }

    let mut parts = trimmed.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let rest = parts.collect::<Vec<_>>().join(" ");
    let search = (!rest.is_empty()).then_some(rest);

    match verb.as_str() {
        "list" => ProjectCommand::List { search },
        "view" => ProjectCommand::View { search },
        "edit" | "delete" => ProjectCommand::Manage { search },
        "create" | "new" => ProjectCommand::Create,
        "help" => ProjectCommand::Help,
        _ => ProjectCommand::List { search: Some(trimmed.to_owned()) },
    }
}

pub fn normalize_project_command(
    payload: &SlashCommandPayload,
) -> Result<(ProjectCommand, CommandEnvelope), CommandParseError> {
    if payload.command != "/project" {
        return Err(CommandParseError::UnsupportedCommand(payload.command.clone()));
    }
    Ok((parse_project_command(&payload.text), CommandEnvelope::from_payload(payload)))
}

fn search_cursor(search: Option<String>) -> PageCursor {
    PageCursor::new(ProjectFilters { search, ..ProjectFilters::default() }, 0)
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: ProjectCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn route(
        &self,
        command: ProjectCommand,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        tracing::debug!(
            event_name = "slack.command.routed",
            correlation_id = %envelope.request_id,
            command = ?command,
            "routing project command"
        );
        match command {
            ProjectCommand::List { search } => {
                self.service.list_projects(search_cursor(search), envelope).await
            }
            ProjectCommand::View { search } => self.service.view_projects(search, envelope).await,
            ProjectCommand::Manage { search } => {
                self.service.manage_projects(search_cursor(search), envelope).await
            }
            ProjectCommand::Create => self.service.open_create_modal(envelope).await,
            ProjectCommand::Help => Ok(blocks::help_message()),
        }
    }
}

#[async_trait]
pub trait ProjectCommandService: Send + Sync {
    async fn list_projects(
        &self,
        cursor: PageCursor,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn view_projects(
        &self,
        search: Option<String>,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn manage_projects(
        &self,
        cursor: PageCursor,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn open_create_modal(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;
}

#[derive(Default)]
pub struct NoopProjectCommandService;

#[async_trait]
impl ProjectCommandService for NoopProjectCommandService {
    async fn list_projects(
        &self,
        cursor: PageCursor,
        _envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let search = cursor.filters.search.unwrap_or_else(|| "all".to_owned());
        Ok(ack_message(&format!("list page={} search={search}", cursor.page)))
    }

    async fn view_projects(
        &self,
        search: Option<String>,
        _envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        Ok(ack_message(&format!("view search={}", search.unwrap_or_else(|| "all".to_owned()))))
    }

    async fn manage_projects(
        &self,
        cursor: PageCursor,
        _envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        Ok(ack_message(&format!("manage page={}", cursor.page)))
    }

    async fn open_create_modal(
        &self,
        _envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        Ok(ack_message("create"))
    }
}

fn ack_message(summary: &str) -> MessageTemplate {
    crate::blocks::MessageBuilder::new(summary.to_owned())
        .section("project.ack", |section| {
            section.plain(summary);
        })
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn known_verbs_map_to_their_actions() {
        assert_eq!(
            parse_project_command("list mint"),
            ProjectCommand::List { search: Some("mint".to_owned()) }
        );
        assert_eq!(
            parse_project_command("view crm rollout"),
            ProjectCommand::View { search: Some("crm rollout".to_owned()) }
        );
        assert_eq!(
            parse_project_command("edit mint"),
            ProjectCommand::Manage { search: Some("mint".to_owned()) }
        );
        assert_eq!(parse_project_command("delete"), ProjectCommand::Manage { search: None });
        assert_eq!(parse_project_command("create"), ProjectCommand::Create);
        assert_eq!(parse_project_command("new"), ProjectCommand::Create);
        assert_eq!(parse_project_command("help"), ProjectCommand::Help);
    }

    #[test]
    fn empty_text_falls_back_to_unfiltered_list() {
        assert_eq!(parse_project_command("   "), ProjectCommand::List { search: None });
    }

    #[test]
    fn unrecognized_verb_lists_with_whole_text_as_search() {
        assert_eq!(
            parse_project_command("mint migration"),
            ProjectCommand::List { search: Some("mint migration".to_owned()) }
        );
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(parse_project_command("LIST"), ProjectCommand::List { search: None });
        assert_eq!(parse_project_command("Create"), ProjectCommand::Create);
    }

    #[test]
    fn normalize_rejects_foreign_commands() {
        let payload = SlashCommandPayload {
            command: "/quote".to_owned(),
            ..SlashCommandPayload::default()
        };
        assert!(matches!(
            normalize_project_command(&payload),
            Err(CommandParseError::UnsupportedCommand(_))
        ));
    }

    #[tokio::test]
    async fn router_calls_service_entrypoints() {
        #[derive(Default)]
        struct RecordingService {
            calls: Mutex<Vec<&'static str>>,
        }

        #[async_trait]
        impl ProjectCommandService for RecordingService {
            async fn list_projects(
                &self,
                _cursor: PageCursor,
                _envelope: &CommandEnvelope,
            ) -> Result<MessageTemplate, CommandRouteError> {
                self.calls.lock().expect("lock").push("list");
                Ok(blocks::help_message())
            }

            async fn view_projects(
                &self,
                _search: Option<String>,
                _envelope: &CommandEnvelope,
            ) -> Result<MessageTemplate, CommandRouteError> {
                self.calls.lock().expect("lock").push("view");
                Ok(blocks::help_message())
            }

            async fn manage_projects(
                &self,
                _cursor: PageCursor,
                _envelope: &CommandEnvelope,
            ) -> Result<MessageTemplate, CommandRouteError> {
                self.calls.lock().expect("lock").push("manage");
                Ok(blocks::help_message())
            }

            async fn open_create_modal(
                &self,
                _envelope: &CommandEnvelope,
            ) -> Result<MessageTemplate, CommandRouteError> {
                self.calls.lock().expect("lock").push("create");
                Ok(blocks::help_message())
            }
        }

        let router = CommandRouter::new(RecordingService::default());
        let envelope = CommandEnvelope::default();
        for input in ["list", "view x", "edit", "create", "help", "unknown words"] {
            router.route(parse_project_command(input), &envelope).await.expect("route");
        }

        let calls = router.service().calls.lock().expect("lock");
        assert_eq!(&*calls, &["list", "view", "manage", "create", "list"]);
    }

    #[tokio::test]
    async fn help_routes_without_touching_the_service() {
        let router = CommandRouter::new(NoopProjectCommandService);
        let message = router
            .route(ProjectCommand::Help, &CommandEnvelope::default())
            .await
            .expect("route");
        assert!(message.fallback_text.contains("help"));
    }
}
