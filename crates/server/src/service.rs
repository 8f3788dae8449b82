//! Command and interaction handling over the repositories.
//!
//! Every listing is stateless: fetch the filtered set from Airtable, sort,
//! slice the cursor's window, render. Page turns decode the cursor from the
//! clicked button and re-run the same pipeline, so a stale message can never
//! show a stale page.

use std::sync::Arc;

use async_trait::async_trait;
use projector_airtable::records::Record;
use projector_airtable::repository::{EmployeeRepository, ProjectRepository};
use projector_core::domain::{ProjectFields, ProjectFilters};
use projector_core::errors::ApplicationError;
use projector_core::page::{page_window, PageCursor};
use projector_slack::blocks::{MessageBuilder, MessageTemplate};
use projector_slack::commands::{CommandEnvelope, CommandRouteError, ProjectCommandService};
use projector_slack::format::{
    project_detail_message, project_list_message, project_manage_message, ProjectCard,
};
use projector_slack::interactions::{InteractionContext, InteractionEvent};
use projector_slack::modals::{create_modal, edit_modal, filter_modal, EmployeeOption};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::slack_api::SlackApi;

/// Where a modal submission should land its reply. Serialized into the
/// modal's `private_metadata` when the view is opened.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalOrigin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl ModalOrigin {
    fn parse(metadata: Option<&str>) -> Self {
        metadata.and_then(|raw| serde_json::from_str(raw).ok()).unwrap_or_default()
    }

    fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned())
    }
}

#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    employees: Arc<dyn EmployeeRepository>,
    slack: Arc<dyn SlackApi>,
}

fn gateway(error: projector_airtable::client::AirtableError) -> ApplicationError {
    ApplicationError::Gateway(error.to_string())
}

fn route_error(error: ApplicationError) -> CommandRouteError {
    CommandRouteError::Service(error.to_string())
}

fn to_cards(records: Vec<Record<ProjectFields>>) -> Vec<ProjectCard> {
    records
        .into_iter()
        .map(|record| ProjectCard { record_id: record.id, fields: record.fields })
        .collect()
}

fn notice(summary: impl Into<String>) -> MessageTemplate {
    let summary = summary.into();
    MessageBuilder::new(summary.clone())
        .section("project.notice", |section| {
            section.mrkdwn(summary);
        })
        .build()
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        employees: Arc<dyn EmployeeRepository>,
        slack: Arc<dyn SlackApi>,
    ) -> Self {
        Self { projects, employees, slack }
    }

    /// The literal search/owner value `mine` means "projects owned by the
    /// invoking user": it is replaced with the employee name correlated to
    /// the Slack user id. An uncorrelated user gets a filter that matches
    /// nothing rather than everyone's projects.
    async fn resolve_mine(
        &self,
        filters: &mut ProjectFilters,
        user_id: &str,
    ) -> Result<(), ApplicationError> {
        let mine_search = filters.search.as_deref().map(str::trim).map(str::to_ascii_lowercase);
        let mine_owner = filters.owner.as_deref().map(str::trim).map(str::to_ascii_lowercase);
        let from_search = mine_search.as_deref() == Some("mine");
        let from_owner = matches!(mine_owner.as_deref(), Some("mine") | Some("me"));
        if !from_search && !from_owner {
            return Ok(());
        }

        let employees = self.employees.list().await.map_err(gateway)?;
        let owner = employees
            .iter()
            .find(|record| record.fields.matches_slack_user(user_id))
            .map(|record| record.fields.name.clone());

        if from_search {
            filters.search = None;
        }
        filters.owner = Some(owner.unwrap_or_else(|| user_id.to_owned()));
        Ok(())
    }

    async fn fetch_cards(
        &self,
        filters: &ProjectFilters,
    ) -> Result<Vec<ProjectCard>, ApplicationError> {
        Ok(to_cards(self.projects.list(filters).await.map_err(gateway)?))
    }

    async fn paged_message(
        &self,
        mut cursor: PageCursor,
        user_id: &str,
        manage: bool,
    ) -> Result<MessageTemplate, ApplicationError> {
        self.resolve_mine(&mut cursor.filters, user_id).await?;
        let cards = self.fetch_cards(&cursor.filters).await?;
        let total = cards.len();
        let window = page_window(total, cursor.page);
        let visible = &cards[window.start..window.end];

        debug!(total, page = cursor.page, manage, "project listing rendered");
        Ok(if manage {
            project_manage_message(visible, &cursor, total)
        } else {
            project_list_message(visible, &cursor, total)
        })
    }

    async fn employee_options(&self) -> Result<Vec<EmployeeOption>, ApplicationError> {
        let employees = self.employees.list().await.map_err(gateway)?;
        Ok(employees
            .into_iter()
            .map(|record| EmployeeOption { record_id: record.id, name: record.fields.name })
            .collect())
    }

    /// One button click or modal submission, end to end. Errors propagate to
    /// the route handler, which turns them into the ephemeral failure reply.
    pub async fn handle_event(
        &self,
        context: InteractionContext,
        event: InteractionEvent,
    ) -> Result<(), ApplicationError> {
        match event {
            InteractionEvent::PageTurn { cursor, manage } => {
                let message = self.paged_message(cursor, &context.user_id, manage).await?;
                let response_url = context.response_url.as_deref().ok_or_else(|| {
                    ApplicationError::InvalidPayload("page turn without response_url".to_owned())
                })?;
                self.slack.post_response(response_url, &message, true).await
            }
            InteractionEvent::OpenFilter { cursor } => {
                let trigger_id = require_trigger(&context)?;
                let employees = self.employee_options().await?;
                let owner_names: Vec<String> =
                    employees.into_iter().map(|employee| employee.name).collect();
                let origin = ModalOrigin { channel_id: context.channel_id.clone() };
                let view = filter_modal(&cursor.filters, &owner_names, &origin.encode());
                self.slack.open_view(trigger_id, &view).await
            }
            InteractionEvent::FilterSubmitted { filters } => {
                let cursor = PageCursor::new(filters, 0);
                let message = self.paged_message(cursor, &context.user_id, false).await?;
                self.reply_to_origin(&context, &message).await
            }
            InteractionEvent::CreateSubmitted { fields } => {
                let record = self.projects.create(&fields).await.map_err(gateway)?;
                info!(record_id = %record.id, "project created");
                let message =
                    notice(format!("✅ Project created: *{}*", record.fields.initiative));
                self.reply_to_origin(&context, &message).await
            }
            InteractionEvent::EditRequested { record_id } => {
                let trigger_id = require_trigger(&context)?;
                let record = self.projects.find(&record_id).await.map_err(gateway)?;
                let employees = self.employee_options().await?;
                let view = edit_modal(&record.id, &record.fields, &employees);
                self.slack.open_view(trigger_id, &view).await
            }
            InteractionEvent::EditSubmitted { record_id, fields } => {
                let record =
                    self.projects.update(&record_id, &fields).await.map_err(gateway)?;
                info!(record_id = %record.id, "project updated");
                let message =
                    notice(format!("✅ Project updated: *{}*", record.fields.initiative));
                self.reply_to_origin(&context, &message).await
            }
            InteractionEvent::DeleteRequested { record_id } => {
                self.projects.delete(&record_id).await.map_err(gateway)?;
                info!(record_id = %record_id, "project deleted");
                let message = notice("🗑️ Project deleted.");
                match context.response_url.as_deref() {
                    Some(response_url) => {
                        self.slack.post_response(response_url, &message, false).await
                    }
                    None => self.reply_to_origin(&context, &message).await,
                }
            }
            InteractionEvent::Unsupported { detail } => {
                debug!(detail, "ignoring unsupported interaction");
                Ok(())
            }
        }
    }

    /// Delivers a failure reply for an interaction: through the action's
    /// `response_url` when there is one, otherwise to the origin channel.
    pub async fn notify_error(
        &self,
        context: &InteractionContext,
        message: &MessageTemplate,
    ) -> Result<(), ApplicationError> {
        match context.response_url.as_deref() {
            Some(response_url) => self.slack.post_response(response_url, message, false).await,
            None => self.reply_to_origin(context, message).await,
        }
    }

    /// Replies where the originating modal was opened: the channel recorded
    /// in its metadata, falling back to a DM with the user.
    async fn reply_to_origin(
        &self,
        context: &InteractionContext,
        message: &MessageTemplate,
    ) -> Result<(), ApplicationError> {
        let origin = ModalOrigin::parse(context.view_metadata.as_deref());
        let channel = origin
            .channel_id
            .or_else(|| context.channel_id.clone())
            .unwrap_or_else(|| context.user_id.clone());
        self.slack.post_ephemeral(&channel, &context.user_id, message).await
    }
}

fn require_trigger(context: &InteractionContext) -> Result<&str, ApplicationError> {
    context
        .trigger_id
        .as_deref()
        .filter(|trigger_id| !trigger_id.is_empty())
        .ok_or_else(|| ApplicationError::InvalidPayload("interaction without trigger_id".to_owned()))
}

#[async_trait]
impl ProjectCommandService for ProjectService {
    async fn list_projects(
        &self,
        cursor: PageCursor,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        self.paged_message(cursor, &envelope.user_id, false).await.map_err(route_error)
    }

    async fn view_projects(
        &self,
        search: Option<String>,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let mut filters = ProjectFilters { search, ..ProjectFilters::default() };
        self.resolve_mine(&mut filters, &envelope.user_id).await.map_err(route_error)?;
        let search = filters.search.clone();
        let cards = self.fetch_cards(&filters).await.map_err(route_error)?;
        Ok(project_detail_message(&cards, search.as_deref()))
    }

    async fn manage_projects(
        &self,
        cursor: PageCursor,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        self.paged_message(cursor, &envelope.user_id, true).await.map_err(route_error)
    }

    async fn open_create_modal(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let employees = self.employee_options().await.map_err(route_error)?;
        let mut view = create_modal(&employees);
        let origin = ModalOrigin {
            channel_id: (!envelope.channel_id.is_empty()).then(|| envelope.channel_id.clone()),
        };
        view.private_metadata = Some(origin.encode());
        self.slack
            .open_view(&envelope.trigger_id, &view)
            .await
            .map_err(route_error)?;
        Ok(notice("📝 Opening the project form…"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use projector_airtable::fixtures::{InMemoryEmployeeRepository, InMemoryProjectRepository};
    use projector_core::domain::EmployeeFields;
    use projector_slack::blocks::Block;
    use projector_slack::modals::CALLBACK_EDIT;

    use super::*;
    use crate::slack_api::{RecordingSlackApi, SlackCall};

    fn project(id: &str, initiative: &str, owner: &str) -> Record<ProjectFields> {
        Record::new(
            id,
            ProjectFields {
                initiative: initiative.to_owned(),
                status: "In progress".to_owned(),
                priority: "High".to_owned(),
                owners_display: owner.to_owned(),
                target_date: NaiveDate::from_ymd_opt(2026, 9, 1),
                ..ProjectFields::default()
            },
        )
    }

    struct Harness {
        service: ProjectService,
        projects: Arc<InMemoryProjectRepository>,
        slack: Arc<RecordingSlackApi>,
    }

    fn harness(records: Vec<Record<ProjectFields>>) -> Harness {
        let projects = Arc::new(InMemoryProjectRepository::with_records(records));
        let employees = Arc::new(InMemoryEmployeeRepository::with_employees(vec![Record::new(
            "recEMP1",
            EmployeeFields { name: "Dana".to_owned(), slack_ids: "U111".to_owned() },
        )]));
        let slack = Arc::new(RecordingSlackApi::default());
        let service =
            ProjectService::new(projects.clone(), employees, slack.clone());
        Harness { service, projects, slack }
    }

    fn envelope(user_id: &str) -> CommandEnvelope {
        CommandEnvelope {
            channel_id: "C42".to_owned(),
            user_id: user_id.to_owned(),
            trigger_id: "trig.1".to_owned(),
            response_url: "https://hooks.slack.com/commands/T/1/abc".to_owned(),
            request_id: "req-1".to_owned(),
        }
    }

    fn item_sections(message: &MessageTemplate) -> usize {
        message
            .blocks
            .iter()
            .filter(|block| {
                matches!(block, Block::Section { block_id, .. }
                    if block_id.starts_with("project.list.item.")
                        && !block_id.ends_with(".controls"))
            })
            .count()
    }

    #[tokio::test]
    async fn listing_shows_at_most_eight_projects_per_page() {
        let records =
            (0..20).map(|i| project(&format!("rec{i:03}"), &format!("P{i}"), "Dana")).collect();
        let fixture = harness(records);

        let message = fixture
            .service
            .list_projects(PageCursor::default(), &envelope("U111"))
            .await
            .expect("list");
        assert_eq!(item_sections(&message), 8);

        let last = fixture
            .service
            .list_projects(PageCursor::new(ProjectFilters::default(), 2), &envelope("U111"))
            .await
            .expect("list");
        assert_eq!(item_sections(&last), 4);
    }

    #[tokio::test]
    async fn mine_search_resolves_to_the_callers_employee_name() {
        let fixture = harness(vec![
            project("rec001", "Mine project", "Dana"),
            project("rec002", "Someone else's", "Riley"),
        ]);

        let cursor = PageCursor::new(
            ProjectFilters { search: Some("mine".to_owned()), ..ProjectFilters::default() },
            0,
        );
        let message =
            fixture.service.list_projects(cursor, &envelope("U111")).await.expect("list");

        assert_eq!(item_sections(&message), 1);
        assert!(message.fallback_text.contains("1 total"));
    }

    #[tokio::test]
    async fn uncorrelated_user_asking_for_mine_matches_nothing() {
        let fixture = harness(vec![project("rec001", "Mine project", "Dana")]);

        let cursor = PageCursor::new(
            ProjectFilters { search: Some("mine".to_owned()), ..ProjectFilters::default() },
            0,
        );
        let message =
            fixture.service.list_projects(cursor, &envelope("U999")).await.expect("list");
        assert_eq!(item_sections(&message), 0);
    }

    #[tokio::test]
    async fn create_submission_persists_and_confirms_in_the_origin_channel() {
        let fixture = harness(Vec::new());

        let context = InteractionContext {
            user_id: "U111".to_owned(),
            view_metadata: Some(r#"{"channel_id":"C42"}"#.to_owned()),
            ..InteractionContext::default()
        };
        let fields = ProjectFields {
            initiative: "Lean CRM".to_owned(),
            status: "Not started".to_owned(),
            priority: "Medium".to_owned(),
            ..ProjectFields::default()
        };
        fixture
            .service
            .handle_event(context, InteractionEvent::CreateSubmitted { fields })
            .await
            .expect("create");

        let records = fixture.projects.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.initiative, "Lean CRM");
        assert_eq!(records[0].fields.description, "");

        let calls = fixture.slack.calls().await;
        assert!(matches!(
            &calls[0],
            SlackCall::PostEphemeral { channel_id, user_id, message }
                if channel_id == "C42" && user_id == "U111"
                    && message.fallback_text.contains("Project created")
        ));
    }

    #[tokio::test]
    async fn deleting_a_missing_record_surfaces_the_raw_upstream_error() {
        let fixture = harness(Vec::new());

        let error = fixture
            .service
            .handle_event(
                InteractionContext {
                    user_id: "U111".to_owned(),
                    response_url: Some("https://hooks.slack.com/actions/T/1/abc".to_owned()),
                    ..InteractionContext::default()
                },
                InteractionEvent::DeleteRequested { record_id: "recMISSING".to_owned() },
            )
            .await
            .expect_err("must fail");

        let text = error.to_string();
        assert!(text.contains("MODEL_ID_NOT_FOUND"));
        assert!(text.contains("recMISSING"));
        assert!(fixture.slack.calls().await.is_empty());
    }

    #[tokio::test]
    async fn edit_click_opens_a_prefilled_modal() {
        let fixture = harness(vec![project("recAAA", "Mint migration", "Dana")]);

        fixture
            .service
            .handle_event(
                InteractionContext {
                    user_id: "U111".to_owned(),
                    trigger_id: Some("trig.9".to_owned()),
                    ..InteractionContext::default()
                },
                InteractionEvent::EditRequested { record_id: "recAAA".to_owned() },
            )
            .await
            .expect("edit");

        let calls = fixture.slack.calls().await;
        match &calls[0] {
            SlackCall::OpenView { trigger_id, view } => {
                assert_eq!(trigger_id, "trig.9");
                assert_eq!(view.callback_id, CALLBACK_EDIT);
                assert_eq!(view.private_metadata.as_deref(), Some("recAAA"));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn page_turn_replaces_the_original_message() {
        let records =
            (0..20).map(|i| project(&format!("rec{i:03}"), &format!("P{i}"), "Dana")).collect();
        let fixture = harness(records);

        fixture
            .service
            .handle_event(
                InteractionContext {
                    user_id: "U111".to_owned(),
                    response_url: Some("https://hooks.slack.com/actions/T/1/abc".to_owned()),
                    ..InteractionContext::default()
                },
                InteractionEvent::PageTurn {
                    cursor: PageCursor::new(ProjectFilters::default(), 1),
                    manage: false,
                },
            )
            .await
            .expect("page turn");

        let calls = fixture.slack.calls().await;
        assert!(matches!(
            &calls[0],
            SlackCall::PostResponse { replace_original: true, message, .. }
                if message.fallback_text.contains("page 2")
        ));
    }

    #[tokio::test]
    async fn delete_confirmation_does_not_replace_the_pick_list() {
        let fixture = harness(vec![project("recAAA", "Mint migration", "Dana")]);

        fixture
            .service
            .handle_event(
                InteractionContext {
                    user_id: "U111".to_owned(),
                    response_url: Some("https://hooks.slack.com/actions/T/1/abc".to_owned()),
                    ..InteractionContext::default()
                },
                InteractionEvent::DeleteRequested { record_id: "recAAA".to_owned() },
            )
            .await
            .expect("delete");

        assert!(fixture.projects.records().await.is_empty());
        let calls = fixture.slack.calls().await;
        assert!(matches!(&calls[0], SlackCall::PostResponse { replace_original: false, .. }));
    }
}
