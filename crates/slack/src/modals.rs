//! Modal view construction and view-submission state extraction.
//!
//! Three modals exist: the filter picker, the creation form, and the edit
//! form. All three are plain data built here and opened by the server via
//! `views.open`; the submitted `view.state.values` payload comes back through
//! [`ViewState`] and is turned into domain values by the extraction helpers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use projector_core::domain::{
    Priority, ProjectFields, ProjectFilters, Status, BUSINESS_UNITS, OBJECTIVES, PRIORITIES,
    STATUSES,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blocks::TextObject;

pub const CALLBACK_FILTER: &str = "filter_projects_modal";
pub const CALLBACK_CREATE: &str = "submit_project_create";
pub const CALLBACK_EDIT: &str = "submit_project_edit";

const BLOCK_SEARCH: &str = "filter_search";
const BLOCK_STATUS: &str = "project_status";
const BLOCK_PRIORITY: &str = "project_priority";
const BLOCK_BU: &str = "project_bu";
const BLOCK_OKR: &str = "project_okr";
const BLOCK_OWNER: &str = "project_owner";
const BLOCK_INITIATIVE: &str = "project_initiative";
const BLOCK_DESCRIPTION: &str = "project_description";
const BLOCK_KPIS: &str = "project_kpis";
const BLOCK_RISKS: &str = "project_risks";
const BLOCK_MILESTONE: &str = "project_milestone";
const BLOCK_TARGET_DATE: &str = "project_target_date";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModalError {
    #[error("required field missing: {0}")]
    MissingField(&'static str),
    #[error("invalid date in field {field}: {value}")]
    InvalidDate { field: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionObject {
    pub text: TextObject,
    pub value: String,
}

impl OptionObject {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { text: TextObject::plain(label), value: value.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput {
        action_id: String,
        multiline: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_value: Option<String>,
    },
    StaticSelect {
        action_id: String,
        options: Vec<OptionObject>,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_option: Option<OptionObject>,
    },
    MultiStaticSelect {
        action_id: String,
        options: Vec<OptionObject>,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_options: Option<Vec<OptionObject>>,
    },
    Datepicker {
        action_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_date: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    pub block_id: String,
    pub label: TextObject,
    pub optional: bool,
    pub element: InputElement,
}

impl InputBlock {
    fn new(block_id: &str, label: &str, optional: bool, element: InputElement) -> Self {
        Self {
            kind: "input",
            block_id: block_id.to_owned(),
            label: TextObject::plain(label),
            optional,
            element,
        }
    }
}

/// A complete `views.open` view body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    kind: &'static str,
    pub callback_id: String,
    pub title: TextObject,
    pub submit: TextObject,
    pub close: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<String>,
    pub blocks: Vec<InputBlock>,
}

impl ModalView {
    fn new(callback_id: &str, title: &str, submit: &str) -> Self {
        Self {
            kind: "modal",
            callback_id: callback_id.to_owned(),
            title: TextObject::plain(title),
            submit: TextObject::plain(submit),
            close: TextObject::plain("Cancel"),
            private_metadata: None,
            blocks: Vec::new(),
        }
    }
}

/// Employee shown in an owner picker. The select option carries the Airtable
/// record id because `Project Owners` is a linked-record column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeOption {
    pub record_id: String,
    pub name: String,
}

fn text_input(action_block: &str, multiline: bool, initial: Option<&str>) -> InputElement {
    InputElement::PlainTextInput {
        action_id: format!("{action_block}_input"),
        multiline,
        initial_value: initial.filter(|value| !value.is_empty()).map(str::to_owned),
    }
}

fn single_select(
    action_block: &str,
    options: Vec<OptionObject>,
    initial: Option<&str>,
) -> InputElement {
    let initial_option = initial
        .and_then(|value| options.iter().find(|option| option.value == value))
        .cloned();
    InputElement::StaticSelect {
        action_id: format!("{action_block}_input"),
        options,
        initial_option,
    }
}

fn multi_select(
    action_block: &str,
    options: Vec<OptionObject>,
    initial: &[String],
) -> InputElement {
    let initial_options: Vec<OptionObject> = options
        .iter()
        .filter(|option| initial.iter().any(|value| *value == option.value))
        .cloned()
        .collect();
    InputElement::MultiStaticSelect {
        action_id: format!("{action_block}_input"),
        options,
        initial_options: (!initial_options.is_empty()).then_some(initial_options),
    }
}

fn status_options() -> Vec<OptionObject> {
    STATUSES
        .into_iter()
        .map(|status| {
            OptionObject::new(format!("{} {}", status.emoji(), status.as_str()), status.as_str())
        })
        .collect()
}

fn priority_options() -> Vec<OptionObject> {
    PRIORITIES
        .into_iter()
        .map(|priority| {
            OptionObject::new(
                format!("{} {}", priority.emoji(), priority.as_str()),
                priority.as_str(),
            )
        })
        .collect()
}

fn business_unit_options() -> Vec<OptionObject> {
    BUSINESS_UNITS.into_iter().map(|unit| OptionObject::new(unit, unit)).collect()
}

fn objective_options() -> Vec<OptionObject> {
    OBJECTIVES.into_iter().map(|objective| OptionObject::new(objective, objective)).collect()
}

fn owner_options(employees: &[EmployeeOption]) -> Vec<OptionObject> {
    employees
        .iter()
        .map(|employee| OptionObject::new(employee.name.clone(), employee.record_id.clone()))
        .collect()
}

/// Filter picker, prefilled from the currently active filters. The encoded
/// cursor of the message that opened it rides in `private_metadata` so the
/// submission can rebuild the listing.
pub fn filter_modal(
    current: &ProjectFilters,
    owner_names: &[String],
    cursor_metadata: &str,
) -> ModalView {
    let owner_opts: Vec<OptionObject> =
        owner_names.iter().map(|name| OptionObject::new(name.clone(), name.clone())).collect();

    let mut view = ModalView::new(CALLBACK_FILTER, "Filter projects", "Apply");
    view.private_metadata = Some(cursor_metadata.to_owned());
    view.blocks = vec![
        InputBlock::new(
            BLOCK_SEARCH,
            "Search",
            true,
            text_input(BLOCK_SEARCH, false, current.search.as_deref()),
        ),
        InputBlock::new(
            BLOCK_STATUS,
            "Status",
            true,
            single_select(BLOCK_STATUS, status_options(), current.status.as_deref()),
        ),
        InputBlock::new(
            BLOCK_PRIORITY,
            "Priority",
            true,
            single_select(BLOCK_PRIORITY, priority_options(), current.priority.as_deref()),
        ),
        InputBlock::new(
            BLOCK_BU,
            "Business unit",
            true,
            single_select(BLOCK_BU, business_unit_options(), current.business_unit.as_deref()),
        ),
        InputBlock::new(
            BLOCK_OKR,
            "Objective",
            true,
            single_select(BLOCK_OKR, objective_options(), current.objective.as_deref()),
        ),
    ];
    // Slack rejects a select with an empty options array, so the owner
    // filter only exists when there are employees to offer.
    if !owner_opts.is_empty() {
        view.blocks.push(InputBlock::new(
            BLOCK_OWNER,
            "Owner",
            true,
            single_select(BLOCK_OWNER, owner_opts, current.owner.as_deref()),
        ));
    }
    view
}

const DEFAULT_STATUS: &str = "Not started";
const DEFAULT_PRIORITY: &str = "Medium";

fn project_form_blocks(fields: &ProjectFields, employees: &[EmployeeOption]) -> Vec<InputBlock> {
    // Stored values outside the enumerations (or absent) preselect the
    // field-level defaults instead of leaving the select empty.
    let status =
        Status::parse(&fields.status).map(|status| status.as_str()).unwrap_or(DEFAULT_STATUS);
    let priority = Priority::parse(&fields.priority)
        .map(|priority| priority.as_str())
        .unwrap_or(DEFAULT_PRIORITY);

    let mut blocks = vec![
        InputBlock::new(
            BLOCK_INITIATIVE,
            "Initiative",
            false,
            text_input(BLOCK_INITIATIVE, false, Some(&fields.initiative)),
        ),
        InputBlock::new(
            BLOCK_DESCRIPTION,
            "Description",
            true,
            text_input(BLOCK_DESCRIPTION, true, Some(&fields.description)),
        ),
        InputBlock::new(
            BLOCK_STATUS,
            "Status",
            false,
            single_select(BLOCK_STATUS, status_options(), Some(status)),
        ),
        InputBlock::new(
            BLOCK_PRIORITY,
            "Priority",
            false,
            single_select(BLOCK_PRIORITY, priority_options(), Some(priority)),
        ),
        InputBlock::new(
            BLOCK_BU,
            "Related BU",
            true,
            multi_select(BLOCK_BU, business_unit_options(), &fields.related_bu),
        ),
        InputBlock::new(
            BLOCK_OKR,
            "Related OKR",
            true,
            multi_select(BLOCK_OKR, objective_options(), &fields.related_okr),
        ),
    ];
    // Slack rejects a select with an empty options array, so the owner
    // picker only exists when there are employees to offer.
    if !employees.is_empty() {
        blocks.push(InputBlock::new(
            BLOCK_OWNER,
            "Project owners",
            true,
            multi_select(BLOCK_OWNER, owner_options(employees), &fields.project_owners),
        ));
    }
    blocks.extend([
        InputBlock::new(
            BLOCK_KPIS,
            "KPIs",
            true,
            text_input(BLOCK_KPIS, true, Some(&fields.kpis)),
        ),
        InputBlock::new(
            BLOCK_RISKS,
            "Risks/Blockers",
            true,
            text_input(BLOCK_RISKS, true, Some(&fields.risks_blockers)),
        ),
        InputBlock::new(
            BLOCK_MILESTONE,
            "Next milestone",
            true,
            text_input(BLOCK_MILESTONE, false, Some(&fields.next_milestone)),
        ),
        InputBlock::new(
            BLOCK_TARGET_DATE,
            "Target date",
            true,
            InputElement::Datepicker {
                action_id: format!("{BLOCK_TARGET_DATE}_input"),
                initial_date: fields
                    .target_date
                    .map(|date| date.format(DATE_FORMAT).to_string()),
            },
        ),
    ]);
    blocks
}

/// Creation form. Status and Priority come preselected so the common case is
/// one typed field and submit.
pub fn create_modal(employees: &[EmployeeOption]) -> ModalView {
    let mut view = ModalView::new(CALLBACK_CREATE, "New project", "Create");
    view.blocks = project_form_blocks(&ProjectFields::default(), employees);
    view
}

/// Edit form for an existing record, prefilled from its current fields. The
/// record id rides in `private_metadata` so the submission knows what to
/// update.
pub fn edit_modal(
    record_id: &str,
    fields: &ProjectFields,
    employees: &[EmployeeOption],
) -> ModalView {
    let mut view = ModalView::new(CALLBACK_EDIT, "Edit project", "Save");
    view.private_metadata = Some(record_id.to_owned());
    view.blocks = project_form_blocks(fields, employees);
    view
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateInput {
    PlainTextInput {
        #[serde(default)]
        value: Option<String>,
    },
    StaticSelect {
        #[serde(default)]
        selected_option: Option<SelectedOption>,
    },
    MultiStaticSelect {
        #[serde(default)]
        selected_options: Vec<SelectedOption>,
    },
    Datepicker {
        #[serde(default)]
        selected_date: Option<String>,
    },
}

/// The `view.state` object of a view submission payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: BTreeMap<String, BTreeMap<String, StateInput>>,
}

impl ViewState {
    fn input(&self, block_id: &str) -> Option<&StateInput> {
        self.values.get(block_id).and_then(|actions| actions.values().next())
    }

    fn text(&self, block_id: &str) -> Option<String> {
        match self.input(block_id)? {
            StateInput::PlainTextInput { value } => value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned),
            _ => None,
        }
    }

    fn selected(&self, block_id: &str) -> Option<String> {
        match self.input(block_id)? {
            StateInput::StaticSelect { selected_option } => {
                selected_option.as_ref().map(|option| option.value.clone())
            }
            _ => None,
        }
    }

    fn selected_many(&self, block_id: &str) -> Vec<String> {
        match self.input(block_id) {
            Some(StateInput::MultiStaticSelect { selected_options }) => {
                selected_options.iter().map(|option| option.value.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    fn date(&self, block_id: &str, field: &'static str) -> Result<Option<NaiveDate>, ModalError> {
        match self.input(block_id) {
            Some(StateInput::Datepicker { selected_date: Some(raw) }) => {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map(Some)
                    .map_err(|_| ModalError::InvalidDate { field, value: raw.clone() })
            }
            _ => Ok(None),
        }
    }
}

/// Filter modal submission back into a filter set. Everything is optional,
/// an all-empty form means an unfiltered listing.
pub fn filters_from_state(state: &ViewState) -> ProjectFilters {
    ProjectFilters {
        search: state.text(BLOCK_SEARCH),
        status: state.selected(BLOCK_STATUS),
        priority: state.selected(BLOCK_PRIORITY),
        business_unit: state.selected(BLOCK_BU),
        objective: state.selected(BLOCK_OKR),
        owner: state.selected(BLOCK_OWNER),
    }
}

/// Create/edit submission back into a full field set. Text and set fields
/// left blank come back as empty values so an edit can clear them upstream.
pub fn project_fields_from_state(state: &ViewState) -> Result<ProjectFields, ModalError> {
    let initiative = state.text(BLOCK_INITIATIVE).ok_or(ModalError::MissingField("Initiative"))?;
    Ok(ProjectFields {
        initiative,
        description: state.text(BLOCK_DESCRIPTION).unwrap_or_default(),
        status: state.selected(BLOCK_STATUS).unwrap_or_default(),
        priority: state.selected(BLOCK_PRIORITY).unwrap_or_default(),
        related_bu: state.selected_many(BLOCK_BU),
        related_okr: state.selected_many(BLOCK_OKR),
        project_owners: state.selected_many(BLOCK_OWNER),
        owners_display: String::new(),
        kpis: state.text(BLOCK_KPIS).unwrap_or_default(),
        risks_blockers: state.text(BLOCK_RISKS).unwrap_or_default(),
        next_milestone: state.text(BLOCK_MILESTONE).unwrap_or_default(),
        last_updated: None,
        target_date: state.date(BLOCK_TARGET_DATE, "Target date")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_modal_preselects_status_and_priority_defaults() {
        let view = create_modal(&[]);
        assert_eq!(view.callback_id, CALLBACK_CREATE);

        let status_block =
            view.blocks.iter().find(|block| block.block_id == BLOCK_STATUS).expect("status block");
        match &status_block.element {
            InputElement::StaticSelect { initial_option: Some(option), .. } => {
                assert_eq!(option.value, "Not started");
            }
            other => panic!("unexpected status element: {other:?}"),
        }

        let priority_block = view
            .blocks
            .iter()
            .find(|block| block.block_id == BLOCK_PRIORITY)
            .expect("priority block");
        match &priority_block.element {
            InputElement::StaticSelect { initial_option: Some(option), .. } => {
                assert_eq!(option.value, "Medium");
            }
            other => panic!("unexpected priority element: {other:?}"),
        }
    }

    #[test]
    fn edit_modal_carries_record_id_and_prefills() {
        let fields = ProjectFields {
            initiative: "Mint migration".to_owned(),
            status: "In progress".to_owned(),
            related_bu: vec!["Engineering".to_owned()],
            ..ProjectFields::default()
        };
        let view = edit_modal("recAAA", &fields, &[]);
        assert_eq!(view.callback_id, CALLBACK_EDIT);
        assert_eq!(view.private_metadata.as_deref(), Some("recAAA"));

        let initiative = view
            .blocks
            .iter()
            .find(|block| block.block_id == BLOCK_INITIATIVE)
            .expect("initiative block");
        match &initiative.element {
            InputElement::PlainTextInput { initial_value: Some(value), .. } => {
                assert_eq!(value, "Mint migration");
            }
            other => panic!("unexpected initiative element: {other:?}"),
        }

        let bu = view.blocks.iter().find(|block| block.block_id == BLOCK_BU).expect("bu block");
        match &bu.element {
            InputElement::MultiStaticSelect { initial_options: Some(options), .. } => {
                assert_eq!(options.len(), 1);
                assert_eq!(options[0].value, "Engineering");
            }
            other => panic!("unexpected bu element: {other:?}"),
        }
    }

    fn select_initial(view: &ModalView, block_id: &str) -> Option<String> {
        let block =
            view.blocks.iter().find(|block| block.block_id == block_id).expect("select block");
        match &block.element {
            InputElement::StaticSelect { initial_option, .. } => {
                initial_option.as_ref().map(|option| option.value.clone())
            }
            other => panic!("unexpected element: {other:?}"),
        }
    }

    #[test]
    fn edit_modal_defaults_blank_status_and_priority() {
        let view = edit_modal("recAAA", &ProjectFields::default(), &[]);
        assert_eq!(select_initial(&view, BLOCK_STATUS).as_deref(), Some("Not started"));
        assert_eq!(select_initial(&view, BLOCK_PRIORITY).as_deref(), Some("Medium"));
    }

    #[test]
    fn edit_modal_defaults_values_outside_the_enumerations() {
        let fields = ProjectFields {
            initiative: "Mystery".to_owned(),
            status: "Paused".to_owned(),
            priority: "Blocker".to_owned(),
            ..ProjectFields::default()
        };
        let view = edit_modal("recAAA", &fields, &[]);
        assert_eq!(select_initial(&view, BLOCK_STATUS).as_deref(), Some("Not started"));
        assert_eq!(select_initial(&view, BLOCK_PRIORITY).as_deref(), Some("Medium"));
    }

    #[test]
    fn owner_picker_is_omitted_when_there_are_no_employees() {
        let create = create_modal(&[]);
        assert!(create.blocks.iter().all(|block| block.block_id != BLOCK_OWNER));

        let filter = filter_modal(&ProjectFilters::default(), &[], "{}");
        assert!(filter.blocks.iter().all(|block| block.block_id != BLOCK_OWNER));

        let filter = filter_modal(&ProjectFilters::default(), &["Dana".to_owned()], "{}");
        assert!(filter.blocks.iter().any(|block| block.block_id == BLOCK_OWNER));
    }

    #[test]
    fn owner_picker_values_are_employee_record_ids() {
        let employees = vec![EmployeeOption {
            record_id: "recEMP1".to_owned(),
            name: "Dana".to_owned(),
        }];
        let view = create_modal(&employees);
        let owners =
            view.blocks.iter().find(|block| block.block_id == BLOCK_OWNER).expect("owner block");
        match &owners.element {
            InputElement::MultiStaticSelect { options, .. } => {
                assert_eq!(options[0].value, "recEMP1");
                assert_eq!(options[0].text.text(), "Dana");
            }
            other => panic!("unexpected owner element: {other:?}"),
        }
    }

    #[test]
    fn modal_serializes_with_block_kit_type_tags() {
        let view = filter_modal(&ProjectFilters::default(), &[], "{}");
        let value = serde_json::to_value(&view).expect("serialize");
        assert_eq!(value["type"], "modal");
        assert_eq!(value["callback_id"], CALLBACK_FILTER);
        assert_eq!(value["title"]["type"], "plain_text");
        assert_eq!(value["blocks"][0]["type"], "input");
        assert_eq!(value["blocks"][0]["element"]["type"], "plain_text_input");
        assert_eq!(value["blocks"][1]["element"]["type"], "static_select");
    }

    fn state_json(raw: &str) -> ViewState {
        serde_json::from_str(raw).expect("state")
    }

    #[test]
    fn filter_submission_extracts_all_dimensions() {
        let state = state_json(
            r#"{
                "values": {
                    "filter_search": {"filter_search_input": {"type": "plain_text_input", "value": "  mint "}},
                    "project_status": {"project_status_input": {"type": "static_select", "selected_option": {"value": "In progress"}}},
                    "project_priority": {"project_priority_input": {"type": "static_select"}},
                    "project_owner": {"project_owner_input": {"type": "static_select", "selected_option": {"value": "Dana"}}}
                }
            }"#,
        );

        let filters = filters_from_state(&state);
        assert_eq!(filters.search.as_deref(), Some("mint"));
        assert_eq!(filters.status.as_deref(), Some("In progress"));
        assert_eq!(filters.priority, None);
        assert_eq!(filters.owner.as_deref(), Some("Dana"));
    }

    #[test]
    fn project_submission_requires_initiative() {
        let state = state_json(r#"{"values": {}}"#);
        assert_eq!(
            project_fields_from_state(&state),
            Err(ModalError::MissingField("Initiative"))
        );
    }

    #[test]
    fn project_submission_defaults_blank_optionals_to_empty_values() {
        let state = state_json(
            r#"{
                "values": {
                    "project_initiative": {"project_initiative_input": {"type": "plain_text_input", "value": "Lean CRM"}},
                    "project_status": {"project_status_input": {"type": "static_select", "selected_option": {"value": "Not started"}}},
                    "project_priority": {"project_priority_input": {"type": "static_select", "selected_option": {"value": "Medium"}}},
                    "project_target_date": {"project_target_date_input": {"type": "datepicker", "selected_date": "2026-03-01"}}
                }
            }"#,
        );

        let fields = project_fields_from_state(&state).expect("fields");
        assert_eq!(fields.initiative, "Lean CRM");
        assert_eq!(fields.description, "");
        assert_eq!(fields.related_bu, Vec::<String>::new());
        assert_eq!(fields.target_date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn malformed_date_is_rejected_with_the_raw_value() {
        let state = state_json(
            r#"{
                "values": {
                    "project_initiative": {"project_initiative_input": {"type": "plain_text_input", "value": "Lean CRM"}},
                    "project_target_date": {"project_target_date_input": {"type": "datepicker", "selected_date": "03/01/2026"}}
                }
            }"#,
        );

        assert_eq!(
            project_fields_from_state(&state),
            Err(ModalError::InvalidDate { field: "Target date", value: "03/01/2026".to_owned() })
        );
    }
}
