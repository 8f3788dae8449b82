//! Project and employee records as Airtable stores them.
//!
//! Field names are part of the wire contract: the serde rename attributes
//! below must match the Airtable column names verbatim, renaming a field here
//! breaks the integration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rank assigned to status/priority values outside the fixed enumerations.
/// Unknown values sort last and render with a neutral emoji instead of
/// failing the whole request.
pub const UNKNOWN_RANK: u32 = 999;

pub const NEUTRAL_EMOJI: &str = "⚪";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    NotStarted,
    InProgress,
    Delivered,
    Cancelled,
    Deprecated,
}

pub const STATUSES: [Status; 5] = [
    Status::NotStarted,
    Status::InProgress,
    Status::Delivered,
    Status::Cancelled,
    Status::Deprecated,
];

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Deprecated => "Deprecated",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        STATUSES.into_iter().find(|status| status.as_str() == raw.trim())
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::NotStarted => "🆕",
            Self::InProgress => "🚧",
            Self::Delivered => "✅",
            Self::Cancelled => "❌",
            Self::Deprecated => "🗑️",
        }
    }
}

/// Emoji for a raw status value as stored in Airtable. Values outside the
/// enumeration degrade to the neutral emoji.
pub fn status_emoji(raw: &str) -> &'static str {
    Status::parse(raw).map(|status| status.emoji()).unwrap_or(NEUTRAL_EMOJI)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

pub const PRIORITIES: [Priority; 4] =
    [Priority::Urgent, Priority::High, Priority::Medium, Priority::Low];

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        PRIORITIES.into_iter().find(|priority| priority.as_str() == raw.trim())
    }

    pub fn rank(&self) -> u32 {
        match self {
            Self::Urgent => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Urgent => "🔴",
            Self::High => "🟠",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }
}

pub fn priority_rank(raw: &str) -> u32 {
    Priority::parse(raw).map(|priority| priority.rank()).unwrap_or(UNKNOWN_RANK)
}

pub fn priority_emoji(raw: &str) -> &'static str {
    Priority::parse(raw).map(|priority| priority.emoji()).unwrap_or(NEUTRAL_EMOJI)
}

/// Business units a project can be tagged with. Fixed enumeration mirrored by
/// the Airtable multi-select options.
pub type BusinessUnit = &'static str;

pub const BUSINESS_UNITS: [BusinessUnit; 7] =
    ["Engineering", "Product", "Design", "Marketing", "Sales", "Operations", "Finance"];

/// Strategic objectives (OKR tags). Fixed enumeration mirrored by the
/// Airtable multi-select options.
pub type Objective = &'static str;

pub const OBJECTIVES: [Objective; 13] = [
    "O1.1 Grow enterprise revenue",
    "O1.2 Expand into new markets",
    "O1.3 Improve net retention",
    "O2.1 Ship the next platform release",
    "O2.2 Reduce incident rate",
    "O2.3 Cut infrastructure cost",
    "O3.1 Improve activation funnel",
    "O3.2 Raise NPS above 50",
    "O3.3 Launch self-serve onboarding",
    "O4.1 Hire and onboard key roles",
    "O4.2 Improve internal tooling",
    "O4.3 Strengthen security posture",
    "O5.1 Operational excellence",
];

/// Project record fields. `Owner(s)` is derived by Airtable from the linked
/// `Project Owners` records and is never written back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFields {
    #[serde(rename = "Initiative", default)]
    pub initiative: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Priority", default)]
    pub priority: String,
    #[serde(rename = "Related BU", default)]
    pub related_bu: Vec<String>,
    #[serde(rename = "Related OKR", default)]
    pub related_okr: Vec<String>,
    #[serde(rename = "Project Owners", default)]
    pub project_owners: Vec<String>,
    #[serde(rename = "Owner(s)", default, skip_serializing)]
    pub owners_display: String,
    #[serde(rename = "KPIs", default)]
    pub kpis: String,
    #[serde(rename = "Risks/Blockers", default)]
    pub risks_blockers: String,
    #[serde(rename = "Next milestone", default)]
    pub next_milestone: String,
    #[serde(rename = "Last updated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDate>,
    #[serde(rename = "Target date", default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFields {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Slack IDs", default)]
    pub slack_ids: String,
}

impl EmployeeFields {
    /// Whether this employee record is correlated with the given Slack user.
    /// The `Slack IDs` column holds one or more ids separated by commas or
    /// whitespace.
    pub fn matches_slack_user(&self, slack_user_id: &str) -> bool {
        self.slack_ids
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .map(str::trim)
            .any(|id| !id.is_empty() && id == slack_user_id)
    }
}

/// Active filter dimensions for a project listing. Carried verbatim inside
/// the pagination cursor so every page turn re-runs the same query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    /// Owner name as displayed by Airtable's primary field for Employees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ProjectFilters {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.business_unit.is_none()
            && self.objective.is_none()
            && self.owner.is_none()
    }
}
