//! In-memory repository fakes for handler tests.

use async_trait::async_trait;
use projector_core::domain::{EmployeeFields, ProjectFields, ProjectFilters};
use tokio::sync::Mutex;

use crate::client::AirtableError;
use crate::records::Record;
use crate::repository::{sort_by_target_date, EmployeeRepository, ProjectRepository};

#[derive(Default)]
pub struct InMemoryProjectRepository {
    state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    records: Vec<Record<ProjectFields>>,
    next_id: usize,
    fail_next: Option<AirtableError>,
}

impl InMemoryProjectRepository {
    pub fn with_records(records: Vec<Record<ProjectFields>>) -> Self {
        Self {
            state: Mutex::new(InMemoryState { records, next_id: 0, fail_next: None }),
        }
    }

    /// Arms a one-shot failure returned by the next repository call.
    pub async fn fail_next(&self, error: AirtableError) {
        self.state.lock().await.fail_next = Some(error);
    }

    pub async fn records(&self) -> Vec<Record<ProjectFields>> {
        self.state.lock().await.records.clone()
    }
}

fn matches_filters(record: &Record<ProjectFields>, filters: &ProjectFilters) -> bool {
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        let haystack = format!(
            "{} {}",
            record.fields.initiative.to_lowercase(),
            record.fields.description.to_lowercase()
        );
        if !haystack.contains(&needle) {
            return false;
        }
    }
    if let Some(status) = filters.status.as_deref() {
        if record.fields.status != status {
            return false;
        }
    }
    if let Some(priority) = filters.priority.as_deref() {
        if record.fields.priority != priority {
            return false;
        }
    }
    if let Some(business_unit) = filters.business_unit.as_deref() {
        if !record.fields.related_bu.iter().any(|bu| bu == business_unit) {
            return false;
        }
    }
    if let Some(objective) = filters.objective.as_deref() {
        if !record.fields.related_okr.iter().any(|okr| okr == objective) {
            return false;
        }
    }
    if let Some(owner) = filters.owner.as_deref() {
        let owned = record.fields.owners_display.contains(owner)
            || record.fields.project_owners.iter().any(|entry| entry == owner);
        if !owned {
            return false;
        }
    }
    true
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn list(
        &self,
        filters: &ProjectFilters,
    ) -> Result<Vec<Record<ProjectFields>>, AirtableError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        let mut matched: Vec<Record<ProjectFields>> = state
            .records
            .iter()
            .filter(|record| matches_filters(record, filters))
            .cloned()
            .collect();
        sort_by_target_date(&mut matched);
        Ok(matched)
    }

    async fn find(&self, record_id: &str) -> Result<Record<ProjectFields>, AirtableError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        state
            .records
            .iter()
            .find(|record| record.id == record_id)
            .cloned()
            .ok_or_else(|| not_found(record_id))
    }

    async fn create(&self, fields: &ProjectFields) -> Result<Record<ProjectFields>, AirtableError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        state.next_id += 1;
        let record = Record::new(format!("recMEM{:04}", state.next_id), fields.clone());
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        record_id: &str,
        fields: &ProjectFields,
    ) -> Result<Record<ProjectFields>, AirtableError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        let Some(record) = state.records.iter_mut().find(|record| record.id == record_id) else {
            return Err(not_found(record_id));
        };
        record.fields = fields.clone();
        Ok(record.clone())
    }

    async fn delete(&self, record_id: &str) -> Result<(), AirtableError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        let before = state.records.len();
        state.records.retain(|record| record.id != record_id);
        if state.records.len() == before {
            return Err(not_found(record_id));
        }
        Ok(())
    }
}

fn not_found(record_id: &str) -> AirtableError {
    AirtableError::Api {
        status: 404,
        body: format!(
            r#"{{"error":{{"type":"MODEL_ID_NOT_FOUND","message":"Record not found: {record_id}"}}}}"#
        ),
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    employees: Vec<Record<EmployeeFields>>,
}

impl InMemoryEmployeeRepository {
    pub fn with_employees(employees: Vec<Record<EmployeeFields>>) -> Self {
        Self { employees }
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn list(&self) -> Result<Vec<Record<EmployeeFields>>, AirtableError> {
        Ok(self.employees.clone())
    }
}
