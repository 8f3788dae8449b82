use async_trait::async_trait;
use chrono::NaiveDate;
use projector_core::domain::{EmployeeFields, ProjectFields, ProjectFilters};
use projector_core::formula::filters_formula;

use crate::client::{AirtableClient, AirtableError};
use crate::records::Record;

/// Project CRUD as the handlers consume it. Filtering happens server-side
/// via `filterByFormula`; ordering is applied client-side after the full
/// retrieval because Airtable cannot sort missing dates last.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list(
        &self,
        filters: &ProjectFilters,
    ) -> Result<Vec<Record<ProjectFields>>, AirtableError>;
    async fn find(&self, record_id: &str) -> Result<Record<ProjectFields>, AirtableError>;
    async fn create(&self, fields: &ProjectFields) -> Result<Record<ProjectFields>, AirtableError>;
    async fn update(
        &self,
        record_id: &str,
        fields: &ProjectFields,
    ) -> Result<Record<ProjectFields>, AirtableError>;
    async fn delete(&self, record_id: &str) -> Result<(), AirtableError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Record<EmployeeFields>>, AirtableError>;
}

/// Stable sort by target date; records without one are treated as far
/// future and land after every dated record.
pub fn sort_by_target_date(records: &mut [Record<ProjectFields>]) {
    records.sort_by_key(|record| match record.fields.target_date {
        Some(date) => (false, date),
        None => (true, NaiveDate::MAX),
    });
}

pub struct AirtableProjectRepository {
    client: AirtableClient,
    table: String,
}

impl AirtableProjectRepository {
    pub fn new(client: AirtableClient, table: impl Into<String>) -> Self {
        Self { client, table: table.into() }
    }
}

#[async_trait]
impl ProjectRepository for AirtableProjectRepository {
    async fn list(
        &self,
        filters: &ProjectFilters,
    ) -> Result<Vec<Record<ProjectFields>>, AirtableError> {
        let formula = filters_formula(filters);
        let mut records = self.client.list_all(&self.table, formula.as_deref()).await?;
        sort_by_target_date(&mut records);
        Ok(records)
    }

    async fn find(&self, record_id: &str) -> Result<Record<ProjectFields>, AirtableError> {
        self.client.find(&self.table, record_id).await
    }

    async fn create(&self, fields: &ProjectFields) -> Result<Record<ProjectFields>, AirtableError> {
        self.client.create(&self.table, fields).await
    }

    async fn update(
        &self,
        record_id: &str,
        fields: &ProjectFields,
    ) -> Result<Record<ProjectFields>, AirtableError> {
        self.client.update(&self.table, record_id, fields).await
    }

    async fn delete(&self, record_id: &str) -> Result<(), AirtableError> {
        self.client.delete(&self.table, record_id).await
    }
}

pub struct AirtableEmployeeRepository {
    client: AirtableClient,
    table: String,
}

impl AirtableEmployeeRepository {
    pub fn new(client: AirtableClient, table: impl Into<String>) -> Self {
        Self { client, table: table.into() }
    }
}

#[async_trait]
impl EmployeeRepository for AirtableEmployeeRepository {
    async fn list(&self) -> Result<Vec<Record<EmployeeFields>>, AirtableError> {
        self.client.list_all(&self.table, None).await
    }
}
