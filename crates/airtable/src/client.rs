use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::records::{Record, RecordPage};
use crate::transport::{AirtableTransport, ApiRequest, ApiResponse, TransportError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AirtableError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Non-success HTTP status. `body` is the API's raw JSON error payload,
    /// surfaced to the invoking user verbatim.
    #[error("airtable returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("airtable response could not be decoded: {0}")]
    Decode(String),
}

/// Thin CRUD client over one Airtable base. Tables are addressed by id, the
/// field schema is whatever the caller's record type declares.
#[derive(Clone)]
pub struct AirtableClient {
    transport: Arc<dyn AirtableTransport>,
}

impl AirtableClient {
    pub fn new(transport: Arc<dyn AirtableTransport>) -> Self {
        Self { transport }
    }

    /// Fetches every record of a table, following the continuation offset
    /// until the API stops returning one. Optionally filtered server-side
    /// with a `filterByFormula` expression.
    pub async fn list_all<F>(
        &self,
        table: &str,
        filter_formula: Option<&str>,
    ) -> Result<Vec<Record<F>>, AirtableError>
    where
        F: DeserializeOwned + Default,
    {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = ApiRequest::get(table);
            if let Some(formula) = filter_formula {
                request = request.query("filterByFormula", formula);
            }
            if let Some(token) = &offset {
                request = request.query("offset", token.clone());
            }

            let body = self.execute(request).await?;
            let page: RecordPage<F> =
                RecordPage::parse(&body).map_err(|error| AirtableError::Decode(error.to_string()))?;

            records.extend(page.records);
            match page.offset {
                Some(token) => offset = Some(token),
                None => break,
            }
        }

        debug!(table, count = records.len(), "airtable listing complete");
        Ok(records)
    }

    pub async fn find<F>(&self, table: &str, record_id: &str) -> Result<Record<F>, AirtableError>
    where
        F: DeserializeOwned + Default,
    {
        let body = self.execute(ApiRequest::get(format!("{table}/{record_id}"))).await?;
        serde_json::from_str(&body).map_err(|error| AirtableError::Decode(error.to_string()))
    }

    pub async fn create<F>(&self, table: &str, fields: &F) -> Result<Record<F>, AirtableError>
    where
        F: Serialize + DeserializeOwned + Default,
    {
        let body = self
            .execute(ApiRequest::post(table, json!({ "fields": fields })))
            .await?;
        serde_json::from_str(&body).map_err(|error| AirtableError::Decode(error.to_string()))
    }

    pub async fn update<F>(
        &self,
        table: &str,
        record_id: &str,
        fields: &F,
    ) -> Result<Record<F>, AirtableError>
    where
        F: Serialize + DeserializeOwned + Default,
    {
        let body = self
            .execute(ApiRequest::patch(format!("{table}/{record_id}"), json!({ "fields": fields })))
            .await?;
        serde_json::from_str(&body).map_err(|error| AirtableError::Decode(error.to_string()))
    }

    pub async fn delete(&self, table: &str, record_id: &str) -> Result<(), AirtableError> {
        self.execute(ApiRequest::delete(format!("{table}/{record_id}"))).await?;
        Ok(())
    }

    async fn execute(&self, request: ApiRequest) -> Result<String, AirtableError> {
        let ApiResponse { status, body } = self.transport.send(request).await?;
        if !(200..300).contains(&status) {
            return Err(AirtableError::Api { status, body });
        }
        Ok(body)
    }
}
