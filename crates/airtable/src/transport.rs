use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

/// One REST call against the base: a path relative to the base root plus
/// query pairs and an optional JSON body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Post, path: path.into(), query: Vec::new(), body: Some(body) }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Patch, path: path.into(), query: Vec::new(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: Method::Delete, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("airtable request failed to send: {0}")]
    Send(String),
    #[error("airtable response body could not be read: {0}")]
    Read(String),
}

#[async_trait]
pub trait AirtableTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport, bearer-token authenticated. Timeouts are
/// whatever the client defaults enforce.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpTransport {
    pub fn new(base_id: &str, api_key: SecretString) -> Self {
        Self::with_base_url(format!("https://api.airtable.com/v0/{base_id}"), api_key)
    }

    pub fn with_base_url(base_url: String, api_key: SecretString) -> Self {
        Self { client: Client::new(), base_url, api_key }
    }
}

#[async_trait]
impl AirtableTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}/{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };

        builder = builder
            .bearer_auth(self.api_key.expose_secret())
            .query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response =
            builder.send().await.map_err(|error| TransportError::Send(error.to_string()))?;
        let status = response.status().as_u16();
        let body =
            response.text().await.map_err(|error| TransportError::Read(error.to_string()))?;

        Ok(ApiResponse { status, body })
    }
}
