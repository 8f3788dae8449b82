use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// One stored record: Airtable's opaque record id plus the typed field set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "F: serde::Deserialize<'de> + Default"))]
pub struct Record<F> {
    pub id: String,
    #[serde(default)]
    pub fields: F,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl<F: Default> Record<F> {
    pub fn new(id: impl Into<String>, fields: F) -> Self {
        Self { id: id.into(), fields, created_time: None }
    }
}

/// One page of a list response. A present `offset` means the listing is not
/// exhausted and must be re-requested with that continuation token.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(bound(deserialize = "F: serde::Deserialize<'de> + Default"))]
pub struct RecordPage<F> {
    #[serde(default = "Vec::new")]
    pub records: Vec<Record<F>>,
    #[serde(default)]
    pub offset: Option<String>,
}

impl<F: DeserializeOwned + Default> RecordPage<F> {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}
