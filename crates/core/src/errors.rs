use thiserror::Error;

/// Failures that can occur while serving a single command or interaction.
/// Every handler is a terminal catch boundary: these never propagate past
/// one invocation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("Airtable request failed: {0}")]
    Gateway(String),
    #[error("Slack API call failed: {0}")]
    SlackApi(String),
    #[error("payload could not be interpreted: {0}")]
    InvalidPayload(String),
    #[error("integration is not configured: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("{message}")]
    Failed { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Text for the ephemeral reply shown to the invoking user: an error
    /// glyph followed by the underlying error message.
    pub fn ephemeral_text(&self) -> String {
        let Self::Failed { message, .. } = self;
        format!("⚠️ {message}")
    }

    pub fn correlation_id(&self) -> &str {
        let Self::Failed { correlation_id, .. } = self;
        correlation_id
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError::Failed {
            message: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}
