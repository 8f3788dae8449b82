use std::sync::Arc;

use projector_airtable::client::AirtableClient;
use projector_airtable::repository::{AirtableEmployeeRepository, AirtableProjectRepository};
use projector_airtable::transport::HttpTransport;
use projector_core::config::{AppConfig, ConfigError, LoadOptions};
use projector_slack::commands::CommandRouter;
use thiserror::Error;
use tracing::{info, warn};

use crate::routes::{self, AppState};
use crate::service::ProjectService;
use crate::signature::SignatureVerifier;
use crate::slack_api::HttpSlackApi;

pub struct Application {
    pub config: AppConfig,
    pub router: axum::Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    for key in config.missing_secrets() {
        warn!(
            event_name = "system.bootstrap.missing_secret",
            correlation_id = "bootstrap",
            key,
            "integration secret not configured, the related calls will fail"
        );
    }

    let transport =
        Arc::new(HttpTransport::new(&config.airtable.base_id, config.airtable.api_key.clone()));
    let client = AirtableClient::new(transport);
    let projects =
        Arc::new(AirtableProjectRepository::new(client.clone(), config.airtable.projects_table.clone()));
    let employees = Arc::new(AirtableEmployeeRepository::new(
        client,
        config.airtable.employees_table.clone(),
    ));
    let slack = Arc::new(HttpSlackApi::new(config.slack.bot_token.clone()));

    let service = ProjectService::new(projects, employees, slack);
    let state = AppState {
        config: Arc::new(config.clone()),
        router: Arc::new(CommandRouter::new(service.clone())),
        service,
        verifier: Arc::new(SignatureVerifier::new(config.slack.signing_secret.clone())),
    };

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application wiring complete"
    );
    Ok(Application { config, router: routes::router(state) })
}

#[cfg(test)]
mod tests {
    use projector_core::config::{ConfigOverrides, LoadOptions};

    use super::*;

    #[tokio::test]
    async fn bootstrap_succeeds_without_integration_secrets() {
        let app = bootstrap(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap");

        assert!(!app.config.missing_secrets().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_rejects_malformed_bot_tokens() {
        let result = bootstrap(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            overrides: ConfigOverrides {
                slack_bot_token: Some("xapp-wrong-kind".to_owned()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }
}
