//! HTTP surface: health/diagnostics plus the three Slack receivers.
//!
//! Every Slack handler is a terminal catch boundary. Whatever goes wrong
//! inside a single command or interaction is turned into an ephemeral
//! failure reply tagged with a correlation id, and the HTTP response to
//! Slack itself stays 200 so the platform does not retry or show its own
//! generic error.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use projector_core::config::AppConfig;
use projector_core::errors::ApplicationError;
use projector_slack::blocks::{error_message, MessageTemplate};
use projector_slack::commands::{
    normalize_project_command, CommandParseError, CommandRouter, SlashCommandPayload,
};
use projector_slack::interactions::{classify, InteractionError, InteractionPayload};
use projector_slack::modals::ModalError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};
use uuid::Uuid;

use crate::service::ProjectService;
use crate::signature::SignatureVerifier;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub router: Arc<CommandRouter<ProjectService>>,
    pub service: ProjectService,
    pub verifier: Arc<SignatureVerifier>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/test", get(diagnostics))
        .route("/slack/commands", post(slash_command))
        .route("/slack/interactions", post(interaction))
        .route("/slack/events", post(event))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "service": "projector-server", "status": "ok" }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let missing = state.config.missing_secrets();
    // Missing integration secrets degrade the check but never fail liveness.
    Json(json!({
        "status": "ready",
        "service": { "status": "ready", "detail": "projector-server runtime initialized" },
        "integrations": {
            "status": if missing.is_empty() { "ready" } else { "degraded" },
            "detail": if missing.is_empty() {
                "all integration secrets configured".to_owned()
            } else {
                format!("missing configuration: {}", missing.join(", "))
            },
        },
        "checked_at": Utc::now().to_rfc3339(),
    }))
}

async fn diagnostics(State(state): State<AppState>) -> Json<Value> {
    let missing = state.config.missing_secrets();
    Json(json!({
        "slack_bot_token_configured": !missing.contains(&"slack.bot_token"),
        "slack_signing_secret_configured": !missing.contains(&"slack.signing_secret"),
        "airtable_configured": !missing.iter().any(|key| key.starts_with("airtable.")),
        "signature_verification_enabled": state.verifier.is_enabled(),
        "missing": missing,
    }))
}

fn verify_request(
    verifier: &SignatureVerifier,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), Response> {
    // With no signing secret configured the verifier accepts everything,
    // so absent headers only matter when verification is live.
    let timestamp = header_str(headers, "x-slack-request-timestamp").unwrap_or_default();
    let signature = header_str(headers, "x-slack-signature").unwrap_or_default();

    verifier.verify(&timestamp, &signature, body, Utc::now().timestamp()).map_err(|reason| {
        warn!(%reason, "rejected request with invalid slack signature");
        unauthorized()
    })
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_owned)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "invalid request signature").into_response()
}

/// Slash-command form body as Slack posts it.
#[derive(Debug, Default, Deserialize)]
struct SlashCommandWire {
    #[serde(default)]
    command: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    trigger_id: String,
    #[serde(default)]
    response_url: String,
}

fn ephemeral_json(message: &MessageTemplate) -> Json<Value> {
    Json(json!({
        "response_type": "ephemeral",
        "text": &message.fallback_text,
        "blocks": &message.blocks,
    }))
}

async fn slash_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(rejection) = verify_request(&state.verifier, &headers, body.as_bytes()) {
        return rejection;
    }
    let request_id = Uuid::new_v4().to_string();

    let wire: SlashCommandWire = match serde_urlencoded::from_str(&body) {
        Ok(wire) => wire,
        Err(parse_error) => {
            error!(correlation_id = %request_id, %parse_error, "malformed slash command body");
            return ephemeral_json(&error_message("The command could not be read.", &request_id))
                .into_response();
        }
    };

    let payload = SlashCommandPayload {
        command: wire.command,
        text: wire.text,
        channel_id: wire.channel_id,
        user_id: wire.user_id,
        trigger_id: wire.trigger_id,
        response_url: wire.response_url,
        request_id: request_id.clone(),
    };

    let (command, envelope) = match normalize_project_command(&payload) {
        Ok(parsed) => parsed,
        Err(CommandParseError::UnsupportedCommand(other)) => {
            warn!(correlation_id = %request_id, command = %other, "unsupported slash command");
            return ephemeral_json(&error_message(
                &format!("Unsupported command: {other}"),
                &request_id,
            ))
            .into_response();
        }
    };

    match state.router.route(command, &envelope).await {
        Ok(message) => ephemeral_json(&message).into_response(),
        Err(route_error) => {
            error!(correlation_id = %request_id, %route_error, "slash command failed");
            ephemeral_json(&error_message(&route_error.to_string(), &request_id)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct InteractionWire {
    payload: String,
}

/// Maps a modal validation failure onto the offending input block, in the
/// `response_action: errors` shape Slack renders inline.
fn validation_response(modal_error: &ModalError) -> Json<Value> {
    let (block_id, text) = match modal_error {
        ModalError::MissingField(field) => {
            ("project_initiative", format!("{field} is required."))
        }
        ModalError::InvalidDate { value, .. } => {
            ("project_target_date", format!("`{value}` is not a valid date."))
        }
    };
    Json(json!({
        "response_action": "errors",
        "errors": { block_id: text },
    }))
}

async fn interaction(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    if let Err(rejection) = verify_request(&state.verifier, &headers, body.as_bytes()) {
        return rejection;
    }
    let request_id = Uuid::new_v4().to_string();

    let wire: InteractionWire = match serde_urlencoded::from_str(&body) {
        Ok(wire) => wire,
        Err(parse_error) => {
            error!(correlation_id = %request_id, %parse_error, "malformed interaction body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let payload = match InteractionPayload::parse(&wire.payload) {
        Ok(payload) => payload,
        Err(parse_error) => {
            error!(correlation_id = %request_id, %parse_error, "undecodable interaction payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let is_view_submission = payload.kind == "view_submission";
    let fallback_response_url = payload.response_url.clone();

    let (context, interaction_event) = match classify(payload) {
        Ok(classified) => classified,
        Err(InteractionError::Modal(modal_error)) if is_view_submission => {
            return validation_response(&modal_error).into_response();
        }
        Err(classify_error) => {
            error!(correlation_id = %request_id, %classify_error, "interaction rejected");
            if let Some(response_url) = fallback_response_url {
                let interface = ApplicationError::InvalidPayload(classify_error.to_string())
                    .into_interface(request_id.clone());
                let message = error_message(&interface.to_string(), interface.correlation_id());
                let _ = state
                    .service
                    .notify_error(
                        &projector_slack::interactions::InteractionContext {
                            response_url: Some(response_url),
                            ..Default::default()
                        },
                        &message,
                    )
                    .await;
            }
            return StatusCode::OK.into_response();
        }
    };

    if let Err(handle_error) = state.service.handle_event(context.clone(), interaction_event).await
    {
        error!(correlation_id = %request_id, %handle_error, "interaction handling failed");
        let interface = handle_error.into_interface(request_id.clone());
        let message = error_message(&interface.to_string(), interface.correlation_id());
        if let Err(notify_error) = state.service.notify_error(&context, &message).await {
            error!(correlation_id = %request_id, %notify_error, "failure reply undeliverable");
        }
    }

    StatusCode::OK.into_response()
}

async fn event(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    if let Err(rejection) = verify_request(&state.verifier, &headers, body.as_bytes()) {
        return rejection;
    }

    let payload: Value = serde_json::from_str(&body).unwrap_or_default();
    if payload["type"] == "url_verification" {
        return Json(json!({ "challenge": payload["challenge"] })).into_response();
    }
    StatusCode::OK.into_response()
}
