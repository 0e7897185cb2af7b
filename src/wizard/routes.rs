//! REST + WebSocket surface for the wizard.
//!
//! Blocked advances and delegated retreats are HTTP 200 with a tagged
//! outcome body: they are normal negative results the SPA must check, not
//! errors. Only misuse of the validated configuration maps to 4xx.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, FormError};
use crate::form::FieldValue;
use crate::progress::Progress;

use super::controller::WizardController;

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub controller: Arc<WizardController>,
}

/// Event pushed to WebSocket subscribers on every index change.
#[derive(Debug, Serialize)]
struct ProgressEvent {
    index: usize,
    progress: Progress,
}

/// Body for the sub-section jump endpoint.
#[derive(Debug, Deserialize)]
struct SectionRequest {
    index: usize,
}

/// Body for the multi-choice toggle endpoint.
#[derive(Debug, Deserialize)]
struct ToggleRequest {
    member: String,
}

/// Build the wizard REST + WS routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws/progress", get(ws_handler))
        .route("/api/wizard/status", get(get_status))
        .route("/api/wizard/progress", get(get_progress))
        .route("/api/wizard/advance", post(advance))
        .route("/api/wizard/retreat", post(retreat))
        .route("/api/wizard/steps/{step}/form", get(get_form))
        .route("/api/wizard/steps/{step}/fields/{field}", post(set_field))
        .route(
            "/api/wizard/steps/{step}/fields/{field}/toggle",
            post(toggle_member),
        )
        .route("/api/wizard/steps/{step}/section", post(jump_section))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "onboarding-wizard"
    }))
}

// ── Navigation ──────────────────────────────────────────────────────────

/// POST /api/wizard/advance
async fn advance(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.controller.advance().await)
}

/// POST /api/wizard/retreat
async fn retreat(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.controller.retreat().await)
}

/// GET /api/wizard/status
async fn get_status(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.controller.status().await)
}

/// GET /api/wizard/progress
async fn get_progress(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.controller.get_progress().await)
}

// ── Forms ───────────────────────────────────────────────────────────────

/// GET /api/wizard/steps/{step}/form
async fn get_form(
    State(state): State<WizardRouteState>,
    Path(step): Path<String>,
) -> Response {
    match state.controller.form_snapshot(&step).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => form_error_response(e),
    }
}

/// POST /api/wizard/steps/{step}/fields/{field}
async fn set_field(
    State(state): State<WizardRouteState>,
    Path((step, field)): Path<(String, String)>,
    Json(value): Json<FieldValue>,
) -> Response {
    match state.controller.set_field(&step, &field, value).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => form_error_response(e),
    }
}

/// POST /api/wizard/steps/{step}/fields/{field}/toggle
async fn toggle_member(
    State(state): State<WizardRouteState>,
    Path((step, field)): Path<(String, String)>,
    Json(request): Json<ToggleRequest>,
) -> Response {
    match state
        .controller
        .toggle_member(&step, &field, &request.member)
        .await
    {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => form_error_response(e),
    }
}

/// POST /api/wizard/steps/{step}/section
async fn jump_section(
    State(state): State<WizardRouteState>,
    Path(step): Path<String>,
    Json(request): Json<SectionRequest>,
) -> Response {
    match state.controller.jump_to_section(&step, request.index).await {
        Ok(index) => Json(serde_json::json!({ "current_section": index })).into_response(),
        Err(e) => form_error_response(e),
    }
}

/// Map a form error to its HTTP shape. Unknown keys are 404; a value that
/// contradicts the validated configuration is 422.
fn form_error_response(error: Error) -> Response {
    let status = match &error {
        Error::Form(FormError::UnknownStep(_))
        | Error::Form(FormError::NoForm(_))
        | Error::Form(FormError::UnknownField(_)) => StatusCode::NOT_FOUND,
        Error::Form(FormError::InvalidOption { .. })
        | Error::Form(FormError::TypeMismatch { .. })
        | Error::Form(FormError::SectionOutOfRange { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(%error, "Form request rejected");
    (status, Json(serde_json::json!({ "error": error.to_string() }))).into_response()
}

// ── WebSocket ───────────────────────────────────────────────────────────

/// GET /ws/progress
///
/// Pushes a `ProgressEvent` on connect and after every index change.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WizardRouteState>,
) -> impl IntoResponse {
    info!("Progress subscriber connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.controller))
}

async fn handle_socket(mut socket: WebSocket, controller: Arc<WizardController>) {
    let mut index_rx = controller.subscribe_index();

    // Initial snapshot on connect
    if send_progress(&mut socket, &controller).await.is_err() {
        warn!("Failed to send initial progress, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            changed = index_rx.changed() => {
                if changed.is_err() {
                    debug!("Index channel closed");
                    break;
                }
                if send_progress(&mut socket, &controller).await.is_err() {
                    debug!("Client disconnected during send");
                    break;
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Progress subscriber disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    // The stream is one-way; client text is ignored.
                    _ => {}
                }
            }
        }
    }
}

async fn send_progress(
    socket: &mut WebSocket,
    controller: &WizardController,
) -> Result<(), axum::Error> {
    let index = *controller.subscribe_index().borrow();
    let event = ProgressEvent {
        index,
        progress: controller.get_progress().await,
    };
    match serde_json::to_string(&event) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!(error = %e, "Failed to serialize progress event");
            Ok(())
        }
    }
}
