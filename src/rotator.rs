//! Decorative auto-rotating display.
//!
//! A static entry list republished on a timer, e.g. the motivational-fact
//! carousel shown beside the wizard. Fully separate from navigation: the
//! task never touches wizard state, self-terminates when every receiver is
//! gone, and is abortable when the hosting screen is exited.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default rotation period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

/// Built-in entries for the default wizard.
pub fn default_entries() -> Vec<String> {
    [
        "The first website went live in 1991 and is still online today.",
        "JavaScript was built in 10 days; the web still runs on it.",
        "Most professional developers started as self-taught hobbyists.",
        "You do not need math to build great web applications.",
        "Every expert was once a beginner who refused to quit.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Spawn the rotation task.
///
/// Publishes the active entry on a watch channel, advancing and wrapping
/// every `period`. With fewer than two entries there is nothing to rotate
/// and the task exits immediately; the receiver still holds the first entry.
pub fn spawn_rotation(
    entries: Vec<String>,
    period: Duration,
) -> (watch::Receiver<String>, JoinHandle<()>) {
    let first = entries.first().cloned().unwrap_or_default();
    let (tx, rx) = watch::channel(first);

    let handle = tokio::spawn(async move {
        if entries.len() < 2 {
            return;
        }
        let mut interval = tokio::time::interval(period);
        // The immediate first tick; the initial entry is already published.
        interval.tick().await;
        let mut index = 0usize;
        loop {
            interval.tick().await;
            index = (index + 1) % entries.len();
            if tx.send(entries[index].clone()).is_err() {
                // All receivers dropped; nothing left to display to.
                break;
            }
        }
    });

    (rx, handle)
}

/// Route state for the read-only display surface.
#[derive(Clone)]
pub struct DisplayRouteState {
    pub fact_rx: Arc<watch::Receiver<String>>,
}

/// GET /api/display/fact
///
/// Returns the currently displayed entry.
async fn get_fact(State(state): State<DisplayRouteState>) -> impl IntoResponse {
    let fact = state.fact_rx.borrow().clone();
    Json(serde_json::json!({ "fact": fact }))
}

/// Build the display routes.
pub fn display_routes(fact_rx: watch::Receiver<String>) -> Router {
    Router::new()
        .route("/api/display/fact", get(get_fact))
        .with_state(DisplayRouteState {
            fact_rx: Arc::new(fact_rx),
        })
}
