use std::fmt::Write;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::game::MetricsSnapshot;
use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let body = render_metrics(&state.game.metrics().snapshot());
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
}

/// Prometheus text exposition of the game counters.
fn render_metrics(snapshot: &MetricsSnapshot) -> String {
    let counters: [(&str, &str, u64); 6] = [
        ("skyhunt_prompts_issued_total", "Prompts handed out to players", snapshot.prompts_issued),
        (
            "skyhunt_prompts_rate_limited_total",
            "Prompt requests refused by the cooldown",
            snapshot.prompts_rate_limited,
        ),
        (
            "skyhunt_submissions_valid_total",
            "Photo submissions that matched their prompt",
            snapshot.submissions_valid,
        ),
        (
            "skyhunt_submissions_invalid_total",
            "Photo submissions that did not match their prompt",
            snapshot.submissions_invalid,
        ),
        ("skyhunt_points_awarded_total", "Points awarded across all players", snapshot.points_awarded),
        (
            "skyhunt_upstream_failures_total",
            "Failed calls to the AI upstream",
            snapshot.upstream_failures,
        ),
    ];

    let mut body = format!(
        "# HELP skyhunt_info Build information\n\
         # TYPE skyhunt_info gauge\n\
         skyhunt_info{{version=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION")
    );
    for (name, help, value) in counters {
        let _ = write!(body, "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n");
    }
    body
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}
