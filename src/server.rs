//! HTTP surface
//!
//! One editing endpoint plus a health check. The handler is pure
//! orchestration: normalize and parse the score, slice the requested
//! measure range, prompt the model, apply up to two candidate plans, and
//! return both results.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::llm::{build_prompt, extract_candidates, Candidate, LlmClient};
use crate::plan::{apply_plan, UnknownActionPolicy};
use crate::score::{fix_steps, parse_score, write_score, GlobalInfo, Score, ScoreParseError};

/// Shared per-process state: the configured model client and plan policy.
pub struct AppState {
    pub llm: LlmClient,
    pub unknown_action_policy: UnknownActionPolicy,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<AppState, crate::llm::LlmError> {
        Ok(AppState {
            llm: LlmClient::new(config.llm.clone())?,
            unknown_action_policy: config.unknown_action_policy,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/llama3", post(edit_handler))
        .with_state(state)
}

async fn home() -> &'static str {
    "score-edit-server is running."
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub xml: String,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub options: [String; 2],
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Score(#[from] ScoreParseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": self.to_string()})),
        )
            .into_response()
    }
}

static MEASURE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"measures?\s+(\d+)\s*[-–]\s*(\d+)").expect("measure range pattern"));

/// Pull an explicit `measures N-M` range out of the instruction text.
pub fn measure_range(instruction: &str) -> Option<(u32, u32)> {
    let captures = MEASURE_RANGE.captures(instruction)?;
    let start = captures.get(1)?.as_str().parse().ok()?;
    let end = captures.get(2)?.as_str().parse().ok()?;
    Some((start, end))
}

async fn edit_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    let xml = fix_steps(&request.xml);
    let score = parse_score(&xml)?;

    let (start, end) =
        measure_range(&request.prompt).unwrap_or((1, score.measure_count() as u32));
    let snippet = score.slice_measures(start, end);
    info!(
        start,
        end,
        measures = snippet.measure_count(),
        "editing measure range"
    );

    let global_info = GlobalInfo::from_score(&snippet);
    let snippet_xml = write_score(&snippet);
    let prompt = build_prompt(&request.prompt, &global_info, &snippet_xml);

    let raw = match state.llm.complete_json(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "completion call failed, returning no edits");
            String::new()
        }
    };
    let candidates = extract_candidates(&raw);
    if candidates.len() != 2 {
        warn!(count = candidates.len(), "model did not return exactly two candidates");
    }

    let options = [
        apply_candidate(candidates.first(), &snippet, state.unknown_action_policy, 1),
        apply_candidate(candidates.get(1), &snippet, state.unknown_action_policy, 2),
    ];
    Ok(Json(EditResponse { options }))
}

/// Apply one candidate to a fresh copy of the snippet. Every failure mode
/// collapses to an empty string for that slot; the cause goes to the log.
fn apply_candidate(
    candidate: Option<&Candidate>,
    snippet: &Score,
    policy: UnknownActionPolicy,
    slot: usize,
) -> String {
    match candidate {
        None => String::new(),
        Some(Candidate::Invalid(e)) => {
            warn!(slot, error = %e, "candidate failed validation");
            String::new()
        }
        Some(Candidate::Plan(plan)) => {
            let mut working = snippet.clone();
            working.movement_title = Some(format!("Modified Melody - Option {}", slot));
            match apply_plan(plan, working, policy) {
                Ok(edited) => write_score(&edited),
                Err(e) => {
                    error!(slot, action = %plan.action, error = %e, "plan application failed");
                    String::new()
                }
            }
        }
    }
}
