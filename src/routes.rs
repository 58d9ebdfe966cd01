use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::envelope::{decode_object_notification, decode_payload};
use crate::error::StageResult;
use crate::pipeline::{StageOutcome, TranslationResult, TranslationTask};
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Stage triggers
        .route("/events/object", post(object_event))
        .route("/events/translate", post(translate_event))
        .route("/events/result", post(result_event))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "transport": state.settings.transport.to_string(),
        "targets": state.settings.to_lang,
    }))
}

async fn object_event(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let result = match decode_object_notification(&body) {
        Ok(event) => state.pipeline.ingest(event).await,
        Err(e) => Err(e),
    };
    completion("ingest", result)
}

async fn translate_event(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let result = match decode_payload::<TranslationTask>(&body) {
        Ok(task) => state.pipeline.translate(task).await,
        Err(e) => Err(e),
    };
    completion("translate", result)
}

async fn result_event(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let result = match decode_payload::<TranslationResult>(&body) {
        Ok(result) => state.pipeline.save(result).await,
        Err(e) => Err(e),
    };
    completion("save", result)
}

/// 2xx acknowledges the delivery; anything else asks the platform to redeliver
fn completion(stage: &str, result: StageResult<StageOutcome>) -> Response {
    match result {
        Ok(outcome) => {
            debug!("{} completed: {:?}", stage, outcome);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            let status = if e.is_permanent() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            warn!("{} failed ({}): {}", stage, status, e);
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
