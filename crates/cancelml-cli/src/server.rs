//! Stateless HTTP prediction service.
//!
//! The model is loaded once at startup and held immutably behind an
//! `Arc`; request handlers only read it. A missing model degrades to 500
//! responses instead of refusing to start, matching the batch pipeline's
//! contract that serving never crashes on absent artifacts.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use maud::{html, Markup, DOCTYPE};
use ndarray::Array2;
use serde_json::{json, Value};

use cancelml::models::GbdtClassifier;

/// The ten input fields, in the exact order the model expects them.
const FEATURE_FIELDS: [(&str, FieldKind); 10] = [
    ("lead_time", FieldKind::Int),
    ("no_of_special_request", FieldKind::Int),
    ("avg_price_per_room", FieldKind::Float),
    ("arrival_month", FieldKind::Int),
    ("arrival_date", FieldKind::Int),
    ("market_segment_type", FieldKind::Int),
    ("no_of_week_nights", FieldKind::Int),
    ("no_of_weekend_nights", FieldKind::Int),
    ("type_of_meal_plan", FieldKind::Int),
    ("room_type_reserved", FieldKind::Int),
];

#[derive(Clone, Copy)]
enum FieldKind {
    Int,
    Float,
}

/// Shared, read-only service state.
#[derive(Clone)]
pub struct AppState {
    model: Option<Arc<GbdtClassifier>>,
    frontend_dist: PathBuf,
}

impl AppState {
    pub fn new(model: Option<GbdtClassifier>, frontend_dist: PathBuf) -> Self {
        AppState {
            model: model.map(Arc::new),
            frontend_dist,
        }
    }

    /// Load the model if the file exists and parses; otherwise keep
    /// serving with no model rather than failing startup.
    pub fn load(model_path: &Path, frontend_dist: PathBuf) -> Self {
        let model = if model_path.exists() {
            match GbdtClassifier::load(model_path) {
                Ok(model) => {
                    log::info!("loaded model from {}", model_path.display());
                    Some(model)
                }
                Err(e) => {
                    log::warn!("failed to load model: {}", e);
                    None
                }
            }
        } else {
            log::warn!("model file {} does not exist", model_path.display());
            None
        };
        AppState::new(model, frontend_dist)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict", post(api_predict))
        .route("/", get(index_get).post(index_post))
        .fallback(static_or_index)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("prediction service listening on {}", bind_addr);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

async fn api_predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Some(model) = state.model.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Model not loaded"})),
        );
    };

    let payload = match payload {
        Ok(Json(Value::Object(map))) => map,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "JSON body required"})),
            )
        }
    };

    let features = match features_from_json(&payload) {
        Ok(features) => features,
        Err(msg) => return (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))),
    };

    match predict_one(model, &features) {
        Ok(prediction) => (StatusCode::OK, Json(json!({"prediction": prediction}))),
        Err(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": msg})),
        ),
    }
}

fn features_from_json(payload: &serde_json::Map<String, Value>) -> Result<Vec<f64>, String> {
    let mut features = Vec::with_capacity(FEATURE_FIELDS.len());
    for (name, kind) in FEATURE_FIELDS {
        let value = payload
            .get(name)
            .ok_or_else(|| format!("Missing field: {}", name))?;
        features.push(coerce_json_value(value, kind, name)?);
    }
    Ok(features)
}

/// Accept JSON numbers and numeric strings; everything else is a client
/// error naming the offending field. Fractional numbers in integer
/// fields truncate toward zero.
fn coerce_json_value(value: &Value, kind: FieldKind, name: &str) -> Result<f64, String> {
    match (value, kind) {
        (Value::Number(n), FieldKind::Float) => n
            .as_f64()
            .ok_or_else(|| format!("Invalid value for field: {}", name)),
        (Value::Number(n), FieldKind::Int) => n
            .as_f64()
            .map(|v| v.trunc())
            .ok_or_else(|| format!("Invalid value for field: {}", name)),
        (Value::String(s), kind) => coerce_str(s, kind, name),
        _ => Err(format!("Invalid value for field: {}", name)),
    }
}

fn coerce_str(s: &str, kind: FieldKind, name: &str) -> Result<f64, String> {
    match kind {
        FieldKind::Int => s
            .trim()
            .parse::<i64>()
            .map(|v| v as f64)
            .map_err(|_| format!("Invalid value for field: {}", name)),
        FieldKind::Float => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid value for field: {}", name)),
    }
}

fn predict_one(model: &GbdtClassifier, features: &[f64]) -> Result<i64, String> {
    let x = Array2::from_shape_vec((1, features.len()), features.to_vec())
        .map_err(|e| e.to_string())?;
    let preds = model.predict(&x).map_err(|e| e.to_string())?;
    Ok(preds[0])
}

// ---------------------------------------------------------------------------
// Frontend: static SPA when built, server-rendered form otherwise
// ---------------------------------------------------------------------------

async fn index_get(State(state): State<AppState>) -> Response {
    if state.frontend_dist.is_dir() {
        return serve_static(&state.frontend_dist, "");
    }
    Html(form_page(None, None).into_string()).into_response()
}

async fn index_post(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    if state.frontend_dist.is_dir() {
        return serve_static(&state.frontend_dist, "");
    }

    let features = match features_from_form(&fields) {
        Ok(features) => features,
        Err(msg) => return Html(form_page(None, Some(&msg)).into_string()).into_response(),
    };

    let Some(model) = state.model.as_ref() else {
        return Html(form_page(None, Some("Model not available")).into_string()).into_response();
    };

    match predict_one(model, &features) {
        Ok(prediction) => Html(form_page(Some(prediction), None).into_string()).into_response(),
        Err(msg) => Html(form_page(None, Some(&msg)).into_string()).into_response(),
    }
}

fn features_from_form(fields: &HashMap<String, String>) -> Result<Vec<f64>, String> {
    let mut features = Vec::with_capacity(FEATURE_FIELDS.len());
    for (name, kind) in FEATURE_FIELDS {
        let raw = fields
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("Missing field: {}", name))?;
        features.push(coerce_str(raw, kind, name)?);
    }
    Ok(features)
}

/// Catch-all: serve the built SPA asset when present, else the SPA entry
/// document, else the fallback form.
async fn static_or_index(State(state): State<AppState>, uri: Uri) -> Response {
    if state.frontend_dist.is_dir() {
        return serve_static(&state.frontend_dist, uri.path().trim_start_matches('/'));
    }
    Html(form_page(None, None).into_string()).into_response()
}

fn serve_static(dist: &Path, rel_path: &str) -> Response {
    // Reject traversal components rather than resolving them.
    let safe = !rel_path.split('/').any(|c| c == "..");
    let candidate = dist.join(rel_path);
    if safe && !rel_path.is_empty() && candidate.is_file() {
        return serve_file(&candidate);
    }
    let index = dist.join("index.html");
    if index.is_file() {
        return serve_file(&index);
    }
    (StatusCode::NOT_FOUND, "frontend entry document missing").into_response()
}

fn serve_file(path: &Path) -> Response {
    match std::fs::read(path) {
        Ok(bytes) => {
            let content_type = content_type_for(path);
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(e) => {
            log::error!("failed to read static file {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to read asset").into_response()
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn form_page(prediction: Option<i64>, error: Option<&str>) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Booking cancellation predictor" }
                style {
                    "body{font-family:sans-serif;max-width:40em;margin:2em auto;}"
                    "label{display:block;margin-top:0.6em;}"
                    ".error{color:#b00;}"
                    ".result{font-size:1.2em;margin-top:1em;}"
                }
            }
            body {
                h1 { "Booking cancellation predictor" }
                @if let Some(msg) = error {
                    p class="error" { (msg) }
                }
                @if let Some(p) = prediction {
                    p class="result" {
                        @if p == 1 { "Prediction: 1 (booking likely to be honored)" }
                        @else { "Prediction: 0 (booking likely to be canceled)" }
                    }
                }
                form method="post" action="/" {
                    @for (name, _) in FEATURE_FIELDS {
                        label for=(name) { (name) }
                        input type="text" id=(name) name=(name);
                    }
                    p { button type="submit" { "Predict" } }
                }
            }
        }
    }
}
