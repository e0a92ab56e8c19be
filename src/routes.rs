use axum::{
    Form, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use include_dir::{include_dir, Dir};
use parking_lot::RwLock;
use serde::Deserialize;
use std::{sync::Arc, time::Instant};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    generator::{ContentGenerator, GenerateError},
    models::{ErrorBody, FieldId, GenerateRequest, GeneratedRecord, GenerationRequest},
    render,
    workbench::{export_record, ExportFile, Workbench},
};

static ASSETS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets");

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn ContentGenerator>,
    pub workbench: Arc<RwLock<Workbench>>,
}

impl AppState {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator, workbench: Arc::default() }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/copy/:field", post(copy_field))
        .route("/export", get(export_current))
        .route("/api/generate", post(generate_listing).fallback(method_not_allowed))
        .route("/api/export", post(export_listing))
        .route("/assets/*path", get(asset))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            GenerateError::Input => (
                StatusCode::BAD_REQUEST,
                ErrorBody { error: message, message: None },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { error: "Failed to generate content".into(), message: Some(message) },
            ),
        };
        (status, Json(body)).into_response()
    }
}

// --- JSON API ---

pub async fn generate_listing(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GeneratedRecord>, GenerateError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::warn!("⚠️ Rejected generate body: {}", rejection.body_text());
        GenerateError::Input
    })?;
    let request = body
        .subject
        .and_then(GenerationRequest::new)
        .ok_or(GenerateError::Input)?;

    let id = Uuid::new_v4();
    tracing::info!(%id, provider = %state.generator.provider(), "🚀 Generating listing for: {}", request.subject());

    match state.generator.generate(&request).await {
        Ok(record) => {
            tracing::info!(%id, "✅ Listing generated: {}", record.base_name);
            Ok(Json(record))
        }
        Err(e) => {
            tracing::error!(%id, "❌ Listing generation failed: {}", e);
            Err(e)
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody { error: "Method not allowed".into(), message: None }),
    )
        .into_response()
}

pub async fn export_listing(Json(record): Json<GeneratedRecord>) -> Response {
    match export_record(&record) {
        Ok(file) => attachment(file),
        Err(e) => {
            tracing::error!("❌ Export failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn attachment(file: ExportFile) -> Response {
    tracing::info!("📦 Exporting {}", file.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.file_name)),
        ],
        file.contents,
    )
        .into_response()
}

// --- Browser form ---

#[derive(Debug, Deserialize, Default)]
pub struct SubmitForm {
    #[serde(default)]
    pub subject: String,
}

pub async fn show_form(State(state): State<AppState>) -> Html<String> {
    let workbench = state.workbench.read();
    Html(render::page(&workbench, Instant::now()))
}

pub async fn submit_form(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> Redirect {
    let submitted = state.workbench.write().submit(&form.subject);
    match submitted {
        Ok(request) => spawn_generation(&state, request),
        Err(e) => tracing::info!("Submit ignored: {}", e),
    }
    Redirect::to("/")
}

/// Runs one generation off the request path and stores its outcome in the form.
/// A panicking generator still settles the form with an error.
pub fn spawn_generation(state: &AppState, request: GenerationRequest) {
    let generator = state.generator.clone();
    let workbench = state.workbench.clone();
    let id = Uuid::new_v4();
    tracing::info!(%id, provider = %generator.provider(), "🚀 Generating listing for: {}", request.subject());

    let task = tokio::spawn(async move { generator.generate(&request).await });
    tokio::spawn(async move {
        let result = task
            .await
            .unwrap_or_else(|e| Err(GenerateError::Transport(format!("generation task failed: {e}"))));
        if let Err(e) = &result {
            tracing::error!(%id, "❌ Listing generation failed: {}", e);
        }
        workbench.write().complete(result, Utc::now());
    });
}

pub async fn copy_field(Path(field): Path<String>, State(state): State<AppState>) -> Response {
    let Ok(field) = field.parse::<FieldId>() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.workbench.write().copy(field, Instant::now()) {
        Ok(text) => {
            tracing::info!("📋 Copied {} ({} chars)", field, text.chars().count());
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("⚠️ Copy of {} rejected: {}", field, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

pub async fn export_current(State(state): State<AppState>) -> Response {
    let exported = state.workbench.read().export();
    match exported {
        Some(Ok(file)) => attachment(file),
        Some(Err(e)) => {
            tracing::error!("❌ Export failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn asset(Path(path): Path<String>) -> Response {
    let Some(file) = ASSETS.get_file(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let content_type = match file.path().extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        _ => "application/octet-stream",
    };
    ([(header::CONTENT_TYPE, content_type)], file.contents()).into_response()
}
