// IFSC Workbench - Web Server
// Minimal JSON API over the same validate + lookup + record pipeline the
// console uses. The sink and cache are shared state; every write goes
// through one mutex so the two surfaces cannot interleave rewrites.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use ifsc_workbench::{
    cache::ResultCache,
    directory::{Directory, IfscDirectory},
    sink::{CodeRecord, RecordSink},
};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// The sink shared with the console surface
const OUTPUT_SINK: &str = "output.csv";

/// Shared application state
#[derive(Clone)]
struct AppState {
    directory: Arc<IfscDirectory>,
    cache: Arc<Mutex<ResultCache>>,
    sink: Arc<Mutex<RecordSink>>,
}

/// Body of POST /validate
#[derive(Debug, Deserialize)]
struct ValidateRequest {
    ifsc: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /records - All records currently in the sink
async fn get_records(State(state): State<AppState>) -> impl IntoResponse {
    let records: Vec<CodeRecord> = state.sink.lock().unwrap().records().to_vec();
    Json(records)
}

/// POST /validate - validate one code, enrich it, append it to the sink
async fn validate_code(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Response {
    let Some(code) = request.ifsc else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing required field: ifsc" })),
        )
            .into_response();
    };
    let code = code.trim().to_string();
    info!("POST /validate - code: {}", code);

    let valid = {
        let mut cache = state.cache.lock().unwrap();
        match cache.cached_validity(&code) {
            Some(known) => known,
            None => {
                let valid = state.directory.validate(&code);
                cache.store_validity(&code, valid);
                valid
            }
        }
    };

    if !valid {
        return append_record(&state, CodeRecord::invalid(&code));
    }

    // Check the cache before the remote call and populate it after, so the
    // lock is never held across the await
    let cached = state.cache.lock().unwrap().cached_details(&code);
    let details = match cached {
        Some(details) => details,
        None => match state.directory.fetch_details(&code).await {
            Ok(details) => {
                state
                    .cache
                    .lock()
                    .unwrap()
                    .store_details(&code, details.clone());
                details
            }
            Err(e) => {
                error!("Lookup failed for {}: {}", code, e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "lookup failed", "details": e.to_string() })),
                )
                    .into_response();
            }
        },
    };

    append_record(&state, CodeRecord::valid(&code, &details))
}

/// Append under the sink lock, answering with the stored record
fn append_record(state: &AppState, record: CodeRecord) -> Response {
    match state.sink.lock().unwrap().append(record.clone()) {
        Ok(()) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => {
            error!("Failed to write record for {}: {:#}", record.ifsc, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to write record", "details": e.to_string() })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("🌐 IFSC Workbench - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let sink = match RecordSink::open(Path::new(OUTPUT_SINK)) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("❌ Cannot open the output sink {}: {:#}", OUTPUT_SINK, e);
            std::process::exit(1);
        }
    };
    println!("✓ Sink opened: {} ({} records)", OUTPUT_SINK, sink.records().len());

    let state = AppState {
        directory: Arc::new(IfscDirectory::new()),
        cache: Arc::new(Mutex::new(ResultCache::new())),
        sink: Arc::new(Mutex::new(sink)),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/records", get(get_records))
        .route("/validate", post(validate_code))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   POST http://localhost:3000/validate");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
