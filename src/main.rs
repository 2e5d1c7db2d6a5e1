//! Case Intake - multi-strategy identity extraction server for
//! legal-immigration documents (passports and G-28 forms).

mod collab;
mod confidence;
mod config;
mod error;
mod merge;
mod mrz;
mod normalize;
mod pattern;
mod record;
mod reference;
mod session;
mod strategy;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collab::ner::NerSidecar;
use collab::ocr::OcrSidecar;
use collab::pdf_form::AcroFormReader;
use collab::vision::VisionClient;
use collab::{DocumentInput, EntityRecognizer, VisionExtractor};
use config::Policy;
use error::IntakeError;
use record::{CaseRecord, ExtractionMethod};
use session::SessionStore;
use strategy::g28::G28Orchestrator;
use strategy::passport::PassportOrchestrator;
use strategy::validate_extension;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    store: SessionStore,
    passport: Arc<PassportOrchestrator>,
    g28: Arc<G28Orchestrator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "case_intake=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let policy = Policy::from_env();
    info!("Extraction policy: {:?}", policy);

    let http = reqwest::Client::new();
    let ocr = Arc::new(OcrSidecar::new(http.clone()));

    let vision: Option<Arc<dyn VisionExtractor>> = match VisionClient::from_env(http.clone()) {
        Ok(client) => {
            info!("Vision client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("Vision extraction disabled: {}", e);
            None
        }
    };
    let ner: Option<Arc<dyn EntityRecognizer>> = match NerSidecar::from_env(http) {
        Some(sidecar) => Some(Arc::new(sidecar)),
        None => {
            warn!("NER_SIDECAR_URL not set; name recognition fallback disabled");
            None
        }
    };

    let state = AppState {
        store: SessionStore::new(),
        passport: Arc::new(PassportOrchestrator::new(
            vision,
            ocr.clone(),
            ner,
            policy.clone(),
        )),
        g28: Arc::new(G28Orchestrator::new(
            Arc::new(AcroFormReader::new()),
            ocr,
            policy,
        )),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/upload/passport", post(upload_passport))
        .route("/upload/g28", post(upload_g28))
        .route("/session/:session_id", get(get_session))
        .route("/session/:session_id", delete(delete_session))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024)) // 50MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
    info!("Server listening on http://0.0.0.0:8000");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(serde::Deserialize)]
struct UploadQuery {
    session_id: Option<String>,
}

/// Response envelope shared by the upload and retrieval endpoints.
#[derive(serde::Serialize)]
struct ExtractionResponse {
    success: bool,
    message: String,
    session_id: String,
    data: CaseRecord,
}

/// Extract identity fields from an uploaded passport and store them under
/// the session, creating one when no `session_id` was supplied.
async fn upload_passport(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Json<ExtractionResponse>, IntakeError> {
    let input = read_upload(multipart).await?;
    let session_id = query.session_id.unwrap_or_else(SessionStore::new_key);

    let passport = state.passport.extract(&input).await;
    let message = format!("Passport processed ({})", method_label(passport.extraction_method));

    let data = state.store.update(&session_id, |case| {
        case.passport = Some(passport);
    });

    info!(%session_id, "passport upload complete");
    Ok(Json(ExtractionResponse {
        success: true,
        message,
        session_id,
        data,
    }))
}

/// Extract the representative from a G-28 and fold any beneficiary names
/// into the session's passport slot without overwriting existing fields.
async fn upload_g28(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Json<ExtractionResponse>, IntakeError> {
    let input = read_upload(multipart).await?;
    let session_id = query.session_id.unwrap_or_else(SessionStore::new_key);

    let extraction = state.g28.extract(&input).await;
    let message = format!(
        "G-28 processed ({})",
        method_label(extraction.representative.extraction_method)
    );

    let data = state.store.update(&session_id, |case| {
        case.representative = Some(extraction.representative);
        if let Some(beneficiary) = extraction.beneficiary {
            case.passport = Some(merge::merge_beneficiary(case.passport.take(), beneficiary));
        }
    });

    info!(%session_id, "G-28 upload complete");
    Ok(Json(ExtractionResponse {
        success: true,
        message,
        session_id,
        data,
    }))
}

/// Get the reconciled record for a session.
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ExtractionResponse>, IntakeError> {
    let data = state
        .store
        .get(&session_id)
        .ok_or_else(|| IntakeError::SessionNotFound(session_id.clone()))?;

    Ok(Json(ExtractionResponse {
        success: true,
        message: "Session data retrieved".to_string(),
        session_id,
        data,
    }))
}

/// Delete all data held for a session.
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, IntakeError> {
    if state.store.delete(&session_id) {
        info!(%session_id, "session deleted");
        Ok(Json(serde_json::json!({
            "success": true,
            "message": "Session deleted",
        })))
    } else {
        Err(IntakeError::SessionNotFound(session_id))
    }
}

/// Pull the `file` part out of the multipart body and gate on the allowed
/// extensions before any strategy runs.
async fn read_upload(mut multipart: Multipart) -> Result<DocumentInput, IntakeError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IntakeError::Internal(anyhow::anyhow!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("document").to_string();
            validate_extension(&filename)?;
            let data = field
                .bytes()
                .await
                .map_err(|e| IntakeError::Internal(anyhow::anyhow!("Failed to read upload: {}", e)))?
                .to_vec();
            if data.is_empty() {
                return Err(IntakeError::EmptyUpload);
            }
            return Ok(DocumentInput::new(filename, data));
        }
    }
    Err(IntakeError::EmptyUpload)
}

fn method_label(method: Option<ExtractionMethod>) -> &'static str {
    method.map(ExtractionMethod::as_str).unwrap_or("UNKNOWN")
}
