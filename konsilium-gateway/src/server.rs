use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::orchestrator::Consultation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub specialist: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ConsultResponse {
    pub consultation_id: Uuid,
    #[serde(flatten)]
    pub consultation: Consultation,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: ModelHealth,
    pub index: IndexHealth,
}

#[derive(Debug, Serialize)]
pub struct ModelHealth {
    pub name: String,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct IndexHealth {
    pub reachable: bool,
    pub total_segments: i64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Run the HTTP server.
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the router with all routes.
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ask/{specialist}", post(ask_handler))
        .route("/consult", post(consult_handler))
        .route("/consultations/{id}", get(consultation_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Health handler: reports reachability of the generation provider and the
/// guideline index. Always 200; degradation is data, not an error.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_reachable = match state.provider.health().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Generation provider unreachable: {e}");
            false
        }
    };

    let (index_reachable, total_segments) = match state.knowledge.stats().await {
        Ok(stats) => (true, stats.total_segments),
        Err(e) => {
            warn!("Guideline index unavailable: {e}");
            (false, 0)
        }
    };

    let status = if model_reachable && index_reachable {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: ModelHealth {
            name: state.provider.model().to_string(),
            reachable: model_reachable,
        },
        index: IndexHealth {
            reachable: index_reachable,
            total_segments,
        },
    })
}

/// Single-specialist question handler - POST /ask/{specialist}
async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Path(specialist): Path<String>,
    Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
    let Some(agent) = state.specialist(&specialist) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown specialist: {specialist}"),
            }),
        )
            .into_response();
    };

    info!("Received question for {}", agent.display_name());
    let answer = agent.answer(&request.question).await;
    Json(AnswerResponse { specialist, answer }).into_response()
}

/// Full consultation handler - POST /consult
async fn consult_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
    if request.question.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Please provide a question.".to_string(),
            }),
        )
            .into_response();
    }

    let id = state.consultations.begin(&request.question).await;
    state
        .consultations
        .append(
            id,
            format!(
                "consultation started, querying {} specialists",
                state.specialists.len()
            ),
        )
        .await;

    let consultation = state.orchestrator.consult(&request.question).await;

    for report in &consultation.reports {
        state
            .consultations
            .append(id, format!("{} settled", report.display_name))
            .await;
    }
    state
        .consultations
        .append(id, format!("finished with status {:?}", consultation.status))
        .await;
    state.consultations.finish(id, consultation.clone()).await;

    Json(ConsultResponse {
        consultation_id: id,
        consultation,
    })
    .into_response()
}

/// Consultation record lookup - GET /consultations/{id}
async fn consultation_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid consultation id: {id}"),
            }),
        )
            .into_response();
    };

    match state.consultations.get(id).await {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown consultation: {id}"),
            }),
        )
            .into_response(),
    }
}
