use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use crate::{
    app_state::{AppState, ChatAvailability},
    chat,
    error::ApiError,
    llm::ChatError,
    models::{ChatRequest, ChatResponse, HealthResponse, Lead, LeadResponse},
};

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/leads", post(lead_handler))
        .route("/chat", post(chat_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "API do Chatbot está funcionando!",
    })
}

#[axum::debug_handler]
async fn lead_handler(
    State(state): State<AppState>,
    Json(lead): Json<Lead>,
) -> Result<Json<LeadResponse>, ApiError> {
    info!("✅ Nuevo lead recibido: nombre='{}', email='{}'", lead.name, lead.email);

    if let Err(e) = state.leads.append(&lead).await {
        error!("❌ Error al guardar el lead: {}", e);
        return Err(ApiError::LeadNotSaved);
    }

    Ok(Json(LeadResponse {
        status: "success",
        message: "Lead recebido com sucesso!",
    }))
}

#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (session, knowledge) = match &state.chat {
        ChatAvailability::Ready { session, knowledge } => (session, knowledge),
        ChatAvailability::Degraded { .. } => return Err(ApiError::ChatUnavailable),
    };

    if payload.message.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    match chat::answer(
        session.as_ref(),
        knowledge,
        &payload.message,
        state.chat_timeout,
    )
    .await
    {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(e @ ChatError::Timeout(_)) => {
            error!("Tiempo agotado esperando la respuesta de Gemini: {}", e);
            Err(ApiError::ChatTimeout)
        }
        Err(e) => {
            error!("Error al generar la respuesta de Gemini: {}", e);
            Err(ApiError::ChatFailed)
        }
    }
}
