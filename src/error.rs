//! Errores de la API y su traducción a respuestas HTTP `{ "detail": ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error de un handler. Los mensajes son fijos: el detalle interno se
/// registra en el log pero no se devuelve al cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    ChatUnavailable,
    EmptyMessage,
    ChatFailed,
    ChatTimeout,
    LeadNotSaved,
}

impl ApiError {
    pub fn status(self) -> StatusCode {
        match self {
            ApiError::ChatUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::EmptyMessage => StatusCode::BAD_REQUEST,
            ApiError::ChatFailed | ApiError::LeadNotSaved => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ChatTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            ApiError::ChatUnavailable => "Desculpe, o chatbot não está disponível no momento.",
            ApiError::EmptyMessage => "A mensagem não pode ser vazia.",
            ApiError::ChatFailed => "Ocorreu um erro ao processar sua mensagem.",
            ApiError::ChatTimeout => "O chatbot demorou demais para responder. Tente novamente.",
            ApiError::LeadNotSaved => "Falha ao salvar o lead.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
