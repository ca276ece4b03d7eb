//! Abstracción sobre Rig para mantener una sesión de chat con Gemini.
//!
//! El resto de la aplicación sólo ve el trait `ChatSession`: enviar un prompt
//! ya compuesto y recibir el texto de respuesta.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rig::agent::Agent;
use rig::completion::{Chat, Message};
use rig::providers::gemini;
use thiserror::Error;
use tracing::debug;

use crate::config::AppConfig;

/// Turnos (pregunta + respuesta) que se reenvían al modelo como contexto.
/// Cada prompt lleva la base de conocimiento completa, así que el historial
/// se mantiene corto para no desbordar la ventana de contexto.
pub const MAX_HISTORY_TURNS: usize = 4;

/// Errores al abrir la sesión durante el arranque.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("falta GEMINI_API_KEY en el entorno")]
    MissingApiKey,
    #[error("no se pudo inicializar el cliente de Gemini: {0}")]
    Init(String),
}

/// Errores de una llamada al modelo remoto.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("error del proveedor LLM: {0}")]
    Remote(String),
    #[error("el proveedor LLM no respondió en {0:?}")]
    Timeout(Duration),
}

/// Sesión conversacional con un modelo remoto.
#[async_trait]
pub trait ChatSession: Send + Sync {
    async fn send_message(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Historial acotado a los últimos `max_turns` turnos.
///
/// El candado sólo se toma para copiar o anotar; nunca durante la llamada
/// remota, así que las peticiones concurrentes no se esperan entre sí.
#[derive(Debug)]
pub struct History<T> {
    turns: Mutex<VecDeque<(T, T)>>,
    max_turns: usize,
}

impl<T: Clone> History<T> {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: Mutex::new(VecDeque::with_capacity(max_turns)),
            max_turns,
        }
    }

    /// Copia de los turnos actuales, aplanados en orden cronológico.
    pub fn snapshot(&self) -> Vec<T> {
        let turns = self.turns.lock().unwrap_or_else(|e| e.into_inner());
        turns
            .iter()
            .flat_map(|(question, reply)| [question.clone(), reply.clone()])
            .collect()
    }

    /// Añade un turno y descarta los más antiguos si se supera el límite.
    pub fn record(&self, question: T, reply: T) -> usize {
        let mut turns = self.turns.lock().unwrap_or_else(|e| e.into_inner());
        if self.max_turns == 0 {
            return 0;
        }
        while turns.len() >= self.max_turns {
            turns.pop_front();
        }
        turns.push_back((question, reply));
        turns.len()
    }
}

/// Sesión de chat de Gemini que conserva un historial corto de la conversación.
pub struct GeminiChatSession {
    agent: Agent<gemini::completion::CompletionModel>,
    history: History<Message>,
}

impl GeminiChatSession {
    pub fn new(api_key: &str, model_name: &str) -> Result<Self, SessionError> {
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| SessionError::Init(e.to_string()))?;
        let client = gemini::client::ClientBuilder::new_with_client(api_key, http_client)
            .build()
            .map_err(|e| SessionError::Init(e.to_string()))?;
        let agent = client.agent(model_name).build();

        Ok(Self {
            agent,
            history: History::new(MAX_HISTORY_TURNS),
        })
    }
}

#[async_trait]
impl ChatSession for GeminiChatSession {
    async fn send_message(&self, prompt: &str) -> Result<String, ChatError> {
        let history = self.history.snapshot();

        let reply = self
            .agent
            .chat(prompt.to_string(), history)
            .await
            .map_err(|e| ChatError::Remote(e.to_string()))?;

        let turns = self
            .history
            .record(Message::user(prompt), Message::assistant(reply.clone()));
        debug!("Turno de chat completado ({turns} turnos en historial)");

        Ok(reply)
    }
}

/// Abre la única sesión de chat del proceso a partir de la configuración.
pub fn open_session(cfg: &AppConfig) -> Result<GeminiChatSession, SessionError> {
    let api_key = cfg
        .gemini_api_key
        .as_deref()
        .ok_or(SessionError::MissingApiKey)?;

    GeminiChatSession::new(api_key, &cfg.gemini_model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn missing_api_key_does_not_open_a_session() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert!(matches!(open_session(&cfg), Err(SessionError::MissingApiKey)));
    }

    #[tokio::test]
    async fn api_key_opens_a_session_without_network() {
        let cfg = AppConfig::from_lookup(|key| match key {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(open_session(&cfg).is_ok());
    }

    #[test]
    fn init_error_mentions_the_cause() {
        let err = SessionError::Init("tls backend unavailable".to_string());
        assert!(err.to_string().contains("tls backend unavailable"));
    }

    #[test]
    fn history_keeps_only_the_latest_turns() {
        let history = History::new(2);
        assert_eq!(history.record("q1", "r1"), 1);
        assert_eq!(history.record("q2", "r2"), 2);
        assert_eq!(history.record("q3", "r3"), 2);

        assert_eq!(history.snapshot(), vec!["q2", "r2", "q3", "r3"]);
    }

    #[test]
    fn zero_turn_history_stays_empty() {
        let history = History::new(0);
        assert_eq!(history.record("q", "r"), 0);
        assert!(history.snapshot().is_empty());
    }

    #[tokio::test]
    async fn snapshots_do_not_block_each_other() {
        let history = Arc::new(History::new(MAX_HISTORY_TURNS));
        history.record("q0".to_string(), "r0".to_string());

        // Dos turnos en vuelo a la vez: ambos leen antes de que ninguno anote.
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let tasks: Vec<_> = (1..=2)
            .map(|i| {
                let history = history.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    let seen = history.snapshot();
                    barrier.wait().await;
                    history.record(format!("q{i}"), format!("r{i}"));
                    seen
                })
            })
            .collect();

        for task in tasks {
            let seen = tokio::time::timeout(Duration::from_secs(1), task)
                .await
                .expect("los turnos concurrentes no deben bloquearse")
                .unwrap();
            assert_eq!(seen, vec!["q0", "r0"]);
        }
        assert_eq!(history.snapshot().len(), 6);
    }
}
