use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::{
    config::AppConfig,
    knowledge,
    leads::LeadStore,
    llm::{self, ChatSession},
};

/// Contexto compartido por todos los handlers. Se construye una vez antes de
/// aceptar peticiones y después sólo se lee.
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatAvailability,
    pub chat_timeout: Duration,
    pub leads: LeadStore,
}

/// Estado del chatbot: o están la sesión y la base de conocimiento, o el
/// servicio está degradado. No hay disponibilidad parcial.
#[derive(Clone)]
pub enum ChatAvailability {
    Ready {
        session: Arc<dyn ChatSession>,
        knowledge: Arc<str>,
    },
    Degraded {
        reason: String,
    },
}

impl ChatAvailability {
    pub fn from_parts(
        session: Result<Arc<dyn ChatSession>, String>,
        knowledge: Result<String, String>,
    ) -> Self {
        match (session, knowledge) {
            (Ok(session), Ok(knowledge)) => Self::Ready {
                session,
                knowledge: knowledge.into(),
            },
            (session, knowledge) => {
                let reason = [session.err(), knowledge.err()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join("; ");
                Self::Degraded { reason }
            }
        }
    }
}

impl AppState {
    /// Carga la base de conocimiento y abre la sesión de chat. Los fallos se
    /// registran y dejan el chat en modo degradado; nunca abortan el arranque.
    pub async fn initialize(cfg: &AppConfig) -> Self {
        info!("Iniciando el chatbot...");

        let knowledge = knowledge::load_knowledge(&cfg.knowledge_file)
            .await
            .map_err(|e| {
                error!("❌ {e}");
                e.to_string()
            });

        let session = llm::open_session(cfg)
            .map(|s| Arc::new(s) as Arc<dyn ChatSession>)
            .map_err(|e| {
                error!("❌ {e}");
                e.to_string()
            });

        let chat = ChatAvailability::from_parts(session, knowledge);
        match &chat {
            ChatAvailability::Ready { .. } => {
                info!("✅ Chatbot Gemini ({}) inicializado", cfg.gemini_model)
            }
            ChatAvailability::Degraded { reason } => warn!(
                "El chatbot está funcionando en modo degradado: {reason}. Revisa GEMINI_API_KEY y el fichero de datos."
            ),
        }

        Self {
            chat,
            chat_timeout: cfg.chat_timeout,
            leads: LeadStore::new(&cfg.leads_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatError;
    use async_trait::async_trait;

    fn is_ready(chat: &ChatAvailability) -> bool {
        matches!(chat, ChatAvailability::Ready { .. })
    }

    struct EchoSession;

    #[async_trait]
    impl ChatSession for EchoSession {
        async fn send_message(&self, prompt: &str) -> Result<String, ChatError> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn ready_only_when_both_parts_are_present() {
        let ready = ChatAvailability::from_parts(Ok(Arc::new(EchoSession)), Ok("K".into()));
        assert!(is_ready(&ready));

        let no_key = ChatAvailability::from_parts(Err("sin clave".into()), Ok("K".into()));
        assert!(!is_ready(&no_key));

        let no_data = ChatAvailability::from_parts(Ok(Arc::new(EchoSession)), Err("sin datos".into()));
        assert!(!is_ready(&no_data));
    }

    #[test]
    fn degraded_reason_lists_every_failure() {
        let chat = ChatAvailability::from_parts(Err("sin clave".into()), Err("sin datos".into()));
        match chat {
            ChatAvailability::Degraded { reason } => assert_eq!(reason, "sin clave; sin datos"),
            ChatAvailability::Ready { .. } => panic!("debería estar degradado"),
        }
    }

    #[tokio::test]
    async fn missing_key_and_file_start_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let knowledge = dir.path().join("dados.txt");
        let leads = dir.path().join("leads.txt");
        let cfg = AppConfig::from_lookup(|key| match key {
            "KNOWLEDGE_FILE" => Some(knowledge.display().to_string()),
            "LEADS_FILE" => Some(leads.display().to_string()),
            _ => None,
        })
        .unwrap();

        let state = AppState::initialize(&cfg).await;
        assert!(!is_ready(&state.chat));
        assert_eq!(state.leads.path(), leads.as_path());
    }
}
