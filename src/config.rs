//! Carga y gestión de configuración de la aplicación (servidor, Gemini, ficheros).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_KNOWLEDGE_FILE: &str = "dados.txt";
const DEFAULT_LEADS_FILE: &str = "leads.txt";
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "https://seu-dominio-na-vercel.app",
    "http://localhost:3000",
    "http://127.0.0.1:5500",
];

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub knowledge_file: PathBuf,
    pub leads_file: PathBuf,

    /// Ausente no es un error: el chat arranca en modo degradado.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub chat_timeout: Duration,

    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo de una función arbitraria.
    /// Permite probar la configuración sin tocar el entorno del proceso.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr =
            lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
        let knowledge_file = lookup("KNOWLEDGE_FILE")
            .unwrap_or_else(|| DEFAULT_KNOWLEDGE_FILE.to_string())
            .into();
        let leads_file = lookup("LEADS_FILE")
            .unwrap_or_else(|| DEFAULT_LEADS_FILE.to_string())
            .into();

        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        let gemini_model = lookup("GEMINI_MODEL")
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let chat_timeout = match lookup("CHAT_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("CHAT_TIMEOUT_SECS no es un número válido: {raw}"))?;
                if secs == 0 {
                    return Err(anyhow!("CHAT_TIMEOUT_SECS debe ser mayor que cero"));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECS),
        };

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            server_addr,
            knowledge_file,
            leads_file,
            gemini_api_key,
            gemini_model,
            chat_timeout,
            cors_origins,
        })
    }
}
