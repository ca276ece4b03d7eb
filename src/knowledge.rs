//! Carga de la base de conocimiento: un único fichero de texto que se
//! interpola tal cual en cada prompt.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("no se pudo leer la base de conocimiento en '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("la base de conocimiento en '{path}' está vacía")]
    Empty { path: PathBuf },
}

/// Lee el fichero completo, sin parsear ni trocear.
/// Un fichero vacío se trata igual que uno ausente.
pub async fn load_knowledge(path: &Path) -> Result<String, KnowledgeError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| KnowledgeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    if text.is_empty() {
        return Err(KnowledgeError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(text)
}
