//! Persistencia de leads en un fichero de texto de sólo anexado.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::models::Lead;

#[derive(Debug, Error)]
#[error("no se pudo escribir el lead en '{path}': {source}")]
pub struct LeadError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

/// Fichero de leads. No hay bloqueo a nivel de aplicación: cada lead se
/// escribe con una única llamada en modo append.
#[derive(Debug, Clone)]
pub struct LeadStore {
    path: PathBuf,
}

impl LeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Añade una línea `Nome: <name>, Email: <email>` al final del fichero,
    /// creándolo si no existe.
    pub async fn append(&self, lead: &Lead) -> Result<(), LeadError> {
        let line = format_lead_line(lead);
        self.write_line(&line).await.map_err(|source| LeadError {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

fn format_lead_line(lead: &Lead) -> String {
    format!("Nome: {}, Email: {}\n", lead.name, lead.email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead(name: &str, email: &str) -> Lead {
        serde_json::from_value(json!({ "name": name, "email": email })).unwrap()
    }

    #[test]
    fn line_format_matches_leads_file() {
        assert_eq!(
            format_lead_line(&lead("Ana", "ana@example.com")),
            "Nome: Ana, Email: ana@example.com\n"
        );
    }

    #[tokio::test]
    async fn appends_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.txt");
        std::fs::write(&path, "Nome: Previo, Email: previo@example.com\n").unwrap();

        let store = LeadStore::new(&path);
        store.append(&lead("Ana", "ana@example.com")).await.unwrap();
        store.append(&lead("Bruno", "bruno@example.com")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Nome: Previo, Email: previo@example.com\n\
             Nome: Ana, Email: ana@example.com\n\
             Nome: Bruno, Email: bruno@example.com\n"
        );
    }

    #[tokio::test]
    async fn io_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // Un directorio en lugar de un fichero: no se puede abrir para escribir.
        let store = LeadStore::new(dir.path());
        let err = store.append(&lead("Ana", "ana@example.com")).await.unwrap_err();
        assert!(err.to_string().contains("no se pudo escribir el lead"));
    }
}
