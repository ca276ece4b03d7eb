//! Modelos de la API: peticiones, respuestas y validación de los leads.
//!
//! La validación vive en la deserialización (`try_from`), así que un lead
//! inválido lo rechaza el extractor `Json` de axum con 422 antes de llegar
//! al handler.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[\p{L}\p{N}!#$%&'*+/=?^_`{|}~.-]+@[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?(?:\.[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?)+$",
    )
    .expect("la expresión regular de email es válida")
});

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lead {
    pub name: LeadName,
    pub email: Email,
}

/// Nombre libre, no vacío y de una sola línea.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct LeadName(String);

impl TryFrom<String> for LeadName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err("o nome não pode ser vazio".to_string());
        }
        // Una línea por lead en el fichero: sin saltos ni caracteres de control.
        if value.chars().any(char::is_control) {
            return Err("o nome não pode conter quebras de linha".to_string());
        }
        Ok(Self(value))
    }
}

impl fmt::Display for LeadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dirección de email con sintaxis estándar (`local@dominio.tld`). Admite
/// direcciones internacionalizadas; el dominio se guarda en minúsculas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Email(String);

impl TryFrom<String> for Email {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_email(&value) {
            Ok(Self(normalize_domain(&value)))
        } else {
            Err(format!("'{value}' não é um endereço de email válido"))
        }
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_domain(value: &str) -> String {
    match value.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => value.to_string(),
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(value) {
        return false;
    }
    let Some((local, _domain)) = value.rsplit_once('@') else {
        return false;
    };
    local.len() <= MAX_LOCAL_PART_LEN
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
}
