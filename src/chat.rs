//! Respuesta del chatbot anclada a la base de conocimiento.
//!
//! Flujo:
//!   1. Se interpola la base de conocimiento y la pregunta en una plantilla fija.
//!   2. El prompt se envía por la sesión compartida, con un tiempo máximo.
//!   3. Se devuelve el texto de la respuesta sin espacios en los extremos.

use std::time::Duration;

use crate::llm::{ChatError, ChatSession};

const PROMPT_TEMPLATE: &str = r#"
Use o conteúdo abaixo como base para responder a pergunta de forma direta, sem inventar nada que não esteja no texto.

=== BASE DE CONHECIMENTO ===
{base_conhecimento}

=== PERGUNTA ===
{pergunta_usuario}

Responda com base apenas no conteúdo da base acima.
"#;

/// Sustitución literal: sin escapes ni truncado de la base de conocimiento.
pub fn compose_prompt(knowledge: &str, question: &str) -> String {
    // Se divide la plantilla en vez de usar `replace` encadenado para que un
    // marcador dentro de la propia base de conocimiento no se sustituya.
    let (head, rest) = split_once_or_all(PROMPT_TEMPLATE, "{base_conhecimento}");
    let (middle, tail) = split_once_or_all(rest, "{pergunta_usuario}");

    let mut prompt =
        String::with_capacity(PROMPT_TEMPLATE.len() + knowledge.len() + question.len());
    prompt.push_str(head);
    prompt.push_str(knowledge);
    prompt.push_str(middle);
    prompt.push_str(question);
    prompt.push_str(tail);
    prompt
}

fn split_once_or_all<'a>(text: &'a str, marker: &str) -> (&'a str, &'a str) {
    text.split_once(marker).unwrap_or((text, ""))
}

/// Compone el prompt, lo envía y recorta la respuesta.
pub async fn answer(
    session: &dyn ChatSession,
    knowledge: &str,
    question: &str,
    timeout: Duration,
) -> Result<String, ChatError> {
    let prompt = compose_prompt(knowledge, question);

    let reply = tokio::time::timeout(timeout, session.send_message(&prompt))
        .await
        .map_err(|_| ChatError::Timeout(timeout))??;

    Ok(reply.trim().to_string())
}
