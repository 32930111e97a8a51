//! Mentor prompt construction for the `generateContent` endpoint.
//!
//! # Responsibility
//! - Compose the persona instruction, recent-note context and the note or
//!   chat transcript into an ordered list of turns.
//! - Carry the fixed generation settings for feedback and chat.
//!
//! # Invariants
//! - Turn 1 is always the persona (role `user`), turn 2 the priming
//!   acknowledgment (role `model`). The endpoint has no system-role channel.
//! - Feedback requests have exactly three turns.
//! - Chat requests embed at most `CHAT_HISTORY_WINDOW` trailing messages.

use crate::model::chat::{ChatMessage, ChatRole};
use crate::model::note::Note;
use serde::{Deserialize, Serialize};

/// Characters of note content kept per recent-note summary.
pub const RECENT_NOTE_PREVIEW_CHARS: usize = 200;
/// Trailing chat messages sent with each chat request.
pub const CHAT_HISTORY_WINDOW: usize = 10;

pub const MENTOR_PERSONA: &str = "Você é um mentor sênior de desenvolvimento de jogos, \
experiente em Unity, Unreal Engine, Blender e design de jogos. Seu papel é orientar \
um estudante que registra notas técnicas curtas sobre o que estuda, implementa, erra, \
decide e planeja. Seja direto, prático e encorajador. Responda sempre em português do \
Brasil. Prefira passos concretos a teoria longa e aponte riscos técnicos quando existirem.";

pub const FEEDBACK_FORMAT: &str = "Ao analisar uma nota, responda EXATAMENTE neste formato:\n\n\
**1. Diagnóstico Rápido**\n(uma ou duas frases sobre o estado atual do aprendizado)\n\n\
**2. Problema Central**\n(o ponto mais importante a resolver ou entender)\n\n\
**3. Direção Recomendada**\n(o caminho sugerido, com justificativa curta)\n\n\
**4. Próximo Passo Imediato**\n(uma ação concreta para fazer hoje)";

pub const PERSONA_ACK: &str =
    "Entendido. Estou pronto para atuar como seu mentor de desenvolvimento de jogos.";

/// Author of a request turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl From<ChatRole> for TurnRole {
    fn from(value: ChatRole) -> Self {
        match value {
            ChatRole::User => Self::User,
            ChatRole::Assistant => Self::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of all parts.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    pub fn feedback() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }

    pub fn chat() -> Self {
        Self {
            temperature: 0.8,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// Builds the one-shot feedback request for `note`.
pub fn build_feedback_request(note: &Note, recent_notes: &[Note]) -> GenerateRequest {
    let persona = format!("{MENTOR_PERSONA}\n\n{FEEDBACK_FORMAT}");
    let mut contents = primed_turns(&persona, recent_notes);
    contents.push(Content::text(TurnRole::User, describe_note(note)));
    GenerateRequest {
        contents,
        generation_config: GenerationConfig::feedback(),
    }
}

/// Builds a chat request from the running transcript.
pub fn build_chat_request(history: &[ChatMessage], recent_notes: &[Note]) -> GenerateRequest {
    let mut contents = primed_turns(MENTOR_PERSONA, recent_notes);
    let start = history.len().saturating_sub(CHAT_HISTORY_WINDOW);
    contents.extend(
        history[start..]
            .iter()
            .map(|message| Content::text(message.role.into(), message.content.as_str())),
    );
    GenerateRequest {
        contents,
        generation_config: GenerationConfig::chat(),
    }
}

/// Context block listing recent notes, or `None` when there are none.
pub fn recent_notes_context(recent_notes: &[Note]) -> Option<String> {
    if recent_notes.is_empty() {
        return None;
    }
    let lines = recent_notes
        .iter()
        .map(|note| {
            format!(
                "- [{}] {}: {}\n  {}",
                note.note_type,
                note.category,
                note.title,
                truncate_preview(&note.content, RECENT_NOTE_PREVIEW_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!(
        "Contexto: notas recentes do estudante (use para entender a trajetória dele):\n{lines}"
    ))
}

/// Truncates to `max_chars` characters, appending `...` when cut.
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut truncated = trimmed.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

fn primed_turns(persona: &str, recent_notes: &[Note]) -> Vec<Content> {
    let instruction = match recent_notes_context(recent_notes) {
        Some(context) => format!("{persona}\n\n{context}"),
        None => persona.to_string(),
    };
    vec![
        Content::text(TurnRole::User, instruction),
        Content::text(TurnRole::Model, PERSONA_ACK),
    ]
}

fn describe_note(note: &Note) -> String {
    let tags = if note.tags.is_empty() {
        "nenhuma".to_string()
    } else {
        note.tags.join(", ")
    };
    format!(
        "Analise a nota abaixo.\n\n\
         Categoria: {}\n\
         Tipo: {}\n\
         Título: {}\n\
         Conteúdo:\n{}\n\n\
         Tags: {tags}",
        note.category, note.note_type, note.title, note.content
    )
}

#[cfg(test)]
mod tests {
    use super::{truncate_preview, GenerateRequest, GenerationConfig};

    #[test]
    fn truncate_preview_marks_cut_content() {
        assert_eq!(truncate_preview("short", 200), "short");
        let long = "é".repeat(250);
        let cut = truncate_preview(&long, 200);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn generation_config_serializes_in_camel_case() {
        let request = GenerateRequest {
            contents: Vec::new(),
            generation_config: GenerationConfig::feedback(),
        };
        let value = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(value["generationConfig"]["temperature"], 0.7);
    }
}
