//! Note domain model.
//!
//! # Responsibility
//! - Define the note record shared by the editor, dashboard and mentor.
//! - Own title/tag normalization applied before every save.
//!
//! # Invariants
//! - A saved note never has a blank title (`DEFAULT_NOTE_TITLE` is applied).
//! - Tags are trimmed, lowercase, deduplicated and sorted.
//! - Timestamps are Unix epoch milliseconds assigned by storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Title applied when a note is saved without one.
pub const DEFAULT_NOTE_TITLE: &str = "Sem título";

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Engine/tool a note is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteCategory {
    Unity,
    Unreal,
    Blender,
    GameDev,
    Other,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 5] = [
        Self::Unity,
        Self::Unreal,
        Self::Blender,
        Self::GameDev,
        Self::Other,
    ];

    /// Stable label used in storage, prompts and the UI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unity => "Unity",
            Self::Unreal => "Unreal",
            Self::Blender => "Blender",
            Self::GameDev => "GameDev",
            Self::Other => "Other",
        }
    }

    /// Parses a label case-insensitively. Unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = fold_label(value);
        Self::ALL
            .into_iter()
            .find(|category| fold_label(category.as_str()) == normalized)
    }

    /// Parses a label, falling back to `Other`.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

impl Default for NoteCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl Display for NoteCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Learning intent of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    Estudo,
    #[serde(rename = "Implementação")]
    Implementacao,
    Erro,
    #[serde(rename = "Decisão")]
    Decisao,
    Objetivo,
}

impl NoteType {
    pub const ALL: [NoteType; 5] = [
        Self::Estudo,
        Self::Implementacao,
        Self::Erro,
        Self::Decisao,
        Self::Objetivo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Estudo => "Estudo",
            Self::Implementacao => "Implementação",
            Self::Erro => "Erro",
            Self::Decisao => "Decisão",
            Self::Objetivo => "Objetivo",
        }
    }

    /// Parses a label case-insensitively; accented and plain spellings are
    /// both accepted (`Decisão` / `decisao`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = fold_label(value);
        Self::ALL
            .into_iter()
            .find(|kind| fold_label(kind.as_str()) == normalized)
    }

    /// Parses a label, falling back to `Estudo`.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

impl Default for NoteType {
    fn default() -> Self {
        Self::Estudo
    }
}

impl Display for NoteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted note owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Editor input for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub note_type: NoteType,
    pub tags: Vec<String>,
}

impl NoteDraft {
    /// Applies save-time defaults: trimmed title (or the default one) and
    /// normalized tags.
    pub fn normalized(mut self) -> Self {
        self.title = normalize_title(&self.title);
        self.tags = normalize_tags(&self.tags);
        self
    }
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<NoteCategory>,
    pub note_type: Option<NoteType>,
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.note_type.is_none()
            && self.tags.is_none()
    }

    /// Same defaults as [`NoteDraft::normalized`] for the fields present.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|title| normalize_title(&title));
        self.tags = self.tags.map(|tags| normalize_tags(&tags));
        self
    }
}

/// Returns the trimmed title, or [`DEFAULT_NOTE_TITLE`] when blank.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_NOTE_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalizes one tag value. Blank input yields `None`.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim().trim_start_matches('#').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes, deduplicates and sorts tag values.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

/// Splits comma-separated editor input into normalized tags.
pub fn parse_tag_input(raw: &str) -> Vec<String> {
    let parts = raw.split(',').map(str::to_string).collect::<Vec<_>>();
    normalize_tags(&parts)
}

fn fold_label(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_tags, normalize_title, parse_tag_input, NoteCategory, NoteDraft, NoteType,
        DEFAULT_NOTE_TITLE,
    };

    #[test]
    fn blank_title_gets_default() {
        assert_eq!(normalize_title("   "), DEFAULT_NOTE_TITLE);
        assert_eq!(normalize_title("  Shaders "), "Shaders");
    }

    #[test]
    fn tags_are_lowercased_and_deduplicated() {
        let tags = normalize_tags(&[
            "Physics".to_string(),
            "physics".to_string(),
            " #URP ".to_string(),
            "".to_string(),
        ]);
        assert_eq!(tags, vec!["physics".to_string(), "urp".to_string()]);
    }

    #[test]
    fn tag_input_splits_on_commas() {
        assert_eq!(
            parse_tag_input("ai, NavMesh,ai,,"),
            vec!["ai".to_string(), "navmesh".to_string()]
        );
    }

    #[test]
    fn labels_parse_with_and_without_accents() {
        assert_eq!(NoteType::parse("decisao"), Some(NoteType::Decisao));
        assert_eq!(
            NoteType::parse("IMPLEMENTAÇÃO"),
            Some(NoteType::Implementacao)
        );
        assert_eq!(NoteCategory::parse("gamedev"), Some(NoteCategory::GameDev));
        assert_eq!(NoteCategory::parse_or_default("godot"), NoteCategory::Other);
    }

    #[test]
    fn draft_normalization_applies_defaults() {
        let draft = NoteDraft {
            title: String::new(),
            tags: vec!["A".to_string(), "a".to_string()],
            ..NoteDraft::default()
        }
        .normalized();
        assert_eq!(draft.title, DEFAULT_NOTE_TITLE);
        assert_eq!(draft.tags, vec!["a".to_string()]);
    }
}
