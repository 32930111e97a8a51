//! Best-effort extraction of the four mentor feedback sections.
//!
//! # Responsibility
//! - Locate the numbered section headings in free model output.
//! - Slice each section body up to the next recognized heading.
//!
//! # Invariants
//! - Heading matching is case-insensitive and anchored at the start of a
//!   line. A body may continue on the heading line itself.
//! - When neither section 1 nor section 2 is found the whole text is returned
//!   as `raw` and every named section is empty.
//! - Missing sections in a partial match are empty strings, never errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Feedback section slots, in template order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Diagnosis,
    Problem,
    Direction,
    NextStep,
}

struct SectionRule {
    section: Section,
    label: &'static str,
    matcher: Regex,
}

fn heading_rule(section: Section, number: u8, label: &'static str, words: &str) -> SectionRule {
    // Optional markdown heading marker, optional bold, optional trailing colon.
    // The match stops after the heading so inline bodies start at its end.
    let pattern = format!(
        r"(?im)^[ \t]*(?:#{{1,6}}[ \t]*)?\*{{0,2}}[ \t]*{number}\.[ \t]*{words}\b[ \t]*\*{{0,2}}[ \t]*:?[ \t]*\*{{0,2}}[ \t]*"
    );
    SectionRule {
        section,
        label,
        matcher: Regex::new(&pattern).expect("valid section heading regex"),
    }
}

static SECTION_RULES: Lazy<Vec<SectionRule>> = Lazy::new(|| {
    vec![
        heading_rule(
            Section::Diagnosis,
            1,
            "Diagnóstico Rápido",
            r"diagn[óo]stico[ \t]+r[áa]pido",
        ),
        heading_rule(
            Section::Problem,
            2,
            "Problema Central",
            r"problema[ \t]+central",
        ),
        heading_rule(
            Section::Direction,
            3,
            "Direção Recomendada",
            r"dire[çc][ãa]o[ \t]+recomendada",
        ),
        heading_rule(
            Section::NextStep,
            4,
            "Próximo Passo Imediato",
            r"pr[óo]ximo[ \t]+passo[ \t]+imediato",
        ),
    ]
});

/// Structured mentor feedback, or the raw text when the template was not
/// followed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMentorResponse {
    pub diagnosis: String,
    pub problem: String,
    pub direction: String,
    pub next_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ParsedMentorResponse {
    /// Callers render `raw` verbatim when this is true.
    pub fn is_fallback(&self) -> bool {
        self.raw.is_some()
    }

    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Diagnosis => &self.diagnosis,
            Section::Problem => &self.problem,
            Section::Direction => &self.direction,
            Section::NextStep => &self.next_step,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::Diagnosis => &mut self.diagnosis,
            Section::Problem => &mut self.problem,
            Section::Direction => &mut self.direction,
            Section::NextStep => &mut self.next_step,
        }
    }
}

/// Display label of a section heading.
pub fn section_label(section: Section) -> &'static str {
    SECTION_RULES
        .iter()
        .find(|rule| rule.section == section)
        .map_or("", |rule| rule.label)
}

/// The template counts as followed when section 1 or section 2 is present.
fn template_followed(headings: &[Option<Range<usize>>]) -> bool {
    headings.first().is_some_and(Option::is_some) || headings.get(1).is_some_and(Option::is_some)
}

/// Parses raw mentor output into its four sections.
pub fn parse_mentor_response(text: &str) -> ParsedMentorResponse {
    let headings = SECTION_RULES
        .iter()
        .map(|rule| rule.matcher.find(text).map(|found| found.range()))
        .collect::<Vec<_>>();

    if !template_followed(&headings) {
        return ParsedMentorResponse {
            raw: Some(text.to_string()),
            ..ParsedMentorResponse::default()
        };
    }

    let mut parsed = ParsedMentorResponse::default();
    for (rule, heading) in SECTION_RULES.iter().zip(&headings) {
        let Some(heading) = heading else {
            continue;
        };
        let body_end = headings
            .iter()
            .flatten()
            .map(|other| other.start)
            .filter(|start| *start >= heading.end)
            .min()
            .unwrap_or(text.len());
        *parsed.section_mut(rule.section) = text[heading.end..body_end].trim().to_string();
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::{parse_mentor_response, section_label, Section};

    #[test]
    fn accepts_heading_variants() {
        let text = "## 1. DIAGNÓSTICO RÁPIDO:\nok\n**2. problema central**\nbug";
        let parsed = parse_mentor_response(text);
        assert!(!parsed.is_fallback());
        assert_eq!(parsed.diagnosis, "ok");
        assert_eq!(parsed.problem, "bug");
    }

    #[test]
    fn heading_must_start_a_line() {
        let parsed = parse_mentor_response("Veja o item 1. Diagnóstico Rápido depois.");
        assert!(parsed.is_fallback());
    }

    #[test]
    fn heading_words_must_end_on_a_word_boundary() {
        let parsed = parse_mentor_response("1. Diagnóstico Rápidos\n2. Problema Centrals");
        assert!(parsed.is_fallback());
    }

    #[test]
    fn labels_follow_template_order() {
        assert_eq!(section_label(Section::Diagnosis), "Diagnóstico Rápido");
        assert_eq!(section_label(Section::NextStep), "Próximo Passo Imediato");
    }
}
