//! Plain-text views mounted by the route handlers.

use crate::mentor::client::{MentorError, MentorFeedback};
use crate::mentor::response::{section_label, Section};
use crate::model::chat::{ChatMessage, ChatRole};
use crate::model::note::{Note, NoteCategory, NoteType};
use crate::repo::note_repo::NoteFilter;
use crate::router::Markup;

const SECTIONS: [Section; 4] = [
    Section::Diagnosis,
    Section::Problem,
    Section::Direction,
    Section::NextStep,
];

pub fn loading_view() -> Markup {
    Markup::from("Carregando...")
}

pub fn login_view() -> Markup {
    Markup::from(
        "== Entrar ==\n\
         Email:\n\
         Senha:\n\
         [Entrar]  Não tem conta? #/register",
    )
}

pub fn register_view() -> Markup {
    Markup::from(
        "== Criar conta ==\n\
         Email:\n\
         Senha (mínimo 6 caracteres):\n\
         [Cadastrar]  Já tem conta? #/login",
    )
}

pub fn dashboard_view(email: &str, notes: &[Note], filter: &NoteFilter) -> Markup {
    let mut out = format!("== Minhas notas ({email}) ==\n");
    let active_filters = [
        filter.category.map(|category| format!("categoria={category}")),
        filter.note_type.map(|note_type| format!("tipo={note_type}")),
        filter.search.as_ref().map(|term| format!("busca=\"{term}\"")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    if !active_filters.is_empty() {
        out.push_str(&format!("Filtros: {}\n", active_filters.join(", ")));
    }

    if notes.is_empty() {
        out.push_str("Nenhuma nota encontrada. Crie a primeira em #/editor\n");
        return Markup::from(out);
    }
    for note in notes {
        out.push_str(&note_line(note));
        out.push('\n');
    }
    Markup::from(out)
}

pub fn editor_view(note: Option<&Note>, mentor_configured: bool) -> Markup {
    let mut out = match note {
        Some(note) => format!(
            "== Editar nota ==\nid: {}\nTítulo: {}\nCategoria: {}\nTipo: {}\nTags: {}\n\n{}\n",
            note.id,
            note.title,
            note.category,
            note.note_type,
            note.tags.join(", "),
            note.content
        ),
        None => format!(
            "== Nova nota ==\nTítulo:\nCategoria: {}\nTipo: {}\nTags:\n",
            option_list(NoteCategory::ALL.iter().map(|c| c.as_str())),
            option_list(NoteType::ALL.iter().map(|t| t.as_str()))
        ),
    };
    out.push_str("\n[Salvar]");
    if note.is_some() {
        out.push_str(" [Excluir]");
        if mentor_configured {
            out.push_str(" [Pedir feedback ao mentor]");
        } else {
            out.push_str("\nMentor indisponível: configure a chave da API do Gemini.");
        }
    }
    Markup::from(out)
}

pub fn note_not_found_view(id: &str) -> Markup {
    Markup::from(format!(
        "Nota não encontrada: {id}\nVoltar para #/dashboard"
    ))
}

pub fn feedback_view(feedback: &MentorFeedback) -> Markup {
    let parsed = &feedback.parsed;
    if let Some(raw) = parsed.raw.as_deref() {
        return Markup::from(format!("== Feedback do mentor ==\n{raw}"));
    }
    let mut out = String::from("== Feedback do mentor ==\n");
    for section in SECTIONS {
        let body = parsed.section(section);
        if body.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {}\n{body}\n", section_label(section)));
    }
    Markup::from(out)
}

pub fn mentor_error_view(err: &MentorError) -> Markup {
    Markup::from(format!("Mentor: {}", err.user_message()))
}

pub fn chat_view(messages: &[ChatMessage]) -> Markup {
    let lines = messages
        .iter()
        .map(|message| {
            let author = match message.role {
                ChatRole::User => "Você",
                ChatRole::Assistant => "Mentor",
            };
            format!("{author}: {}", message.content)
        })
        .collect::<Vec<_>>();
    Markup::from(lines.join("\n\n"))
}

fn note_line(note: &Note) -> String {
    let tags = if note.tags.is_empty() {
        String::new()
    } else {
        format!(
            " {}",
            note.tags
                .iter()
                .map(|tag| format!("#{tag}"))
                .collect::<Vec<_>>()
                .join(" ")
        )
    };
    format!(
        "- [{}] [{}] {}{tags}  (#/editor?id={})",
        note.category, note.note_type, note.title, note.id
    )
}

fn option_list<'a>(options: impl Iterator<Item = &'a str>) -> String {
    options.collect::<Vec<_>>().join(" | ")
}
