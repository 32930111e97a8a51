//! Command handlers. Views come from `gamenote_core::app::views`; this module
//! only resolves input and prints.

use crate::{Cli, Commands, Credentials, NotesAction};
use gamenote_core::app::{build_router, views, FeedbackError};
use gamenote_core::auth::{IdentityProvider, SqliteAccountStore, SqliteIdentityProvider};
use gamenote_core::model::note::parse_tag_input;
use gamenote_core::router::RenderStatus;
use gamenote_core::service::note_service::MENTOR_CONTEXT_NOTES;
use gamenote_core::{
    open_db, AppConfig, AppState, ChatSession, MemorySink, MentorClient, NoteCategory, NoteDraft,
    NoteFilter, NoteId, NotePatch, NoteType, ReqwestTransport, UserRef,
};
use log::info;
use std::error::Error;
use std::io::{BufRead, Write};
use std::rc::Rc;

type CliResult<T = ()> = Result<T, Box<dyn Error>>;
type State = Rc<AppState<ReqwestTransport>>;

const CHAT_EXIT: &str = "/sair";
const CHAT_RETRY: &str = "/tentar";

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db.as_ref() {
        config.db_path = db.clone();
    }
    if let Some(api_key) = cli.api_key.as_ref() {
        config.mentor.api_key = api_key.trim().to_string();
    }
    if let Some(model) = cli.model.as_ref() {
        config.mentor.model = model.trim().to_string();
    }
    if let Some(level) = cli.log_level.as_ref() {
        config.logging.level = level.clone();
    }
    if let Some(log_dir) = cli.log_dir.as_ref() {
        config.logging.log_dir = log_dir.clone();
    }
    config.logging.echo_warnings = true;
    config
}

pub fn run(cli: &Cli, config: &AppConfig) -> CliResult {
    let conn = open_db(&config.db_path)?;
    let mentor = MentorClient::from_settings(&config.mentor)?;
    let state: State = Rc::new(AppState::new(conn, mentor));
    info!(
        "event=cli_start module=cli status=ok mentor_configured={}",
        state.mentor().is_configured()
    );

    match &cli.command {
        Commands::SignUp => sign_up(&state, &cli.credentials),
        Commands::Route { fragment } => route(&state, &cli.credentials, fragment),
        Commands::Notes { action } => notes(&state, &cli.credentials, action),
        Commands::Feedback { id } => feedback(&state, &cli.credentials, id),
        Commands::Chat { message } => chat(&state, &cli.credentials, message.as_deref()),
    }
}

/// Provider for one invocation. Failed sign-in counts (and so the
/// `MAX_FAILED_SIGN_INS` lockout) do not carry over between invocations.
fn identity(state: &State) -> SqliteIdentityProvider<'_> {
    SqliteIdentityProvider::new(SqliteAccountStore::new(state.connection()))
}

fn credentials(creds: &Credentials) -> CliResult<(&str, &str)> {
    match (creds.email.as_deref(), creds.password.as_deref()) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err("this command needs --email and --password".into()),
    }
}

fn sign_in(state: &State, creds: &Credentials) -> CliResult<UserRef> {
    let (email, password) = credentials(creds)?;
    Ok(identity(state).sign_in(email, password)?)
}

fn sign_up(state: &State, creds: &Credentials) -> CliResult {
    let (email, password) = credentials(creds)?;
    let user = identity(state).sign_up(email, password)?;
    println!("Conta criada: {}", user.email);
    Ok(())
}

fn route(state: &State, creds: &Credentials, fragment: &str) -> CliResult {
    let sink = MemorySink::new();
    let mut router = build_router(Rc::clone(state), sink.clone())?;
    if creds.email.is_some() {
        let user = sign_in(state, creds)?;
        router.set_user(Some(user));
    }

    let outcome = router.hash_changed(fragment);
    if let Some(markup) = sink.current() {
        println!("{markup}");
    }
    match outcome.status {
        RenderStatus::Rendered => println!("\n[{}]", router.location()),
        RenderStatus::Failed(err) => eprintln!("{err}"),
        RenderStatus::RedirectLoop => {
            eprintln!("redirect loop after {} hops", outcome.redirects)
        }
    }
    Ok(())
}

fn notes(state: &State, creds: &Credentials, action: &NotesAction) -> CliResult {
    let user = sign_in(state, creds)?;
    let service = state.notes();

    match action {
        NotesAction::List {
            category,
            note_type,
            search,
        } => {
            let filter = NoteFilter {
                category: category.as_deref().map(parse_category).transpose()?,
                note_type: note_type.as_deref().map(parse_note_type).transpose()?,
                search: search.clone(),
            };
            let notes = service.list_notes(&user, &filter);
            println!("{}", views::dashboard_view(&user.email, &notes, &filter));
        }
        NotesAction::Show { id } => {
            let id = parse_note_id(id)?;
            match service.get_note(&user, id)? {
                Some(note) => println!(
                    "{}",
                    views::editor_view(Some(&note), state.mentor().is_configured())
                ),
                None => println!("{}", views::note_not_found_view(&id.to_string())),
            }
        }
        NotesAction::Add {
            title,
            content,
            category,
            note_type,
            tags,
        } => {
            let draft = NoteDraft {
                title: title.clone(),
                content: content.clone(),
                category: parse_category(category)?,
                note_type: parse_note_type(note_type)?,
                tags: parse_tag_input(tags),
            };
            let note = service.create_note(&user, draft)?;
            println!("Nota criada: {} ({})", note.title, note.id);
        }
        NotesAction::Edit {
            id,
            title,
            content,
            category,
            note_type,
            tags,
        } => {
            let patch = NotePatch {
                title: title.clone(),
                content: content.clone(),
                category: category.as_deref().map(parse_category).transpose()?,
                note_type: note_type.as_deref().map(parse_note_type).transpose()?,
                tags: tags.as_deref().map(parse_tag_input),
            };
            if patch.is_empty() {
                return Err("nothing to update; pass at least one field".into());
            }
            let note = service.update_note(&user, parse_note_id(id)?, patch)?;
            println!("Nota atualizada: {} ({})", note.title, note.id);
        }
        NotesAction::Delete { id } => {
            let id = parse_note_id(id)?;
            service.delete_note(&user, id)?;
            println!("Nota excluída: {id}");
        }
    }
    Ok(())
}

fn feedback(state: &State, creds: &Credentials, id: &str) -> CliResult {
    let user = sign_in(state, creds)?;
    match state.request_feedback(&user, parse_note_id(id)?) {
        Ok(feedback) => println!("{}", views::feedback_view(&feedback)),
        Err(FeedbackError::Mentor(err)) => println!("{}", views::mentor_error_view(&err)),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn chat(state: &State, creds: &Credentials, message: Option<&str>) -> CliResult {
    let user = sign_in(state, creds)?;
    let mut session = ChatSession::new();

    if let Some(message) = message {
        chat_turn(state, &user, &mut session, message);
        return Ok(());
    }

    println!("Converse com o mentor. {CHAT_RETRY} reenvia a última pergunta, {CHAT_EXIT} encerra.");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            CHAT_EXIT => break,
            CHAT_RETRY => {
                let recent = state
                    .notes()
                    .recent_notes(&user, MENTOR_CONTEXT_NOTES, None);
                match session.retry(state.mentor(), &recent) {
                    Ok(Some(reply)) => println!("Mentor: {}\n", reply.content),
                    Ok(None) => println!("Nada para reenviar.\n"),
                    Err(err) => println!("{}\n", views::mentor_error_view(&err)),
                }
            }
            text => chat_turn(state, &user, &mut session, text),
        }
    }
    Ok(())
}

fn chat_turn(state: &State, user: &UserRef, session: &mut ChatSession, text: &str) {
    match state.send_chat(user, session, text) {
        Ok(Some(reply)) => println!("Mentor: {reply}\n"),
        Ok(None) => {}
        Err(err) => println!("{}\n", views::mentor_error_view(&err)),
    }
}

fn parse_note_id(raw: &str) -> CliResult<NoteId> {
    raw.trim()
        .parse::<NoteId>()
        .map_err(|_| format!("invalid note id `{raw}`").into())
}

fn parse_category(raw: &str) -> CliResult<NoteCategory> {
    NoteCategory::parse(raw).ok_or_else(|| {
        let known = NoteCategory::ALL.map(NoteCategory::as_str).join(", ");
        format!("unknown category `{raw}`; expected one of: {known}").into()
    })
}

fn parse_note_type(raw: &str) -> CliResult<NoteType> {
    NoteType::parse(raw).ok_or_else(|| {
        let known = NoteType::ALL.map(NoteType::as_str).join(", ");
        format!("unknown note type `{raw}`; expected one of: {known}").into()
    })
}
