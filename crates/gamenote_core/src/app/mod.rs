//! Application shell: route registrations and the state handlers share.
//!
//! # Responsibility
//! - Register `/`, `/login`, `/register`, `/dashboard` and `/editor` with
//!   their guard policies.
//! - Render note views through [`NoteService`] for the signed-in user.
//! - Run mentor feedback and chat with the recent-notes context attached.
//!
//! # Invariants
//! - Handlers only read state; writes go through [`AppState`] methods.
//! - A missing or unknown note id renders a not-found view, not an error.
//!   Storage failures while loading a note surface as render errors.

use crate::mentor::{ChatSession, MentorClient, MentorError, MentorFeedback, MentorTransport};
use crate::model::note::{NoteCategory, NoteId, NoteType};
use crate::model::user::UserRef;
use crate::repo::note_repo::{NoteFilter, SqliteNoteRepository};
use crate::router::fragment::ROOT_PATH;
use crate::router::{
    Markup, MountSink, RenderError, RouteContext, RouteError, RouteOptions, Router,
    DASHBOARD_PATH, LOGIN_PATH,
};
use crate::service::note_service::{NoteService, NoteServiceError, MENTOR_CONTEXT_NOTES};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub mod views;

pub const REGISTER_PATH: &str = "/register";
pub const EDITOR_PATH: &str = "/editor";

/// Query keys understood by the dashboard and editor.
pub const PARAM_NOTE_ID: &str = "id";
pub const PARAM_CATEGORY: &str = "category";
pub const PARAM_TYPE: &str = "type";
pub const PARAM_SEARCH: &str = "q";

/// Errors from the feedback action.
#[derive(Debug)]
pub enum FeedbackError {
    Note(NoteServiceError),
    Mentor(MentorError),
}

impl Display for FeedbackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Note(err) => write!(f, "{err}"),
            Self::Mentor(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FeedbackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Note(err) => Some(err),
            Self::Mentor(err) => Some(err),
        }
    }
}

impl From<NoteServiceError> for FeedbackError {
    fn from(value: NoteServiceError) -> Self {
        Self::Note(value)
    }
}

impl From<MentorError> for FeedbackError {
    fn from(value: MentorError) -> Self {
        Self::Mentor(value)
    }
}

/// State shared by route handlers: the note database and the mentor client.
pub struct AppState<T: MentorTransport> {
    conn: Connection,
    mentor: MentorClient<T>,
}

impl<T: MentorTransport> AppState<T> {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection, mentor: MentorClient<T>) -> Self {
        Self { conn, mentor }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn mentor(&self) -> &MentorClient<T> {
        &self.mentor
    }

    /// Note service over the shared connection.
    pub fn notes(&self) -> NoteService<SqliteNoteRepository<'_>> {
        NoteService::new(SqliteNoteRepository::new(&self.conn))
    }

    /// Requests mentor feedback on one of `user`'s notes. The other most
    /// recently updated notes go along as context.
    pub fn request_feedback(
        &self,
        user: &UserRef,
        note_id: NoteId,
    ) -> Result<MentorFeedback, FeedbackError> {
        let notes = self.notes();
        let note = notes
            .get_note(user, note_id)
            .map_err(NoteServiceError::from)?
            .ok_or(NoteServiceError::NoteNotFound(note_id))?;
        let recent = notes.recent_notes(user, MENTOR_CONTEXT_NOTES, Some(note_id));
        info!(
            "event=mentor_feedback module=app status=start note_id={note_id} context_notes={}",
            recent.len()
        );
        Ok(self.mentor.request_feedback(&note, &recent)?)
    }

    /// Sends `text` in `session` and returns the reply text. Blank input
    /// yields `Ok(None)`.
    pub fn send_chat(
        &self,
        user: &UserRef,
        session: &mut ChatSession,
        text: &str,
    ) -> Result<Option<String>, MentorError> {
        let recent = self.notes().recent_notes(user, MENTOR_CONTEXT_NOTES, None);
        let reply = session.send(&self.mentor, text, &recent)?;
        Ok(reply.map(|message| message.content.clone()))
    }
}

/// Builds a router mounting into `sink` with every application route.
pub fn build_router<T: MentorTransport + 'static>(
    state: Rc<AppState<T>>,
    sink: impl MountSink + 'static,
) -> Result<Router, RouteError> {
    let mut router = Router::new(sink);
    register_routes(&mut router, state)?;
    Ok(router)
}

/// Registers the application routes on `router`.
pub fn register_routes<T: MentorTransport + 'static>(
    router: &mut Router,
    state: Rc<AppState<T>>,
) -> Result<(), RouteError> {
    router.register(
        ROOT_PATH,
        |_| Ok(views::loading_view()),
        RouteOptions::public().on_render(|ctx: &mut RouteContext| {
            let target = if ctx.user().is_some() {
                DASHBOARD_PATH
            } else {
                LOGIN_PATH
            };
            ctx.navigate(target);
        }),
    )?;
    router.register(
        LOGIN_PATH,
        |_| Ok(views::login_view()),
        RouteOptions::auth_only(),
    )?;
    router.register(
        REGISTER_PATH,
        |_| Ok(views::register_view()),
        RouteOptions::auth_only(),
    )?;

    let dashboard_state = Rc::clone(&state);
    router.register(
        DASHBOARD_PATH,
        move |ctx| render_dashboard(&dashboard_state, ctx),
        RouteOptions::requires_auth(),
    )?;

    let editor_state = state;
    router.register(
        EDITOR_PATH,
        move |ctx| render_editor(&editor_state, ctx),
        RouteOptions::requires_auth(),
    )?;
    Ok(())
}

/// Dashboard filters from query parameters. Unknown values are ignored.
pub fn filter_from_context(ctx: &RouteContext) -> NoteFilter {
    let params = ctx.params();
    NoteFilter {
        category: params.get(PARAM_CATEGORY).and_then(NoteCategory::parse),
        note_type: params.get(PARAM_TYPE).and_then(NoteType::parse),
        search: params
            .get(PARAM_SEARCH)
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string),
    }
}

fn signed_in_user(ctx: &RouteContext) -> Result<&UserRef, RenderError> {
    ctx.user()
        .ok_or_else(|| RenderError::new(format!("{} rendered without a user", ctx.path())))
}

fn render_dashboard<T: MentorTransport>(
    state: &AppState<T>,
    ctx: &RouteContext,
) -> Result<Markup, RenderError> {
    let user = signed_in_user(ctx)?;
    let filter = filter_from_context(ctx);
    let notes = state.notes().list_notes(user, &filter);
    Ok(views::dashboard_view(&user.email, &notes, &filter))
}

fn render_editor<T: MentorTransport>(
    state: &AppState<T>,
    ctx: &RouteContext,
) -> Result<Markup, RenderError> {
    let user = signed_in_user(ctx)?;
    let configured = state.mentor.is_configured();
    let Some(raw_id) = ctx.params().get(PARAM_NOTE_ID) else {
        return Ok(views::editor_view(None, configured));
    };
    let Ok(id) = raw_id.parse::<NoteId>() else {
        return Ok(views::note_not_found_view(raw_id));
    };

    let note = state
        .notes()
        .get_note(user, id)
        .map_err(|err| RenderError::new(err.to_string()))?;
    Ok(match note {
        Some(note) => views::editor_view(Some(&note), configured),
        None => views::note_not_found_view(raw_id),
    })
}
