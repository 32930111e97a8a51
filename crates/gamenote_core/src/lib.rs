//! Core domain logic for GameNote.
//! This crate is the single source of truth for routing, note and mentor
//! invariants.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod listeners;
pub mod logging;
pub mod mentor;
pub mod model;
pub mod repo;
pub mod router;
pub mod service;

pub use app::{build_router, register_routes, AppState, FeedbackError};
pub use auth::{
    localized_auth_message, AuthError, AuthErrorCode, IdentityProvider, InMemoryIdentityProvider,
    SqliteIdentityProvider,
};
pub use config::{AppConfig, MentorSettings};
pub use db::{open_db, open_db_in_memory, DbError};
pub use listeners::SubscriptionId;
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use mentor::{
    parse_mentor_response, ChatSession, MentorClient, MentorError, MentorFeedback,
    MentorTransport, ParsedMentorResponse, ReqwestTransport,
};
pub use model::chat::{ChatMessage, ChatRole};
pub use model::note::{Note, NoteCategory, NoteDraft, NoteId, NotePatch, NoteType};
pub use model::user::UserRef;
pub use repo::note_repo::{NoteFilter, NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use router::{
    MemorySink, MountSink, RenderStatus, RouteContext, RouteOptions, RouteOutcome, Router,
};
pub use service::note_service::{NoteService, NoteServiceError};

