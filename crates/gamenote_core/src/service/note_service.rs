//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/get/list APIs for one signed-in user.
//! - Apply save-time defaults (title, tags) before persistence.
//! - Collect the recent-notes context sent along with mentor requests.
//!
//! # Invariants
//! - Writes return the read-back note, never the caller's input.
//! - List operations degrade to an empty result on storage failure; the
//!   failure is logged, not propagated.

use crate::model::note::{Note, NoteDraft, NoteId, NotePatch};
use crate::model::user::UserRef;
use crate::repo::note_repo::{NoteFilter, NoteRepository};
use crate::repo::{RepoError, RepoResult};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Default number of recent notes attached to a mentor request.
pub const MENTOR_CONTEXT_NOTES: u32 = 5;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note does not exist for this user.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back did not find the row.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over a repository implementation.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a note from editor input.
    pub fn create_note(&self, user: &UserRef, draft: NoteDraft) -> Result<Note, NoteServiceError> {
        let draft = draft.normalized();
        let note = Note {
            id: Uuid::new_v4(),
            user_id: user.uid.clone(),
            title: draft.title,
            content: draft.content,
            category: draft.category,
            note_type: draft.note_type,
            tags: draft.tags,
            created_at: 0,
            updated_at: 0,
        };

        let id = self.repo.create(&user.uid, &note).inspect_err(|err| {
            error!("event=note_create module=service status=error error={err}");
        })?;
        info!("event=note_create module=service status=ok note_id={id}");
        self.read_back(user, id, "created note not found in read-back")
    }

    /// Applies a partial update and returns the stored note.
    pub fn update_note(
        &self,
        user: &UserRef,
        id: NoteId,
        patch: NotePatch,
    ) -> Result<Note, NoteServiceError> {
        let patch = patch.normalized();
        self.repo.update(&user.uid, id, &patch).inspect_err(|err| {
            warn!("event=note_update module=service status=error note_id={id} error={err}");
        })?;
        info!("event=note_update module=service status=ok note_id={id}");
        self.read_back(user, id, "updated note not found in read-back")
    }

    pub fn delete_note(&self, user: &UserRef, id: NoteId) -> Result<(), NoteServiceError> {
        self.repo.delete(&user.uid, id).inspect_err(|err| {
            warn!("event=note_delete module=service status=error note_id={id} error={err}");
        })?;
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    pub fn get_note(&self, user: &UserRef, id: NoteId) -> RepoResult<Option<Note>> {
        self.repo.get(&user.uid, id)
    }

    /// Lists notes newest first. Storage failures yield an empty list.
    pub fn list_notes(&self, user: &UserRef, filter: &NoteFilter) -> Vec<Note> {
        match self.repo.list(&user.uid, filter) {
            Ok(notes) => notes,
            Err(err) => {
                error!("event=note_list module=service status=error error={err}");
                Vec::new()
            }
        }
    }

    /// Most recently updated notes, optionally skipping the note under edit.
    /// Storage failures yield an empty list.
    pub fn recent_notes(&self, user: &UserRef, limit: u32, exclude: Option<NoteId>) -> Vec<Note> {
        // One extra row so the excluded note does not shrink the window.
        let fetch = if exclude.is_some() {
            limit.saturating_add(1)
        } else {
            limit
        };
        match self.repo.list_recent(&user.uid, fetch) {
            Ok(notes) => notes
                .into_iter()
                .filter(|note| Some(note.id) != exclude)
                .take(limit as usize)
                .collect(),
            Err(err) => {
                error!("event=note_list_recent module=service status=error error={err}");
                Vec::new()
            }
        }
    }

    fn read_back(
        &self,
        user: &UserRef,
        id: NoteId,
        details: &'static str,
    ) -> Result<Note, NoteServiceError> {
        self.repo
            .get(&user.uid, id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }
}
