use gamenote_core::db::open_db_in_memory;
use gamenote_core::model::note::DEFAULT_NOTE_TITLE;
use gamenote_core::{
    NoteCategory, NoteDraft, NoteFilter, NotePatch, NoteService, NoteServiceError, NoteType,
    SqliteNoteRepository, UserRef,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn alice() -> UserRef {
    UserRef::new("uid-alice", "alice@example.com")
}

fn bob() -> UserRef {
    UserRef::new("uid-bob", "bob@example.com")
}

fn draft(title: &str, content: &str, category: NoteCategory, note_type: NoteType) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        content: content.to_string(),
        category,
        note_type,
        tags: Vec::new(),
    }
}

fn set_timestamps(conn: &Connection, id: Uuid, created_at: i64, updated_at: i64) {
    conn.execute(
        "UPDATE notes SET created_at = ?1, updated_at = ?2 WHERE id = ?3;",
        params![created_at, updated_at, id.to_string()],
    )
    .unwrap();
}

#[test]
fn create_applies_defaults_and_reads_back() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));

    let mut input = draft("   ", "corpo", NoteCategory::Unity, NoteType::Erro);
    input.tags = vec![" #Física ".to_string(), "física".to_string(), "".to_string()];
    let created = service.create_note(&alice(), input).unwrap();

    assert_eq!(created.title, DEFAULT_NOTE_TITLE);
    assert_eq!(created.user_id, "uid-alice");
    assert_eq!(created.tags, vec!["física".to_string()]);
    assert_eq!(created.category, NoteCategory::Unity);
    assert_eq!(created.note_type, NoteType::Erro);
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);
}

#[test]
fn notes_are_scoped_to_their_owner() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));

    let note = service
        .create_note(
            &alice(),
            draft("Shader", "x", NoteCategory::Unity, NoteType::Estudo),
        )
        .unwrap();

    assert!(service.get_note(&bob(), note.id).unwrap().is_none());
    assert!(service.list_notes(&bob(), &NoteFilter::default()).is_empty());

    let err = service.delete_note(&bob(), note.id).unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(id) if id == note.id));
    let err = service
        .update_note(
            &bob(),
            note.id,
            NotePatch {
                title: Some("hijack".to_string()),
                ..NotePatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(_)));

    let still_there = service.get_note(&alice(), note.id).unwrap().unwrap();
    assert_eq!(still_there.title, "Shader");
}

#[test]
fn update_applies_only_present_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));
    let mut input = draft("Blueprint", "antes", NoteCategory::Unreal, NoteType::Estudo);
    input.tags = vec!["ue5".to_string()];
    let note = service.create_note(&alice(), input).unwrap();

    let updated = service
        .update_note(
            &alice(),
            note.id,
            NotePatch {
                content: Some("depois".to_string()),
                note_type: Some(NoteType::Decisao),
                tags: Some(vec!["#Blueprints".to_string()]),
                ..NotePatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "Blueprint");
    assert_eq!(updated.content, "depois");
    assert_eq!(updated.category, NoteCategory::Unreal);
    assert_eq!(updated.note_type, NoteType::Decisao);
    assert_eq!(updated.tags, vec!["blueprints".to_string()]);
    assert!(updated.updated_at >= note.updated_at);
}

#[test]
fn delete_removes_note_and_its_tags() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));
    let mut input = draft("Rig", "", NoteCategory::Blender, NoteType::Implementacao);
    input.tags = vec!["rigging".to_string()];
    let note = service.create_note(&alice(), input).unwrap();

    service.delete_note(&alice(), note.id).unwrap();

    assert!(service.get_note(&alice(), note.id).unwrap().is_none());
    let tag_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM note_tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tag_rows, 0);
    let err = service.delete_note(&alice(), note.id).unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(_)));
}

#[test]
fn list_orders_newest_first_and_applies_filters() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));
    let user = alice();

    let old = service
        .create_note(
            &user,
            draft("Colisão", "rigidbody atravessa parede", NoteCategory::Unity, NoteType::Erro),
        )
        .unwrap();
    let mid = service
        .create_note(
            &user,
            draft("Game loop", "fixed timestep", NoteCategory::GameDev, NoteType::Estudo),
        )
        .unwrap();
    let mut tagged = draft("Inventário", "grid", NoteCategory::Unity, NoteType::Objetivo);
    tagged.tags = vec!["Rigidbody".to_string()];
    let new = service.create_note(&user, tagged).unwrap();
    set_timestamps(&conn, old.id, 1_000, 1_000);
    set_timestamps(&conn, mid.id, 2_000, 2_000);
    set_timestamps(&conn, new.id, 3_000, 3_000);

    let all = service.list_notes(&user, &NoteFilter::default());
    let ids = all.iter().map(|note| note.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![new.id, mid.id, old.id]);

    let unity = service.list_notes(
        &user,
        &NoteFilter {
            category: Some(NoteCategory::Unity),
            ..NoteFilter::default()
        },
    );
    assert_eq!(unity.len(), 2);

    let errors = service.list_notes(
        &user,
        &NoteFilter {
            category: Some(NoteCategory::Unity),
            note_type: Some(NoteType::Erro),
            search: None,
        },
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, old.id);

    // Matches content of one note and a tag of another.
    let search = service.list_notes(
        &user,
        &NoteFilter {
            search: Some("RIGIDBODY".to_string()),
            ..NoteFilter::default()
        },
    );
    let ids = search.iter().map(|note| note.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![new.id, old.id]);
}

#[test]
fn recent_notes_skip_the_excluded_note_without_shrinking() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));
    let user = alice();

    let mut ids = Vec::new();
    for index in 0..4 {
        let note = service
            .create_note(
                &user,
                draft(&format!("n{index}"), "", NoteCategory::Other, NoteType::Estudo),
            )
            .unwrap();
        set_timestamps(&conn, note.id, 1_000, 1_000 + index);
        ids.push(note.id);
    }

    let recent = service.recent_notes(&user, 2, None);
    let recent_ids = recent.iter().map(|note| note.id).collect::<Vec<_>>();
    assert_eq!(recent_ids, vec![ids[3], ids[2]]);

    let recent = service.recent_notes(&user, 2, Some(ids[3]));
    let recent_ids = recent.iter().map(|note| note.id).collect::<Vec<_>>();
    assert_eq!(recent_ids, vec![ids[2], ids[1]]);

    let recent = service.recent_notes(&user, u32::MAX, Some(ids[0]));
    let recent_ids = recent.iter().map(|note| note.id).collect::<Vec<_>>();
    assert_eq!(recent_ids, vec![ids[3], ids[2], ids[1]]);
}

#[test]
fn unknown_stored_category_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::new(&conn));
    let note = service
        .create_note(
            &alice(),
            draft("x", "", NoteCategory::Other, NoteType::Estudo),
        )
        .unwrap();
    conn.execute(
        "UPDATE notes SET category = 'godot' WHERE id = ?1;",
        [note.id.to_string()],
    )
    .unwrap();

    assert!(service.get_note(&alice(), note.id).is_err());
    // Listing degrades to empty instead of failing.
    assert!(service.list_notes(&alice(), &NoteFilter::default()).is_empty());
}
