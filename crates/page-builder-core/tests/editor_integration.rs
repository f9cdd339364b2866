// Integration tests for editor sessions.
//
// These exercise full editing workflows through EditorSession, including
// saving to disk and resuming undo history from the redb store.

use std::sync::Arc;

use page_builder_core::component::{HeroProps, TextProps};
use page_builder_core::{
    load_document, Block, BlockKind, Document, EditError, EditorSession, HistoryConfig,
    PersistenceLayer,
};
use tempfile::TempDir;

fn text(body: &str) -> Block {
    Block::Text(TextProps {
        body: body.to_string(),
        ..TextProps::default()
    })
}

fn titles(session: &EditorSession) -> Vec<String> {
    session
        .document()
        .pages
        .iter()
        .map(|p| p.title.clone())
        .collect()
}

// ── Undo/redo semantics through the session ─────────────────────────

#[test]
fn test_three_edits_undo_twice_then_branch() {
    let mut session = EditorSession::new(Document::new("Riverside"));
    session.add_page("A").unwrap();
    session.add_page("B").unwrap();
    session.add_page("C").unwrap();

    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(titles(&session), vec!["A"]);

    session.redo().unwrap();
    assert_eq!(titles(&session), vec!["A", "B"]);

    session.add_page("D").unwrap();
    assert_eq!(titles(&session), vec!["A", "B", "D"]);
    assert!(!session.can_redo());
    assert!(!session.redo().unwrap());

    session.undo().unwrap();
    assert_eq!(titles(&session), vec!["A", "B"]);
}

#[test]
fn test_history_cap_applies_to_session() {
    let config = HistoryConfig::with_max_snapshots(5);
    let mut session = EditorSession::new_unsaved(Document::new("Capped"), &config, None);
    let page = session.add_page("Home").unwrap();
    for i in 0..10 {
        session.rename_page(&page, &format!("Home {i}")).unwrap();
    }
    assert_eq!(session.history().len(), 5);

    let mut steps = 0;
    while session.undo().unwrap() {
        steps += 1;
    }
    assert_eq!(steps, 4);
    assert_eq!(session.document().pages[0].title, "Home 5");
}

#[test]
fn test_undone_document_is_not_shared_with_log() {
    let mut session = EditorSession::new(Document::new("Isolation"));
    let page = session.add_page("Home").unwrap();
    let hero = session
        .add_component(&page, Block::default_for(BlockKind::Hero), None)
        .unwrap();
    session
        .update_component(
            &page,
            &hero,
            Block::Hero(HeroProps {
                heading: "Enrol now".to_string(),
                ..HeroProps::default()
            }),
        )
        .unwrap();

    session.undo().unwrap();
    let snapshot = session.document().clone();
    session.redo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.document(), &snapshot);
}

#[test]
fn test_failed_action_keeps_history_intact() {
    let mut session = EditorSession::new(Document::new("Strict"));
    let page = session.add_page("Home").unwrap();
    session.add_component(&page, text("a"), None).unwrap();
    let before = session.document().clone();
    let len = session.history().len();

    assert!(matches!(
        session.move_component(&page, "missing", 0),
        Err(EditError::ComponentNotFound(_))
    ));
    assert!(matches!(
        session.move_page(&page, 7),
        Err(EditError::IndexOutOfRange { .. })
    ));
    assert_eq!(session.document(), &before);
    assert_eq!(session.history().len(), len);
    assert!(session.can_undo());
}

// ── Persistence ─────────────────────────────────────────────────────

#[test]
fn test_edit_save_reopen_and_undo() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("site.json");
    let pl = PersistenceLayer::open(&dir.path().join("data")).unwrap();
    let config = HistoryConfig::default();

    let mut session = EditorSession::new_unsaved(Document::new("Harbour"), &config, None);
    session.add_page("Home").unwrap();
    session.save_to(&path, true).unwrap();

    {
        let mut session =
            EditorSession::open_file_with_persistence(&path, &config, Arc::clone(&pl)).unwrap();
        let home = session.document().pages[0].id.clone();
        session.add_component(&home, text("Welcome"), None).unwrap();
        session
            .add_component(&home, Block::default_for(BlockKind::CourseGrid), None)
            .unwrap();
        session.undo().unwrap();
        session.save(true).unwrap();
        session.flush_history().unwrap();
    }

    let mut session = EditorSession::open_file_with_persistence(&path, &config, pl).unwrap();
    assert_eq!(session.document().component_count(), 1);
    assert!(session.can_redo());

    session.redo().unwrap();
    assert_eq!(session.document().component_count(), 2);
    assert!(session.is_dirty());

    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.document().component_count(), 0);
    assert!(!session.can_undo());
}

#[test]
fn test_sessions_for_different_files_do_not_share_history() {
    let dir = TempDir::new().unwrap();
    let pl = PersistenceLayer::open(&dir.path().join("data")).unwrap();
    let config = HistoryConfig::default();

    let a_path = dir.path().join("a.json");
    let b_path = dir.path().join("b.json");
    for path in [&a_path, &b_path] {
        let mut session = EditorSession::new(Document::new("Shared"));
        session.save_to(path, false).unwrap();
    }

    {
        let mut a =
            EditorSession::open_file_with_persistence(&a_path, &config, Arc::clone(&pl)).unwrap();
        a.add_page("Only in A").unwrap();
        a.save(false).unwrap();
        a.flush_history().unwrap();
    }

    let b = EditorSession::open_file_with_persistence(&b_path, &config, Arc::clone(&pl)).unwrap();
    assert!(!b.can_undo());
    assert!(b.document().pages.is_empty());

    let a = EditorSession::open_file_with_persistence(&a_path, &config, pl).unwrap();
    assert!(a.can_undo());
}

#[test]
fn test_deleted_history_is_not_restored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("site.json");
    let pl = PersistenceLayer::open(&dir.path().join("data")).unwrap();
    let config = HistoryConfig::default();

    EditorSession::new(Document::new("Gone"))
        .save_to(&path, true)
        .unwrap();
    {
        let mut session =
            EditorSession::open_file_with_persistence(&path, &config, Arc::clone(&pl)).unwrap();
        session.add_page("Home").unwrap();
        session.save(true).unwrap();
        session.flush_history().unwrap();
        session.delete_history().unwrap();
    }

    let session = EditorSession::open_file_with_persistence(&path, &config, pl).unwrap();
    assert!(!session.can_undo());
    assert_eq!(load_document(&path).unwrap(), *session.document());
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{"pages":[{"id":"p1","components":[{"id":"c1","block":{"type":"carousel","props":{}}}]}]}"#,
    )
    .unwrap();

    let err = EditorSession::open_file(&path, &HistoryConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("invalid document"));
}
