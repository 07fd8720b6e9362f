//! Optimistic bookmark toggle behaviour against the in-memory row store.

mod common;

use common::{bookmark_row, drain_event_types, harness, note_row, user, wait_until};
use notevault_client::ToggleState;
use notevault_core::defaults::BOOKMARKS_TABLE;
use notevault_core::{Category, Error};
use notevault_store::RowOp;

fn seed_scenario(h: &common::Harness) {
    h.rows.seed(
        "notes",
        vec![
            note_row("a", "Physics Notes", "Physics", Some("CSE"), 1),
            note_row("b", "Contributed Set", "CONTRIBUTION", None, 2),
        ],
    );
}

#[tokio::test]
async fn test_optimistic_apply_then_commit() {
    let mut h = harness(Some(user("u1")));
    seed_scenario(&h);
    h.vault.refresh().await.unwrap();
    assert!(h.vault.cache.bookmark_ids().is_empty());

    h.rows.hold_mutations();
    let coordinator = h.vault.bookmarks.clone();
    let task = tokio::spawn(async move { coordinator.toggle("a").await });

    // Visible before the remote insert resolves.
    let cache = h.vault.cache.clone();
    wait_until(|| cache.is_bookmarked("a")).await;
    assert_eq!(h.vault.bookmarks.status("a"), ToggleState::Pending);
    assert!(h.rows.rows(BOOKMARKS_TABLE).is_empty());
    let view = h.vault.cache.view("", &Category::Bookmarked, 1, 6);
    assert_eq!(view.items[0].id, "a");

    h.rows.release_mutations();
    assert!(task.await.unwrap().unwrap());

    assert!(h.vault.cache.is_bookmarked("a"));
    assert_eq!(h.rows.rows(BOOKMARKS_TABLE).len(), 1);
    assert_eq!(h.vault.bookmarks.status("a"), ToggleState::Idle);
    assert!(h.vault.bookmarks.last_error().is_none());

    let types = drain_event_types(&mut h.events);
    let applied = types.iter().position(|t| t == "bookmark.applied").unwrap();
    let committed = types.iter().position(|t| t == "bookmark.committed").unwrap();
    assert!(applied < committed);
}

#[tokio::test]
async fn test_failed_insert_rolls_back() {
    let mut h = harness(Some(user("u1")));
    seed_scenario(&h);
    h.vault.refresh().await.unwrap();
    h.rows.fail(BOOKMARKS_TABLE, RowOp::Insert);

    h.rows.hold_mutations();
    let coordinator = h.vault.bookmarks.clone();
    let task = tokio::spawn(async move { coordinator.toggle("a").await });

    let cache = h.vault.cache.clone();
    wait_until(|| cache.is_bookmarked("a")).await;
    h.rows.release_mutations();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Mutation(_)));
    assert!(!h.vault.cache.is_bookmarked("a"));
    assert!(h.vault.bookmarks.last_error().is_some());
    assert_eq!(h.vault.bookmarks.status("a"), ToggleState::Idle);

    let types = drain_event_types(&mut h.events);
    assert!(types.contains(&"bookmark.rolled_back".to_string()));
}

#[tokio::test]
async fn test_failed_delete_restores_membership() {
    let h = harness(Some(user("u1")));
    seed_scenario(&h);
    h.rows.seed(BOOKMARKS_TABLE, vec![bookmark_row("u1", "a")]);
    h.vault.refresh().await.unwrap();
    assert!(h.vault.cache.is_bookmarked("a"));

    h.rows.fail(BOOKMARKS_TABLE, RowOp::Delete);
    assert!(h.vault.bookmarks.toggle("a").await.is_err());
    assert!(h.vault.cache.is_bookmarked("a"));
}

#[tokio::test]
async fn test_rollback_only_touches_its_own_key() {
    let h = harness(Some(user("u1")));
    h.rows.seed(
        "notes",
        vec![
            note_row("a", "A", "Maths", Some("CSE"), 1),
            note_row("b", "B", "Maths", Some("CSE"), 2),
            note_row("c", "C", "Maths", Some("CSE"), 3),
        ],
    );
    h.rows.seed(BOOKMARKS_TABLE, vec![bookmark_row("u1", "b")]);
    h.vault.refresh().await.unwrap();

    // Inserts fail, deletes succeed.
    h.rows.fail(BOOKMARKS_TABLE, RowOp::Insert);
    h.rows.hold_mutations();

    let first = h.vault.bookmarks.clone();
    let second = h.vault.bookmarks.clone();
    let failing = tokio::spawn(async move { first.toggle("a").await });
    let succeeding = tokio::spawn(async move { second.toggle("b").await });

    let cache = h.vault.cache.clone();
    wait_until(|| cache.is_pending("a") && cache.is_pending("b")).await;
    assert!(h.vault.cache.is_bookmarked("a"));
    assert!(!h.vault.cache.is_bookmarked("b"));

    h.rows.release_mutations();
    assert!(succeeding.await.unwrap().is_ok());
    assert!(failing.await.unwrap().is_err());

    assert!(!h.vault.cache.is_bookmarked("a"));
    assert!(!h.vault.cache.is_bookmarked("b"));
    assert!(!h.vault.cache.is_bookmarked("c"));
    assert!(h.rows.rows(BOOKMARKS_TABLE).is_empty());
}

#[tokio::test]
async fn test_second_toggle_while_pending_is_busy() {
    let h = harness(Some(user("u1")));
    seed_scenario(&h);
    h.vault.refresh().await.unwrap();

    h.rows.hold_mutations();
    let coordinator = h.vault.bookmarks.clone();
    let task = tokio::spawn(async move { coordinator.toggle("a").await });
    let cache = h.vault.cache.clone();
    wait_until(|| cache.is_pending("a")).await;

    let err = h.vault.bookmarks.toggle("a").await.unwrap_err();
    assert!(matches!(err, Error::Busy(_)));
    assert!(h.vault.cache.is_bookmarked("a"));

    h.rows.release_mutations();
    assert!(task.await.unwrap().unwrap());
    assert_eq!(h.rows.call_count(BOOKMARKS_TABLE, RowOp::Insert), 1);
}

#[tokio::test]
async fn test_toggle_twice_restores_original() {
    let h = harness(Some(user("u1")));
    seed_scenario(&h);
    h.vault.refresh().await.unwrap();

    assert!(h.vault.bookmarks.toggle("a").await.unwrap());
    assert!(!h.vault.bookmarks.toggle("a").await.unwrap());
    assert!(!h.vault.cache.is_bookmarked("a"));
    assert!(h.rows.rows(BOOKMARKS_TABLE).is_empty());
}

#[tokio::test]
async fn test_guest_toggle_requires_login() {
    let mut h = harness(None);
    seed_scenario(&h);
    h.vault.refresh().await.unwrap();

    let err = h.vault.bookmarks.toggle("a").await.unwrap_err();
    assert!(matches!(err, Error::AuthRequired(_)));
    assert!(!h.vault.cache.is_bookmarked("a"));
    assert!(h.rows.calls().iter().all(|c| c.op == RowOp::Select));

    let types = drain_event_types(&mut h.events);
    assert!(types.contains(&"auth.login_required".to_string()));
}

#[tokio::test]
async fn test_settle_reconciles_server_drift() {
    let h = harness(Some(user("u1")));
    seed_scenario(&h);
    h.vault.refresh().await.unwrap();

    // Bookmarked from another device after the last load.
    h.rows.seed(BOOKMARKS_TABLE, vec![bookmark_row("u1", "b")]);
    assert!(!h.vault.cache.is_bookmarked("b"));

    h.vault.bookmarks.toggle("a").await.unwrap();
    assert!(h.vault.cache.is_bookmarked("a"));
    assert!(h.vault.cache.is_bookmarked("b"));
}

#[tokio::test]
async fn test_reconcile_failure_is_not_returned() {
    let h = harness(Some(user("u1")));
    seed_scenario(&h);
    h.vault.refresh().await.unwrap();

    h.rows.fail(BOOKMARKS_TABLE, RowOp::Select);
    assert!(h.vault.bookmarks.toggle("a").await.unwrap());
    assert!(h.vault.cache.is_bookmarked("a"));
    assert!(h.vault.cache.bookmarks_error().is_some());
}
