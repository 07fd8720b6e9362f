//! Paging through the catalog with BrowseState.

mod common;

use common::{bookmark_row, harness, note_row, user};
use notevault_client::BrowseState;
use notevault_core::defaults::{BOOKMARKS_TABLE, NOTES_TABLE};
use notevault_core::{Category, Error, RowFilter, RowStore};

async fn fourteen_notes() -> common::Harness {
    let h = harness(None);
    h.rows.seed(
        NOTES_TABLE,
        (0..14u32).map(|i| note_row(&format!("n{:02}", i), &format!("Unit {}", i), "Maths", Some("CSE"), i)),
    );
    h.vault.cache.load_notes().await.unwrap();
    h
}

#[tokio::test]
async fn test_fourteen_notes_make_three_pages() {
    let h = fourteen_notes().await;
    let mut browse = BrowseState::new(6);
    assert_eq!(browse.total_pages(&h.vault.cache), 3);

    browse.go_to_page(&h.vault.cache, 3).unwrap();
    let last = browse.view(&h.vault.cache);
    assert_eq!(last.items.len(), 2);
    assert!(!last.has_next());
    assert!(last.has_previous());

    let err = browse.go_to_page(&h.vault.cache, 4).unwrap_err();
    assert!(matches!(
        err,
        Error::PageOutOfRange {
            requested: 4,
            total_pages: 3
        }
    ));
    assert_eq!(browse.page(), 3);

    assert!(browse.go_to_page(&h.vault.cache, 0).is_err());
    assert_eq!(browse.page(), 3);
    assert!(browse.next_page(&h.vault.cache).is_err());
}

#[tokio::test]
async fn test_pages_reconstruct_results_in_order() {
    let h = fourteen_notes().await;
    let mut browse = BrowseState::new(6);

    let mut seen = Vec::new();
    loop {
        let view = browse.view(&h.vault.cache);
        assert!(view.items.len() <= 6);
        seen.extend(view.items.into_iter().map(|n| n.id));
        if browse.next_page(&h.vault.cache).is_err() {
            break;
        }
    }
    let expected: Vec<String> = h.vault.cache.notes().into_iter().map(|n| n.id).collect();
    assert_eq!(seen, expected);
    assert_eq!(seen.first().map(String::as_str), Some("n13"));
}

#[tokio::test]
async fn test_changing_query_or_category_resets_page() {
    let h = fourteen_notes().await;
    let mut browse = BrowseState::new(6);
    browse.go_to_page(&h.vault.cache, 2).unwrap();

    browse.set_query("unit 1");
    assert_eq!(browse.page(), 1);
    // "unit 1" hits Unit 1 and Unit 10..13.
    assert_eq!(browse.view(&h.vault.cache).total_results, 5);

    browse.go_to_page(&h.vault.cache, 1).unwrap();
    browse.set_query("");
    browse.go_to_page(&h.vault.cache, 3).unwrap();
    browse.set_category(Category::Community);
    assert_eq!(browse.page(), 1);

    let empty = browse.view(&h.vault.cache);
    assert!(empty.is_empty());
    assert_eq!(empty.total_pages, 0);
    // Page 1 of the empty state is still addressable; page 2 is not.
    assert!(browse.go_to_page(&h.vault.cache, 1).is_ok());
    assert!(browse.go_to_page(&h.vault.cache, 2).is_err());
    assert!(browse.previous_page(&h.vault.cache).is_err());
}

#[tokio::test]
async fn test_same_query_keeps_page() {
    let h = fourteen_notes().await;
    let mut browse = BrowseState::new(6);
    browse.set_query("unit");
    browse.go_to_page(&h.vault.cache, 2).unwrap();
    browse.set_query("unit");
    assert_eq!(browse.page(), 2);
}

#[tokio::test]
async fn test_page_follows_shrinking_bookmark_view() {
    let h = harness(Some(user("u1")));
    h.rows.seed(
        NOTES_TABLE,
        (0..7u32).map(|i| note_row(&format!("n{}", i), &format!("Unit {}", i), "Maths", Some("CSE"), i)),
    );
    h.rows.seed(
        BOOKMARKS_TABLE,
        (0..7u32).map(|i| bookmark_row("u1", &format!("n{}", i))),
    );
    h.vault.refresh().await.unwrap();

    let mut browse = BrowseState::new(6);
    browse.set_category(Category::Bookmarked);
    browse.go_to_page(&h.vault.cache, 2).unwrap();
    assert_eq!(browse.view(&h.vault.cache).items[0].id, "n0");

    // Unbookmarking the only note on page 2 leaves a single page.
    assert!(!h.vault.bookmarks.toggle("n0").await.unwrap());

    let view = browse.view(&h.vault.cache);
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.page, 1);
    assert_eq!(view.items.len(), 6);
    assert_eq!(browse.page(), 1);
    let current = browse.page();
    assert!(browse.go_to_page(&h.vault.cache, current).is_ok());
}

#[tokio::test]
async fn test_page_clamps_after_delete_and_empty_reload() {
    let h = fourteen_notes().await;
    let mut browse = BrowseState::new(6);
    browse.go_to_page(&h.vault.cache, 3).unwrap();

    h.vault.cache.remove_note("n00");
    h.vault.cache.remove_note("n01");
    assert_eq!(browse.sync(&h.vault.cache), 2);

    h.rows.delete(NOTES_TABLE, &[RowFilter::neq("id", "")]).await.unwrap();
    h.vault.cache.load_notes().await.unwrap();
    let view = browse.view(&h.vault.cache);
    assert!(view.is_empty());
    assert_eq!(browse.page(), 1);
    assert!(browse.previous_page(&h.vault.cache).is_err());
}
