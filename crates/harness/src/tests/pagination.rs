use super::helpers::{server_error, ScriptedPages};
use crate::pagination::{fetch_all, Completion, Cursor, FetchState, Page, DEFAULT_MAX_ERRORS};

fn numbers(range: std::ops::Range<u32>) -> Vec<u32> {
    range.collect()
}

#[test]
fn test_initial_state_requests_null_cursor() {
    let state = FetchState::new(DEFAULT_MAX_ERRORS);

    assert!(state.is_running(), "A fresh enumeration must request at least one page");
    assert_eq!(state.cursor(), &Cursor::Start);
    assert_eq!(state.cursor().as_variable(), None);
    assert_eq!(state.error_count(), 0);
}

#[test]
fn test_successful_page_advances_cursor() {
    let state = FetchState::new(3);

    let (state, items) = state.advance(Ok(Page::new(vec![1, 2], Some("next".to_string()))));

    assert_eq!(items, vec![1, 2]);
    assert_eq!(state.cursor(), &Cursor::Next("next".to_string()));
    assert_eq!(state.cursor().as_variable(), Some("next"));
    assert!(state.is_running());
}

#[test]
fn test_failed_page_keeps_cursor() {
    let (state, _) = FetchState::new(3).advance(Ok(Page::new(vec![1], Some("page-2".to_string()))));

    let (state, items) = state.advance::<u32>(Err(server_error()));

    assert!(items.is_empty());
    assert_eq!(state.error_count(), 1);
    assert_eq!(state.cursor(), &Cursor::Next("page-2".to_string()), "Same page must be retried");
    assert!(state.is_running());
}

#[test]
fn test_null_cursor_ends_enumeration() {
    let (state, items) = FetchState::new(3).advance(Ok(Page::last(vec![7])));

    assert_eq!(items, vec![7]);
    assert_eq!(state.cursor(), &Cursor::End);
    assert!(!state.is_running());
}

#[test]
fn test_error_ceiling_stops_enumeration() {
    let mut state = FetchState::new(3);
    for _ in 0..3 {
        assert!(state.is_running());
        state = state.advance::<u32>(Err(server_error())).0;
    }

    assert!(!state.is_running());
    assert_eq!(state.error_count(), 3);
}

#[tracing_test::traced_test]
#[tokio::test]
async fn test_two_pages_return_all_items_in_order() {
    let source = ScriptedPages::new(vec![
        Ok(Page::new(numbers(0..100), Some("cursor-1".to_string()))),
        Ok(Page::last(numbers(100..150))),
    ]);

    let fetched = fetch_all(&source, DEFAULT_MAX_ERRORS).await;

    assert_eq!(fetched.items.len(), 150);
    assert_eq!(fetched.items, numbers(0..150));
    assert_eq!(fetched.completion, Completion::Exhausted);
    assert_eq!(fetched.errors, 0);
    assert!(fetched.is_complete());
    assert_eq!(
        source.requested_cursors(),
        vec![None, Some("cursor-1".to_string())],
        "Should stop exactly at the page with a null cursor"
    );
}

#[tracing_test::traced_test]
#[tokio::test]
async fn test_three_failures_on_second_page_truncate_silently() {
    let source = ScriptedPages::new(vec![
        Ok(Page::new(numbers(0..100), Some("page-2".to_string()))),
        Err(server_error()),
        Err(server_error()),
        Err(server_error()),
        Ok(Page::new(numbers(100..200), Some("page-3".to_string()))),
        Ok(Page::last(numbers(200..250))),
    ]);

    let fetched = fetch_all(&source, 3).await;

    assert_eq!(fetched.items, numbers(0..100), "Only page 1 should be returned");
    assert_eq!(fetched.completion, Completion::Truncated);
    assert_eq!(fetched.errors, 3);
    assert!(!fetched.is_complete());
    assert_eq!(
        source.requested_cursors(),
        vec![
            None,
            Some("page-2".to_string()),
            Some("page-2".to_string()),
            Some("page-2".to_string()),
        ]
    );
    assert!(logs_contain("gave up after 3 failed requests"));
}

#[tokio::test]
async fn test_failure_below_ceiling_retries_same_page() {
    let source = ScriptedPages::new(vec![
        Ok(Page::new(vec![1, 2], Some("page-2".to_string()))),
        Err(server_error()),
        Ok(Page::last(vec![3])),
    ]);

    let fetched = fetch_all(&source, 3).await;

    assert_eq!(fetched.items, vec![1, 2, 3]);
    assert_eq!(fetched.completion, Completion::Exhausted);
    assert_eq!(fetched.errors, 1, "Recovered errors are still counted");
    assert_eq!(
        source.requested_cursors(),
        vec![None, Some("page-2".to_string()), Some("page-2".to_string())]
    );
}

#[tokio::test]
async fn test_errors_are_counted_across_pages() {
    // Two failures on page 1 and one on page 2 still reach the ceiling.
    let source = ScriptedPages::new(vec![
        Err(server_error()),
        Err(server_error()),
        Ok(Page::new(vec![1], Some("page-2".to_string()))),
        Err(server_error()),
        Ok(Page::last(vec![2])),
    ]);

    let fetched = fetch_all(&source, 3).await;

    assert_eq!(fetched.items, vec![1]);
    assert_eq!(fetched.completion, Completion::Truncated);
    assert_eq!(source.requested_cursors().len(), 4);
}

#[tokio::test]
async fn test_empty_last_page() {
    let source = ScriptedPages::<u32>::new(vec![Ok(Page::last(Vec::new()))]);

    let fetched = fetch_all(&source, 3).await;

    assert!(fetched.items.is_empty());
    assert_eq!(fetched.completion, Completion::Exhausted);
    assert_eq!(source.requested_cursors(), vec![None]);
}

#[tokio::test]
async fn test_first_page_never_succeeds() {
    let source = ScriptedPages::<u32>::new(vec![]);

    let fetched = fetch_all(&source, 3).await;

    assert!(fetched.items.is_empty());
    assert_eq!(fetched.completion, Completion::Truncated);
    assert_eq!(source.requested_cursors(), vec![None, None, None]);
}
