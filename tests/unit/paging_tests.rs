/// Pagination store behavior through the public API
use std::sync::Arc;

use chrono::Duration;
use yahoo_map_mcp::*;

fn store() -> (Arc<ManualClock>, PaginationStore) {
    let clock = Arc::new(ManualClock::default());
    let store = PaginationStore::new(clock.clone(), Duration::minutes(5));
    (clock, store)
}

#[test]
fn test_reads_then_reset() {
    let (_, store) = store();
    let key = PagingKey::new("s1", "q1");

    let first = store.get_and_advance(&key, 10, false, None);
    let second = store.get_and_advance(&key, 10, false, None);
    let reset = store.get_and_advance(&key, 10, true, None);

    assert_eq!((first.offset, first.next_offset), (0, 10));
    assert_eq!((second.offset, second.next_offset), (10, 20));
    assert_eq!((reset.offset, reset.next_offset), (0, 10));
}

#[test]
fn test_explicit_offset_sets_stored_next() {
    let (_, store) = store();
    let key = PagingKey::new("s1", "q1");

    store.get_and_advance(&key, 10, false, None);
    let jumped = store.get_and_advance(&key, 10, false, Some(55));
    let after = store.get_and_advance(&key, 10, false, None);

    assert_eq!(jumped.offset, 55);
    assert_eq!(after.offset, 65);
}

#[test]
fn test_idle_session_expires() {
    let (clock, store) = store();
    let key = PagingKey::new("s1", "q1");

    store.get_and_advance(&key, 10, false, None);
    clock.advance(Duration::minutes(5) + Duration::seconds(1));

    assert!(store.peek(&key).is_none());
    assert_eq!(store.purge_expired(), 1);
    assert_eq!(store.get_and_advance(&key, 10, false, None).offset, 0);
}

#[test]
fn test_clear_session_keeps_other_sessions() {
    let (_, store) = store();
    store.get_and_advance(&PagingKey::new("a", "q1"), 10, false, None);
    store.get_and_advance(&PagingKey::new("a", "q2"), 10, false, None);
    store.get_and_advance(&PagingKey::new("b", "q1"), 10, false, None);

    assert_eq!(store.clear_session("a"), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.peek(&PagingKey::new("b", "q1")).map(|s| s.offset), Some(10));
}

#[test]
fn test_fingerprint_from_params_shares_cursor_across_paging_controls() {
    let (_, store) = store();
    let plain = LocalSearchParams {
        query: Some("ramen".to_string()),
        session_id: Some("s1".to_string()),
        ..Default::default()
    };
    let with_controls = LocalSearchParams {
        results: Some(20),
        reset: Some(false),
        ..plain.clone()
    };

    let first = tools::build_local_search_query(&plain, "key", &store).unwrap();
    let second = tools::build_local_search_query(&with_controls, "key", &store).unwrap();

    assert_eq!(first.query.start, 1);
    assert_eq!(second.query.start, 11);
    assert_eq!(second.next_offset, Some(30));
}
