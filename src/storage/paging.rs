/// Session-scoped pagination cursors
///
/// Each (session, query fingerprint) pair owns a cursor holding the offset the
/// next page starts at. Cursors expire lazily: an entry idle for longer than
/// the TTL is treated as absent the next time it is touched, and
/// [`PaginationStore::purge_expired`] can be run periodically to drop them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::storage::{Clock, SystemClock};

/// Idle time after which a cursor is forgotten
pub const DEFAULT_PAGING_TTL_SECS: i64 = 5 * 60;

/// Default TTL as a chrono duration
pub fn default_paging_ttl() -> Duration {
    Duration::seconds(DEFAULT_PAGING_TTL_SECS)
}

/// Identity of a resumable search
///
/// Two searches in the same session only share a cursor when their
/// fingerprints match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PagingKey {
    pub session_id: String,
    pub fingerprint: String,
}

impl PagingKey {
    pub fn new(session_id: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

/// Stored cursor for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingState {
    /// Offset the next read starts at
    pub offset: u64,
    /// Last time the cursor was read
    pub updated_at: DateTime<Utc>,
}

/// Offsets handed out by a single read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Offset this page starts at
    pub offset: u64,
    /// Offset the following page will start at
    pub next_offset: u64,
}

type Slot = Arc<Mutex<Option<PagingState>>>;

/// Process-wide pagination cursor store
///
/// Reads of the same key are serialized through a per-key mutex, so two
/// concurrent calls for one search never receive the same page. Different
/// keys only contend on the short map lookup.
///
/// Slot handles are only cloned while the map lock is held, which lets the
/// maintenance operations tell whether a slot is in use by looking at its
/// reference count.
#[derive(Debug)]
pub struct PaginationStore {
    slots: Mutex<HashMap<PagingKey, Slot>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PaginationStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    /// Store backed by the wall clock and the default TTL
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock), default_paging_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the current page for `key` and move the cursor past it
    ///
    /// An expired cursor counts as absent. `reset` discards the stored cursor
    /// first, and an explicit offset always wins over whatever is stored. The
    /// store keeps the offset to resume from, not the one just returned.
    pub fn get_and_advance(
        &self,
        key: &PagingKey,
        page_size: u32,
        reset: bool,
        explicit_offset: Option<u64>,
    ) -> PageCursor {
        let slot = self.slot(key);
        let mut state = lock_slot(&slot);
        let now = self.clock.now();

        if state.as_ref().is_some_and(|s| self.is_expired(s, now)) {
            debug!(session_id = %key.session_id, "paging cursor expired");
            *state = None;
        }
        if reset {
            *state = None;
        }

        let offset = explicit_offset
            .or_else(|| state.as_ref().map(|s| s.offset))
            .unwrap_or(0);
        let next_offset = offset.saturating_add(u64::from(page_size));

        *state = Some(PagingState {
            offset: next_offset,
            updated_at: now,
        });

        debug!(
            session_id = %key.session_id,
            offset,
            next_offset,
            reset,
            "advanced paging cursor"
        );

        PageCursor { offset, next_offset }
    }

    /// Stored cursor for `key`, if one exists and has not expired
    pub fn peek(&self, key: &PagingKey) -> Option<PagingState> {
        let slot = lock(&self.slots).get(key).cloned()?;
        let now = self.clock.now();
        let state = *lock_slot(&slot);
        state.filter(|s| !self.is_expired(s, now))
    }

    /// Forget every cursor belonging to `session_id`
    ///
    /// Returns the number of entries removed.
    pub fn clear_session(&self, session_id: &str) -> usize {
        let mut slots = lock(&self.slots);
        let before = slots.len();
        slots.retain(|key, slot| {
            if key.session_id != session_id {
                return true;
            }
            *lock_slot(slot) = None;
            Arc::strong_count(slot) > 1
        });
        let removed = before - slots.len();
        debug!(session_id, removed, "cleared paging session");
        removed
    }

    /// Drop every expired cursor
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut slots = lock(&self.slots);
        let before = slots.len();
        slots.retain(|_, slot| {
            let mut state = lock_slot(slot);
            if state.as_ref().is_some_and(|s| self.is_expired(s, now)) {
                *state = None;
            }
            state.is_some() || Arc::strong_count(slot) > 1
        });
        before - slots.len()
    }

    /// Number of live (unexpired) cursors
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let slots = lock(&self.slots);
        slots
            .values()
            .filter(|slot| lock_slot(slot).as_ref().is_some_and(|s| !self.is_expired(s, now)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &PagingKey) -> Slot {
        let mut slots = lock(&self.slots);
        slots.entry(key.clone()).or_default().clone()
    }

    fn is_expired(&self, state: &PagingState, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(state.updated_at) > self.ttl
    }
}

impl Default for PaginationStore {
    fn default() -> Self {
        Self::with_system_clock()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<PagingState>> {
    lock(&**slot)
}
