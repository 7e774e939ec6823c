use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-flight markers keyed by attempt id.
///
/// Acquisition is fetch-or-fail: a second caller for the same attempt is
/// rejected rather than queued.
#[derive(Debug, Default)]
pub struct AttemptLocks {
    in_flight: DashMap<String, Instant>,
}

impl AttemptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `attempt_id` as in flight, or return `None` if it already is.
    pub fn try_acquire(&self, attempt_id: &str) -> Option<AttemptGuard<'_>> {
        match self.in_flight.entry(attempt_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Some(AttemptGuard {
                    locks: self,
                    attempt_id: attempt_id.to_string(),
                })
            }
        }
    }

    pub fn is_locked(&self, attempt_id: &str) -> bool {
        self.in_flight.contains_key(attempt_id)
    }

    /// Number of attempts currently executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Releases the attempt's marker on drop, on every exit path.
#[derive(Debug)]
pub struct AttemptGuard<'a> {
    locks: &'a AttemptLocks,
    attempt_id: String,
}

impl AttemptGuard<'_> {
    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.locks.in_flight.remove(&self.attempt_id);
    }
}
