//! Loading flags held for the duration of a generation call

use super::{lock_state, SessionState};
use std::sync::Mutex;

/// Marks a section as loading until dropped
///
/// Calls on one section are counted, so the flag stays set until the last
/// overlapping call finishes. Dropping on any path (success, error, panic
/// unwind) clears this call's share.
pub(crate) struct LoadingGuard<'a> {
    state: &'a Mutex<SessionState>,
    id: String,
}

impl<'a> LoadingGuard<'a> {
    /// Register one in-flight call for `id`
    pub(crate) fn acquire(state: &'a Mutex<SessionState>, id: &str) -> Self {
        lock_state(state).begin_loading(id);
        Self {
            state,
            id: id.to_string(),
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock_state(self.state).end_loading(&self.id);
    }
}
