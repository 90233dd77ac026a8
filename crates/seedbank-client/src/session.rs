use std::sync::Arc;

use parking_lot::RwLock;

use crate::credential::AuthToken;

/// The credential and filter last negotiated with the seed bank.
///
/// Snapshots are immutable; the client publishes a new one on every successful
/// exchange, so a reader always sees a matching pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<AuthToken>,
    pub filter: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct SessionCell {
    current: RwLock<Arc<SessionState>>,
}

impl SessionCell {
    pub(crate) fn load(&self) -> Arc<SessionState> {
        Arc::clone(&self.current.read())
    }

    /// Copy-on-write update of the current snapshot.
    pub(crate) fn update(&self, apply: impl FnOnce(&mut SessionState)) -> Arc<SessionState> {
        let mut guard = self.current.write();
        let mut next = SessionState::clone(&guard);
        apply(&mut next);
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        next
    }
}
