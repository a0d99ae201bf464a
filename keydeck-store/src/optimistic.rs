//! Optimistic updates with snapshot rollback.

use tracing::debug;

/// An optimistic change that has been applied locally but not confirmed.
///
/// Created by [`Optimistic::apply`], which snapshots the state before
/// mutating it. Settle with [`Optimistic::commit`] once the backend
/// accepts the change, or [`Optimistic::rollback`] to restore the snapshot
/// exactly.
#[derive(Debug)]
#[must_use = "an optimistic change must be committed or rolled back"]
pub struct Optimistic<T> {
    snapshot: T,
}

impl<T: Clone> Optimistic<T> {
    /// Snapshots `state`, then applies `change` to it.
    pub fn apply(state: &mut T, change: impl FnOnce(&mut T)) -> Self {
        let snapshot = state.clone();
        change(state);
        Self { snapshot }
    }

    /// State as it was before the change.
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// Keeps the applied change.
    pub fn commit(self) {
        debug!("Optimistic change committed");
    }

    /// Restores the snapshot into `state`.
    pub fn rollback(self, state: &mut T) {
        debug!("Optimistic change rolled back");
        *state = self.snapshot;
    }
}
