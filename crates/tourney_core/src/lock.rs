//! Exclusive per-tournament locks.
//!
//! Match and team creation allocate the next dense number from the current
//! maximum, so two writers on the same tournament must never interleave. A
//! [`TournamentLock`] is the proof that the holder has the tournament to itself;
//! store writes that allocate or renumber take it as an argument.
//!
//! Locks on different tournaments never block each other.

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::model::TournamentId;

/// Registry of currently held tournament locks.
///
/// Cheaply cloneable; all clones share the same set of held locks.
#[derive(Debug, Clone, Default)]
pub struct LockTable {
    inner: Arc<LockState>,
}

#[derive(Debug, Default)]
struct LockState {
    held: Mutex<HashSet<TournamentId>>,
    released: Condvar,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the tournament is free, then take it.
    pub fn acquire(&self, tournament_id: TournamentId) -> TournamentLock {
        let state = &self.inner;
        let mut held = state.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&tournament_id) {
            held = state
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(tournament_id);

        TournamentLock {
            tournament_id,
            table: Arc::clone(&self.inner),
        }
    }

    /// Take the tournament only if nobody holds it
    pub fn try_acquire(&self, tournament_id: TournamentId) -> Option<TournamentLock> {
        let mut held = self
            .inner
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !held.insert(tournament_id) {
            return None;
        }
        Some(TournamentLock {
            tournament_id,
            table: Arc::clone(&self.inner),
        })
    }

    pub fn is_locked(&self, tournament_id: TournamentId) -> bool {
        self.inner
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&tournament_id)
    }
}

/// Exclusive hold on one tournament. Released on drop, whatever the exit path.
#[derive(Debug)]
#[must_use = "the tournament is unlocked as soon as the guard is dropped"]
pub struct TournamentLock {
    tournament_id: TournamentId,
    table: Arc<LockState>,
}

impl TournamentLock {
    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }
}

impl Drop for TournamentLock {
    fn drop(&mut self) {
        let mut held = self
            .table
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.tournament_id);
        drop(held);
        self.table.released.notify_all();
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod lock_tests;
