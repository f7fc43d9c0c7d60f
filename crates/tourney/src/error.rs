//! Errors returned by admin actions

use thiserror::Error;

use tourney_core::{StoreError, TournamentStatus};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("cannot {action} a tournament that is {status}")]
    InvalidStatus {
        action: &'static str,
        status: TournamentStatus,
    },

    #[error("set the number of matches per team before enabling automatic match creation")]
    MatchCapRequired,

    #[error("the number of matches per team must be positive")]
    InvalidMatchCap,

    #[error("a match needs at least two teams, got {0}")]
    NotEnoughTeams(usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}
