//! Storage error types

use thiserror::Error;

use crate::model::{MatchId, TeamId, TournamentId};

/// Errors raised by a [`crate::TournamentStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tournament {0} not found")]
    TournamentNotFound(TournamentId),

    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("team {team} does not belong to tournament {tournament}")]
    TeamNotInTournament {
        team: TeamId,
        tournament: TournamentId,
    },

    #[error("team {team} does not play in match {match_id}")]
    TeamNotInMatch { team: TeamId, match_id: MatchId },

    #[error("invalid match: {0}")]
    InvalidMatch(String),

    #[error("lock held for tournament {held} cannot write to tournament {target}")]
    LockMismatch {
        held: TournamentId,
        target: TournamentId,
    },

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
