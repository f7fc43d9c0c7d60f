//! The storage contract the ranking and scheduling engine works against.

use crate::error::StoreResult;
use crate::lock::TournamentLock;
use crate::model::{Match, MatchId, NewMatch, Score, Team, TeamId, Tournament, TournamentId};

/// Queryable team/match/score store keyed by tournament.
///
/// Writes that allocate or renumber dense sequences (team numbers, match
/// orderings) require a [`TournamentLock`] for the tournament they touch, so
/// the read-max-then-insert step can never race with another writer.
pub trait TournamentStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Tournaments
    // -------------------------------------------------------------------------

    fn tournament(&self, id: TournamentId) -> StoreResult<Tournament>;

    fn insert_tournament(&self, tournament: Tournament) -> StoreResult<()>;

    /// Overwrite the settings and status of an existing tournament
    fn save_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    /// Take the tournament's exclusive lock, blocking until it is free
    fn lock_tournament(&self, id: TournamentId) -> StoreResult<TournamentLock>;

    // -------------------------------------------------------------------------
    // Teams
    // -------------------------------------------------------------------------

    /// Teams of a tournament, ordered by number
    fn teams(&self, id: TournamentId) -> StoreResult<Vec<Team>>;

    fn team(&self, id: TeamId) -> StoreResult<Team>;

    /// Add a team numbered after the current last one
    fn insert_team(&self, lock: &TournamentLock, name: &str) -> StoreResult<Team>;

    /// Remove a team with its scores and match memberships, then renumber the
    /// remaining teams 1..N
    fn delete_team(&self, lock: &TournamentLock, id: TeamId) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Matches
    // -------------------------------------------------------------------------

    /// Matches of a tournament, ordered by ordering
    fn matches(&self, id: TournamentId) -> StoreResult<Vec<Match>>;

    fn get_match(&self, id: MatchId) -> StoreResult<Match>;

    /// Create a match with `ordering = max + 1` (1 for the first match).
    ///
    /// The match must oppose exactly two distinct teams of its tournament.
    fn insert_match(&self, lock: &TournamentLock, new_match: NewMatch) -> StoreResult<Match>;

    /// Persist status, timestamps and descriptive fields of an existing match
    fn save_match(&self, m: &Match) -> StoreResult<()>;

    /// Remove a match and its scores, then renumber the remaining matches 1..N
    fn delete_match(&self, lock: &TournamentLock, id: MatchId) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Scores
    // -------------------------------------------------------------------------

    /// Scores of a match in the order they were first recorded
    fn scores(&self, match_id: MatchId) -> StoreResult<Vec<Score>>;

    /// Create or overwrite the score of a team in a match
    fn upsert_score(&self, match_id: MatchId, team_id: TeamId, value: i32) -> StoreResult<()>;

    /// Remove the score of a team in a match. Returns whether one existed.
    fn delete_score(&self, match_id: MatchId, team_id: TeamId) -> StoreResult<bool>;
}
