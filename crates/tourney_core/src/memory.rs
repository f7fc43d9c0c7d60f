//! Embedded in-process store.
//!
//! Holds every record in memory behind a read-write lock and serializes
//! allocation through a [`LockTable`]. The whole state can be saved to and
//! loaded from a JSON snapshot.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::lock::{LockTable, TournamentLock};
use crate::model::{Match, MatchId, NewMatch, Score, Team, TeamId, Tournament, TournamentId};
use crate::store::TournamentStore;

/// Serializable contents of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tournaments: Vec<Tournament>,
    pub teams: Vec<Team>,
    pub matches: Vec<Match>,
    /// Kept in recording order
    pub scores: Vec<Score>,
}

/// In-memory [`TournamentStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Snapshot>,
    locks: LockTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            tables: RwLock::new(snapshot),
            locks: LockTable::new(),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    /// Load a store from a JSON snapshot file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Snapshot(format!("failed to read {}: {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Snapshot(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Save the store to a JSON snapshot file
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&*self.read())
            .map_err(|e| StoreError::Snapshot(format!("failed to serialize: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| StoreError::Snapshot(format!("failed to write {}: {}", path.display(), e)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_lock(lock: &TournamentLock, target: TournamentId) -> StoreResult<()> {
    if lock.tournament_id() != target {
        return Err(StoreError::LockMismatch {
            held: lock.tournament_id(),
            target,
        });
    }
    Ok(())
}

impl Snapshot {
    fn has_tournament(&self, id: TournamentId) -> bool {
        self.tournaments.iter().any(|t| t.id == id)
    }

    fn ensure_tournament(&self, id: TournamentId) -> StoreResult<()> {
        if self.has_tournament(id) {
            Ok(())
        } else {
            Err(StoreError::TournamentNotFound(id))
        }
    }

    fn find_team(&self, id: TeamId) -> StoreResult<&Team> {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::TeamNotFound(id))
    }

    fn find_match(&self, id: MatchId) -> StoreResult<&Match> {
        self.matches
            .iter()
            .find(|m| m.id == id)
            .ok_or(StoreError::MatchNotFound(id))
    }

    fn renumber_teams(&mut self, tournament_id: TournamentId) {
        let mut teams: Vec<&mut Team> = self
            .teams
            .iter_mut()
            .filter(|t| t.tournament_id == tournament_id)
            .collect();
        teams.sort_by_key(|t| t.number);
        for (team, number) in teams.into_iter().zip(1..) {
            team.number = number;
        }
    }

    fn renumber_matches(&mut self, tournament_id: TournamentId) {
        let mut matches: Vec<&mut Match> = self
            .matches
            .iter_mut()
            .filter(|m| m.tournament_id == tournament_id)
            .collect();
        matches.sort_by_key(|m| m.ordering);
        for (m, ordering) in matches.into_iter().zip(1..) {
            m.ordering = ordering;
        }
    }
}

impl TournamentStore for MemoryStore {
    fn tournament(&self, id: TournamentId) -> StoreResult<Tournament> {
        self.read()
            .tournaments
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::TournamentNotFound(id))
    }

    fn insert_tournament(&self, tournament: Tournament) -> StoreResult<()> {
        let mut tables = self.write();
        tables.tournaments.retain(|t| t.id != tournament.id);
        tables.tournaments.push(tournament);
        Ok(())
    }

    fn save_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let mut tables = self.write();
        let stored = tables
            .tournaments
            .iter_mut()
            .find(|t| t.id == tournament.id)
            .ok_or(StoreError::TournamentNotFound(tournament.id))?;
        *stored = tournament.clone();
        Ok(())
    }

    fn lock_tournament(&self, id: TournamentId) -> StoreResult<TournamentLock> {
        self.read().ensure_tournament(id)?;
        Ok(self.locks.acquire(id))
    }

    fn teams(&self, id: TournamentId) -> StoreResult<Vec<Team>> {
        let tables = self.read();
        tables.ensure_tournament(id)?;
        let mut teams: Vec<Team> = tables
            .teams
            .iter()
            .filter(|t| t.tournament_id == id)
            .cloned()
            .collect();
        teams.sort_by_key(|t| t.number);
        Ok(teams)
    }

    fn team(&self, id: TeamId) -> StoreResult<Team> {
        self.read().find_team(id).cloned()
    }

    fn insert_team(&self, lock: &TournamentLock, name: &str) -> StoreResult<Team> {
        let tournament_id = lock.tournament_id();
        let mut tables = self.write();
        tables.ensure_tournament(tournament_id)?;

        let last = tables
            .teams
            .iter()
            .filter(|t| t.tournament_id == tournament_id)
            .map(|t| t.number)
            .max()
            .unwrap_or(0);
        let team = Team {
            id: TeamId::generate(),
            tournament_id,
            name: name.to_string(),
            number: last + 1,
            created_at: Utc::now(),
        };
        tables.teams.push(team.clone());
        Ok(team)
    }

    fn delete_team(&self, lock: &TournamentLock, id: TeamId) -> StoreResult<()> {
        let mut tables = self.write();
        let tournament_id = tables.find_team(id)?.tournament_id;
        check_lock(lock, tournament_id)?;

        tables.teams.retain(|t| t.id != id);
        tables.scores.retain(|s| s.team_id != id);
        for m in tables.matches.iter_mut() {
            m.teams.retain(|&t| t != id);
        }
        tables.renumber_teams(tournament_id);
        Ok(())
    }

    fn matches(&self, id: TournamentId) -> StoreResult<Vec<Match>> {
        let tables = self.read();
        tables.ensure_tournament(id)?;
        let mut matches: Vec<Match> = tables
            .matches
            .iter()
            .filter(|m| m.tournament_id == id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.ordering);
        Ok(matches)
    }

    fn get_match(&self, id: MatchId) -> StoreResult<Match> {
        self.read().find_match(id).cloned()
    }

    fn insert_match(&self, lock: &TournamentLock, new_match: NewMatch) -> StoreResult<Match> {
        check_lock(lock, new_match.tournament_id)?;
        let tournament_id = new_match.tournament_id;

        let mut tables = self.write();
        tables.ensure_tournament(tournament_id)?;

        match new_match.teams.as_slice() {
            [a, b] if a != b => {}
            [_, _] => {
                return Err(StoreError::InvalidMatch(
                    "a team cannot play against itself".to_string(),
                ))
            }
            teams => {
                return Err(StoreError::InvalidMatch(format!(
                    "a match needs exactly two teams, got {}",
                    teams.len()
                )))
            }
        }
        for &team_id in &new_match.teams {
            if tables.find_team(team_id)?.tournament_id != tournament_id {
                return Err(StoreError::TeamNotInTournament {
                    team: team_id,
                    tournament: tournament_id,
                });
            }
        }

        let last = tables
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .map(|m| m.ordering)
            .max()
            .unwrap_or(0);
        let created = Match {
            id: MatchId::generate(),
            tournament_id,
            ordering: last + 1,
            status: new_match.status,
            teams: new_match.teams,
            date_start: new_match.date_start,
            date_end: None,
            location: new_match.location,
            details: new_match.details,
            created_at: Utc::now(),
        };
        tables.matches.push(created.clone());
        Ok(created)
    }

    fn save_match(&self, m: &Match) -> StoreResult<()> {
        let mut tables = self.write();
        let stored = tables
            .matches
            .iter_mut()
            .find(|s| s.id == m.id)
            .ok_or(StoreError::MatchNotFound(m.id))?;
        // Ordering and teams belong to the store
        stored.status = m.status;
        stored.date_start = m.date_start;
        stored.date_end = m.date_end;
        stored.location = m.location.clone();
        stored.details = m.details.clone();
        Ok(())
    }

    fn delete_match(&self, lock: &TournamentLock, id: MatchId) -> StoreResult<()> {
        let mut tables = self.write();
        let tournament_id = tables.find_match(id)?.tournament_id;
        check_lock(lock, tournament_id)?;

        tables.matches.retain(|m| m.id != id);
        tables.scores.retain(|s| s.match_id != id);
        tables.renumber_matches(tournament_id);
        Ok(())
    }

    fn scores(&self, match_id: MatchId) -> StoreResult<Vec<Score>> {
        let tables = self.read();
        let m = tables.find_match(match_id)?;
        Ok(tables
            .scores
            .iter()
            .filter(|s| s.match_id == match_id && m.has_team(s.team_id))
            .cloned()
            .collect())
    }

    fn upsert_score(&self, match_id: MatchId, team_id: TeamId, value: i32) -> StoreResult<()> {
        let mut tables = self.write();
        if !tables.find_match(match_id)?.has_team(team_id) {
            return Err(StoreError::TeamNotInMatch {
                team: team_id,
                match_id,
            });
        }

        match tables
            .scores
            .iter_mut()
            .find(|s| s.match_id == match_id && s.team_id == team_id)
        {
            Some(existing) => existing.value = value,
            None => tables.scores.push(Score {
                match_id,
                team_id,
                value,
            }),
        }
        Ok(())
    }

    fn delete_score(&self, match_id: MatchId, team_id: TeamId) -> StoreResult<bool> {
        let mut tables = self.write();
        tables.find_match(match_id)?;
        let before = tables.scores.len();
        tables
            .scores
            .retain(|s| !(s.match_id == match_id && s.team_id == team_id));
        Ok(tables.scores.len() != before)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
