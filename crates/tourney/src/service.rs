//! Admin actions on a tournament.
//!
//! This is the layer a request handler talks to. Any action that finishes a
//! match runs a scheduling pass through the tournament's sport controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::info;

use tourney_core::{
    Match, MatchId, MatchStatus, NewMatch, Sport, StoreError, Team, TeamId, Tournament,
    TournamentId, TournamentStatus, TournamentStore,
};

use crate::controller::{ControllerRegistry, SportController};
use crate::error::ActionError;
use crate::ranking::RankingStrategy;
use crate::scheduler::SchedulingStrategy;
use crate::status;

pub type ActionResult<T> = Result<T, ActionError>;

/// A match after an update, with the matches the update caused to be created
#[derive(Debug, Clone)]
pub struct MatchUpdate {
    pub updated: Match,
    pub scheduled: Vec<Match>,
}

/// One line of the team list shown when composing a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOverview {
    pub team: Team,
    pub match_count: u32,
    pub rank: u32,
    pub points: u32,
}

/// Admin operations over a store
pub struct TournamentService<S: TournamentStore> {
    store: S,
    registry: ControllerRegistry,
    update_statuses: bool,
}

impl<S: TournamentStore> TournamentService<S> {
    pub fn new(store: S, registry: ControllerRegistry) -> Self {
        Self {
            store,
            registry,
            update_statuses: true,
        }
    }

    /// Whether scheduling passes triggered here start the matches they create
    pub fn with_update_statuses(mut self, update_statuses: bool) -> Self {
        self.update_statuses = update_statuses;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn controller(&self, tournament: &Tournament) -> Arc<dyn SportController> {
        self.registry.for_tournament(tournament)
    }

    // =========================================================================
    // Tournament lifecycle
    // =========================================================================

    pub fn create_tournament(&self, name: &str, sport: Sport) -> ActionResult<Tournament> {
        let tournament = Tournament::new(name, sport);
        self.store.insert_tournament(tournament.clone())?;
        info!("Created tournament {} ({})", tournament.name, tournament.id);
        Ok(tournament)
    }

    pub fn publish(&self, tournament_id: TournamentId) -> ActionResult<Tournament> {
        let mut tournament = self.store.tournament(tournament_id)?;
        if tournament.status != TournamentStatus::Draft {
            return Err(ActionError::InvalidStatus {
                action: "publish",
                status: tournament.status,
            });
        }
        tournament.status = TournamentStatus::Published;
        self.store.save_tournament(&tournament)?;
        info!("Published tournament {}", tournament.name);
        Ok(tournament)
    }

    /// Start the tournament and create its first matches
    pub fn start(&self, tournament_id: TournamentId) -> ActionResult<Vec<Match>> {
        let mut tournament = self.store.tournament(tournament_id)?;
        if !matches!(
            tournament.status,
            TournamentStatus::Draft | TournamentStatus::Published
        ) {
            return Err(ActionError::InvalidStatus {
                action: "start",
                status: tournament.status,
            });
        }
        tournament.status = TournamentStatus::Ongoing;
        tournament.date_start = Some(Utc::now());
        self.store.save_tournament(&tournament)?;
        info!("Started tournament {}", tournament.name);

        self.schedule(&tournament)
    }

    pub fn finish(&self, tournament_id: TournamentId) -> ActionResult<Tournament> {
        let mut tournament = self.store.tournament(tournament_id)?;
        if tournament.status != TournamentStatus::Ongoing {
            return Err(ActionError::InvalidStatus {
                action: "finish",
                status: tournament.status,
            });
        }
        tournament.status = TournamentStatus::Finished;
        self.store.save_tournament(&tournament)?;
        info!("Finished tournament {}", tournament.name);
        Ok(tournament)
    }

    pub fn set_auto_match_creation(
        &self,
        tournament_id: TournamentId,
        enabled: bool,
    ) -> ActionResult<Tournament> {
        let mut tournament = self.store.tournament(tournament_id)?;
        if enabled && tournament.nb_team_matches.is_none() {
            return Err(ActionError::MatchCapRequired);
        }
        tournament.auto_match_creation = enabled;
        self.store.save_tournament(&tournament)?;
        Ok(tournament)
    }

    /// Set the per-team match cap. Clearing it also turns automatic creation off.
    pub fn set_nb_team_matches(
        &self,
        tournament_id: TournamentId,
        cap: Option<u32>,
    ) -> ActionResult<Tournament> {
        let mut tournament = self.store.tournament(tournament_id)?;
        match cap {
            Some(value) => {
                let cap = NonZeroU32::new(value).ok_or(ActionError::InvalidMatchCap)?;
                tournament.nb_team_matches = Some(cap);
            }
            None => {
                tournament.nb_team_matches = None;
                tournament.auto_match_creation = false;
            }
        }
        self.store.save_tournament(&tournament)?;
        Ok(tournament)
    }

    // =========================================================================
    // Teams
    // =========================================================================

    pub fn add_team(&self, tournament_id: TournamentId, name: &str) -> ActionResult<Team> {
        let lock = self.store.lock_tournament(tournament_id)?;
        Ok(self.store.insert_team(&lock, name)?)
    }

    /// Add `count` teams named after their number
    pub fn add_teams(&self, tournament_id: TournamentId, count: u32) -> ActionResult<Vec<Team>> {
        let lock = self.store.lock_tournament(tournament_id)?;
        let last = self
            .store
            .teams(tournament_id)?
            .last()
            .map_or(0, |t| t.number);

        let mut created = Vec::with_capacity(count as usize);
        for number in (last + 1)..=(last + count) {
            created.push(self.store.insert_team(&lock, &format!("Team {}", number))?);
        }
        Ok(created)
    }

    pub fn remove_team(&self, team_id: TeamId) -> ActionResult<()> {
        let team = self.store.team(team_id)?;
        let lock = self.store.lock_tournament(team.tournament_id)?;
        self.store.delete_team(&lock, team_id)?;
        info!("Removed team {}", team.name);
        Ok(())
    }

    /// Teams by number with their match count, points and rank
    pub fn team_overview(&self, tournament_id: TournamentId) -> ActionResult<Vec<TeamOverview>> {
        let tournament = self.store.tournament(tournament_id)?;
        let standings = self
            .controller(&tournament)
            .get_team_scores(&self.store, tournament_id)?;
        let matches = self.store.matches(tournament_id)?;

        let mut overview: Vec<TeamOverview> = standings
            .into_iter()
            .map(|score| TeamOverview {
                match_count: matches.iter().filter(|m| m.has_team(score.team.id)).count() as u32,
                rank: score.rank,
                points: score.total_points,
                team: score.team,
            })
            .collect();
        overview.sort_by_key(|o| o.team.number);
        Ok(overview)
    }

    // =========================================================================
    // Matches
    // =========================================================================

    /// Create a match by hand. Allowed only while the tournament is ongoing.
    pub fn create_match(
        &self,
        tournament_id: TournamentId,
        teams: &[TeamId],
        date_start: Option<DateTime<Utc>>,
    ) -> ActionResult<Match> {
        let tournament = self.store.tournament(tournament_id)?;
        if tournament.status != TournamentStatus::Ongoing {
            return Err(ActionError::InvalidStatus {
                action: "create a match in",
                status: tournament.status,
            });
        }
        if teams.len() < 2 {
            return Err(ActionError::NotEnoughTeams(teams.len()));
        }

        let new_match = NewMatch {
            tournament_id,
            teams: teams.to_vec(),
            status: MatchStatus::Coming,
            date_start: Some(date_start.unwrap_or_else(Utc::now)),
            location: String::new(),
            details: String::new(),
        };
        let lock = self.store.lock_tournament(tournament_id)?;
        let created = self.store.insert_match(&lock, new_match)?;
        drop(lock);

        info!("Created match {} in {}", created.ordering, tournament.name);
        Ok(created)
    }

    pub fn remove_match(&self, match_id: MatchId) -> ActionResult<()> {
        let m = self.store.get_match(match_id)?;
        let lock = self.store.lock_tournament(m.tournament_id)?;
        self.store.delete_match(&lock, match_id)?;
        info!("Removed match {}", m.ordering);
        Ok(())
    }

    /// Change a match status by hand
    pub fn set_match_status(
        &self,
        match_id: MatchId,
        new_status: MatchStatus,
    ) -> ActionResult<MatchUpdate> {
        let mut m = self.store.get_match(match_id)?;
        let old_status = m.status;
        status::apply_status(&mut m, new_status, Utc::now());
        self.store.save_match(&m)?;

        let scheduled = self.after_match_update(old_status, &m)?;
        Ok(MatchUpdate {
            updated: m,
            scheduled,
        })
    }

    /// Enter scores for a match.
    ///
    /// `Some(value)` sets a team's score, `None` clears it. Entering any score on
    /// a coming match starts it. An explicit `new_status` is applied last.
    pub fn record_scores(
        &self,
        match_id: MatchId,
        scores: &[(TeamId, Option<i32>)],
        new_status: Option<MatchStatus>,
    ) -> ActionResult<MatchUpdate> {
        let mut m = self.store.get_match(match_id)?;
        let old_status = m.status;
        let now = Utc::now();

        // Nothing is written unless every entry belongs to the match
        if let Some(&(team_id, _)) = scores.iter().find(|(t, _)| !m.has_team(*t)) {
            return Err(StoreError::TeamNotInMatch {
                team: team_id,
                match_id,
            }
            .into());
        }

        let mut has_score = false;
        for &(team_id, value) in scores {
            match value {
                Some(value) => {
                    self.store.upsert_score(match_id, team_id, value)?;
                    has_score = true;
                }
                None => {
                    self.store.delete_score(match_id, team_id)?;
                }
            }
        }

        if m.status == MatchStatus::Coming && has_score {
            status::apply_status(&mut m, MatchStatus::Ongoing, now);
            info!("Match {} started with its first score", m.ordering);
        }
        if let Some(status) = new_status {
            status::apply_status(&mut m, status, now);
        }
        self.store.save_match(&m)?;

        let scheduled = self.after_match_update(old_status, &m)?;
        Ok(MatchUpdate {
            updated: m,
            scheduled,
        })
    }

    /// Run a scheduling pass when a match has just finished
    fn after_match_update(&self, old_status: MatchStatus, m: &Match) -> ActionResult<Vec<Match>> {
        if old_status == MatchStatus::Done || m.status != MatchStatus::Done {
            return Ok(Vec::new());
        }
        let tournament = self.store.tournament(m.tournament_id)?;
        self.schedule(&tournament)
    }

    fn schedule(&self, tournament: &Tournament) -> ActionResult<Vec<Match>> {
        if tournament.auto_scheduling_cap().is_none() {
            return Ok(Vec::new());
        }
        let created = self.controller(tournament).create_next_matches(
            &self.store,
            tournament.id,
            self.update_statuses,
        )?;
        if !created.is_empty() {
            info!(
                "{} match(es) created automatically in {}",
                created.len(),
                tournament.name
            );
        }
        Ok(created)
    }

    /// Start whatever coming matches can start
    pub fn promote_matches(
        &self,
        tournament_id: TournamentId,
        keep_match_order: bool,
    ) -> ActionResult<Vec<Match>> {
        let tournament = self.store.tournament(tournament_id)?;
        Ok(self.controller(&tournament).update_match_statuses(
            &self.store,
            tournament_id,
            keep_match_order,
        )?)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
