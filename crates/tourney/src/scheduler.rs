//! Automatic match scheduling.
//!
//! Each pass repeatedly picks the neediest free team (the anchor), finds the
//! opponent it has met the least, and creates their match, until no team is
//! both under its match cap and free of pending matches.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

use tourney_core::{Match, NewMatch, StoreResult, Team, TeamId, TournamentId, TournamentStore};

use crate::config::SchedulerConfig;
use crate::status;

/// Creates new matches and moves matches through their statuses
pub trait SchedulingStrategy: Send + Sync {
    /// Pair free teams until none qualifies. Returns the matches created.
    ///
    /// Does nothing unless the tournament has automatic creation switched on
    /// and a per-team match cap set.
    fn create_next_matches(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
        update_statuses: bool,
    ) -> StoreResult<Vec<Match>>;

    /// Start every coming match that can start. Returns the started matches.
    fn update_match_statuses(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
        keep_match_order: bool,
    ) -> StoreResult<Vec<Match>> {
        status::update_match_statuses(store, tournament_id, keep_match_order)
    }
}

/// Match history of one team, as seen by the scheduler
#[derive(Debug, Clone)]
pub struct TeamLoad {
    pub team: Team,
    /// Matches of any status
    pub total: u32,
    /// Coming or ongoing matches
    pub pending: u32,
    /// When its latest done match was played
    pub last_done: DateTime<Utc>,
}

impl TeamLoad {
    fn compute(team: &Team, matches: &[Match], oldest: DateTime<Utc>) -> Self {
        let mut load = TeamLoad {
            team: team.clone(),
            total: 0,
            pending: 0,
            last_done: oldest,
        };
        let mut last_done: Option<DateTime<Utc>> = None;

        for m in matches.iter().filter(|m| m.has_team(team.id)) {
            load.total += 1;
            if m.status.is_pending() {
                load.pending += 1;
            } else {
                let played = m.played_at();
                last_done = Some(last_done.map_or(played, |l| l.max(played)));
            }
        }
        if let Some(last) = last_done {
            load.last_done = last;
        }
        load
    }
}

/// Teams that may receive a new match, neediest first.
///
/// A team qualifies when it is below `cap` and has no pending match. Fewer
/// matches come first, then the longest wait since the last finished match.
pub fn eligible_teams(
    teams: &[Team],
    matches: &[Match],
    cap: u32,
    oldest: DateTime<Utc>,
) -> Vec<TeamLoad> {
    let mut eligible: Vec<TeamLoad> = teams
        .iter()
        .map(|team| TeamLoad::compute(team, matches, oldest))
        .filter(|load| load.total < cap && load.pending == 0)
        .collect();
    eligible.sort_by_key(|load| (load.total, load.last_done, load.team.number));
    eligible
}

/// How often two teams have met and when they last did
#[derive(Debug, Clone, Copy)]
struct Encounters {
    count: u32,
    last: DateTime<Utc>,
}

fn encounters(
    anchor: TeamId,
    other: TeamId,
    matches: &[Match],
    oldest: DateTime<Utc>,
) -> Encounters {
    matches
        .iter()
        .filter(|m| m.involves_both(anchor, other))
        .fold(
            Encounters {
                count: 0,
                last: oldest,
            },
            |acc, m| Encounters {
                count: acc.count + 1,
                last: acc.last.max(m.played_at()),
            },
        )
}

/// Generic scheduler: least-met opponent, random among first meetings
#[derive(Debug)]
pub struct MatchScheduler {
    rng: Mutex<StdRng>,
}

impl Default for MatchScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchScheduler {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Scheduler with reproducible first-meeting draws
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }

    /// Pick the opponent for `anchor`.
    ///
    /// Every other team is a candidate, busy or capped ones included. Only the
    /// teams met the fewest times stay in the pool, narrowed to the other
    /// eligible teams when any of them is in it. Teams that never met are drawn
    /// at random; otherwise the longest-unmet team wins.
    pub fn choose_opponent(
        &self,
        anchor: &Team,
        teams: &[Team],
        matches: &[Match],
        eligible: &HashSet<TeamId>,
        oldest: DateTime<Utc>,
    ) -> Option<Team> {
        let candidates: Vec<(&Team, Encounters)> = teams
            .iter()
            .filter(|t| t.id != anchor.id)
            .map(|t| (t, encounters(anchor.id, t.id, matches, oldest)))
            .collect();

        let min_encounters = candidates.iter().map(|(_, e)| e.count).min()?;
        let mut pool: Vec<(&Team, Encounters)> = candidates
            .into_iter()
            .filter(|(_, e)| e.count == min_encounters)
            .collect();

        if pool.iter().any(|(t, _)| eligible.contains(&t.id)) {
            pool.retain(|(t, _)| eligible.contains(&t.id));
            debug!(
                "Opponent pool for {} narrowed to {} free teams",
                anchor.name,
                pool.len()
            );
        }

        let chosen = if min_encounters == 0 {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            pool.choose(&mut *rng).map(|(t, _)| *t)
        } else {
            pool.iter()
                .min_by_key(|(t, e)| (e.last, t.number))
                .map(|(t, _)| *t)
        };
        chosen.cloned()
    }
}

impl SchedulingStrategy for MatchScheduler {
    fn create_next_matches(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
        update_statuses: bool,
    ) -> StoreResult<Vec<Match>> {
        let tournament = store.tournament(tournament_id)?;
        let Some(cap) = tournament.auto_scheduling_cap() else {
            debug!("Automatic match creation is off for {}", tournament.name);
            return Ok(Vec::new());
        };
        let oldest = tournament.created_at;

        if update_statuses {
            status::update_match_statuses(store, tournament_id, true)?;
        }

        let mut created = Vec::new();
        loop {
            let teams = store.teams(tournament_id)?;
            let matches = store.matches(tournament_id)?;

            let eligible = eligible_teams(&teams, &matches, cap, oldest);
            let Some(anchor) = eligible.first().map(|load| load.team.clone()) else {
                break;
            };
            debug!(
                "{} eligible teams in {}, anchor is {}",
                eligible.len(),
                tournament.name,
                anchor.name
            );

            let free: HashSet<TeamId> = eligible
                .iter()
                .map(|load| load.team.id)
                .filter(|&id| id != anchor.id)
                .collect();
            let Some(opponent) = self.choose_opponent(&anchor, &teams, &matches, &free, oldest)
            else {
                warn!(
                    "No opponent available for {} in tournament {}, stopping",
                    anchor.name, tournament.name
                );
                break;
            };

            let lock = store.lock_tournament(tournament_id)?;
            let pairing = NewMatch::pairing(tournament_id, anchor.id, opponent.id);
            let mut m = store.insert_match(&lock, pairing)?;
            drop(lock);
            if update_statuses {
                status::update_status_in_order(store, &mut m)?;
            }

            info!(
                "Created match {} in {}: {} vs {} ({})",
                m.ordering, tournament.name, anchor.name, opponent.name, m.status
            );
            created.push(m);
        }

        Ok(created)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
