//! Match status transitions.
//!
//! A coming match starts (becomes ongoing) only when none of its teams is
//! already playing another ongoing match of the tournament. Nothing here ever
//! demotes a match.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

use tourney_core::{Match, MatchStatus, StoreResult, TeamId, TournamentId, TournamentStore};

/// Set a status and stamp the matching timestamp if it is still empty
pub fn apply_status(m: &mut Match, status: MatchStatus, now: DateTime<Utc>) {
    m.status = status;
    match status {
        MatchStatus::Ongoing => {
            m.date_start.get_or_insert(now);
        }
        MatchStatus::Done => {
            m.date_end.get_or_insert(now);
        }
        MatchStatus::Coming => {}
    }
}

/// Teams currently holding an ongoing match, other than `exclude`
fn ongoing_teams(matches: &[Match], exclude: Option<&Match>) -> HashSet<TeamId> {
    matches
        .iter()
        .filter(|m| m.status == MatchStatus::Ongoing)
        .filter(|m| exclude.map_or(true, |e| e.id != m.id))
        .flat_map(|m| m.teams.iter().copied())
        .collect()
}

/// Try to start one coming match.
///
/// `opponents` are the teams whose commitments are checked; they default to
/// the match's own teams. Returns whether the match became ongoing.
pub fn update_status(
    store: &dyn TournamentStore,
    m: &mut Match,
    opponents: Option<&[TeamId]>,
) -> StoreResult<bool> {
    if m.status != MatchStatus::Coming {
        return Ok(false);
    }

    let matches = store.matches(m.tournament_id)?;
    let busy = ongoing_teams(&matches, Some(&*m));
    let teams = opponents.unwrap_or(m.teams.as_slice());
    if teams.iter().any(|t| busy.contains(t)) {
        debug!("Match {} stays coming: a team is already playing", m.ordering);
        return Ok(false);
    }

    apply_status(m, MatchStatus::Ongoing, Utc::now());
    store.save_match(m)?;
    info!("Match {} of tournament {} is now ongoing", m.ordering, m.tournament_id);
    Ok(true)
}

/// Like [`update_status`], but a team still waiting in an earlier coming match
/// is held for that match, so queued matches keep their precedence.
pub fn update_status_in_order(store: &dyn TournamentStore, m: &mut Match) -> StoreResult<bool> {
    if m.status != MatchStatus::Coming {
        return Ok(false);
    }

    let matches = store.matches(m.tournament_id)?;
    let queued: HashSet<TeamId> = matches
        .iter()
        .filter(|o| o.status == MatchStatus::Coming && o.ordering < m.ordering)
        .flat_map(|o| o.teams.iter().copied())
        .collect();
    if m.teams.iter().any(|t| queued.contains(t)) {
        debug!("Match {} stays coming: a team is queued for an earlier match", m.ordering);
        return Ok(false);
    }

    update_status(store, m, None)
}

/// Start every coming match that can start, in ordering order.
///
/// A match is blocked when one of its teams holds a match that was ongoing when
/// the pass began. With `keep_match_order`, a team also counts as taken once an
/// earlier match of this pass has started with it. Without it, matches are not
/// checked against each other.
///
/// Returns the matches that became ongoing, in evaluation order.
pub fn update_match_statuses(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
    keep_match_order: bool,
) -> StoreResult<Vec<Match>> {
    let matches = store.matches(tournament_id)?;
    let playing = ongoing_teams(&matches, None);
    let mut claimed: HashSet<TeamId> = HashSet::new();
    let mut promoted = Vec::new();
    let now = Utc::now();

    for mut m in matches.into_iter().filter(|m| m.status == MatchStatus::Coming) {
        let blocked = m
            .teams
            .iter()
            .any(|t| playing.contains(t) || claimed.contains(t));
        if blocked {
            continue;
        }

        apply_status(&mut m, MatchStatus::Ongoing, now);
        store.save_match(&m)?;
        if keep_match_order {
            claimed.extend(m.teams.iter().copied());
        }
        info!("Match {} of tournament {} is now ongoing", m.ordering, tournament_id);
        promoted.push(m);
    }

    Ok(promoted)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
