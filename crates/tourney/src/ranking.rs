//! Points-based standings with competitive ranking

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use tourney_core::{Score, StoreResult, Team, TeamId, TournamentId, TournamentStore};

/// Points awarded for a win, and to each side of a draw
pub const MATCH_POINT: u32 = 1;

/// One row of the standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub team: Team,
    pub total_points: u32,
    /// Competitive rank: tied teams share a rank, the next rank skips ahead
    pub rank: u32,
}

/// Computes standings from recorded match scores
pub trait RankingStrategy: Send + Sync {
    /// Every team of the tournament with its points and rank, best first
    fn get_team_scores(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<TeamScore>>;
}

/// Generic rules: one point to the higher score, one point to both on a draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Points earned in one match.
    ///
    /// Only the first two recorded scores count; with fewer than two the match
    /// is not decisive and awards nothing.
    pub fn match_points(scores: &[Score]) -> Vec<(TeamId, u32)> {
        let [first, second, ..] = scores else {
            return Vec::new();
        };

        if first.value > second.value {
            vec![(first.team_id, MATCH_POINT)]
        } else if second.value > first.value {
            vec![(second.team_id, MATCH_POINT)]
        } else {
            vec![(first.team_id, MATCH_POINT), (second.team_id, MATCH_POINT)]
        }
    }
}

impl RankingStrategy for RankingEngine {
    fn get_team_scores(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<TeamScore>> {
        let teams = store.teams(tournament_id)?;
        let mut points: HashMap<TeamId, u32> = teams.iter().map(|t| (t.id, 0)).collect();

        let mut decisive = 0;
        for m in store.matches(tournament_id)? {
            let scores = store.scores(m.id)?;
            let awarded = Self::match_points(&scores);
            if awarded.is_empty() {
                continue;
            }
            decisive += 1;
            for (team_id, earned) in awarded {
                if let Some(total) = points.get_mut(&team_id) {
                    *total += earned;
                }
            }
        }

        // Teams arrive ordered by number and the sort is stable, so equal
        // points stay in number order
        let mut standings: Vec<(Team, u32)> = teams
            .into_iter()
            .map(|team| {
                let total = points.get(&team.id).copied().unwrap_or(0);
                (team, total)
            })
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));

        let totals: Vec<u32> = standings.iter().map(|(_, p)| *p).collect();
        let ranks = competitive_ranks(&totals);

        debug!(
            "Ranked {} teams of tournament {} from {} decisive matches",
            standings.len(),
            tournament_id,
            decisive
        );

        Ok(standings
            .into_iter()
            .zip(ranks)
            .map(|((team, total_points), rank)| TeamScore {
                team,
                total_points,
                rank,
            })
            .collect())
    }
}

/// Competitive ("1224") ranks for points sorted in descending order.
///
/// Tied entries share the rank of the first entry of their block; the next
/// distinct value gets its 1-based position.
pub fn competitive_ranks(sorted_points: &[u32]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted_points.len());
    let mut previous: Option<u32> = None;
    let mut rank = 0;

    for (position, &points) in (1u32..).zip(sorted_points) {
        if previous != Some(points) {
            rank = position;
            previous = Some(points);
        }
        ranks.push(rank);
    }
    ranks
}

#[cfg(test)]
#[path = "ranking_tests.rs"]
mod ranking_tests;
