//! Standings report rendering and storage

use serde::{Deserialize, Serialize};
use std::path::Path;

use tourney_core::{Match, Sport, Team, TeamId, Tournament, TournamentStatus};

use crate::service::TeamOverview;

/// Standings of a tournament, ready to print or save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsReport {
    pub tournament: String,
    pub sport: Sport,
    pub status: TournamentStatus,
    pub rows: Vec<StandingRow>,
}

/// A single line of the standings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingRow {
    pub rank: u32,
    pub number: u32,
    pub team: String,
    pub points: u32,
    pub matches: u32,
}

impl StandingsReport {
    /// Build from a team overview, best rank first
    pub fn new(tournament: &Tournament, overview: &[TeamOverview]) -> Self {
        let mut rows: Vec<StandingRow> = overview
            .iter()
            .map(|o| StandingRow {
                rank: o.rank,
                number: o.team.number,
                team: o.team.name.clone(),
                points: o.points,
                matches: o.match_count,
            })
            .collect();
        rows.sort_by_key(|r| (r.rank, r.number));

        Self {
            tournament: tournament.name.clone(),
            sport: tournament.sport,
            status: tournament.status,
            rows,
        }
    }

    /// Save report to JSON file
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write: {}", e))
    }

    /// Generate a text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("=== Tournament: {} ===\n\n", self.tournament));
        report.push_str(&format!("Sport: {}, status: {}\n\n", self.sport, self.status));

        report.push_str(&format!(
            "{:>4}  {:>3}  {:<24} {:>6} {:>7}\n",
            "Rank", "#", "Team", "Points", "Matches"
        ));
        report.push_str(&"-".repeat(50));
        report.push('\n');

        for row in &self.rows {
            report.push_str(&format!(
                "{:>4}  {:>3}  {:<24} {:>6} {:>7}\n",
                row.rank, row.number, row.team, row.points, row.matches
            ));
        }

        report
    }

    /// Print report to stdout
    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }
}

/// One line per match: ordering, status and the two team names
pub fn match_lines(matches: &[Match], teams: &[Team]) -> Vec<String> {
    matches
        .iter()
        .map(|m| {
            let names: Vec<&str> = m.teams.iter().map(|&id| team_name(teams, id)).collect();
            format!("#{:<3} {:<8} {}", m.ordering, m.status.to_string(), names.join(" vs "))
        })
        .collect()
}

fn team_name(teams: &[Team], id: TeamId) -> &str {
    teams
        .iter()
        .find(|t| t.id == id)
        .map_or("?", |t| t.name.as_str())
}
