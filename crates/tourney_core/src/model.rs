//! Tournament, team, match and score records.
//!
//! These are plain data: the store owns them, the engine reads them and writes
//! new or updated copies back through [`crate::TournamentStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifies a tournament
    TournamentId
);
entity_id!(
    /// Identifies a team
    TeamId
);
entity_id!(
    /// Identifies a match
    MatchId
);

// =============================================================================
// Enumerations
// =============================================================================

/// Sport discipline of a tournament.
///
/// Selects the controller used for ranking and scheduling. Petanque currently
/// behaves exactly like the generic rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sport {
    #[default]
    Generic,
    Petanque,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Generic => "GENERIC",
            Sport::Petanque => "PETANQUE",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GENERIC" => Ok(Sport::Generic),
            "PETANQUE" => Ok(Sport::Petanque),
            _ => Err(format!("unknown sport: {}", s)),
        }
    }
}

/// Lifecycle of a tournament. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    #[default]
    Draft,
    Published,
    Ongoing,
    Finished,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TournamentStatus::Draft => "DRAFT",
            TournamentStatus::Published => "PUBLISHED",
            TournamentStatus::Ongoing => "ONGOING",
            TournamentStatus::Finished => "FINISHED",
        };
        f.write_str(s)
    }
}

/// Status of a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Coming,
    Ongoing,
    Done,
}

impl MatchStatus {
    /// Coming and ongoing matches still occupy their teams
    pub fn is_pending(&self) -> bool {
        matches!(self, MatchStatus::Coming | MatchStatus::Ongoing)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Coming => "COMING",
            MatchStatus::Ongoing => "ONGOING",
            MatchStatus::Done => "DONE",
        };
        f.write_str(s)
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COMING" => Ok(MatchStatus::Coming),
            "ONGOING" => Ok(MatchStatus::Ongoing),
            "DONE" => Ok(MatchStatus::Done),
            _ => Err(format!("unknown match status: {}", s)),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// A competition and its scheduling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub sport: Sport,
    pub status: TournamentStatus,
    /// Let the scheduler pair teams automatically
    pub auto_match_creation: bool,
    /// Cap on matches per team for automatic scheduling. `None` disables it.
    pub nb_team_matches: Option<NonZeroU32>,
    #[serde(default)]
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub date_start: Option<DateTime<Utc>>,
}

impl Tournament {
    pub fn new(name: &str, sport: Sport) -> Self {
        Self {
            id: TournamentId::generate(),
            name: name.to_string(),
            sport,
            status: TournamentStatus::Draft,
            auto_match_creation: false,
            nb_team_matches: None,
            location: String::new(),
            created_at: Utc::now(),
            date_start: None,
        }
    }

    /// Per-team cap when automatic scheduling is switched on and configured
    pub fn auto_scheduling_cap(&self) -> Option<u32> {
        if self.auto_match_creation {
            self.nb_team_matches.map(NonZeroU32::get)
        } else {
            None
        }
    }
}

/// A team entered in one tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// Dense 1-based display number within the tournament
    pub number: u32,
    pub created_at: DateTime<Utc>,
}

/// A match between teams of one tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// Dense 1-based position in the tournament's match list
    pub ordering: u32,
    pub status: MatchStatus,
    pub teams: Vec<TeamId>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn has_team(&self, team: TeamId) -> bool {
        self.teams.contains(&team)
    }

    /// True when both teams take part in this match
    pub fn involves_both(&self, a: TeamId, b: TeamId) -> bool {
        self.has_team(a) && self.has_team(b)
    }

    /// When the match was played: end time, else start time, else creation time
    pub fn played_at(&self) -> DateTime<Utc> {
        self.date_end.or(self.date_start).unwrap_or(self.created_at)
    }
}

/// Input for a new match. The ordering is allocated by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub teams: Vec<TeamId>,
    pub status: MatchStatus,
    pub date_start: Option<DateTime<Utc>>,
    pub location: String,
    pub details: String,
}

impl NewMatch {
    /// A coming match between two teams
    pub fn pairing(tournament_id: TournamentId, first: TeamId, second: TeamId) -> Self {
        Self {
            tournament_id,
            teams: vec![first, second],
            status: MatchStatus::Coming,
            date_start: None,
            location: String::new(),
            details: String::new(),
        }
    }
}

/// Score of one team in one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub match_id: MatchId,
    pub team_id: TeamId,
    pub value: i32,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
