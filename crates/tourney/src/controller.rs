//! Sport controllers and the registry that selects them.
//!
//! A controller bundles the ranking and scheduling rules of one sport. The
//! registry is built once at startup and handed to whoever needs it; sports
//! without a dedicated controller fall back to the generic rules.

use std::collections::HashMap;
use std::sync::Arc;

use tourney_core::{Match, Sport, StoreResult, Tournament, TournamentId, TournamentStore};

use crate::config::SchedulerConfig;
use crate::ranking::{RankingEngine, RankingStrategy, TeamScore};
use crate::scheduler::{MatchScheduler, SchedulingStrategy};

/// Ranking and scheduling rules of one sport
pub trait SportController: RankingStrategy + SchedulingStrategy {
    /// Name shown in logs and reports
    fn name(&self) -> &str;
}

/// Generic rules used by every sport unless it overrides them
#[derive(Debug, Default)]
pub struct GenericController {
    ranking: RankingEngine,
    scheduler: MatchScheduler,
}

impl GenericController {
    pub fn new(scheduler: MatchScheduler) -> Self {
        Self {
            ranking: RankingEngine::new(),
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &MatchScheduler {
        &self.scheduler
    }
}

impl RankingStrategy for GenericController {
    fn get_team_scores(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<TeamScore>> {
        self.ranking.get_team_scores(store, tournament_id)
    }
}

impl SchedulingStrategy for GenericController {
    fn create_next_matches(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
        update_statuses: bool,
    ) -> StoreResult<Vec<Match>> {
        self.scheduler
            .create_next_matches(store, tournament_id, update_statuses)
    }
}

impl SportController for GenericController {
    fn name(&self) -> &str {
        "Generic"
    }
}

/// Petanque. Same rules as the generic controller for now.
#[derive(Debug, Default)]
pub struct PetanqueController {
    inner: GenericController,
}

impl PetanqueController {
    pub fn new(scheduler: MatchScheduler) -> Self {
        Self {
            inner: GenericController::new(scheduler),
        }
    }
}

impl RankingStrategy for PetanqueController {
    fn get_team_scores(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<TeamScore>> {
        self.inner.get_team_scores(store, tournament_id)
    }
}

impl SchedulingStrategy for PetanqueController {
    fn create_next_matches(
        &self,
        store: &dyn TournamentStore,
        tournament_id: TournamentId,
        update_statuses: bool,
    ) -> StoreResult<Vec<Match>> {
        self.inner
            .create_next_matches(store, tournament_id, update_statuses)
    }
}

impl SportController for PetanqueController {
    fn name(&self) -> &str {
        "Petanque"
    }
}

/// Maps sports to their controllers
#[derive(Clone)]
pub struct ControllerRegistry {
    controllers: HashMap<Sport, Arc<dyn SportController>>,
    fallback: Arc<dyn SportController>,
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sports: Vec<&str> = self.controllers.keys().map(Sport::as_str).collect();
        sports.sort_unstable();
        f.debug_struct("ControllerRegistry")
            .field("sports", &sports)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl ControllerRegistry {
    /// Registry with only a fallback controller
    pub fn new(fallback: Arc<dyn SportController>) -> Self {
        Self {
            controllers: HashMap::new(),
            fallback,
        }
    }

    /// Add or replace the controller of a sport
    pub fn register(mut self, sport: Sport, controller: Arc<dyn SportController>) -> Self {
        self.controllers.insert(sport, controller);
        self
    }

    /// Generic and petanque controllers sharing the generic fallback
    pub fn standard(config: &SchedulerConfig) -> Self {
        let generic: Arc<dyn SportController> =
            Arc::new(GenericController::new(MatchScheduler::from_config(config)));
        let petanque: Arc<dyn SportController> =
            Arc::new(PetanqueController::new(MatchScheduler::from_config(config)));

        Self::new(Arc::clone(&generic))
            .register(Sport::Generic, generic)
            .register(Sport::Petanque, petanque)
    }

    pub fn get(&self, sport: Sport) -> Arc<dyn SportController> {
        self.controllers
            .get(&sport)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Look up by sport identifier; unknown identifiers get the fallback
    pub fn get_by_name(&self, name: &str) -> Arc<dyn SportController> {
        match name.parse::<Sport>() {
            Ok(sport) => self.get(sport),
            Err(_) => Arc::clone(&self.fallback),
        }
    }

    pub fn for_tournament(&self, tournament: &Tournament) -> Arc<dyn SportController> {
        self.get(tournament.sport)
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::standard(&SchedulerConfig::default())
    }
}
