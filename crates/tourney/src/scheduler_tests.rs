use super::*;
use chrono::Duration;
use std::num::NonZeroU32;
use tourney_core::{MatchStatus, MemoryStore, Sport, Tournament};

fn setup(count: usize, cap: Option<u32>) -> (MemoryStore, TournamentId, Vec<Team>) {
    let store = MemoryStore::new();
    let mut tournament = Tournament::new("Scheduler Cup", Sport::Generic);
    tournament.nb_team_matches = cap.and_then(NonZeroU32::new);
    tournament.auto_match_creation = cap.is_some();
    let id = tournament.id;
    store.insert_tournament(tournament).unwrap();

    let lock = store.lock_tournament(id).unwrap();
    let teams = (1..=count)
        .map(|i| store.insert_team(&lock, &format!("Team {}", i)).unwrap())
        .collect();
    (store, id, teams)
}

fn add_match(store: &MemoryStore, id: TournamentId, a: &Team, b: &Team) -> Match {
    let lock = store.lock_tournament(id).unwrap();
    store
        .insert_match(&lock, NewMatch::pairing(id, a.id, b.id))
        .unwrap()
}

/// A done match that ended `minutes_ago`
fn add_done(store: &MemoryStore, id: TournamentId, a: &Team, b: &Team, minutes_ago: i64) -> Match {
    let mut m = add_match(store, id, a, b);
    let end = Utc::now() - Duration::minutes(minutes_ago);
    m.status = MatchStatus::Done;
    m.date_start = Some(end - Duration::minutes(30));
    m.date_end = Some(end);
    store.save_match(&m).unwrap();
    m
}

fn finish_all(store: &MemoryStore, id: TournamentId) {
    for mut m in store.matches(id).unwrap() {
        status::apply_status(&mut m, MatchStatus::Done, Utc::now());
        store.save_match(&m).unwrap();
    }
}

fn oldest(store: &MemoryStore, id: TournamentId) -> DateTime<Utc> {
    store.tournament(id).unwrap().created_at
}

fn numbers(teams: &[Team], m: &Match) -> Vec<u32> {
    let mut numbers: Vec<u32> = m
        .teams
        .iter()
        .map(|id| teams.iter().find(|t| t.id == *id).unwrap().number)
        .collect();
    numbers.sort_unstable();
    numbers
}

// =============================================================================
// Eligibility
// =============================================================================

#[test]
fn test_eligible_teams_order_and_filtering() {
    let (store, id, teams) = setup(5, Some(2));
    // Team 1: two done matches, capped
    add_done(&store, id, &teams[0], &teams[1], 60);
    add_done(&store, id, &teams[0], &teams[2], 10);
    // Team 4 and 5 are busy
    add_match(&store, id, &teams[3], &teams[4]);

    let matches = store.matches(id).unwrap();
    let eligible = eligible_teams(&teams, &matches, 2, oldest(&store, id));
    let order: Vec<u32> = eligible.iter().map(|l| l.team.number).collect();
    // Team 2 finished an hour ago, team 3 ten minutes ago
    assert_eq!(order, vec![2, 3]);
    assert!(eligible.iter().all(|l| l.total == 1 && l.pending == 0));
}

#[test]
fn test_teams_without_matches_come_first_by_number() {
    let (store, id, teams) = setup(4, Some(3));
    add_done(&store, id, &teams[0], &teams[3], 5);

    let matches = store.matches(id).unwrap();
    let eligible = eligible_teams(&teams, &matches, 3, oldest(&store, id));
    let order: Vec<u32> = eligible.iter().map(|l| l.team.number).collect();
    assert_eq!(order, vec![2, 3, 1, 4]);
    assert_eq!(eligible[0].last_done, oldest(&store, id));
}

// =============================================================================
// Opponent choice
// =============================================================================

#[test]
fn test_opponent_pool_narrowed_to_free_teams() {
    let (store, id, teams) = setup(3, Some(3));
    let matches = store.matches(id).unwrap();
    let free: HashSet<TeamId> = [teams[2].id].into_iter().collect();

    let scheduler = MatchScheduler::new();
    for _ in 0..20 {
        let chosen = scheduler
            .choose_opponent(&teams[0], &teams, &matches, &free, oldest(&store, id))
            .unwrap();
        assert_eq!(chosen.id, teams[2].id);
    }
}

#[test]
fn test_least_met_opponent_wins_over_free_one() {
    let (store, id, teams) = setup(3, Some(5));
    add_done(&store, id, &teams[0], &teams[2], 30);
    add_match(&store, id, &teams[1], &teams[2]);

    let matches = store.matches(id).unwrap();
    // Team 2 is busy but has never met team 1; team 3 is free but already met it
    let free: HashSet<TeamId> = [teams[2].id].into_iter().collect();
    let chosen = MatchScheduler::new()
        .choose_opponent(&teams[0], &teams, &matches, &free, oldest(&store, id))
        .unwrap();
    assert_eq!(chosen.id, teams[1].id);
}

#[test]
fn test_oldest_encounter_chosen_among_rematches() {
    let (store, id, teams) = setup(3, Some(5));
    add_done(&store, id, &teams[0], &teams[1], 20);
    add_done(&store, id, &teams[0], &teams[2], 90);

    let matches = store.matches(id).unwrap();
    let free: HashSet<TeamId> = [teams[1].id, teams[2].id].into_iter().collect();
    let chosen = MatchScheduler::new()
        .choose_opponent(&teams[0], &teams, &matches, &free, oldest(&store, id))
        .unwrap();
    assert_eq!(chosen.id, teams[2].id);
}

#[test]
fn test_no_opponent_without_other_teams() {
    let (store, id, teams) = setup(1, Some(1));
    let chosen = MatchScheduler::new().choose_opponent(
        &teams[0],
        &teams,
        &[],
        &HashSet::new(),
        oldest(&store, id),
    );
    assert!(chosen.is_none());
}

// =============================================================================
// Scheduling passes
// =============================================================================

#[test]
fn test_nothing_scheduled_when_disabled() {
    let (store, id, _) = setup(4, None);
    let created = MatchScheduler::new()
        .create_next_matches(&store, id, true)
        .unwrap();
    assert!(created.is_empty());

    // Cap set but automatic creation off
    let mut tournament = store.tournament(id).unwrap();
    tournament.nb_team_matches = NonZeroU32::new(2);
    store.save_tournament(&tournament).unwrap();
    let created = MatchScheduler::new()
        .create_next_matches(&store, id, true)
        .unwrap();
    assert!(created.is_empty());
    assert!(store.matches(id).unwrap().is_empty());
}

#[test]
fn test_four_teams_get_two_disjoint_ongoing_matches() {
    let (store, id, teams) = setup(4, Some(1));
    let created = MatchScheduler::with_seed(11)
        .create_next_matches(&store, id, true)
        .unwrap();

    assert_eq!(created.len(), 2);
    let orderings: Vec<u32> = created.iter().map(|m| m.ordering).collect();
    assert_eq!(orderings, vec![1, 2]);
    assert!(created.iter().all(|m| m.status == MatchStatus::Ongoing));

    let mut seen: Vec<u32> = created.iter().flat_map(|m| numbers(&teams, m)).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4]);
    // Team 1 is the first anchor
    assert!(numbers(&teams, &created[0]).contains(&1));
}

#[test]
fn test_created_matches_stay_coming_without_status_update() {
    let (store, id, _) = setup(4, Some(1));
    let created = MatchScheduler::new()
        .create_next_matches(&store, id, false)
        .unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|m| m.status == MatchStatus::Coming));
}

#[test]
fn test_cap_stops_scheduling() {
    let (store, id, _) = setup(4, Some(1));
    let scheduler = MatchScheduler::new();
    assert_eq!(scheduler.create_next_matches(&store, id, true).unwrap().len(), 2);

    finish_all(&store, id);
    assert!(scheduler.create_next_matches(&store, id, true).unwrap().is_empty());
    assert_eq!(store.matches(id).unwrap().len(), 2);
}

#[test]
fn test_new_match_ordering_follows_existing_max() {
    let (store, id, teams) = setup(4, Some(10));
    for i in 0..5 {
        add_done(&store, id, &teams[i % 2], &teams[2 + i % 2], 100 - i as i64);
    }

    let created = MatchScheduler::new()
        .create_next_matches(&store, id, true)
        .unwrap();
    assert!(!created.is_empty());
    assert_eq!(created[0].ordering, 6);
}

#[test]
fn test_single_team_tournament_schedules_nothing() {
    let (store, id, _) = setup(1, Some(3));
    let created = MatchScheduler::new()
        .create_next_matches(&store, id, true)
        .unwrap();
    assert!(created.is_empty());
}

#[test]
fn test_seeded_schedulers_agree() {
    let pairings = |seed: u64| {
        let (store, id, teams) = setup(6, Some(1));
        let created = MatchScheduler::with_seed(seed)
            .create_next_matches(&store, id, true)
            .unwrap();
        created.iter().map(|m| numbers(&teams, m)).collect::<Vec<_>>()
    };

    let first = pairings(42);
    assert_eq!(first.len(), 3);
    assert_eq!(first, pairings(42));
}

#[test]
fn test_second_round_prefers_new_opponents() {
    let (store, id, teams) = setup(4, Some(2));
    let scheduler = MatchScheduler::with_seed(3);
    let round_one = scheduler.create_next_matches(&store, id, true).unwrap();
    assert_eq!(round_one.len(), 2);

    finish_all(&store, id);
    let round_two = scheduler.create_next_matches(&store, id, true).unwrap();
    assert_eq!(round_two.len(), 2);
    for m in &round_two {
        let pair = numbers(&teams, m);
        assert!(round_one.iter().all(|r| numbers(&teams, r) != pair));
    }
}

#[test]
fn test_new_match_waits_behind_opponents_queued_match() {
    let (store, id, teams) = setup(4, Some(5));
    // Team 1 already met teams 2 and 3, so team 4 is its least-met opponent
    add_done(&store, id, &teams[0], &teams[1], 60);
    add_done(&store, id, &teams[0], &teams[2], 30);
    let mut ongoing = add_match(&store, id, &teams[1], &teams[2]);
    assert!(status::update_status(&store, &mut ongoing, None).unwrap());
    // Team 4 is free but queued behind the ongoing match of team 3
    let queued = add_match(&store, id, &teams[2], &teams[3]);

    let created = MatchScheduler::new()
        .create_next_matches(&store, id, true)
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(numbers(&teams, &created[0]), vec![1, 4]);
    assert_eq!(created[0].status, MatchStatus::Coming);

    let queued = store.get_match(queued.id).unwrap();
    assert_eq!(queued.status, MatchStatus::Coming);
    assert!(created[0].ordering > queued.ordering);
}
