use super::*;
use crate::model::{MatchStatus, Sport};

fn store_with_teams(count: usize) -> (MemoryStore, TournamentId, Vec<Team>) {
    let store = MemoryStore::new();
    let tournament = Tournament::new("Club Cup", Sport::Generic);
    let id = tournament.id;
    store.insert_tournament(tournament).unwrap();

    let lock = store.lock_tournament(id).unwrap();
    let teams = (1..=count)
        .map(|i| store.insert_team(&lock, &format!("Team {}", i)).unwrap())
        .collect();
    (store, id, teams)
}

fn pair(store: &MemoryStore, id: TournamentId, a: &Team, b: &Team) -> Match {
    let lock = store.lock_tournament(id).unwrap();
    store
        .insert_match(&lock, NewMatch::pairing(id, a.id, b.id))
        .unwrap()
}

#[test]
fn test_team_numbers_are_dense() {
    let (store, id, teams) = store_with_teams(3);
    let numbers: Vec<u32> = teams.iter().map(|t| t.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let lock = store.lock_tournament(id).unwrap();
    store.delete_team(&lock, teams[0].id).unwrap();
    drop(lock);

    let remaining = store.teams(id).unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].name, "Team 2");
    assert_eq!(remaining[0].number, 1);
    assert_eq!(remaining[1].name, "Team 3");
    assert_eq!(remaining[1].number, 2);
}

#[test]
fn test_match_ordering_allocation_and_renumbering() {
    let (store, id, teams) = store_with_teams(4);
    let m1 = pair(&store, id, &teams[0], &teams[1]);
    let m2 = pair(&store, id, &teams[2], &teams[3]);
    let m3 = pair(&store, id, &teams[0], &teams[2]);
    assert_eq!((m1.ordering, m2.ordering, m3.ordering), (1, 2, 3));
    assert_eq!(m1.status, MatchStatus::Coming);

    let lock = store.lock_tournament(id).unwrap();
    store.delete_match(&lock, m2.id).unwrap();
    drop(lock);

    let matches = store.matches(id).unwrap();
    let view: Vec<(MatchId, u32)> = matches.iter().map(|m| (m.id, m.ordering)).collect();
    assert_eq!(view, vec![(m1.id, 1), (m3.id, 2)]);
}

#[test]
fn test_insert_match_requires_two_distinct_teams() {
    let (store, id, teams) = store_with_teams(3);
    let lock = store.lock_tournament(id).unwrap();

    let same = NewMatch::pairing(id, teams[0].id, teams[0].id);
    assert!(matches!(
        store.insert_match(&lock, same),
        Err(StoreError::InvalidMatch(_))
    ));

    let mut three = NewMatch::pairing(id, teams[0].id, teams[1].id);
    three.teams.push(teams[2].id);
    assert!(matches!(
        store.insert_match(&lock, three),
        Err(StoreError::InvalidMatch(_))
    ));
    drop(lock);

    assert!(store.matches(id).unwrap().is_empty());
}

#[test]
fn test_insert_match_rejects_foreign_team_and_lock() {
    let (store, id, teams) = store_with_teams(2);
    let (other_store_team, other_id) = {
        let other = Tournament::new("Other", Sport::Generic);
        let other_id = other.id;
        store.insert_tournament(other).unwrap();
        let lock = store.lock_tournament(other_id).unwrap();
        (store.insert_team(&lock, "Stranger").unwrap(), other_id)
    };

    let lock = store.lock_tournament(id).unwrap();
    let foreign = NewMatch::pairing(id, teams[0].id, other_store_team.id);
    assert!(matches!(
        store.insert_match(&lock, foreign),
        Err(StoreError::TeamNotInTournament { .. })
    ));

    let wrong_lock = NewMatch::pairing(other_id, teams[0].id, teams[1].id);
    assert!(matches!(
        store.insert_match(&lock, wrong_lock),
        Err(StoreError::LockMismatch { .. })
    ));
}

#[test]
fn test_scores_keep_recording_order_on_overwrite() {
    let (store, id, teams) = store_with_teams(2);
    let m = pair(&store, id, &teams[0], &teams[1]);

    store.upsert_score(m.id, teams[1].id, 3).unwrap();
    store.upsert_score(m.id, teams[0].id, 7).unwrap();
    store.upsert_score(m.id, teams[1].id, 13).unwrap();

    let scores = store.scores(m.id).unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!((scores[0].team_id, scores[0].value), (teams[1].id, 13));
    assert_eq!((scores[1].team_id, scores[1].value), (teams[0].id, 7));

    assert!(store.delete_score(m.id, teams[1].id).unwrap());
    assert!(!store.delete_score(m.id, teams[1].id).unwrap());
    assert_eq!(store.scores(m.id).unwrap().len(), 1);
}

#[test]
fn test_score_for_team_outside_match_is_rejected() {
    let (store, id, teams) = store_with_teams(3);
    let m = pair(&store, id, &teams[0], &teams[1]);

    let result = store.upsert_score(m.id, teams[2].id, 1);
    assert!(matches!(result, Err(StoreError::TeamNotInMatch { .. })));
}

#[test]
fn test_delete_team_cascades() {
    let (store, id, teams) = store_with_teams(3);
    let m = pair(&store, id, &teams[0], &teams[1]);
    store.upsert_score(m.id, teams[0].id, 5).unwrap();
    store.upsert_score(m.id, teams[1].id, 2).unwrap();

    let lock = store.lock_tournament(id).unwrap();
    store.delete_team(&lock, teams[0].id).unwrap();
    drop(lock);

    let m = store.get_match(m.id).unwrap();
    assert_eq!(m.teams, vec![teams[1].id]);
    let scores = store.scores(m.id).unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].team_id, teams[1].id);
}

#[test]
fn test_save_match_keeps_ordering_and_teams() {
    let (store, id, teams) = store_with_teams(3);
    let mut m = pair(&store, id, &teams[0], &teams[1]);

    m.status = MatchStatus::Done;
    m.ordering = 42;
    m.teams = vec![teams[2].id];
    m.location = "Court 2".to_string();
    store.save_match(&m).unwrap();

    let stored = store.get_match(m.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Done);
    assert_eq!(stored.location, "Court 2");
    assert_eq!(stored.ordering, 1);
    assert_eq!(stored.teams, vec![teams[0].id, teams[1].id]);
}

#[test]
fn test_missing_records() {
    let store = MemoryStore::new();
    let ghost = TournamentId::generate();
    assert!(matches!(
        store.tournament(ghost),
        Err(StoreError::TournamentNotFound(_))
    ));
    assert!(store.lock_tournament(ghost).is_err());
    assert!(matches!(
        store.get_match(MatchId::generate()),
        Err(StoreError::MatchNotFound(_))
    ));
}

#[test]
fn test_snapshot_file_roundtrip() {
    let (store, id, teams) = store_with_teams(2);
    let m = pair(&store, id, &teams[0], &teams[1]);
    store.upsert_score(m.id, teams[0].id, 11).unwrap();

    let path = std::env::temp_dir().join(format!("tourney-snapshot-{}.json", id));
    store.save(&path).unwrap();
    let loaded = MemoryStore::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.snapshot(), store.snapshot());
    assert_eq!(loaded.matches(id).unwrap()[0].ordering, 1);
}

#[test]
fn test_load_missing_snapshot_fails() {
    let path = std::env::temp_dir().join("tourney-does-not-exist.json");
    assert!(matches!(
        MemoryStore::load(&path),
        Err(StoreError::Snapshot(_))
    ));
}
