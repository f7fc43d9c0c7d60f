//! Tests for dense match orderings under concurrent writers
//!
//! Every writer takes the tournament lock before allocating, so orderings
//! must come out as 1..N with no duplicate whatever the interleaving.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use tourney_core::{MemoryStore, NewMatch, Sport, Team, Tournament, TournamentId, TournamentStore};

fn setup(teams: usize) -> (Arc<MemoryStore>, TournamentId, Vec<Team>) {
    let store = Arc::new(MemoryStore::new());
    let tournament = Tournament::new("Concurrent Open", Sport::Generic);
    let id = tournament.id;
    store.insert_tournament(tournament).unwrap();

    let lock = store.lock_tournament(id).unwrap();
    let created = (0..teams)
        .map(|i| store.insert_team(&lock, &format!("Team {}", i + 1)).unwrap())
        .collect();
    drop(lock);
    (store, id, created)
}

// =============================================================================
// Ordering allocation
// =============================================================================

#[test]
fn test_concurrent_match_creation_gives_dense_orderings() {
    let (store, id, teams) = setup(4);
    let writers = 8;
    let per_writer = 25;

    thread::scope(|s| {
        for w in 0..writers {
            let store = Arc::clone(&store);
            let teams = &teams;
            s.spawn(move || {
                for i in 0..per_writer {
                    let a = &teams[(w + i) % teams.len()];
                    let b = &teams[(w + i + 1) % teams.len()];
                    let lock = store.lock_tournament(id).unwrap();
                    store
                        .insert_match(&lock, NewMatch::pairing(id, a.id, b.id))
                        .unwrap();
                }
            });
        }
    });

    let matches = store.matches(id).unwrap();
    let total = (writers * per_writer) as u32;
    assert_eq!(matches.len() as u32, total);

    let orderings: Vec<u32> = matches.iter().map(|m| m.ordering).collect();
    let expected: Vec<u32> = (1..=total).collect();
    assert_eq!(orderings, expected);

    let unique: HashSet<u32> = orderings.into_iter().collect();
    assert_eq!(unique.len() as u32, total);
}

#[test]
fn test_ordering_continues_after_existing_maximum() {
    let (store, id, teams) = setup(2);
    let lock = store.lock_tournament(id).unwrap();
    for _ in 0..5 {
        store
            .insert_match(&lock, NewMatch::pairing(id, teams[0].id, teams[1].id))
            .unwrap();
    }
    let next = store
        .insert_match(&lock, NewMatch::pairing(id, teams[1].id, teams[0].id))
        .unwrap();
    assert_eq!(next.ordering, 6);
}

#[test]
fn test_tournaments_allocate_independently() {
    let (store, first, first_teams) = setup(2);
    let second_tournament = Tournament::new("Second", Sport::Petanque);
    let second = second_tournament.id;
    store.insert_tournament(second_tournament).unwrap();
    let second_lock = store.lock_tournament(second).unwrap();
    let a = store.insert_team(&second_lock, "A").unwrap();
    let b = store.insert_team(&second_lock, "B").unwrap();

    // Holding the second tournament's lock does not block the first
    let first_lock = store.lock_tournament(first).unwrap();
    let m1 = store
        .insert_match(
            &first_lock,
            NewMatch::pairing(first, first_teams[0].id, first_teams[1].id),
        )
        .unwrap();
    let m2 = store
        .insert_match(&second_lock, NewMatch::pairing(second, a.id, b.id))
        .unwrap();

    assert_eq!(m1.ordering, 1);
    assert_eq!(m2.ordering, 1);
}
