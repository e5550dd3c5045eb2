#![cfg(feature = "memory-store")]

use futures::executor::block_on;
use rs_checkpoint::{
    AccessCheckService, CheckResult, Direction, KeyId, MemoryStore, OccupancyStore, RoomId,
};
use std::sync::{Arc, Barrier};

const THREADS: usize = 8;

/// Runs one check per thread, spreading threads over `services`.
fn spawn_checks<S, F>(services: &[Arc<AccessCheckService<S>>], op: F) -> Vec<CheckResult>
where
    S: OccupancyStore + 'static,
    F: Fn(usize) -> (i64, Direction, i64) + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let barrier = Arc::new(Barrier::new(THREADS));
    let mut joins = Vec::with_capacity(THREADS);
    for i in 0..THREADS {
        let service = Arc::clone(&services[i % services.len()]);
        let barrier = Arc::clone(&barrier);
        let op = Arc::clone(&op);
        joins.push(std::thread::spawn(move || {
            let (room, direction, key) = op(i);
            barrier.wait();
            block_on(service.check(room, direction, key))
        }));
    }
    joins
        .into_iter()
        .map(|join| join.join().expect("thread panicked"))
        .collect()
}

#[test]
fn same_key_from_many_threads_enters_once() {
    let store = MemoryStore::new();
    let service = Arc::new(AccessCheckService::new(store.clone()));

    let results = spawn_checks(std::slice::from_ref(&service), |_| (2, Direction::Entrance, 4));

    let allowed = results
        .iter()
        .filter(|result| **result == CheckResult::Allowed)
        .count();
    assert_eq!(allowed, 1);
    assert_eq!(store.saves(), 1);
    assert_eq!(
        store.snapshot().room_of(KeyId::new(4).unwrap()),
        Some(RoomId::new(2).unwrap())
    );
}

#[test]
fn same_key_racing_into_different_rooms_lands_in_one() {
    let store = MemoryStore::new();
    let service = Arc::new(AccessCheckService::new(store.clone()));

    // key 60 fits every room
    let results = spawn_checks(std::slice::from_ref(&service), |i| {
        ((i % 5) as i64 + 1, Direction::Entrance, 60)
    });

    let allowed = results
        .iter()
        .filter(|result| **result == CheckResult::Allowed)
        .count();
    assert_eq!(allowed, 1);
    let state = store.snapshot();
    assert_eq!(state.len(), 1);
    assert!(state.room_of(KeyId::new(60).unwrap()).is_some());
}

#[test]
fn racing_exits_remove_the_key_once() {
    let store = MemoryStore::new();
    let service = Arc::new(AccessCheckService::new(store.clone()));
    assert_eq!(
        block_on(service.check(3, Direction::Entrance, 9)),
        CheckResult::Allowed
    );

    let results = spawn_checks(std::slice::from_ref(&service), |_| (3, Direction::Exit, 9));

    let allowed = results
        .iter()
        .filter(|result| **result == CheckResult::Allowed)
        .count();
    assert_eq!(allowed, 1);
    assert!(store.snapshot().is_empty());
    assert_eq!(store.saves(), 2);
}

#[test]
fn services_sharing_one_store_enter_once() {
    let store = Arc::new(MemoryStore::new());
    let services = [
        Arc::new(AccessCheckService::new(Arc::clone(&store))),
        Arc::new(AccessCheckService::new(Arc::clone(&store))),
    ];

    let results = spawn_checks(&services, |_| (4, Direction::Entrance, 20));

    let allowed = results
        .iter()
        .filter(|result| **result == CheckResult::Allowed)
        .count();
    assert_eq!(allowed, 1);
    assert_eq!(store.saves(), 1);
    assert_eq!(
        store.snapshot().room_of(KeyId::new(20).unwrap()),
        Some(RoomId::new(4).unwrap())
    );
}
