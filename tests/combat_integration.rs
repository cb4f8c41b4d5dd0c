//! Combat integration tests

use beast_arena::arena::Arena;
use beast_arena::combat::*;
use beast_arena::core::error::ArenaError;
use beast_arena::core::types::{BattleId, TxContext, UserId};
use proptest::prelude::*;

const T0: i64 = 1_700_000_000;

fn standard_params() -> BattleParams {
    BattleParams {
        hp: 100,
        atk: 50,
        def: 20,
        spd: 30,
        turn_interval_secs: 10,
        max_duration_secs: 86_400,
    }
}

#[test]
fn test_battle_runs_to_single_survivor() {
    let operator = UserId::new();
    let mut arena = Arena::new(operator);
    let id = BattleId(1);
    arena
        .create_battle(&TxContext::new(operator, T0, 0), id, &standard_params())
        .unwrap();

    let cranker = UserId::new();
    let mut now = T0;
    let mut turns = 0;
    while !arena.battle(id).unwrap().is_over() {
        now += 10;
        turns += 1;
        let ctx = TxContext::new(cranker, now, turns);
        let (battle, log) = arena.advance_turn(&ctx, id).unwrap();
        assert_eq!(battle.current_turn, turns);
        assert_eq!(log.turn_number, turns);
        assert!(turns < 100, "battle did not finish");
    }

    let battle = arena.battle(id).unwrap();
    let winner = battle.winner.expect("hp 100 battles end by knockout");
    assert_eq!(battle.alive_indices(), vec![winner]);
    for (i, creature) in battle.creatures.iter().enumerate() {
        if i != winner.as_usize() {
            assert!(!creature.alive);
            assert_eq!(creature.current_hp, 0);
        }
    }

    // Terminal: further turns fail and change nothing
    let before = battle.clone();
    let err = arena
        .advance_turn(&TxContext::new(cranker, now + 100, 999), id)
        .unwrap_err();
    assert_eq!(err, ArenaError::BattleAlreadyOver(id));
    assert_eq!(arena.battle(id).unwrap(), &before);
}

#[test]
fn test_rate_limited_leaves_state_identical() {
    let operator = UserId::new();
    let mut arena = Arena::new(operator);
    let id = BattleId(2);
    arena
        .create_battle(&TxContext::new(operator, T0, 0), id, &standard_params())
        .unwrap();
    let before = serde_json::to_vec(arena.battle(id).unwrap()).unwrap();

    let err = arena
        .advance_turn(&TxContext::new(operator, T0 + 9, 1), id)
        .unwrap_err();
    assert_eq!(err, ArenaError::RateLimited { remaining_secs: 1 });
    assert_eq!(serde_json::to_vec(arena.battle(id).unwrap()).unwrap(), before);
}

#[test]
fn test_timeout_ends_without_winner() {
    let params = BattleParams {
        hp: 1_000,
        atk: 21,
        def: 20,
        spd: 30,
        turn_interval_secs: 10,
        max_duration_secs: 30,
    };
    let battle = Battle::new(BattleId(3), UserId::new(), &params, 0);
    let mut rng = turn_rng(42);
    let (battle, _) = advance(&battle, 10, &mut rng).unwrap();
    let (battle, _) = advance(&battle, 20, &mut rng).unwrap();
    assert!(!battle.is_over());
    let (battle, log) = advance(&battle, 30, &mut rng).unwrap();
    assert!(battle.is_over());
    assert_eq!(battle.winner, None);
    assert_eq!(log.end, Some(BattleEnd::Timeout));
    // The timed-out turn still counts
    assert_eq!(battle.current_turn, 3);
    assert_eq!(log.attacks.len(), 4);
}

#[test]
fn test_independent_battles_do_not_interfere() {
    let operator = UserId::new();
    let mut arena = Arena::new(operator);
    for id in 1..=3 {
        arena
            .create_battle(
                &TxContext::new(operator, T0, id),
                BattleId(id),
                &standard_params(),
            )
            .unwrap();
    }
    arena
        .advance_turn(&TxContext::new(operator, T0 + 10, 10), BattleId(2))
        .unwrap();
    assert_eq!(arena.battle(BattleId(1)).unwrap().current_turn, 0);
    assert_eq!(arena.battle(BattleId(2)).unwrap().current_turn, 1);
    assert_eq!(arena.battle(BattleId(3)).unwrap().current_turn, 0);
}

proptest! {
    #[test]
    fn prop_advance_is_deterministic(seed in any::<u64>(), turns in 1usize..20) {
        let start = Battle::new(BattleId(1), UserId::new(), &standard_params(), 0);
        let run = || {
            let mut battle = start.clone();
            let mut logs = Vec::new();
            let mut rng = turn_rng(seed);
            for t in 1..=turns {
                match advance(&battle, t as i64 * 10, &mut rng) {
                    Ok((next, log)) => {
                        battle = next;
                        logs.push(log);
                    }
                    Err(_) => break,
                }
            }
            (battle, logs)
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn prop_turn_counter_is_monotonic(seed in any::<u64>(), gaps in prop::collection::vec(0i64..25, 1..40)) {
        let mut battle = Battle::new(BattleId(1), UserId::new(), &standard_params(), 0);
        let mut rng = turn_rng(seed);
        let mut now = 0;
        for gap in gaps {
            now += gap;
            let before = battle.clone();
            match advance(&battle, now, &mut rng) {
                Ok((next, _)) => {
                    prop_assert_eq!(next.current_turn, before.current_turn + 1);
                    prop_assert_eq!(next.last_turn_timestamp, now);
                    battle = next;
                }
                Err(ArenaError::RateLimited { .. }) => {
                    prop_assert!(now - before.last_turn_timestamp < 10);
                }
                Err(ArenaError::BattleAlreadyOver(_)) => prop_assert!(before.is_over()),
                Err(e) => prop_assert!(false, "unexpected error {:?}", e),
            }
        }
    }

    #[test]
    fn prop_winner_is_unique_survivor(seed in any::<u64>()) {
        let mut battle = Battle::new(BattleId(1), UserId::new(), &standard_params(), 0);
        let mut rng = turn_rng(seed);
        let mut now = 0;
        while !battle.is_over() {
            now += 10;
            let (next, _) = advance(&battle, now, &mut rng).unwrap();
            battle = next;
        }
        match battle.winner {
            Some(w) => prop_assert_eq!(battle.alive_indices(), vec![w]),
            None => prop_assert!(battle.alive_count() != 1),
        }
    }
}
