//! Headless Battle Runner
//!
//! Runs many seeded battles to completion on a simulated clock and prints
//! outcome statistics. Useful for checking that stat choices give each
//! creature a fair chance and battles end in reasonable time.

use beast_arena::combat::{advance, turn_rng, turn_seed, Battle, BattleEnd, BattleParams};
use beast_arena::core::types::{BattleId, TxContext, UserId, CREATURE_COUNT};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

/// Headless Battle Runner - seeded battles for balance checks
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run seeded arena battles and output outcome statistics")]
struct Args {
    /// Number of battles to simulate
    #[arg(long, short = 'n', default_value_t = 1000)]
    battles: u64,

    /// Base seed; battle i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 100)]
    hp: u16,

    #[arg(long, default_value_t = 50)]
    atk: u16,

    #[arg(long, default_value_t = 20)]
    def: u16,

    #[arg(long, default_value_t = 30)]
    spd: u16,

    /// Seconds between turns
    #[arg(long, default_value_t = 10)]
    interval: i64,

    /// Seconds before a battle times out
    #[arg(long, default_value_t = 86_400)]
    max_duration: i64,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Include every battle in the output, not just the summary
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct BattleOutcome {
    battle_id: u64,
    seed: u64,
    turns: u64,
    end: String,
    winner: Option<u8>,
}

#[derive(Serialize)]
struct Summary {
    battles: u64,
    seed: u64,
    wins: [u64; CREATURE_COUNT],
    draws: u64,
    timeouts: u64,
    mean_turns: f64,
    max_turns: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    outcomes: Vec<BattleOutcome>,
}

fn run_battle(id: u64, seed: u64, params: &BattleParams) -> Result<BattleOutcome, String> {
    let battle_id = BattleId(id);
    let caller = UserId::default();
    let mut now = 0;
    let mut battle = Battle::new(battle_id, caller, params, now);

    while !battle.is_over() {
        now += params.turn_interval_secs;
        // Stand-in for the ledger's slot: unique per battle and turn
        let slot = seed.wrapping_add(battle.current_turn);
        let ctx = TxContext::new(caller, now, slot);
        let mut rng = turn_rng(turn_seed(&ctx, battle_id, battle.current_turn));
        let (next, _log) = advance(&battle, now, &mut rng).map_err(|e| e.to_string())?;
        battle = next;
    }

    let end = match battle.winner {
        Some(w) => BattleEnd::Winner(w),
        None if battle.alive_count() == 0 => BattleEnd::Draw,
        None => BattleEnd::Timeout,
    };
    Ok(BattleOutcome {
        battle_id: id,
        seed,
        turns: battle.current_turn,
        end: format!("{:?}", end),
        winner: battle.winner.map(|w| w.get()),
    })
}

fn main() {
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let params = BattleParams {
        hp: args.hp,
        atk: args.atk,
        def: args.def,
        spd: args.spd,
        turn_interval_secs: args.interval,
        max_duration_secs: args.max_duration,
    };
    if let Err(e) = params.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    let results: Vec<Result<BattleOutcome, String>> = (0..args.battles)
        .into_par_iter()
        .map(|i| run_battle(i + 1, seed.wrapping_add(i), &params))
        .collect();

    let mut outcomes = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => eprintln!("Warning: battle aborted: {}", e),
        }
    }

    let mut wins = [0u64; CREATURE_COUNT];
    let mut draws = 0;
    let mut timeouts = 0;
    for outcome in &outcomes {
        match outcome.winner {
            Some(w) => wins[w as usize] += 1,
            None if outcome.end == "Draw" => draws += 1,
            None => timeouts += 1,
        }
    }
    let total_turns: u64 = outcomes.iter().map(|o| o.turns).sum();
    let summary = Summary {
        battles: outcomes.len() as u64,
        seed,
        wins,
        draws,
        timeouts,
        mean_turns: if outcomes.is_empty() {
            0.0
        } else {
            total_turns as f64 / outcomes.len() as f64
        },
        max_turns: outcomes.iter().map(|o| o.turns).max().unwrap_or(0),
        outcomes: if args.verbose { outcomes } else { Vec::new() },
    };

    match args.format.as_str() {
        "text" => {
            println!("Battle Runner");
            println!("=============");
            println!("Battles: {}", summary.battles);
            for (i, w) in summary.wins.iter().enumerate() {
                println!("Creature {} wins: {}", i, w);
            }
            println!("Draws: {}", summary.draws);
            println!("Timeouts: {}", summary.timeouts);
            println!("Mean turns: {:.1}", summary.mean_turns);
            println!("Max turns: {}", summary.max_turns);
            println!("Seed: {}", summary.seed);
            for outcome in &summary.outcomes {
                println!(
                    "  #{} seed={} turns={} end={}",
                    outcome.battle_id, outcome.seed, outcome.turns, outcome.end
                );
            }
        }
        format => {
            if format != "json" {
                eprintln!("Unknown format '{}', defaulting to json", format);
            }
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }
}
