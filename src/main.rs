//! Arena crank - keeps battles moving
//!
//! Creates each battle and its market, advances turns as soon as the
//! interval allows, settles finished markets and rolls over to the next
//! battle id. Ctrl-C finishes the in-flight step and writes a checkpoint.

use beast_arena::arena::Arena;
use beast_arena::core::config::CrankConfig;
use beast_arena::core::error::Result;
use beast_arena::core::types::BattleId;
use beast_arena::crank::{Checkpoint, LocalHost, RpcClient, Scheduler, SystemClock};
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "arena_crank")]
#[command(about = "Drive arena battles: create, advance turns, settle, roll over")]
struct Args {
    /// TOML config file (defaults are used when omitted)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the RPC endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Start at this battle id, ignoring any checkpoint
    #[arg(long)]
    start_battle: Option<u64>,

    /// Run against an in-process arena instead of a remote host
    #[arg(long)]
    local: bool,

    /// Stop after this many battles
    #[arg(long)]
    max_battles: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => CrankConfig::load(path)?,
        None => CrankConfig::default(),
    };
    if let Some(endpoint) = args.endpoint {
        config.rpc_endpoint = endpoint;
    }
    if args.max_battles.is_some() {
        config.max_battles = args.max_battles;
    }
    config.validate()?;

    let start = match args.start_battle {
        Some(id) => BattleId(id),
        None => match Checkpoint::load(&config.checkpoint_path)? {
            Some(checkpoint) => {
                tracing::info!(
                    "Resuming from checkpoint at battle {}",
                    checkpoint.resume_battle_id
                );
                checkpoint.resume_battle_id
            }
            None => config.start_battle(),
        },
    };

    let local = args.local;
    let rt = Runtime::new()?;
    let report = rt.block_on(async move {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested, finishing current step");
                let _ = shutdown_tx.send(true);
            }
        });

        let operator = config.operator_id();
        if local {
            tracing::info!("Running against a local arena");
            let host = LocalHost::new(Arena::new(operator), SystemClock, operator);
            Scheduler::new(host, SystemClock, config, shutdown_rx)
                .run(start)
                .await
        } else {
            let client = RpcClient::new(config.rpc_endpoint.clone(), operator);
            tracing::info!("Connecting to {}", client.endpoint());
            Scheduler::new(client, SystemClock, config, shutdown_rx)
                .run(start)
                .await
        }
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
