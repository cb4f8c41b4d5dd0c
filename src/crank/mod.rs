//! Off-ledger turn scheduler ("crank")

pub mod checkpoint;
pub mod client;
pub mod clock;
pub mod scheduler;

pub use checkpoint::Checkpoint;
pub use client::{ArenaClient, LocalHost, RpcClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{CrankReport, Scheduler};
