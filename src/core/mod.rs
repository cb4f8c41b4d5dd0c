pub mod config;
pub mod error;
pub mod types;

pub use config::CrankConfig;
pub use error::{ArenaError, ErrorKind, Result};
