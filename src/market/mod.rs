//! Outcome market - one bonding-curve pool per creature, parimutuel payout
//!
//! Like the combat engine, every function here computes a next state and
//! leaves writing it to the arena.

pub mod curve;
pub mod position;
pub mod settlement;
pub mod state;
pub mod trade;

pub use curve::{BuyQuote, SellQuote, MIN_BUY_AMOUNT, PRICE_SCALE};
pub use position::{Position, PositionKey, PositionLedger};
pub use settlement::{claim, payout_for, settle, ClaimReceipt};
pub use state::{Market, Settlement};
pub use trade::{buy, sell, BuyReceipt, SellReceipt};
