//! Beast Arena - four-creature battles with a bonding-curve prediction market

pub mod arena;
pub mod combat;
pub mod core;
pub mod crank;
pub mod market;
