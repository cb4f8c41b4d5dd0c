//! Battle lifecycle: creation, authorization and atomic dispatch

pub mod controller;
pub mod instruction;

pub use controller::Arena;
pub use instruction::{ArenaSnapshot, Instruction, Outcome};
