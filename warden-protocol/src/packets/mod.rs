//! Packet records, grouped by protocol state.

pub mod game;
pub mod ids;
