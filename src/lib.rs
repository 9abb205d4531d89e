//! Fleet Odds - Monte Carlo space combat calculator

pub mod battle;
pub mod core;
pub mod units;
