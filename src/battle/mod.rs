//! Battle system - two-fleet space combat odds
//!
//! A battle is resolved many times over; each trial is an independent
//! randomized run of the same state machine:
//! - Anti-fighter barrage, fired simultaneously by both sides
//! - Combat rounds with simultaneous hit rolls until a fleet is destroyed
//! - Sustain damage absorbs hits before anything dies
//! - Ships die lightest first

pub mod accounting;
pub mod constants;
pub mod fleet;
pub mod monte_carlo;
pub mod resolution;
pub mod scenario;

// Re-exports for convenient access
pub use accounting::ResourceLedger;
pub use constants::*;
pub use fleet::{BattleConfig, FleetConfig, FleetState, UnitInstance};
pub use monte_carlo::{BattleResult, BattleSimulator, SeededStreams, TrialStreams};
pub use resolution::{resolve_battle, BattlePhase, SingleBattle, TrialOutcome, Winner};
pub use scenario::{FleetSpec, Scenario};
