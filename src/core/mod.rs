pub mod config;
pub mod error;
pub mod types;

pub use config::{SimulationBudget, SimulationConfig};
pub use error::{ConfigError, FleetOddsError, LoadError, LookupError, Result};
pub use types::{CategoryCounts, UnitCategory};
