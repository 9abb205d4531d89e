//! Battle system constants - all tunable values in one place

/// Every combat and barrage die is a d10
pub const DIE_SIDES: i32 = 10;

/// Default location of the bundled static unit table
pub const DEFAULT_UNITS_PATH: &str = "data/units.toml";
