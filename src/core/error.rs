use std::path::PathBuf;

use thiserror::Error;

/// Static unit table could not be produced
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read unit table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in unit table: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON in unit table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unit table queried before it was loaded")]
    NotLoaded,

    #[error("Unit '{unit}' has unknown category tag '{tag}'")]
    UnknownCategoryTag { unit: String, tag: String },
}

/// Static data does not satisfy a query
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Unknown unit key: {0}")]
    UnknownUnit(String),

    #[error("No space combat stats for {0}")]
    MissingCombatProfile(String),

    #[error("Category '{0}' cannot be mapped to a unit key")]
    UnmappedCategory(String),
}

/// Caller-supplied battle rejected before any trial runs
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{side} has no units")]
    EmptyFleet { side: String },

    #[error("Simulation count must be positive")]
    ZeroSimulations,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

#[derive(Error, Debug)]
pub enum FleetOddsError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to render result: {0}")]
    Output(#[source] serde_json::Error),
}

impl FleetOddsError {
    /// Message suitable for an end user
    pub fn user_message(&self) -> String {
        match self {
            FleetOddsError::Config(ConfigError::EmptyFleet { .. }) => {
                "Both sides need at least one unit to simulate.".to_string()
            }
            FleetOddsError::Config(e) => e.to_string(),
            FleetOddsError::Load(_) | FleetOddsError::Lookup(_) => "Simulation failed".to_string(),
            FleetOddsError::Output(_) => "Could not write the result".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FleetOddsError>;
