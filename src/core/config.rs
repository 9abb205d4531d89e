//! Simulation configuration with documented constants
//!
//! The simulation count itself comes from a coarse user-facing setting;
//! everything else here tunes how trials are executed, never their outcome.

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// Coarse "how hard should we work" setting exposed to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationBudget {
    Low,
    Medium,
    High,
}

impl SimulationBudget {
    /// Parse a setting string. Anything unrecognized falls back to Medium.
    pub fn from_setting(setting: &str) -> Self {
        match setting.trim().to_lowercase().as_str() {
            "low" => SimulationBudget::Low,
            "high" => SimulationBudget::High,
            _ => SimulationBudget::Medium,
        }
    }

    /// Number of Monte Carlo trials for this budget
    pub fn simulations(self) -> u32 {
        match self {
            SimulationBudget::Low => 500,
            SimulationBudget::Medium => 3000,
            SimulationBudget::High => 10_000,
        }
    }
}

impl Default for SimulationBudget {
    fn default() -> Self {
        SimulationBudget::Medium
    }
}

/// Configuration for the Monte Carlo driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Minimum trial count before using parallel processing
    ///
    /// Below this threshold thread overhead exceeds benefits. Results are
    /// identical either way because every trial owns its RNG stream.
    pub parallel_threshold: usize,

    /// Optional hard cap on regular combat rounds per trial
    ///
    /// `None` runs every trial to its natural end. A capped trial is
    /// recorded as a stalemate draw.
    pub max_rounds: Option<u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 1000,
            max_rounds: None,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run everything on the calling thread
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == Some(0) {
            return Err(ConfigError::InvalidSetting(
                "max_rounds must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_mapping() {
        assert_eq!(SimulationBudget::from_setting("low").simulations(), 500);
        assert_eq!(SimulationBudget::from_setting("Medium").simulations(), 3000);
        assert_eq!(SimulationBudget::from_setting("HIGH").simulations(), 10_000);
        assert_eq!(SimulationBudget::from_setting("extreme").simulations(), 3000);
        assert_eq!(SimulationBudget::from_setting("").simulations(), 3000);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.max_rounds.is_none());
    }

    #[test]
    fn test_zero_round_cap_rejected() {
        let config = SimulationConfig {
            max_rounds: Some(0),
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_partial_toml() {
        let config: SimulationConfig = toml::from_str("max_rounds = 50").unwrap();
        assert_eq!(config.max_rounds, Some(50));
        assert_eq!(config.parallel_threshold, 1000);
    }
}
