//! Battle scenarios loaded from TOML
//!
//! A scenario names two fleets by faction and ship counts and optionally
//! carries a simulation count, a usage setting, a seed and driver settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::fleet::{BattleConfig, FleetConfig};
use crate::core::config::{SimulationBudget, SimulationConfig};
use crate::core::error::{ConfigError, LookupError, Result};
use crate::core::types::UnitCategory;
use crate::units::UnitStatsRepository;

/// One fleet as written in a scenario file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Faction id or display name
    #[serde(default)]
    pub faction: Option<String>,
    /// Ship counts keyed by category ("war_sun", "Dreadnought", ...)
    #[serde(default)]
    pub ships: BTreeMap<String, u32>,
    #[serde(default)]
    pub upgraded: Vec<String>,
    /// Overrides the faction's own combat modifier when present
    #[serde(default)]
    pub combat_modifier: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub simulations: Option<u32>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub player1: FleetSpec,
    pub player2: FleetSpec,
}

fn parse_category(tag: &str) -> std::result::Result<UnitCategory, LookupError> {
    UnitCategory::from_tag(tag).ok_or_else(|| LookupError::UnmappedCategory(tag.to_string()))
}

impl FleetSpec {
    /// Build a `FleetConfig`, resolving the faction and its combat modifier
    pub fn to_config(&self, default_name: &str, repo: &UnitStatsRepository) -> Result<FleetConfig> {
        let faction_id = match self.faction.as_deref() {
            Some(name) => {
                let found = repo.find_faction(name)?;
                if found.is_none() && !name.trim().is_empty() {
                    tracing::warn!(faction = name, "Unknown faction, fighting without one");
                }
                found
            }
            None => None,
        };

        let name = self.name.clone().unwrap_or_else(|| default_name.to_string());
        let mut config = FleetConfig::new(name);
        for (tag, &count) in &self.ships {
            let category = parse_category(tag)?;
            let slot = config.ships.entry(category).or_insert(0);
            *slot = slot.checked_add(count).ok_or_else(|| {
                ConfigError::InvalidSetting(format!(
                    "Ship count for {} overflows",
                    category.display_name()
                ))
            })?;
        }
        for tag in &self.upgraded {
            config.upgraded.insert(parse_category(tag)?);
        }

        config.combat_modifier = match self.combat_modifier {
            Some(modifier) => modifier,
            None => repo.faction_combat_modifier(faction_id.as_deref())?,
        };
        config.faction_id = faction_id;
        Ok(config)
    }
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::InvalidSetting(format!("Invalid scenario TOML: {}", e)))
    }

    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidSetting(format!("Failed to read scenario {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Simulation count: explicit override, then the file's count, then its
    /// usage setting (unknown or missing usage means medium)
    pub fn simulation_count(&self, override_count: Option<u32>) -> u32 {
        override_count
            .or(self.simulations)
            .unwrap_or_else(|| {
                SimulationBudget::from_setting(self.usage.as_deref().unwrap_or("")).simulations()
            })
    }

    pub fn battle_config(
        &self,
        repo: &UnitStatsRepository,
        override_count: Option<u32>,
    ) -> Result<BattleConfig> {
        Ok(BattleConfig::new(
            self.player1.to_config("Player 1", repo)?,
            self.player2.to_config("Player 2", repo)?,
            self.simulation_count(override_count),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FleetOddsError;
    use crate::units::UnitSource;

    const TABLE: &str = r#"
[units.cruiser]
display_name = "Cruiser"
category = "Cruiser"
space_combat = { dice = 1, hit_on = 7 }

[factions.sardakk_norr]
display_name = "Sardakk N'orr"
combat_modifier = 1
"#;

    const SCENARIO: &str = r#"
usage = "low"
seed = 17

[simulation]
parallel_threshold = 5000

[player1]
name = "Red"
faction = "Sardakk N'orr"
upgraded = ["cruiser"]

[player1.ships]
cruiser = 3
war_sun = 0

[player2]
faction = "Nobody Special"

[player2.ships]
Cruiser = 2
"#;

    fn repo() -> UnitStatsRepository {
        UnitStatsRepository::from_source(&UnitSource::Toml(TABLE.into())).unwrap()
    }

    #[test]
    fn test_scenario_to_battle_config() {
        let repo = repo();
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let battle = scenario.battle_config(&repo, None).unwrap();

        assert_eq!(battle.simulations, 500);
        assert_eq!(scenario.seed, Some(17));
        assert_eq!(scenario.simulation.parallel_threshold, 5000);

        assert_eq!(battle.player1.name, "Red");
        assert_eq!(battle.player1.faction(), Some("sardakk_norr"));
        assert_eq!(battle.player1.combat_modifier, 1);
        assert!(battle.player1.is_upgraded(UnitCategory::Cruiser));
        assert_eq!(battle.player1.total_units(), 3);

        assert_eq!(battle.player2.name, "Player 2");
        assert_eq!(battle.player2.faction(), None);
        assert_eq!(battle.player2.combat_modifier, 0);
        assert_eq!(battle.player2.ships[&UnitCategory::Cruiser], 2);
    }

    #[test]
    fn test_simulation_count_precedence() {
        let mut scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        assert_eq!(scenario.simulation_count(Some(42)), 42);
        assert_eq!(scenario.simulation_count(None), 500);

        scenario.simulations = Some(1234);
        assert_eq!(scenario.simulation_count(None), 1234);

        scenario.simulations = None;
        scenario.usage = None;
        assert_eq!(scenario.simulation_count(None), 3000);
    }

    #[test]
    fn test_explicit_modifier_wins() {
        let repo = repo();
        let spec = FleetSpec {
            faction: Some("sardakk_norr".into()),
            combat_modifier: Some(-1),
            ..FleetSpec::default()
        };
        assert_eq!(spec.to_config("P", &repo).unwrap().combat_modifier, -1);
    }

    #[test]
    fn test_unknown_ship_tag_is_lookup_error() {
        let repo = repo();
        let mut spec = FleetSpec::default();
        spec.ships.insert("mech".into(), 2);

        let err = spec.to_config("P", &repo).unwrap_err();
        assert!(matches!(
            err,
            FleetOddsError::Lookup(LookupError::UnmappedCategory(ref tag)) if tag == "mech"
        ));
    }

    #[test]
    fn test_duplicate_tags_merge_and_overflow_is_rejected() {
        let repo = repo();
        let mut spec = FleetSpec::default();
        spec.ships.insert("war_sun".into(), 2);
        spec.ships.insert("WarSun".into(), 3);
        let config = spec.to_config("P", &repo).unwrap();
        assert_eq!(config.ships[&UnitCategory::WarSun], 5);

        spec.ships.insert("war_sun".into(), u32::MAX);
        let err = spec.to_config("P", &repo).unwrap_err();
        assert!(matches!(err, FleetOddsError::Config(ConfigError::InvalidSetting(_))));
    }

    #[test]
    fn test_bad_scenario_toml() {
        assert!(Scenario::from_toml_str("[player1").is_err());
        assert!(Scenario::from_toml_str("usage = \"high\"").is_err());
    }
}
