//! Static unit table records
//!
//! Three tiers: base unit definitions, upgrade deltas keyed by upgrade id,
//! and faction definitions carrying per-unit overrides. Upgrade and faction
//! tiers are partial records where every field is optional.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::LoadError;
use crate::core::types::UnitCategory;

/// Ability key granting one free hit absorption per battle
pub const SUSTAIN_DAMAGE: &str = "SUSTAIN_DAMAGE";

/// Ability key for the pre-combat barrage against fighters
pub const ANTI_FIGHTER_BARRAGE: &str = "ANTI_FIGHTER_BARRAGE";

/// Root of the static unit table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitTables {
    #[serde(default)]
    pub edition: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub units: AHashMap<String, UnitDef>,
    #[serde(default)]
    pub upgrades: AHashMap<String, UnitUpgrade>,
    #[serde(default)]
    pub factions: AHashMap<String, FactionDef>,
}

/// Full base definition of a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDef {
    pub display_name: String,
    /// Category tag, e.g. "Dreadnought" or "WarSun"
    pub category: String,
    #[serde(default)]
    pub cost: Option<UnitCost>,
    #[serde(default)]
    pub space_combat: Option<SpaceCombat>,
    #[serde(default, rename = "move")]
    pub movement: u32,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub abilities: Vec<Ability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCost {
    pub resources: u32,
    #[serde(default = "default_units_produced")]
    pub units_produced: u32,
}

fn default_units_produced() -> u32 {
    1
}

/// Primary combat profile: roll `dice` d10s, each hits on `hit_on` or better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceCombat {
    pub dice: u32,
    pub hit_on: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub key: String,
    #[serde(default)]
    pub dice: Option<u32>,
    #[serde(default)]
    pub hit_on: Option<i32>,
}

impl Ability {
    pub fn flag(key: &str) -> Self {
        Self {
            key: key.to_string(),
            dice: None,
            hit_on: None,
        }
    }

    pub fn roll(key: &str, dice: u32, hit_on: i32) -> Self {
        Self {
            key: key.to_string(),
            dice: Some(dice),
            hit_on: Some(hit_on),
        }
    }
}

/// Partial unit record: only the fields that are present override
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitLayer {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub space_combat: Option<SpaceCombat>,
    #[serde(default, rename = "move")]
    pub movement: Option<u32>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub abilities: Option<Vec<Ability>>,
}

/// Upgrade delta for one base unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitUpgrade {
    pub base_id: String,
    #[serde(flatten)]
    pub layer: UnitLayer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionDef {
    pub display_name: String,
    /// Overrides keyed by base unit id
    #[serde(default)]
    pub unit_overrides: AHashMap<String, UnitLayer>,
    /// Faction-specific flagship, replacing the generic one
    #[serde(default)]
    pub flagship: Option<UnitDef>,
    /// Added to every regular combat roll of this faction's ships
    #[serde(default)]
    pub combat_modifier: Option<i32>,
}

impl UnitDef {
    pub fn unit_category(&self) -> Option<UnitCategory> {
        UnitCategory::from_tag(&self.category)
    }
}

impl UnitTables {
    /// Check the invariants the resolver relies on
    pub fn validate(&self) -> Result<(), LoadError> {
        for (id, unit) in &self.units {
            check_category(id, unit)?;
        }
        for (id, faction) in &self.factions {
            if let Some(flagship) = &faction.flagship {
                check_category(&format!("{}.flagship", id), flagship)?;
            }
        }
        Ok(())
    }
}

fn check_category(id: &str, unit: &UnitDef) -> Result<(), LoadError> {
    match unit.unit_category() {
        Some(_) => Ok(()),
        None => Err(LoadError::UnknownCategoryTag {
            unit: id.to_string(),
            tag: unit.category.clone(),
        }),
    }
}
