//! Unit stat repository: owns the static table and resolves effective stats
//!
//! The table is loaded once per repository and is read-only afterwards, so
//! a loaded repository can be shared across rayon workers by reference.

use std::sync::{Mutex, OnceLock, PoisonError};

use crate::core::error::{LoadError, LookupError, Result};
use crate::core::types::UnitCategory;
use crate::units::loader::UnitSource;
use crate::units::merge::merge_layers;
use crate::units::schema::{UnitDef, UnitTables, ANTI_FIGHTER_BARRAGE, SUSTAIN_DAMAGE};
use crate::units::stats::EffectiveUnitStats;

#[derive(Debug, Default)]
pub struct UnitStatsRepository {
    tables: OnceLock<UnitTables>,
    /// Serializes first-time loads so exactly one loader runs
    init: Mutex<()>,
}

impl UnitStatsRepository {
    /// Create an empty repository; call `load` before querying
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and load in one step
    pub fn from_source(source: &UnitSource) -> std::result::Result<Self, LoadError> {
        let repo = Self::new();
        repo.load(source)?;
        Ok(repo)
    }

    /// Load the static table. A second call is a no-op.
    pub fn load(&self, source: &UnitSource) -> std::result::Result<(), LoadError> {
        self.load_with(|| source.load())
    }

    /// Load using an arbitrary loader. Concurrent first callers block until
    /// the single winning load finishes; the loser's closure never runs.
    pub fn load_with<F>(&self, loader: F) -> std::result::Result<(), LoadError>
    where
        F: FnOnce() -> std::result::Result<UnitTables, LoadError>,
    {
        if self.tables.get().is_some() {
            return Ok(());
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if self.tables.get().is_some() {
            return Ok(());
        }

        let tables = loader()?;
        tracing::debug!(
            units = tables.units.len(),
            upgrades = tables.upgrades.len(),
            factions = tables.factions.len(),
            "Unit table loaded"
        );
        // Only reachable by the lock holder, so the cell is still empty
        let _ = self.tables.set(tables);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.tables.get().is_some()
    }

    fn tables(&self) -> std::result::Result<&UnitTables, LoadError> {
        self.tables.get().ok_or(LoadError::NotLoaded)
    }

    /// Resolve the effective stats for a unit key with optional layers.
    ///
    /// Unknown faction or upgrade ids contribute no layer.
    pub fn resolve(
        &self,
        unit_key: &str,
        faction_id: Option<&str>,
        upgrade_id: Option<&str>,
    ) -> Result<EffectiveUnitStats> {
        let tables = self.tables()?;
        let base = base_record(tables, unit_key, faction_id)?;

        let upgrade = upgrade_id.and_then(|id| tables.upgrades.get(id).map(|u| (id, u)));
        if let Some((id, upgrade)) = upgrade {
            if upgrade.base_id != unit_key {
                tracing::warn!(
                    upgrade = id,
                    base_id = %upgrade.base_id,
                    unit_key,
                    "Upgrade applied to a unit it does not belong to"
                );
            }
        }
        let faction_layer = faction_id
            .and_then(|id| tables.factions.get(id))
            .and_then(|f| f.unit_overrides.get(unit_key));

        let merged = merge_layers(base, upgrade.map(|(_, u)| &u.layer), faction_layer);

        let combat = merged
            .space_combat
            .ok_or_else(|| LookupError::MissingCombatProfile(unit_key.to_string()))?;

        let category = base
            .unit_category()
            .ok_or_else(|| LookupError::UnmappedCategory(base.category.clone()))?;

        let (anti_fighter_dice, anti_fighter_hit_on) = merged
            .first_ability(ANTI_FIGHTER_BARRAGE)
            .map(|a| (a.dice.unwrap_or(0), a.hit_on.unwrap_or(0)))
            .unwrap_or((0, 0));

        let id = match upgrade {
            Some((id, _)) => id.to_string(),
            None => unit_key.to_string(),
        };

        Ok(EffectiveUnitStats {
            id,
            category,
            display_name: merged.display_name.clone(),
            space_dice: combat.dice,
            space_hit_on: combat.hit_on,
            has_sustain_damage: merged.has_ability(SUSTAIN_DAMAGE),
            anti_fighter_dice,
            anti_fighter_hit_on,
            cost_resources: base.cost.map(|c| c.resources).unwrap_or(0),
            movement: merged.movement,
            capacity: merged.capacity,
        })
    }

    /// Resolve the stats a ship of `category` fights with.
    ///
    /// Categories without an upgraded variant ignore `is_upgraded`.
    pub fn resolve_for_battle(
        &self,
        category: UnitCategory,
        faction_id: Option<&str>,
        is_upgraded: bool,
    ) -> Result<EffectiveUnitStats> {
        let upgrade_id = if is_upgraded {
            category.upgrade_id()
        } else {
            None
        };
        self.resolve(category.unit_key(), faction_id, upgrade_id)
    }

    /// Resource cost of one ship; always the base definition's cost
    pub fn resource_cost(
        &self,
        category: UnitCategory,
        faction_id: Option<&str>,
        _is_upgraded: bool,
    ) -> Result<u32> {
        let tables = self.tables()?;
        let base = base_record(tables, category.unit_key(), faction_id)?;
        Ok(base.cost.map(|c| c.resources).unwrap_or(0))
    }

    /// Faction-wide combat roll modifier; 0 for no faction or an unknown one
    pub fn faction_combat_modifier(&self, faction_id: Option<&str>) -> Result<i32> {
        let tables = self.tables()?;
        Ok(faction_id
            .and_then(|id| tables.factions.get(id))
            .and_then(|f| f.combat_modifier)
            .unwrap_or(0))
    }

    /// Find a faction by id or by display name, case-insensitively
    pub fn find_faction(&self, name_or_id: &str) -> Result<Option<String>> {
        let tables = self.tables()?;
        let wanted = name_or_id.trim();
        if wanted.is_empty() {
            return Ok(None);
        }
        if tables.factions.contains_key(wanted) {
            return Ok(Some(wanted.to_string()));
        }
        Ok(tables
            .factions
            .iter()
            .find(|(id, f)| {
                id.eq_ignore_ascii_case(wanted) || f.display_name.eq_ignore_ascii_case(wanted)
            })
            .map(|(id, _)| id.clone()))
    }

    /// All factions as (id, display name), sorted by display name
    pub fn factions(&self) -> Result<Vec<(String, String)>> {
        let tables = self.tables()?;
        let mut list: Vec<_> = tables
            .factions
            .iter()
            .map(|(id, f)| (id.clone(), f.display_name.clone()))
            .collect();
        list.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(list)
    }
}

/// Base definition for a unit key. A faction's own flagship replaces the
/// generic flagship record.
fn base_record<'a>(
    tables: &'a UnitTables,
    unit_key: &str,
    faction_id: Option<&str>,
) -> std::result::Result<&'a UnitDef, LookupError> {
    if unit_key == UnitCategory::Flagship.unit_key() {
        let own = faction_id
            .and_then(|id| tables.factions.get(id))
            .and_then(|f| f.flagship.as_ref());
        if let Some(flagship) = own {
            return Ok(flagship);
        }
    }
    tables
        .units
        .get(unit_key)
        .ok_or_else(|| LookupError::UnknownUnit(unit_key.to_string()))
}
