//! Fleet configuration and trial-scoped fleet state
//!
//! `FleetConfig` is what callers hand in. `FleetState` is built from it once
//! per simulation batch and cloned fresh for every trial.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::constants::DIE_SIDES;
use crate::core::error::{ConfigError, Result};
use crate::core::types::{CategoryCounts, UnitCategory};
use crate::units::{EffectiveUnitStats, UnitStatsRepository};

/// One side of a battle as described by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    pub name: String,
    pub faction_id: Option<String>,
    pub ships: BTreeMap<UnitCategory, u32>,
    pub upgraded: BTreeSet<UnitCategory>,
    /// Added to every regular combat roll of this fleet
    pub combat_modifier: i32,
}

impl FleetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_faction(mut self, faction_id: impl Into<String>) -> Self {
        self.faction_id = Some(faction_id.into());
        self
    }

    pub fn with_ships(mut self, category: UnitCategory, count: u32) -> Self {
        self.ships.insert(category, count);
        self
    }

    pub fn with_upgrade(mut self, category: UnitCategory) -> Self {
        self.upgraded.insert(category);
        self
    }

    pub fn with_combat_modifier(mut self, modifier: i32) -> Self {
        self.combat_modifier = modifier;
        self
    }

    pub fn faction(&self) -> Option<&str> {
        self.faction_id.as_deref()
    }

    pub fn is_upgraded(&self, category: UnitCategory) -> bool {
        self.upgraded.contains(&category)
    }

    pub fn total_units(&self) -> u32 {
        self.ships.values().fold(0, |total, &n| total.saturating_add(n))
    }

    pub fn initial_counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::new();
        for (&category, &count) in &self.ships {
            counts[category] += count;
        }
        counts
    }
}

/// Two fleets and how many trials to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    pub player1: FleetConfig,
    pub player2: FleetConfig,
    pub simulations: u32,
}

impl BattleConfig {
    pub fn new(player1: FleetConfig, player2: FleetConfig, simulations: u32) -> Self {
        Self {
            player1,
            player2,
            simulations,
        }
    }

    /// Reject battles that cannot produce a meaningful result
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for fleet in [&self.player1, &self.player2] {
            if fleet.total_units() == 0 {
                return Err(ConfigError::EmptyFleet {
                    side: fleet.name.clone(),
                });
            }
        }
        if self.simulations == 0 {
            return Err(ConfigError::ZeroSimulations);
        }
        Ok(())
    }
}

/// A single ship in a running trial
#[derive(Debug, Clone)]
pub struct UnitInstance {
    pub stats: Arc<EffectiveUnitStats>,
    pub combat_modifier: i32,
    /// Sustain damage already used this trial
    pub damaged: bool,
}

impl UnitInstance {
    pub fn new(stats: Arc<EffectiveUnitStats>, combat_modifier: i32) -> Self {
        Self {
            stats,
            combat_modifier,
            damaged: false,
        }
    }

    pub fn category(&self) -> UnitCategory {
        self.stats.category
    }

    fn can_absorb(&self) -> bool {
        self.stats.has_sustain_damage && !self.damaged
    }
}

/// Unordered multiset of living ships; destroyed when empty
#[derive(Debug, Clone, Default)]
pub struct FleetState {
    units: Vec<UnitInstance>,
}

impl FleetState {
    pub fn new(units: Vec<UnitInstance>) -> Self {
        Self { units }
    }

    /// Expand a config into one instance per ship, skipping zero counts
    pub fn from_config(config: &FleetConfig, repo: &UnitStatsRepository) -> Result<Self> {
        let mut units = Vec::with_capacity(config.total_units() as usize);
        for (&category, &count) in &config.ships {
            if count == 0 {
                continue;
            }
            let stats = Arc::new(repo.resolve_for_battle(
                category,
                config.faction(),
                config.is_upgraded(category),
            )?);
            units.extend(
                (0..count).map(|_| UnitInstance::new(Arc::clone(&stats), config.combat_modifier)),
            );
        }
        Ok(Self { units })
    }

    pub fn units(&self) -> &[UnitInstance] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.units.is_empty()
    }

    pub fn counts(&self) -> CategoryCounts {
        self.units.iter().map(UnitInstance::category).collect()
    }

    /// Whether any living ship can ever roll a hit
    pub fn can_score(&self) -> bool {
        self.units
            .iter()
            .any(|u| u.stats.can_score_hit(u.combat_modifier))
    }

    /// Roll every living ship's combat dice; d10 + modifier >= threshold hits
    pub fn roll_hits<R: Rng>(&self, rng: &mut R) -> u32 {
        let mut hits = 0;
        for unit in &self.units {
            for _ in 0..unit.stats.space_dice {
                let roll = rng.gen_range(1..=DIE_SIDES).saturating_add(unit.combat_modifier);
                if roll >= unit.stats.space_hit_on {
                    hits += 1;
                }
            }
        }
        hits
    }

    /// Roll anti-fighter barrage; the fleet modifier does not apply
    pub fn roll_barrage<R: Rng>(&self, rng: &mut R) -> u32 {
        let mut hits = 0;
        for unit in self.units.iter().filter(|u| u.stats.has_barrage()) {
            for _ in 0..unit.stats.anti_fighter_dice {
                if rng.gen_range(1..=DIE_SIDES) >= unit.stats.anti_fighter_hit_on {
                    hits += 1;
                }
            }
        }
        hits
    }

    /// Barrage hits only destroy screening ships; excess hits are wasted
    pub fn destroy_screen(&mut self, hits: u32) -> u32 {
        let mut doomed = CategoryCounts::new();
        doomed[UnitCategory::SCREEN] = hits.min(self.counts()[UnitCategory::SCREEN]);
        self.remove(doomed)
    }

    /// Apply regular combat hits: sustain absorption first, then destroy by
    /// kill order. Returns the number of ships destroyed.
    pub fn apply_hits(&mut self, hits: u32) -> u32 {
        let mut remaining = hits;
        if remaining == 0 || self.units.is_empty() {
            return 0;
        }

        for unit in self.units.iter_mut() {
            if remaining == 0 {
                break;
            }
            if unit.can_absorb() {
                unit.damaged = true;
                remaining -= 1;
            }
        }
        if remaining == 0 {
            return 0;
        }

        let living = self.counts();
        let mut doomed = CategoryCounts::new();
        for category in UnitCategory::KILL_ORDER {
            let killed = remaining.min(living[category]);
            doomed[category] = killed;
            remaining -= killed;
            if remaining == 0 {
                break;
            }
        }
        self.remove(doomed)
    }

    /// Remove `doomed[c]` ships of each category. Ships within a category are
    /// interchangeable at this point: if any remain to die, every sustain
    /// ship among them has already been flipped.
    fn remove(&mut self, mut doomed: CategoryCounts) -> u32 {
        let total = doomed.total();
        if total == 0 {
            return 0;
        }
        self.units.retain(|unit| {
            let slot = &mut doomed[unit.category()];
            if *slot > 0 {
                *slot -= 1;
                false
            } else {
                true
            }
        });
        total
    }
}
