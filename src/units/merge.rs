//! Layered stat merge: faction override > upgrade delta > base definition
//!
//! Scalar fields take the value from the highest layer that sets them.
//! Ability lists are never replaced: they concatenate base, then upgrade,
//! then faction. Lookups by key over the concatenation see the first entry.

use crate::units::schema::{Ability, SpaceCombat, UnitDef, UnitLayer};

/// Base record with both optional layers folded in
#[derive(Debug, Clone, PartialEq)]
pub struct MergedUnit {
    pub display_name: String,
    pub space_combat: Option<SpaceCombat>,
    pub movement: u32,
    pub capacity: u32,
    pub abilities: Vec<Ability>,
}

pub fn merge_layers(
    base: &UnitDef,
    upgrade: Option<&UnitLayer>,
    faction: Option<&UnitLayer>,
) -> MergedUnit {
    let display_name = pick(faction, upgrade, |l| l.display_name.clone())
        .unwrap_or_else(|| base.display_name.clone());
    let space_combat = pick(faction, upgrade, |l| l.space_combat).or(base.space_combat);
    let movement = pick(faction, upgrade, |l| l.movement).unwrap_or(base.movement);
    let capacity = pick(faction, upgrade, |l| l.capacity).unwrap_or(base.capacity);

    let mut abilities = base.abilities.clone();
    for layer in [upgrade, faction].into_iter().flatten() {
        if let Some(extra) = &layer.abilities {
            abilities.extend(extra.iter().cloned());
        }
    }

    MergedUnit {
        display_name,
        space_combat,
        movement,
        capacity,
        abilities,
    }
}

/// First layer (faction, then upgrade) that sets the field
fn pick<T>(
    faction: Option<&UnitLayer>,
    upgrade: Option<&UnitLayer>,
    field: impl Fn(&UnitLayer) -> Option<T>,
) -> Option<T> {
    faction.and_then(&field).or_else(|| upgrade.and_then(&field))
}

impl MergedUnit {
    /// True if any layer granted the ability
    pub fn has_ability(&self, key: &str) -> bool {
        self.abilities.iter().any(|a| a.key == key)
    }

    /// First entry with this key; later duplicates are ignored
    pub fn first_ability(&self, key: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.key == key)
    }
}
