//! Fully resolved combat profile of one unit variant

use serde::{Deserialize, Serialize};

use crate::core::types::UnitCategory;

/// Immutable result of merging base, upgrade and faction layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveUnitStats {
    /// Upgrade id when an upgrade applied, otherwise the unit key
    pub id: String,
    pub category: UnitCategory,
    pub display_name: String,
    pub space_dice: u32,
    pub space_hit_on: i32,
    pub has_sustain_damage: bool,
    /// Zero when the unit has no barrage
    pub anti_fighter_dice: u32,
    pub anti_fighter_hit_on: i32,
    pub cost_resources: u32,
    pub movement: u32,
    pub capacity: u32,
}

impl EffectiveUnitStats {
    pub fn has_barrage(&self) -> bool {
        self.anti_fighter_dice > 0
    }

    /// Whether a d10 plus `modifier` can ever reach this unit's threshold
    pub fn can_score_hit(&self, modifier: i32) -> bool {
        self.space_dice > 0
            && self.space_hit_on.saturating_sub(modifier) <= crate::battle::constants::DIE_SIDES
    }
}
