//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Kind of ship that can take part in space combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    Fighter,
    Destroyer,
    Cruiser,
    Carrier,
    Dreadnought,
    Flagship,
    WarSun,
}

impl UnitCategory {
    pub const COUNT: usize = 7;

    /// Order in which hits destroy ships: most expendable first
    pub const KILL_ORDER: [UnitCategory; UnitCategory::COUNT] = [
        UnitCategory::Fighter,
        UnitCategory::Destroyer,
        UnitCategory::Cruiser,
        UnitCategory::Carrier,
        UnitCategory::Dreadnought,
        UnitCategory::Flagship,
        UnitCategory::WarSun,
    ];

    /// The only category anti-fighter barrage can destroy
    pub const SCREEN: UnitCategory = UnitCategory::Fighter;

    pub fn all() -> impl Iterator<Item = UnitCategory> {
        Self::KILL_ORDER.into_iter()
    }

    /// Dense index, stable across runs
    pub fn index(self) -> usize {
        match self {
            UnitCategory::Fighter => 0,
            UnitCategory::Destroyer => 1,
            UnitCategory::Cruiser => 2,
            UnitCategory::Carrier => 3,
            UnitCategory::Dreadnought => 4,
            UnitCategory::Flagship => 5,
            UnitCategory::WarSun => 6,
        }
    }

    /// Parse the category tag used by the static unit table ("Fighter", "WarSun")
    /// or by scenario files ("fighter", "war_sun")
    pub fn from_tag(tag: &str) -> Option<UnitCategory> {
        let normalized: String = tag
            .chars()
            .filter(|c| *c != '_' && *c != ' ' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "fighter" => Some(UnitCategory::Fighter),
            "destroyer" => Some(UnitCategory::Destroyer),
            "cruiser" => Some(UnitCategory::Cruiser),
            "carrier" => Some(UnitCategory::Carrier),
            "dreadnought" => Some(UnitCategory::Dreadnought),
            "flagship" => Some(UnitCategory::Flagship),
            "warsun" => Some(UnitCategory::WarSun),
            _ => None,
        }
    }

    /// Canonical key of this category's base record in the unit table
    pub fn unit_key(self) -> &'static str {
        match self {
            UnitCategory::Fighter => "fighter",
            UnitCategory::Destroyer => "destroyer",
            UnitCategory::Cruiser => "cruiser",
            UnitCategory::Carrier => "carrier",
            UnitCategory::Dreadnought => "dreadnought",
            UnitCategory::Flagship => "flagship_generic",
            UnitCategory::WarSun => "war_sun",
        }
    }

    /// Canonical upgrade id, if this category has an upgraded variant
    pub fn upgrade_id(self) -> Option<&'static str> {
        match self {
            UnitCategory::Fighter => Some("fighter_2"),
            UnitCategory::Destroyer => Some("destroyer_2"),
            UnitCategory::Cruiser => Some("cruiser_2"),
            UnitCategory::Carrier => Some("carrier_2"),
            UnitCategory::Dreadnought => Some("dreadnought_2"),
            UnitCategory::WarSun => None,
            UnitCategory::Flagship => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            UnitCategory::Fighter => "Fighter",
            UnitCategory::Destroyer => "Destroyer",
            UnitCategory::Cruiser => "Cruiser",
            UnitCategory::Carrier => "Carrier",
            UnitCategory::Dreadnought => "Dreadnought",
            UnitCategory::Flagship => "Flagship",
            UnitCategory::WarSun => "War Sun",
        }
    }
}

/// Per-category counter backed by a fixed array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts([u32; UnitCategory::COUNT]);

impl CategoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Categories with a non-zero count, in kill order
    pub fn iter(&self) -> impl Iterator<Item = (UnitCategory, u32)> + '_ {
        UnitCategory::all()
            .map(move |c| (c, self[c]))
            .filter(|(_, n)| *n > 0)
    }

    /// Per-category `self - other`, floored at zero
    pub fn saturating_sub(&self, other: &CategoryCounts) -> CategoryCounts {
        let mut out = CategoryCounts::new();
        for c in UnitCategory::all() {
            out[c] = self[c].saturating_sub(other[c]);
        }
        out
    }
}

impl Index<UnitCategory> for CategoryCounts {
    type Output = u32;

    fn index(&self, category: UnitCategory) -> &u32 {
        &self.0[category.index()]
    }
}

impl IndexMut<UnitCategory> for CategoryCounts {
    fn index_mut(&mut self, category: UnitCategory) -> &mut u32 {
        &mut self.0[category.index()]
    }
}

impl FromIterator<UnitCategory> for CategoryCounts {
    fn from_iter<I: IntoIterator<Item = UnitCategory>>(iter: I) -> Self {
        let mut counts = CategoryCounts::new();
        for c in iter {
            counts[c] += 1;
        }
        counts
    }
}
