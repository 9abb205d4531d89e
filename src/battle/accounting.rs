//! Resource value of destroyed ships

use crate::battle::fleet::FleetConfig;
use crate::core::error::Result;
use crate::core::types::{CategoryCounts, UnitCategory};
use crate::units::UnitStatsRepository;

/// Per-category unit cost for one side, priced with that side's own
/// faction and upgrade flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    costs: [u32; UnitCategory::COUNT],
}

impl ResourceLedger {
    /// Price every category the fleet fields
    pub fn for_fleet(fleet: &FleetConfig, repo: &UnitStatsRepository) -> Result<Self> {
        let mut costs = [0; UnitCategory::COUNT];
        for (category, _) in fleet.initial_counts().iter() {
            costs[category.index()] =
                repo.resource_cost(category, fleet.faction(), fleet.is_upgraded(category))?;
        }
        Ok(Self { costs })
    }

    pub fn cost_of(&self, category: UnitCategory) -> u32 {
        self.costs[category.index()]
    }

    /// Total resources lost across all destroyed ships
    pub fn value_of(&self, losses: &CategoryCounts) -> u64 {
        losses
            .iter()
            .map(|(category, lost)| u64::from(self.cost_of(category)) * u64::from(lost))
            .sum()
    }
}
