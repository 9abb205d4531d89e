//! Static unit definitions and effective stat resolution

pub mod loader;
pub mod merge;
pub mod repository;
pub mod schema;
pub mod stats;

pub use loader::UnitSource;
pub use merge::{merge_layers, MergedUnit};
pub use repository::UnitStatsRepository;
pub use schema::{
    Ability, FactionDef, SpaceCombat, UnitCost, UnitDef, UnitLayer, UnitTables, UnitUpgrade,
    ANTI_FIGHTER_BARRAGE, SUSTAIN_DAMAGE,
};
pub use stats::EffectiveUnitStats;
