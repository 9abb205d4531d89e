//! Single-battle resolution
//!
//! One trial runs as a small state machine:
//! barrage, terminal check, then combat rounds until a side is destroyed.
//! Both sides always fire from the same pre-phase snapshot.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::fleet::FleetState;
use crate::core::types::CategoryCounts;

/// Who won a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    Player1,
    Player2,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    AntiFighterBarrage,
    CombatRound,
    Finished(Winner),
}

/// Result of one trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialOutcome {
    pub winner: Winner,
    pub losses_p1: CategoryCounts,
    pub losses_p2: CategoryCounts,
    /// Regular combat rounds fought (barrage not included)
    pub rounds: u32,
    /// Ended because no further progress was possible or the round cap hit
    pub stalemate: bool,
}

/// One battle between two fleets, advanced phase by phase
#[derive(Debug, Clone)]
pub struct SingleBattle {
    p1: FleetState,
    p2: FleetState,
    initial_p1: CategoryCounts,
    initial_p2: CategoryCounts,
    phase: BattlePhase,
    rounds: u32,
    max_rounds: Option<u32>,
    stalemate: bool,
}

impl SingleBattle {
    pub fn new(p1: FleetState, p2: FleetState) -> Self {
        let initial_p1 = p1.counts();
        let initial_p2 = p2.counts();
        Self {
            p1,
            p2,
            initial_p1,
            initial_p2,
            phase: BattlePhase::AntiFighterBarrage,
            rounds: 0,
            max_rounds: None,
            stalemate: false,
        }
    }

    pub fn with_round_limit(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn fleets(&self) -> (&FleetState, &FleetState) {
        (&self.p1, &self.p2)
    }

    /// Advance one phase and return the phase now current
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> BattlePhase {
        self.phase = match self.phase {
            BattlePhase::AntiFighterBarrage => {
                self.resolve_barrage(rng);
                self.terminal_check().unwrap_or(BattlePhase::CombatRound)
            }
            BattlePhase::CombatRound => {
                if self.is_stalled() {
                    self.stalemate = true;
                    tracing::trace!(rounds = self.rounds, "Trial stalled");
                    BattlePhase::Finished(Winner::Draw)
                } else {
                    self.resolve_round(rng);
                    self.terminal_check().unwrap_or(BattlePhase::CombatRound)
                }
            }
            finished @ BattlePhase::Finished(_) => finished,
        };
        self.phase
    }

    /// Run to a terminal state
    pub fn run<R: Rng>(mut self, rng: &mut R) -> TrialOutcome {
        loop {
            if let BattlePhase::Finished(winner) = self.step(rng) {
                return self.outcome(winner);
            }
        }
    }

    /// Both barrages are rolled before either is applied
    fn resolve_barrage<R: Rng>(&mut self, rng: &mut R) {
        let hits_on_p2 = self.p1.roll_barrage(rng);
        let hits_on_p1 = self.p2.roll_barrage(rng);

        self.p1.destroy_screen(hits_on_p1);
        self.p2.destroy_screen(hits_on_p2);
    }

    /// Both sides roll from the pre-round state, then hits land together
    fn resolve_round<R: Rng>(&mut self, rng: &mut R) {
        let hits_on_p1 = self.p2.roll_hits(rng);
        let hits_on_p2 = self.p1.roll_hits(rng);

        self.p1.apply_hits(hits_on_p1);
        self.p2.apply_hits(hits_on_p2);
        self.rounds += 1;
    }

    fn terminal_check(&self) -> Option<BattlePhase> {
        match (self.p1.is_destroyed(), self.p2.is_destroyed()) {
            (true, true) => Some(BattlePhase::Finished(Winner::Draw)),
            (true, false) => Some(BattlePhase::Finished(Winner::Player2)),
            (false, true) => Some(BattlePhase::Finished(Winner::Player1)),
            (false, false) => None,
        }
    }

    /// No future round can change anything, or the configured cap is reached
    fn is_stalled(&self) -> bool {
        let capped = self.max_rounds.is_some_and(|max| self.rounds >= max);
        capped || (!self.p1.can_score() && !self.p2.can_score())
    }

    /// Losses are initial minus living: a destroyed side loses everything
    fn outcome(&self, winner: Winner) -> TrialOutcome {
        TrialOutcome {
            winner,
            losses_p1: self.initial_p1.saturating_sub(&self.p1.counts()),
            losses_p2: self.initial_p2.saturating_sub(&self.p2.counts()),
            rounds: self.rounds,
            stalemate: self.stalemate,
        }
    }
}

/// Run one trial to completion
pub fn resolve_battle<R: Rng>(
    p1: FleetState,
    p2: FleetState,
    max_rounds: Option<u32>,
    rng: &mut R,
) -> TrialOutcome {
    SingleBattle::new(p1, p2).with_round_limit(max_rounds).run(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fleet::UnitInstance;
    use crate::core::types::UnitCategory;
    use crate::units::EffectiveUnitStats;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    fn ship(category: UnitCategory, dice: u32, hit_on: i32) -> EffectiveUnitStats {
        EffectiveUnitStats {
            id: category.unit_key().to_string(),
            category,
            display_name: category.display_name().to_string(),
            space_dice: dice,
            space_hit_on: hit_on,
            has_sustain_damage: false,
            anti_fighter_dice: 0,
            anti_fighter_hit_on: 0,
            cost_resources: 1,
            movement: 0,
            capacity: 0,
        }
    }

    fn fleet_of(stats: EffectiveUnitStats, count: usize) -> FleetState {
        let stats = Arc::new(stats);
        FleetState::new(
            (0..count)
                .map(|_| UnitInstance::new(Arc::clone(&stats), 0))
                .collect(),
        )
    }

    fn sure_barrage_destroyer(dice: u32) -> EffectiveUnitStats {
        let mut destroyer = ship(UnitCategory::Destroyer, 1, 9);
        destroyer.anti_fighter_dice = dice;
        destroyer.anti_fighter_hit_on = 1;
        destroyer
    }

    #[test]
    fn test_barrage_annihilation_skips_combat_rounds() {
        let p1 = fleet_of(ship(UnitCategory::Fighter, 1, 9), 3);
        let p2 = fleet_of(sure_barrage_destroyer(4), 1);

        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let outcome = resolve_battle(p1.clone(), p2.clone(), None, &mut rng);

            assert_eq!(outcome.winner, Winner::Player2);
            assert_eq!(outcome.rounds, 0);
            assert_eq!(outcome.losses_p1[UnitCategory::Fighter], 3);
            assert_eq!(outcome.losses_p2.total(), 0);
        }
    }

    #[test]
    fn test_barrage_is_simultaneous() {
        // Each side's barrage wipes the other's fighters; neither is spared
        // by having its own barrage ships listed first.
        let mut mixed = fleet_of(sure_barrage_destroyer(2), 1);
        let fighter = Arc::new(ship(UnitCategory::Fighter, 1, 9));
        let mut units = mixed.units().to_vec();
        units.push(UnitInstance::new(Arc::clone(&fighter), 0));
        mixed = FleetState::new(units);

        let mut battle = SingleBattle::new(mixed.clone(), mixed);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(battle.step(&mut rng), BattlePhase::CombatRound);

        let (p1, p2) = battle.fleets();
        assert_eq!(p1.counts()[UnitCategory::Fighter], 0);
        assert_eq!(p2.counts()[UnitCategory::Fighter], 0);
        assert_eq!(p1.len(), 1);
        assert_eq!(p2.len(), 1);
    }

    #[test]
    fn test_mutual_barrage_wipe_is_draw() {
        let mut fighter = sure_barrage_destroyer(1);
        fighter.category = UnitCategory::Fighter;
        let p = fleet_of(fighter, 1);

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = resolve_battle(p.clone(), p, None, &mut rng);
        assert_eq!(outcome.winner, Winner::Draw);
        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.losses_p1[UnitCategory::Fighter], 1);
        assert_eq!(outcome.losses_p2[UnitCategory::Fighter], 1);
    }

    #[test]
    fn test_certain_hits_trade_evenly() {
        // Hit on 1: every die hits, so equal fleets annihilate each other
        let p = fleet_of(ship(UnitCategory::Cruiser, 1, 1), 3);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = resolve_battle(p.clone(), p, None, &mut rng);

        assert_eq!(outcome.winner, Winner::Draw);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.losses_p1[UnitCategory::Cruiser], 3);
        assert_eq!(outcome.losses_p2[UnitCategory::Cruiser], 3);
    }

    #[test]
    fn test_survivor_losses_are_initial_minus_living() {
        let strong = fleet_of(ship(UnitCategory::Dreadnought, 1, 1), 3);
        let weak = fleet_of(ship(UnitCategory::Cruiser, 1, 1), 1);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let outcome = resolve_battle(strong, weak, None, &mut rng);

        assert_eq!(outcome.winner, Winner::Player1);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.losses_p1[UnitCategory::Dreadnought], 1);
        assert_eq!(outcome.losses_p2[UnitCategory::Cruiser], 1);
    }

    #[test]
    fn test_hopeless_fleets_end_as_stalemate() {
        let p = fleet_of(ship(UnitCategory::Carrier, 1, 11), 2);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let outcome = resolve_battle(p.clone(), p, None, &mut rng);

        assert_eq!(outcome.winner, Winner::Draw);
        assert!(outcome.stalemate);
        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.losses_p1.total(), 0);
    }

    #[test]
    fn test_one_sided_scoring_still_terminates() {
        let hopeless = fleet_of(ship(UnitCategory::Carrier, 1, 11), 2);
        let shooter = fleet_of(ship(UnitCategory::Cruiser, 1, 6), 1);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let outcome = resolve_battle(hopeless, shooter, None, &mut rng);

        assert_eq!(outcome.winner, Winner::Player2);
        assert!(!outcome.stalemate);
        assert!(outcome.rounds >= 2);
    }

    #[test]
    fn test_round_cap_reports_stalemate() {
        let p = fleet_of(ship(UnitCategory::WarSun, 1, 10), 50);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let outcome = resolve_battle(p.clone(), p, Some(1), &mut rng);

        assert_eq!(outcome.rounds, 1);
        assert!(outcome.stalemate);
        assert_eq!(outcome.winner, Winner::Draw);
    }

    #[test]
    fn test_finished_battle_stays_finished() {
        let p1 = fleet_of(ship(UnitCategory::Fighter, 1, 9), 1);
        let p2 = fleet_of(sure_barrage_destroyer(1), 1);
        let mut battle = SingleBattle::new(p1, p2);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let done = battle.step(&mut rng);
        assert_eq!(done, BattlePhase::Finished(Winner::Player2));
        assert_eq!(battle.step(&mut rng), done);
        assert_eq!(battle.rounds(), 0);
    }
}
