//! Monte Carlo driver
//!
//! Runs many independent trials of the same battle and aggregates win rates
//! and expected attrition. Every trial draws from its own RNG stream, and the
//! tally merges by plain integer summation, so results are bit-identical for a
//! given seed whether trials run on one thread or many.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::battle::accounting::ResourceLedger;
use crate::battle::fleet::{BattleConfig, FleetState};
use crate::battle::resolution::{SingleBattle, TrialOutcome, Winner};
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{CategoryCounts, UnitCategory};
use crate::units::UnitStatsRepository;

/// Source of per-trial random streams
pub trait TrialStreams: Sync {
    type Rng: Rng;

    /// Independent generator for trial number `trial`
    fn trial_rng(&self, trial: u64) -> Self::Rng;
}

/// ChaCha8 streams derived from a single base seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededStreams {
    seed: u64,
}

impl SeededStreams {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl TrialStreams for SeededStreams {
    type Rng = ChaCha8Rng;

    fn trial_rng(&self, trial: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(trial);
        rng
    }
}

/// Aggregate statistics over all trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub simulations: u32,
    pub p1_wins: u32,
    pub p2_wins: u32,
    pub draws: u32,
    pub p1_win_rate: f64,
    pub p2_win_rate: f64,
    pub draw_rate: f64,
    /// Average ships lost per trial, for every category the side fielded
    pub avg_losses_p1: BTreeMap<UnitCategory, f64>,
    pub avg_losses_p2: BTreeMap<UnitCategory, f64>,
    pub avg_resource_loss_p1: f64,
    pub avg_resource_loss_p2: f64,
    /// Average regular combat rounds per trial
    pub avg_rounds: f64,
    /// Share of trials that ended as a stalemate draw
    pub stalemate_rate: f64,
}

/// Running sums; merged across workers by addition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    p1_wins: u32,
    p2_wins: u32,
    draws: u32,
    stalemates: u32,
    rounds: u64,
    losses_p1: [u64; UnitCategory::COUNT],
    losses_p2: [u64; UnitCategory::COUNT],
    resources_p1: u64,
    resources_p2: u64,
}

impl Tally {
    fn from_outcome(
        outcome: &TrialOutcome,
        ledger_p1: &ResourceLedger,
        ledger_p2: &ResourceLedger,
    ) -> Self {
        let mut tally = Tally::default();
        match outcome.winner {
            Winner::Player1 => tally.p1_wins = 1,
            Winner::Player2 => tally.p2_wins = 1,
            Winner::Draw => tally.draws = 1,
        }
        tally.stalemates = u32::from(outcome.stalemate);
        tally.rounds = u64::from(outcome.rounds);
        add_counts(&mut tally.losses_p1, &outcome.losses_p1);
        add_counts(&mut tally.losses_p2, &outcome.losses_p2);
        tally.resources_p1 = ledger_p1.value_of(&outcome.losses_p1);
        tally.resources_p2 = ledger_p2.value_of(&outcome.losses_p2);
        tally
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.p1_wins += other.p1_wins;
        self.p2_wins += other.p2_wins;
        self.draws += other.draws;
        self.stalemates += other.stalemates;
        self.rounds += other.rounds;
        for i in 0..UnitCategory::COUNT {
            self.losses_p1[i] += other.losses_p1[i];
            self.losses_p2[i] += other.losses_p2[i];
        }
        self.resources_p1 += other.resources_p1;
        self.resources_p2 += other.resources_p2;
        self
    }

    fn trials(&self) -> u32 {
        self.p1_wins + self.p2_wins + self.draws
    }
}

fn add_counts(sums: &mut [u64; UnitCategory::COUNT], counts: &CategoryCounts) {
    for (category, n) in counts.iter() {
        sums[category.index()] += u64::from(n);
    }
}

fn average_losses(
    sums: &[u64; UnitCategory::COUNT],
    fielded: &CategoryCounts,
    simulations: f64,
) -> BTreeMap<UnitCategory, f64> {
    fielded
        .iter()
        .map(|(category, _)| (category, sums[category.index()] as f64 / simulations))
        .collect()
}

/// Monte Carlo estimator over a loaded unit repository
pub struct BattleSimulator<'a> {
    repo: &'a UnitStatsRepository,
    config: SimulationConfig,
}

impl<'a> BattleSimulator<'a> {
    pub fn new(repo: &'a UnitStatsRepository) -> Self {
        Self::with_config(repo, SimulationConfig::default())
    }

    pub fn with_config(repo: &'a UnitStatsRepository, config: SimulationConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run `battle.simulations` independent trials and aggregate them.
    ///
    /// Validation and stat resolution happen before the first trial; any
    /// error aborts the whole call with no partial result.
    pub fn simulate<S: TrialStreams>(
        &self,
        battle: &BattleConfig,
        streams: &S,
    ) -> Result<BattleResult> {
        battle.validate()?;
        self.config.validate()?;

        let p1 = FleetState::from_config(&battle.player1, self.repo)?;
        let p2 = FleetState::from_config(&battle.player2, self.repo)?;
        let ledger_p1 = ResourceLedger::for_fleet(&battle.player1, self.repo)?;
        let ledger_p2 = ResourceLedger::for_fleet(&battle.player2, self.repo)?;

        let simulations = battle.simulations;
        let parallel = simulations as usize >= self.config.parallel_threshold;
        let max_rounds = self.config.max_rounds;

        tracing::info!(
            p1 = %battle.player1.name,
            p2 = %battle.player2.name,
            simulations,
            parallel,
            "Starting battle simulation"
        );
        let start = Instant::now();

        let run_trial = |trial: u64| -> Tally {
            let mut rng = streams.trial_rng(trial);
            let outcome = SingleBattle::new(p1.clone(), p2.clone())
                .with_round_limit(max_rounds)
                .run(&mut rng);
            Tally::from_outcome(&outcome, &ledger_p1, &ledger_p2)
        };

        let trials = 0..u64::from(simulations);
        let tally = if parallel {
            trials
                .into_par_iter()
                .map(&run_trial)
                .reduce(Tally::default, Tally::merge)
        } else {
            trials.map(&run_trial).fold(Tally::default(), Tally::merge)
        };
        debug_assert_eq!(tally.trials(), simulations);

        if tally.stalemates > 0 {
            tracing::warn!(
                stalemates = tally.stalemates,
                simulations,
                "Some trials could not finish and were scored as draws"
            );
        }

        let n = f64::from(simulations);
        let result = BattleResult {
            simulations,
            p1_wins: tally.p1_wins,
            p2_wins: tally.p2_wins,
            draws: tally.draws,
            p1_win_rate: f64::from(tally.p1_wins) / n,
            p2_win_rate: f64::from(tally.p2_wins) / n,
            draw_rate: f64::from(tally.draws) / n,
            avg_losses_p1: average_losses(&tally.losses_p1, &battle.player1.initial_counts(), n),
            avg_losses_p2: average_losses(&tally.losses_p2, &battle.player2.initial_counts(), n),
            avg_resource_loss_p1: tally.resources_p1 as f64 / n,
            avg_resource_loss_p2: tally.resources_p2 as f64 / n,
            avg_rounds: tally.rounds as f64 / n,
            stalemate_rate: f64::from(tally.stalemates) / n,
        };

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            p1_win_rate = result.p1_win_rate,
            p2_win_rate = result.p2_win_rate,
            draw_rate = result.draw_rate,
            "Battle simulation finished"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fleet::FleetConfig;
    use crate::core::error::{ConfigError, FleetOddsError, LookupError};
    use crate::units::UnitSource;

    const TABLE: &str = r#"
[units.fighter]
display_name = "Fighter"
category = "Fighter"
cost = { resources = 1, units_produced = 2 }
space_combat = { dice = 1, hit_on = 9 }

[units.destroyer]
display_name = "Destroyer"
category = "Destroyer"
cost = { resources = 1 }
space_combat = { dice = 1, hit_on = 9 }
abilities = [{ key = "ANTI_FIGHTER_BARRAGE", dice = 2, hit_on = 9 }]

[units.cruiser]
display_name = "Cruiser"
category = "Cruiser"
cost = { resources = 2 }
space_combat = { dice = 1, hit_on = 7 }

[units.dreadnought]
display_name = "Dreadnought"
category = "Dreadnought"
cost = { resources = 4 }
space_combat = { dice = 1, hit_on = 5 }
abilities = [{ key = "SUSTAIN_DAMAGE" }]

[upgrades.cruiser_2]
base_id = "cruiser"
space_combat = { dice = 1, hit_on = 6 }
"#;

    fn repo() -> UnitStatsRepository {
        UnitStatsRepository::from_source(&UnitSource::Toml(TABLE.into())).unwrap()
    }

    fn battle(simulations: u32) -> BattleConfig {
        let p1 = FleetConfig::new("Player 1")
            .with_ships(UnitCategory::Dreadnought, 1)
            .with_ships(UnitCategory::Cruiser, 2)
            .with_ships(UnitCategory::Fighter, 3)
            .with_upgrade(UnitCategory::Cruiser);
        let p2 = FleetConfig::new("Player 2")
            .with_ships(UnitCategory::Destroyer, 2)
            .with_ships(UnitCategory::Cruiser, 2)
            .with_ships(UnitCategory::Fighter, 2);
        BattleConfig::new(p1, p2, simulations)
    }

    #[test]
    fn test_outcome_counts_sum_to_simulations() {
        let repo = repo();
        let result = BattleSimulator::new(&repo)
            .simulate(&battle(400), &SeededStreams::new(42))
            .unwrap();

        assert_eq!(result.p1_wins + result.p2_wins + result.draws, 400);
        let total = result.p1_win_rate + result.p2_win_rate + result.draw_rate;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_losses_within_bounds() {
        let repo = repo();
        let config = battle(300);
        let result = BattleSimulator::new(&repo)
            .simulate(&config, &SeededStreams::new(7))
            .unwrap();

        for (category, count) in config.player1.initial_counts().iter() {
            let avg = result.avg_losses_p1[&category];
            assert!(avg >= 0.0 && avg <= f64::from(count), "{:?}: {}", category, avg);
        }
        assert_eq!(result.avg_losses_p2.len(), 3);
        assert!(result.avg_resource_loss_p1 >= 0.0);
        // Max possible p1 loss: 4 + 2*2 + 3*1
        assert!(result.avg_resource_loss_p1 <= 11.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let repo = repo();
        let sim = BattleSimulator::new(&repo);
        let a = sim.simulate(&battle(500), &SeededStreams::new(99)).unwrap();
        let b = sim.simulate(&battle(500), &SeededStreams::new(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let repo = repo();
        let parallel = BattleSimulator::with_config(
            &repo,
            SimulationConfig {
                parallel_threshold: 1,
                ..SimulationConfig::default()
            },
        );
        let sequential = BattleSimulator::with_config(&repo, SimulationConfig::sequential());

        let streams = SeededStreams::new(2024);
        let a = parallel.simulate(&battle(600), &streams).unwrap();
        let b = sequential.simulate(&battle(600), &streams).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_fleet_rejected_before_trials() {
        let repo = repo();
        let mut config = battle(100);
        config.player2.ships.clear();

        let err = BattleSimulator::new(&repo)
            .simulate(&config, &SeededStreams::new(1))
            .unwrap_err();
        assert!(matches!(err, FleetOddsError::Config(ConfigError::EmptyFleet { .. })));
        assert_eq!(err.user_message(), "Both sides need at least one unit to simulate.");
    }

    #[test]
    fn test_missing_unit_aborts_batch() {
        let repo = repo();
        let mut config = battle(100);
        config.player1.ships.insert(UnitCategory::WarSun, 1);

        let err = BattleSimulator::new(&repo)
            .simulate(&config, &SeededStreams::new(1))
            .unwrap_err();
        assert!(matches!(err, FleetOddsError::Lookup(LookupError::UnknownUnit(_))));
    }

    #[test]
    fn test_streams_are_independent() {
        let streams = SeededStreams::new(5);
        let a: u64 = streams.trial_rng(0).gen();
        let b: u64 = streams.trial_rng(1).gen();
        let a_again: u64 = streams.trial_rng(0).gen();
        assert_ne!(a, b);
        assert_eq!(a, a_again);
    }

    #[test]
    fn test_tally_merge_is_order_independent() {
        let mut a = Tally::default();
        a.p1_wins = 3;
        a.losses_p1[0] = 5;
        a.resources_p2 = 9;
        let mut b = Tally::default();
        b.draws = 2;
        b.losses_p1[0] = 1;
        b.stalemates = 1;

        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).trials(), 5);
    }
}
