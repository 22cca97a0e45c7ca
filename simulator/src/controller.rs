//! Simulation controller.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use chipvault_common::AccountId;
use chipvault_ledger::{CreditLedger, CREDIT_RATE};

use crate::metrics::SimulationMetrics;
use crate::scenario::{Scenario, ScenarioStep};
use crate::token::SimulatedToken;

/// Controls the simulation.
pub struct SimulationController {
    /// The ledger under test.
    ledger: Arc<CreditLedger>,
    /// The simulated token backing it.
    token: Arc<SimulatedToken>,
    /// Player accounts, funded at initialization.
    players: Vec<AccountId>,
    /// The operator (ledger owner).
    operator: AccountId,
    /// Random number generator.
    rng: StdRng,
    /// Simulation metrics.
    metrics: SimulationMetrics,
}

impl SimulationController {
    /// Create a controller with `player_count` players, each funded with
    /// `initial_tokens` tokens.
    pub fn new(player_count: usize, initial_tokens: u64, seed: Option<u64>) -> anyhow::Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let vault = AccountId::new("VAULT");
        let operator = AccountId::new("OPERATOR");
        let token = Arc::new(SimulatedToken::new(vault.clone()));

        let players: Vec<AccountId> = (1..=player_count)
            .map(|i| AccountId::new(format!("PLAYER_{i}")))
            .collect();
        for player in &players {
            token.mint(player, initial_tokens);
            info!(player = %player, tokens = initial_tokens, "Funded player");
        }

        let ledger = Arc::new(CreditLedger::new(token.clone(), vault, operator.clone())?);

        Ok(Self {
            ledger,
            token,
            players,
            operator,
            rng,
            metrics: SimulationMetrics::new(),
        })
    }

    /// The ledger under test.
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Metrics collected so far.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Run a scripted scenario.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        for step in &scenario.steps {
            self.execute_step(step)?;
        }

        Ok(())
    }

    /// Run `rounds` randomized operations across the player pool.
    pub fn run_random(&mut self, rounds: u64) -> anyhow::Result<()> {
        info!(rounds, players = self.players.len(), "Running randomized session");

        for _ in 0..rounds {
            let player = self.players[self.rng.gen_range(0..self.players.len())].clone();

            match self.rng.gen_range(0..4u8) {
                0 => {
                    let tokens = self.rng.gen_range(1..=5);
                    self.deposit(&player, tokens);
                }
                1 => {
                    let credits = self.rng.gen_range(1..=3 * CREDIT_RATE);
                    self.spend(&player, credits);
                }
                2 => {
                    let credits = self.rng.gen_range(1..=5 * CREDIT_RATE);
                    self.award(&player, credits);
                }
                _ => {
                    let credits = self.rng.gen_range(1..=6 * CREDIT_RATE);
                    self.withdraw(&player, credits);
                }
            }
        }

        Ok(())
    }

    fn execute_step(&mut self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Deposit { player, tokens } => {
                self.deposit(&AccountId::new(player.clone()), *tokens);
            }
            ScenarioStep::Spend { player, credits } => {
                self.spend(&AccountId::new(player.clone()), *credits);
            }
            ScenarioStep::Award { player, credits } => {
                self.award(&AccountId::new(player.clone()), *credits);
            }
            ScenarioStep::Withdraw { player, credits } => {
                self.withdraw(&AccountId::new(player.clone()), *credits);
            }
            ScenarioStep::AssertCredits { player, expected } => {
                let account = AccountId::new(player.clone());
                let actual = self.ledger.credits(&account);
                if actual != *expected {
                    anyhow::bail!(
                        "Assertion failed: {player} holds {actual} credits, expected {expected}"
                    );
                }
            }
            ScenarioStep::AssertReserve { expected } => {
                let actual = self.ledger.reserve();
                if actual != *expected {
                    anyhow::bail!(
                        "Assertion failed: vault holds {actual} tokens, expected {expected}"
                    );
                }
            }
        }

        Ok(())
    }

    fn deposit(&mut self, player: &AccountId, tokens: u64) {
        match self.ledger.deposit(player, tokens) {
            Ok(credited) => {
                self.metrics.record_success();
                self.metrics.credits_issued += credited;
            }
            Err(err) => {
                warn!(player = %player, tokens, error = %err, "Deposit rejected");
                self.metrics.record_failure();
            }
        }
    }

    fn spend(&mut self, player: &AccountId, credits: u64) {
        match self.ledger.spend_credits(player, credits) {
            Ok(()) => {
                self.metrics.record_success();
                self.metrics.credits_spent += credits;
            }
            Err(err) => {
                warn!(player = %player, credits, error = %err, "Spend rejected");
                self.metrics.record_failure();
            }
        }
    }

    fn award(&mut self, player: &AccountId, credits: u64) {
        match self.ledger.award_winnings(&self.operator, player, credits) {
            Ok(()) => {
                self.metrics.record_success();
                self.metrics.credits_awarded += credits;
            }
            Err(err) => {
                warn!(player = %player, credits, error = %err, "Award rejected");
                self.metrics.record_failure();
            }
        }
    }

    fn withdraw(&mut self, player: &AccountId, credits: u64) {
        match self.ledger.withdraw(player, credits) {
            Ok(tokens) => {
                self.metrics.record_success();
                self.metrics.credits_redeemed += credits;
                self.metrics.tokens_paid += tokens;
            }
            Err(err) => {
                warn!(player = %player, credits, error = %err, "Withdrawal rejected");
                self.metrics.record_failure();
            }
        }
    }
}
