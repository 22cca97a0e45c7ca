//! Simulation scenarios.

use serde::{Deserialize, Serialize};

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
///
/// Ledger operations that fail are recorded in the metrics and the scenario
/// continues; assertion steps abort the run when they do not hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// A player deposits tokens for credits.
    Deposit { player: String, tokens: u64 },
    /// A player spends credits on gameplay.
    Spend { player: String, credits: u64 },
    /// The operator awards winnings.
    Award { player: String, credits: u64 },
    /// A player redeems credits for tokens.
    Withdraw { player: String, credits: u64 },
    /// Assert a player's credit balance.
    AssertCredits { player: String, expected: u64 },
    /// Assert the vault's token custody.
    AssertReserve { expected: u64 },
}

impl Scenario {
    /// Load a scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "cash-in-cash-out" => Ok(Self::cash_in_cash_out()),
            "table-session" => Ok(Self::table_session()),
            "failed-payout" => Ok(Self::failed_payout()),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Deposit and immediately redeem everything; balances return to zero.
    fn cash_in_cash_out() -> Self {
        Self {
            name: "cash-in-cash-out".to_string(),
            description: "Deposit then redeem everything, no gameplay".to_string(),
            steps: vec![
                ScenarioStep::Deposit {
                    player: "PLAYER_1".to_string(),
                    tokens: 10,
                },
                ScenarioStep::AssertCredits {
                    player: "PLAYER_1".to_string(),
                    expected: 1000,
                },
                ScenarioStep::AssertReserve { expected: 10 },
                ScenarioStep::Withdraw {
                    player: "PLAYER_1".to_string(),
                    credits: 1000,
                },
                ScenarioStep::AssertCredits {
                    player: "PLAYER_1".to_string(),
                    expected: 0,
                },
                ScenarioStep::AssertReserve { expected: 0 },
            ],
        }
    }

    /// A full table session: buy-in, play, a win, cash-out.
    fn table_session() -> Self {
        Self {
            name: "table-session".to_string(),
            description: "Buy-in, gameplay spends, an award, cash-out".to_string(),
            steps: vec![
                ScenarioStep::Deposit {
                    player: "PLAYER_1".to_string(),
                    tokens: 10,
                },
                ScenarioStep::Deposit {
                    player: "PLAYER_2".to_string(),
                    tokens: 5,
                },
                ScenarioStep::Spend {
                    player: "PLAYER_1".to_string(),
                    credits: 250,
                },
                ScenarioStep::Spend {
                    player: "PLAYER_2".to_string(),
                    credits: 250,
                },
                ScenarioStep::Award {
                    player: "PLAYER_1".to_string(),
                    credits: 450,
                },
                ScenarioStep::AssertCredits {
                    player: "PLAYER_1".to_string(),
                    expected: 1200,
                },
                ScenarioStep::AssertCredits {
                    player: "PLAYER_2".to_string(),
                    expected: 250,
                },
                ScenarioStep::Withdraw {
                    player: "PLAYER_1".to_string(),
                    credits: 1200,
                },
                ScenarioStep::Withdraw {
                    player: "PLAYER_2".to_string(),
                    credits: 250,
                },
                // 50-credit remainder forfeited on the second withdrawal.
                ScenarioStep::AssertCredits {
                    player: "PLAYER_2".to_string(),
                    expected: 0,
                },
                ScenarioStep::AssertReserve { expected: 1 },
            ],
        }
    }

    /// Awards outrun the vault's custody; the payout is refused and the
    /// credit balance stays intact.
    fn failed_payout() -> Self {
        Self {
            name: "failed-payout".to_string(),
            description: "Withdrawal exceeding vault custody is refused".to_string(),
            steps: vec![
                ScenarioStep::Deposit {
                    player: "PLAYER_1".to_string(),
                    tokens: 2,
                },
                ScenarioStep::Award {
                    player: "PLAYER_1".to_string(),
                    credits: 800,
                },
                ScenarioStep::Withdraw {
                    player: "PLAYER_1".to_string(),
                    credits: 1000,
                },
                ScenarioStep::AssertCredits {
                    player: "PLAYER_1".to_string(),
                    expected: 1000,
                },
                ScenarioStep::AssertReserve { expected: 2 },
            ],
        }
    }
}
