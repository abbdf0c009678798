use crate::config::scenario_config::{ScenarioConfig, StepAction, StepDefinition};
use crate::core::keypair::Keypair;
use crate::core::provider::Provider;
use crate::core::workspace::Workspace;
use crate::domain::model::{Pubkey, TxSignature};
use crate::programs::hello_anchor::MyAccount;
use crate::programs::tic_tac_toe::{GameState, Tile};
use crate::utils::error::{HarnessError, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 單一步驟的執行結果
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub index: usize,
    pub kind: &'static str,
    pub signature: Option<TxSignature>,
    /// Error text for steps that failed but were allowed to.
    pub error: Option<String>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepOutcome>,
    pub elapsed: Duration,
}

impl ScenarioReport {
    pub fn signatures(&self) -> Vec<TxSignature> {
        self.steps.iter().filter_map(|s| s.signature).collect()
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.error.is_some()).count()
    }
}

/// 情境執行上下文：標籤對應的金鑰與已完成步驟
#[derive(Debug, Default)]
pub struct ScenarioContext {
    keypairs: HashMap<String, Keypair>,
    pub outcomes: Vec<StepOutcome>,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keypair behind a label, generated on first use.
    pub fn keypair(&mut self, label: &str) -> &Keypair {
        self.keypairs
            .entry(label.to_string())
            .or_insert_with(Keypair::generate)
    }

    /// Accepts a base58 address or a label.
    pub fn address(&mut self, label_or_pubkey: &str) -> Pubkey {
        match label_or_pubkey.parse::<Pubkey>() {
            Ok(pubkey) => pubkey,
            Err(_) => self.keypair(label_or_pubkey).pubkey(),
        }
    }

    pub fn insert_keypair(&mut self, label: &str, keypair: Keypair) {
        self.keypairs.insert(label.to_string(), keypair);
    }
}

pub struct ScenarioRunner<'a> {
    provider: &'a Provider,
    workspace: &'a Workspace,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(provider: &'a Provider, workspace: &'a Workspace) -> Self {
        Self {
            provider,
            workspace,
        }
    }

    /// Runs every step in order and stops at the first unexpected failure.
    pub async fn run(&self, config: &ScenarioConfig) -> Result<ScenarioReport> {
        let mut context = ScenarioContext::new();
        self.run_with_context(config, &mut context).await
    }

    pub async fn run_with_context(
        &self,
        config: &ScenarioConfig,
        context: &mut ScenarioContext,
    ) -> Result<ScenarioReport> {
        let started = Instant::now();
        tracing::info!(
            "▶ Scenario '{}' ({} steps)",
            config.scenario.name,
            config.steps.len()
        );

        for (index, step) in config.steps.iter().enumerate() {
            let kind = step.action.kind();
            let step_started = Instant::now();
            tracing::debug!("Step {} {}: {:?}", index, kind, step.action);

            let result = self.execute(&step.action, context).await;
            let outcome = self.settle(index, step, result)?;
            context.outcomes.push(StepOutcome {
                elapsed: step_started.elapsed(),
                ..outcome
            });
        }

        let report = ScenarioReport {
            name: config.scenario.name.clone(),
            steps: context.outcomes.clone(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "✅ Scenario '{}' finished: {} steps, {} transactions, {:?}",
            report.name,
            report.steps.len(),
            report.signatures().len(),
            report.elapsed
        );
        Ok(report)
    }

    fn settle(
        &self,
        index: usize,
        step: &StepDefinition,
        result: Result<Option<TxSignature>>,
    ) -> Result<StepOutcome> {
        let kind = step.action.kind();
        let outcome = |signature, error| StepOutcome {
            index,
            kind,
            signature,
            error,
            elapsed: Duration::ZERO,
        };

        match (result, step.expect_error.as_deref()) {
            (Ok(signature), None) => Ok(outcome(signature, None)),
            (Ok(_), Some(expected)) => Err(HarnessError::ScenarioError {
                index,
                step: kind.to_string(),
                message: format!("expected {} but the step succeeded", expected),
            }),
            (Err(HarnessError::ProgramError { name, .. }), Some(expected)) if name == expected => {
                tracing::info!("Step {} {} failed with expected {}", index, kind, name);
                Ok(outcome(None, Some(name)))
            }
            (Err(e), _) if step.continue_on_error => {
                tracing::warn!("Step {} {} failed, continuing: {}", index, kind, e);
                Ok(outcome(None, Some(e.to_string())))
            }
            (Err(e), _) => Err(HarnessError::ScenarioError {
                index,
                step: kind.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn execute(
        &self,
        action: &StepAction,
        context: &mut ScenarioContext,
    ) -> Result<Option<TxSignature>> {
        let provider = self.provider;
        match action {
            StepAction::Initialize { program } => {
                let program = self
                    .workspace
                    .program(program.as_deref().unwrap_or("hello_anchor"))?;
                let signature = program.rpc(provider, "initialize", &(), vec![], &[]).await?;
                Ok(Some(signature))
            }
            StepAction::Airdrop { lamports } => Ok(Some(provider.airdrop(*lamports).await?)),
            StepAction::CreateMyAccount { account } => {
                let client = self.workspace.hello_anchor()?;
                let keypair = context.keypair(account).clone();
                Ok(Some(client.create_my_account(provider, &keypair).await?))
            }
            StepAction::SetData { account, data, age } => {
                let client = self.workspace.hello_anchor()?;
                let address = context.address(account);
                let value = MyAccount {
                    data: *data,
                    age: *age,
                };
                Ok(Some(client.set_data(provider, &address, value).await?))
            }
            StepAction::ExpectMyAccount { account, data, age } => {
                let client = self.workspace.hello_anchor()?;
                let address = context.address(account);
                let stored = client.fetch_my_account(provider, &address).await?;
                let expected = MyAccount {
                    data: *data,
                    age: *age,
                };
                if stored != expected {
                    return Err(HarnessError::decode(format!(
                        "{} holds {:?}, expected {:?}",
                        address, stored, expected
                    )));
                }
                Ok(None)
            }
            StepAction::SetupGame { game, player_two } => {
                let client = self.workspace.tic_tac_toe()?;
                let player_two = if player_two == "wallet" {
                    provider.wallet_pubkey()
                } else {
                    context.address(player_two)
                };
                let keypair = context.keypair(game).clone();
                Ok(Some(client.setup_game(provider, &keypair, &player_two).await?))
            }
            StepAction::Play { game, row, column } => {
                let client = self.workspace.tic_tac_toe()?;
                let address = context.address(game);
                let tile = Tile {
                    row: *row,
                    column: *column,
                };
                Ok(Some(client.play(provider, &address, tile).await?))
            }
            StepAction::ExpectGame {
                game,
                state,
                winner,
            } => {
                let client = self.workspace.tic_tac_toe()?;
                let address = context.address(game);
                let fetched = client.fetch_game(provider, &address).await?;
                let matches = match (&fetched.state, state.as_str()) {
                    (GameState::Active, "active") | (GameState::Tie, "tie") => true,
                    (GameState::Won { winner: actual }, "won") => match winner.as_deref() {
                        None => true,
                        Some("wallet") => *actual == provider.wallet_pubkey(),
                        Some(other) => *actual == context.address(other),
                    },
                    _ => false,
                };
                if !matches {
                    return Err(HarnessError::decode(format!(
                        "game {} is {:?}, expected {}{}",
                        address,
                        fetched.state,
                        state,
                        winner.as_deref().map(|w| format!(" by {}", w)).unwrap_or_default()
                    )));
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable_within_a_run() {
        let mut context = ScenarioContext::new();
        let first = context.address("game");
        let second = context.address("game");
        assert_eq!(first, second);
        assert_ne!(first, context.address("other"));
    }

    #[test]
    fn test_base58_address_is_used_verbatim() {
        let mut context = ScenarioContext::new();
        let address = Pubkey([3u8; 32]);
        assert_eq!(context.address(&address.to_string()), address);
    }

    #[test]
    fn test_inserted_keypair_backs_label() {
        let mut context = ScenarioContext::new();
        let keypair = Keypair::from_seed([4u8; 32]);
        let pubkey = keypair.pubkey();
        context.insert_keypair("acct", keypair);
        assert_eq!(context.address("acct"), pubkey);
    }
}
