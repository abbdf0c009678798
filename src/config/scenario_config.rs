use crate::utils::error::{HarnessError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A scripted list of program calls, executed in order against one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: ScenarioInfo,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    #[serde(flatten)]
    pub action: StepAction,
    /// 失敗時仍繼續執行後續步驟
    #[serde(default)]
    pub continue_on_error: bool,
    /// 預期的程式錯誤名稱，例如 "DataTooLarge"
    pub expect_error: Option<String>,
}

/// `account` / `game` values are labels for keypairs created during the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    Initialize {
        program: Option<String>,
    },
    Airdrop {
        lamports: u64,
    },
    CreateMyAccount {
        account: String,
    },
    SetData {
        account: String,
        data: u64,
        #[serde(default)]
        age: u8,
    },
    ExpectMyAccount {
        account: String,
        data: u64,
        #[serde(default)]
        age: u8,
    },
    SetupGame {
        game: String,
        /// base58 pubkey, or "wallet" for the provider's own key
        player_two: String,
    },
    Play {
        game: String,
        row: u8,
        column: u8,
    },
    ExpectGame {
        game: String,
        /// "active", "tie" or "won"
        state: String,
        winner: Option<String>,
    },
}

impl StepAction {
    pub fn kind(&self) -> &'static str {
        match self {
            StepAction::Initialize { .. } => "initialize",
            StepAction::Airdrop { .. } => "airdrop",
            StepAction::CreateMyAccount { .. } => "create_my_account",
            StepAction::SetData { .. } => "set_data",
            StepAction::ExpectMyAccount { .. } => "expect_my_account",
            StepAction::SetupGame { .. } => "setup_game",
            StepAction::Play { .. } => "play",
            StepAction::ExpectGame { .. } => "expect_game",
        }
    }
}

impl ScenarioConfig {
    /// 從 TOML 檔案載入情境
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| HarnessError::ConfigError {
            message: format!("failed to read scenario {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = super::toml_config::substitute_env_vars(content)?;
        let config: Self = toml::from_str(&processed).map_err(|e| HarnessError::ConfigError {
            message: format!("scenario parsing error: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("scenario.name", &self.scenario.name)?;
        if self.steps.is_empty() {
            return Err(HarnessError::InvalidConfigValueError {
                field: "steps".to_string(),
                value: "[]".to_string(),
                reason: "a scenario needs at least one step".to_string(),
            });
        }

        for (i, step) in self.steps.iter().enumerate() {
            let field = |name: &str| format!("steps[{}].{}", i, name);
            match &step.action {
                StepAction::Airdrop { lamports } => {
                    validate_positive_number(&field("lamports"), *lamports, 1)?
                }
                StepAction::CreateMyAccount { account }
                | StepAction::SetData { account, .. }
                | StepAction::ExpectMyAccount { account, .. } => {
                    validate_non_empty_string(&field("account"), account)?
                }
                StepAction::SetupGame { game, player_two } => {
                    validate_non_empty_string(&field("game"), game)?;
                    validate_non_empty_string(&field("player_two"), player_two)?;
                }
                StepAction::Play { game, .. } => validate_non_empty_string(&field("game"), game)?,
                StepAction::ExpectGame { game, state, .. } => {
                    validate_non_empty_string(&field("game"), game)?;
                    if !matches!(state.as_str(), "active" | "tie" | "won") {
                        return Err(HarnessError::InvalidConfigValueError {
                            field: field("state"),
                            value: state.clone(),
                            reason: "expected active, tie or won".to_string(),
                        });
                    }
                }
                StepAction::Initialize { .. } => {}
            }
        }
        Ok(())
    }
}
