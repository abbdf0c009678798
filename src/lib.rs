pub mod config;
pub mod core;
pub mod domain;
pub mod programs;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{Overrides, ResolvedConfig};
pub use crate::core::{
    keypair::Keypair,
    program::Program,
    provider::{provider, set_provider, Provider},
    rpc::RpcClient,
    scenario::{ScenarioReport, ScenarioRunner},
    workspace::Workspace,
};
pub use domain::model::{Commitment, Pubkey, TxSignature};
pub use utils::error::{HarnessError, Result};
