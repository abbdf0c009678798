pub mod keypair;
pub mod program;
pub mod provider;
pub mod rpc;
pub mod scenario;
pub mod transaction;
pub mod workspace;

pub use crate::domain::model::{AccountMeta, Commitment, Instruction, Pubkey, TxSignature};
pub use crate::domain::ports::{ProviderSettings, RpcTransport};
pub use crate::utils::error::Result;
