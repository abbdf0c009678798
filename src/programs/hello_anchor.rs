use crate::core::keypair::Keypair;
use crate::core::program::{Program, ProgramErrorDef};
use crate::core::provider::Provider;
use crate::domain::model::{AccountMeta, Pubkey, TxSignature};
use crate::programs::system;
use crate::utils::error::Result;
use borsh::{BorshDeserialize, BorshSerialize};

pub const PROGRAM_NAME: &str = "hello_anchor";
pub const PROGRAM_ID: &str = "Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS";
pub const ACCOUNT_TYPE: &str = "MyAccount";
/// Discriminator plus `data: u64` and `age: u8`.
pub const MY_ACCOUNT_SPACE: usize = 8 + 8 + 1;
pub const MAX_DATA: u64 = 100;

pub const DATA_TOO_LARGE: u32 = 300;

pub const ERRORS: &[ProgramErrorDef] = &[ProgramErrorDef {
    code: DATA_TOO_LARGE,
    name: "DataTooLarge",
    msg: "MyAccount may only hold data below 100",
}];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MyAccount {
    pub data: u64,
    pub age: u8,
}

pub struct HelloAnchor {
    program: Program,
}

impl HelloAnchor {
    pub fn new(program: Program) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Calls `initialize` with empty arguments and no accounts.
    pub async fn initialize(&self, provider: &Provider) -> Result<TxSignature> {
        self.program.rpc(provider, "initialize", &(), vec![], &[]).await
    }

    /// Same bound the program enforces, checked before anything is sent.
    pub fn check_data(&self, value: &MyAccount) -> Result<()> {
        if value.data >= MAX_DATA {
            return Err(self.program.error(DATA_TOO_LARGE));
        }
        Ok(())
    }

    pub async fn set_data(
        &self,
        provider: &Provider,
        account: &Pubkey,
        value: MyAccount,
    ) -> Result<TxSignature> {
        self.check_data(&value)?;
        self.program
            .rpc(
                provider,
                "set_data",
                &value,
                vec![AccountMeta::writable(*account, false)],
                &[],
            )
            .await
    }

    /// Allocates a rent-exempt `MyAccount` owned by the program.
    pub async fn create_my_account(
        &self,
        provider: &Provider,
        account: &Keypair,
    ) -> Result<TxSignature> {
        let lamports = provider
            .rpc()
            .get_minimum_balance_for_rent_exemption(MY_ACCOUNT_SPACE)
            .await?;
        let ix = system::create_account(
            &provider.wallet_pubkey(),
            &account.pubkey(),
            lamports,
            MY_ACCOUNT_SPACE as u64,
            &self.program.id(),
        );
        let signature = self.program.send(provider, &[ix], &[account]).await?;
        tracing::info!(
            "Created {} {} ({} lamports): {}",
            ACCOUNT_TYPE,
            account.pubkey(),
            lamports,
            signature
        );
        Ok(signature)
    }

    pub async fn fetch_my_account(&self, provider: &Provider, address: &Pubkey) -> Result<MyAccount> {
        self.program
            .fetch_account(provider, address, ACCOUNT_TYPE)
            .await
    }
}
