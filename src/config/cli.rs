use super::Overrides;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "anchor-harness")]
#[command(about = "Drive Anchor programs over JSON-RPC from the command line")]
pub struct CliConfig {
    /// Cluster moniker (localnet, devnet, ...) or RPC URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Path to the fee payer keypair
    #[arg(long, global = true)]
    pub wallet: Option<String>,

    /// processed, confirmed or finalized
    #[arg(long, global = true)]
    pub commitment: Option<String>,

    #[arg(long, global = true, default_value = "Anchor.toml")]
    pub anchor_toml: String,

    #[arg(long, global = true)]
    pub confirm_timeout_secs: Option<u64>,

    /// Send without simulating first; failures then surface at confirmation
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Call `initialize` with no arguments and print the signature
    Initialize {
        #[arg(long, default_value = "hello_anchor")]
        program: String,
    },
    /// Allocate a MyAccount for hello_anchor
    CreateAccount {
        /// Keypair file for the new account; generated when absent
        #[arg(long, default_value = "my-account.json")]
        keypair: String,
    },
    /// Store data in a MyAccount
    SetData {
        #[arg(long)]
        account: String,
        #[arg(long)]
        data: u64,
        #[arg(long, default_value = "0")]
        age: u8,
    },
    /// Print a MyAccount
    ShowAccount {
        #[arg(long)]
        account: String,
    },
    /// Start a tic-tac-toe game with the wallet as player one
    SetupGame {
        #[arg(long)]
        player_two: String,
        /// Keypair file for the game account; generated when absent
        #[arg(long, default_value = "game.json")]
        game_keypair: String,
    },
    /// Play a tile as the wallet
    Play {
        #[arg(long)]
        game: String,
        #[arg(long)]
        row: u8,
        #[arg(long)]
        column: u8,
    },
    /// Print a game board
    ShowGame {
        #[arg(long)]
        game: String,
    },
    /// Request lamports for the wallet (localnet/devnet)
    Airdrop {
        #[arg(long, default_value = "1000000000")]
        lamports: u64,
    },
    /// Run a TOML scenario file
    Run {
        scenario: String,
    },
}

impl CliConfig {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            wallet: self.wallet.clone(),
            commitment: self.commitment.clone(),
            confirm_timeout_secs: self.confirm_timeout_secs,
            anchor_toml: Some(self.anchor_toml.clone()),
            skip_preflight: self.skip_preflight,
        }
    }
}
