use anchor_harness::config::cli::Command;
use anchor_harness::config::scenario_config::ScenarioConfig;
use anchor_harness::programs::hello_anchor::MyAccount;
use anchor_harness::programs::tic_tac_toe::Tile;
use anchor_harness::utils::logger;
use anchor_harness::{
    CliConfig, Keypair, Provider, Pubkey, ResolvedConfig, Result, ScenarioRunner, Workspace,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting anchor-harness");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config).await {
        tracing::error!("❌ {} (category: {:?})", e, e.category());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let resolved = ResolvedConfig::resolve(&config.overrides())?;
    let provider = Provider::from_settings(&resolved)?;
    let workspace = Workspace::from_anchor_toml(&resolved.manifest, &resolved.cluster)?.merge_defaults()?;

    tracing::info!(
        "🔗 {} as {} ({})",
        resolved.cluster_url,
        provider.wallet_pubkey(),
        resolved.commitment
    );

    match config.command {
        Command::Initialize { program } => {
            let program = workspace.program(&program)?;
            let signature = program.rpc(&provider, "initialize", &(), vec![], &[]).await?;
            println!("Your transaction signature {}", signature);
        }
        Command::CreateAccount { keypair } => {
            let account = Keypair::read_or_create(&keypair)?;
            let signature = workspace
                .hello_anchor()?
                .create_my_account(&provider, &account)
                .await?;
            println!("Created {} ({})", account.pubkey(), signature);
        }
        Command::SetData { account, data, age } => {
            let account: Pubkey = account.parse()?;
            let signature = workspace
                .hello_anchor()?
                .set_data(&provider, &account, MyAccount { data, age })
                .await?;
            println!("Your transaction signature {}", signature);
        }
        Command::ShowAccount { account } => {
            let account: Pubkey = account.parse()?;
            let stored = workspace
                .hello_anchor()?
                .fetch_my_account(&provider, &account)
                .await?;
            println!("{}: data={} age={}", account, stored.data, stored.age);
        }
        Command::SetupGame {
            player_two,
            game_keypair,
        } => {
            let player_two: Pubkey = player_two.parse()?;
            let game = Keypair::read_or_create(&game_keypair)?;
            let signature = workspace
                .tic_tac_toe()?
                .setup_game(&provider, &game, &player_two)
                .await?;
            println!("Game {} ({})", game.pubkey(), signature);
        }
        Command::Play { game, row, column } => {
            let game: Pubkey = game.parse()?;
            let client = workspace.tic_tac_toe()?;
            let signature = client.play(&provider, &game, Tile { row, column }).await?;
            println!("Your transaction signature {}", signature);
            println!("{}", client.fetch_game(&provider, &game).await?);
        }
        Command::ShowGame { game } => {
            let game: Pubkey = game.parse()?;
            println!("{}", workspace.tic_tac_toe()?.fetch_game(&provider, &game).await?);
        }
        Command::Airdrop { lamports } => {
            let signature = provider.airdrop(lamports).await?;
            let balance = provider
                .rpc()
                .get_balance(&provider.wallet_pubkey(), provider.commitment())
                .await?;
            println!("{} (balance {} lamports)", signature, balance);
        }
        Command::Run { scenario } => {
            let scenario = ScenarioConfig::from_file(&scenario)?;
            let report = ScenarioRunner::new(&provider, &workspace).run(&scenario).await?;
            for step in &report.steps {
                match (&step.signature, &step.error) {
                    (Some(sig), _) => println!("[{}] {} {}", step.index, step.kind, sig),
                    (None, Some(err)) => println!("[{}] {} failed: {}", step.index, step.kind, err),
                    (None, None) => println!("[{}] {} ok", step.index, step.kind),
                }
            }
            if report.failed_steps() > 0 {
                tracing::warn!("{} step(s) failed and were skipped over", report.failed_steps());
            }
        }
    }

    Ok(())
}
