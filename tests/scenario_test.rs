mod common;

use anchor_harness::config::scenario_config::ScenarioConfig;
use anchor_harness::core::program::account_discriminator;
use anchor_harness::programs::hello_anchor::{self, MyAccount};
use anchor_harness::programs::tic_tac_toe::{self, Game, GameState, Tile};
use anchor_harness::{HarnessError, Pubkey, ScenarioRunner, Workspace};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const HELLO_SCENARIO: &str = r#"
[scenario]
name = "hello-anchor"
description = "mirror of the original mocha suite plus set_data"

[[steps]]
kind = "initialize"

[[steps]]
kind = "create_my_account"
account = "acct"

[[steps]]
kind = "set_data"
account = "acct"
data = 42
age = 7

[[steps]]
kind = "set_data"
account = "acct"
data = 150
expect_error = "DataTooLarge"

[[steps]]
kind = "expect_my_account"
account = "acct"
data = 42
age = 7
"#;

fn my_account_data(value: &MyAccount) -> Vec<u8> {
    let mut data = account_discriminator(hello_anchor::ACCOUNT_TYPE).to_vec();
    data.extend(borsh::to_vec(value).unwrap());
    data
}

#[tokio::test]
async fn test_hello_anchor_scenario_runs_in_order() {
    let server = MockServer::start();
    let provider = common::provider(&server);
    let workspace = Workspace::with_defaults().unwrap();

    let blockhash = common::mock_blockhash(&server);
    let send = common::mock_send(&server, &common::signature_string(8));
    let status = common::mock_confirmed(&server);
    let rent = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"getMinimumBalanceForRentExemption\"")
            .body_contains(format!("\"params\":[{}]", hello_anchor::MY_ACCOUNT_SPACE));
        then.status(200).json_body(common::rpc_result(json!(1_009_200)));
    });
    let account = common::mock_account(
        &server,
        hello_anchor::PROGRAM_ID,
        &my_account_data(&MyAccount { data: 42, age: 7 }),
    );

    let config = ScenarioConfig::from_toml_str(HELLO_SCENARIO).unwrap();
    let report = ScenarioRunner::new(&provider, &workspace)
        .run(&config)
        .await
        .unwrap();

    assert_eq!(report.name, "hello-anchor");
    assert_eq!(report.steps.len(), 5);
    assert_eq!(report.signatures().len(), 3);
    assert_eq!(report.failed_steps(), 1);
    assert_eq!(report.steps[3].error.as_deref(), Some("DataTooLarge"));
    assert_eq!(
        report.steps.iter().map(|s| s.kind).collect::<Vec<_>>(),
        vec!["initialize", "create_my_account", "set_data", "set_data", "expect_my_account"]
    );

    // the rejected set_data never reaches the cluster
    send.assert_hits(3);
    blockhash.assert_hits(3);
    status.assert_hits(3);
    rent.assert();
    account.assert();
    assert!(report.steps.iter().all(|s| s.elapsed <= report.elapsed));
}

#[tokio::test]
async fn test_scenario_stops_at_first_unexpected_failure() {
    let server = MockServer::start();
    let provider = common::provider(&server);
    let workspace = Workspace::with_defaults().unwrap();

    let _blockhash = common::mock_blockhash(&server);
    let send = common::mock_send(&server, &common::signature_string(9));
    let _status = common::mock_confirmed(&server);

    let config = ScenarioConfig::from_toml_str(
        r#"
[scenario]
name = "stops"

[[steps]]
kind = "set_data"
account = "acct"
data = 500

[[steps]]
kind = "initialize"
"#,
    )
    .unwrap();

    let result = ScenarioRunner::new(&provider, &workspace).run(&config).await;
    match result {
        Err(HarnessError::ScenarioError { index, step, message }) => {
            assert_eq!(index, 0);
            assert_eq!(step, "set_data");
            assert!(message.contains("DataTooLarge"));
        }
        other => panic!("unexpected {:?}", other.map(|r| r.name)),
    }
    send.assert_hits(0);
}

#[tokio::test]
async fn test_continue_on_error_keeps_going() {
    let server = MockServer::start();
    let provider = common::provider(&server);
    let workspace = Workspace::with_defaults().unwrap();

    let _blockhash = common::mock_blockhash(&server);
    let send = common::mock_send(&server, &common::signature_string(10));
    let _status = common::mock_confirmed(&server);

    let config = ScenarioConfig::from_toml_str(
        r#"
[scenario]
name = "keeps going"

[[steps]]
kind = "initialize"
program = "Escrow"
continue_on_error = true

[[steps]]
kind = "initialize"
program = "HelloAnchor"
"#,
    )
    .unwrap();

    let report = ScenarioRunner::new(&provider, &workspace)
        .run(&config)
        .await
        .unwrap();
    assert_eq!(report.failed_steps(), 1);
    assert!(report.steps[0].error.as_deref().unwrap().contains("Escrow"));
    assert!(report.steps[1].signature.is_some());
    send.assert();
}

#[tokio::test]
async fn test_expected_error_that_never_happens_fails() {
    let server = MockServer::start();
    let provider = common::provider(&server);
    let workspace = Workspace::with_defaults().unwrap();

    let _blockhash = common::mock_blockhash(&server);
    let _send = common::mock_send(&server, &common::signature_string(12));
    let _status = common::mock_confirmed(&server);

    let config = ScenarioConfig::from_toml_str(
        r#"
[scenario]
name = "wrong expectation"

[[steps]]
kind = "initialize"
expect_error = "InstructionFallbackNotFound"
"#,
    )
    .unwrap();

    let result = ScenarioRunner::new(&provider, &workspace).run(&config).await;
    assert!(matches!(result, Err(HarnessError::ScenarioError { index: 0, .. })));
}

#[test]
fn test_scenario_file_loading() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hello.toml");
    std::fs::write(&path, HELLO_SCENARIO).unwrap();

    let config = ScenarioConfig::from_file(&path).unwrap();
    assert_eq!(config.steps.len(), 5);
    assert!(ScenarioConfig::from_file(dir.path().join("absent.toml")).is_err());
}

fn game_account_data(game: &Game) -> Vec<u8> {
    let mut data = account_discriminator(tic_tac_toe::ACCOUNT_TYPE).to_vec();
    data.extend(borsh::to_vec(game).unwrap());
    data.resize(tic_tac_toe::GAME_ACCOUNT_SPACE, 0);
    data
}

#[test]
fn test_demo_scenarios_parse() {
    let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");

    let game = ScenarioConfig::from_file(demos.join("tic_tac_toe.toml")).unwrap();
    assert_eq!(game.steps.len(), 7);
    assert_eq!(game.steps[0].action.kind(), "setup_game");
    assert_eq!(game.steps[6].action.kind(), "expect_game");

    let hello = ScenarioConfig::from_file(demos.join("hello_anchor.toml")).unwrap();
    assert_eq!(hello.steps[0].action.kind(), "airdrop");
}

#[tokio::test]
async fn test_tic_tac_toe_scenario_checks_active_game() {
    let server = MockServer::start();
    let provider = common::provider(&server);
    let workspace = Workspace::with_defaults().unwrap();
    let wallet = provider.wallet_pubkey();

    let sig = common::signature_string(13);
    let _blockhash = common::mock_blockhash(&server);
    let send = common::mock_send(&server, &sig);
    let _status = common::mock_confirmed(&server);
    let airdrop = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"requestAirdrop\"");
        then.status(200).json_body(common::rpc_result(json!(sig)));
    });
    let account = common::mock_account(
        &server,
        tic_tac_toe::PROGRAM_ID,
        &game_account_data(&Game::new(wallet, wallet)),
    );

    let config = ScenarioConfig::from_toml_str(
        r#"
[scenario]
name = "first move"

[[steps]]
kind = "airdrop"
lamports = 2000000000

[[steps]]
kind = "setup_game"
game = "game"
player_two = "wallet"

[[steps]]
kind = "play"
game = "game"
row = 1
column = 1

[[steps]]
kind = "expect_game"
game = "game"
state = "active"
"#,
    )
    .unwrap();

    let report = ScenarioRunner::new(&provider, &workspace)
        .run(&config)
        .await
        .unwrap();

    assert_eq!(report.signatures().len(), 3);
    assert_eq!(report.failed_steps(), 0);
    airdrop.assert();
    send.assert_hits(2);
    account.assert_hits(2);
}

#[tokio::test]
async fn test_expect_game_matches_state_and_winner() {
    let server = MockServer::start();
    let provider = common::provider(&server);
    let workspace = Workspace::with_defaults().unwrap();
    let wallet = provider.wallet_pubkey();

    let mut game = Game::new(wallet, Pubkey([80u8; 32]));
    for (row, column) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
        game.play(&Tile { row, column }).unwrap();
    }
    assert_eq!(game.state, GameState::Won { winner: wallet });
    let _account = common::mock_account(&server, tic_tac_toe::PROGRAM_ID, &game_account_data(&game));

    let won_by_wallet = ScenarioConfig::from_toml_str(
        "[scenario]\nname = \"won\"\n\n[[steps]]\nkind = \"expect_game\"\ngame = \"game\"\nstate = \"won\"\nwinner = \"wallet\"\n",
    )
    .unwrap();
    let report = ScenarioRunner::new(&provider, &workspace)
        .run(&won_by_wallet)
        .await
        .unwrap();
    assert_eq!(report.failed_steps(), 0);

    let won_by_other = ScenarioConfig::from_toml_str(
        "[scenario]\nname = \"other\"\n\n[[steps]]\nkind = \"expect_game\"\ngame = \"game\"\nstate = \"won\"\nwinner = \"rival\"\n",
    )
    .unwrap();
    let result = ScenarioRunner::new(&provider, &workspace).run(&won_by_other).await;
    assert!(matches!(result, Err(HarnessError::ScenarioError { index: 0, .. })));

    let tie = ScenarioConfig::from_toml_str(
        "[scenario]\nname = \"tie\"\n\n[[steps]]\nkind = \"expect_game\"\ngame = \"game\"\nstate = \"tie\"\n",
    )
    .unwrap();
    match ScenarioRunner::new(&provider, &workspace).run(&tie).await {
        Err(HarnessError::ScenarioError { step, message, .. }) => {
            assert_eq!(step, "expect_game");
            assert!(message.contains("expected tie"));
        }
        other => panic!("unexpected {:?}", other.map(|r| r.name)),
    }
}

#[tokio::test]
async fn test_move_on_finished_game_by_other_player_expects_not_players_turn() {
    let server = MockServer::start();
    let provider = common::provider(&server);
    let workspace = Workspace::with_defaults().unwrap();

    let mut game = Game::new(Pubkey([81u8; 32]), Pubkey([82u8; 32]));
    for (row, column) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
        game.play(&Tile { row, column }).unwrap();
    }
    let _account = common::mock_account(&server, tic_tac_toe::PROGRAM_ID, &game_account_data(&game));
    let send = common::mock_send(&server, &common::signature_string(14));

    let config = ScenarioConfig::from_toml_str(
        r#"
[scenario]
name = "late move"

[[steps]]
kind = "play"
game = "game"
row = 2
column = 2
expect_error = "NotPlayersTurn"
"#,
    )
    .unwrap();

    let report = ScenarioRunner::new(&provider, &workspace)
        .run(&config)
        .await
        .unwrap();
    assert_eq!(report.steps[0].error.as_deref(), Some("NotPlayersTurn"));
    send.assert_hits(0);
}
