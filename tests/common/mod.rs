#![allow(dead_code)]

use anchor_harness::{Keypair, Provider, RpcClient};
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::json;
use std::time::Duration;

pub const BLOCKHASH_BYTES: [u8; 32] = [9u8; 32];

pub fn blockhash() -> String {
    bs58::encode(BLOCKHASH_BYTES).into_string()
}

pub fn wallet() -> Keypair {
    Keypair::from_seed([11u8; 32])
}

pub fn provider(server: &MockServer) -> Provider {
    let rpc = RpcClient::new(&server.url("/"))
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));
    Provider::new(rpc, wallet()).with_confirm_timeout(Duration::from_secs(2))
}

pub fn rpc_result(result: serde_json::Value) -> serde_json::Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result })
}

pub fn mock_blockhash(server: &MockServer) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"getLatestBlockhash\"");
        then.status(200).json_body(rpc_result(json!({
            "context": { "slot": 1 },
            "value": { "blockhash": blockhash(), "lastValidBlockHeight": 300 }
        })));
    })
}

pub fn mock_send<'a>(server: &'a MockServer, signature: &str) -> Mock<'a> {
    let signature = signature.to_string();
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"sendTransaction\"");
        then.status(200).json_body(rpc_result(json!(signature)));
    })
}

pub fn mock_confirmed(server: &MockServer) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"getSignatureStatuses\"");
        then.status(200).json_body(rpc_result(json!({
            "context": { "slot": 2 },
            "value": [{
                "slot": 2,
                "confirmations": 0,
                "err": null,
                "confirmationStatus": "confirmed"
            }]
        })));
    })
}

pub fn mock_account<'a>(server: &'a MockServer, owner: &str, data: &[u8]) -> Mock<'a> {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let owner = owner.to_string();
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"getAccountInfo\"");
        then.status(200).json_body(rpc_result(json!({
            "context": { "slot": 3 },
            "value": {
                "data": [encoded, "base64"],
                "executable": false,
                "lamports": 1_500_000,
                "owner": owner,
                "rentEpoch": 0,
                "space": data.len()
            }
        })));
    })
}

pub fn signature_string(byte: u8) -> String {
    bs58::encode([byte; 64]).into_string()
}
