//! RPC client against an in-process daemon: connection sharing, timeouts,
//! connection loss and reconnect backoff.

mod common;

use common::fake_daemon::{self, FakeDaemon};
use serde_json::json;
use snare_core::dispatch::JobOptions;
use snare_core::rpc::{ConnectionState, RpcClient, RpcError};
use snare_core::settings::DaemonConfig;
use std::time::Duration;

fn config() -> DaemonConfig {
    DaemonConfig {
        secret: "s3cret".to_string(),
        ..DaemonConfig::default()
    }
}

#[tokio::test]
async fn concurrent_calls_share_one_connection() {
    let daemon = FakeDaemon::new();
    let client = RpcClient::new(&config(), daemon.clone());
    assert_eq!(client.state(), ConnectionState::Disconnected);

    let (a, b, c) = tokio::join!(client.global_stat(), client.global_stat(), client.global_stat());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(daemon.opens(), 1);
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.pending_count(), 0);

    let ids: Vec<String> = daemon
        .requests()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
}

#[tokio::test(start_paused = true)]
async fn calls_during_the_handshake_join_one_attempt() {
    let daemon = FakeDaemon::new();
    daemon.delay_open(Duration::from_millis(50));
    let client = RpcClient::new(&config(), daemon.clone());

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.global_stat().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.state(), ConnectionState::Connecting);

    let (second, third) = tokio::join!(client.global_stat(), client.global_stat());
    assert!(first.await.unwrap().is_ok());
    assert!(second.is_ok() && third.is_ok());
    assert_eq!(daemon.opens(), 1);
    assert_eq!(daemon.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn disconnect_during_the_handshake_is_kept() {
    let daemon = FakeDaemon::new();
    daemon.delay_open(Duration::from_millis(50));
    let client = RpcClient::new(&config(), daemon.clone());

    let connecting = {
        let client = client.clone();
        tokio::spawn(async move { client.connect().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.state(), ConnectionState::Connecting);

    client.disconnect();
    assert_eq!(connecting.await.unwrap(), Err(RpcError::ConnectionClosed));
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // The next call starts a fresh connection.
    assert!(client.global_stat().await.is_ok());
    assert_eq!(daemon.opens(), 2);
}

#[tokio::test]
async fn add_uri_sends_token_url_and_options() {
    let daemon = FakeDaemon::new();
    let client = RpcClient::new(&config(), daemon.clone());
    let options = JobOptions {
        out: "a.zip".to_string(),
        header: vec!["Referer: https://x.test/".to_string()],
    };

    let gid = client.add_uri("https://x.test/a.zip", &options).await.unwrap();
    assert!(gid.starts_with("gid"));

    let sent = &daemon.requests()[0];
    assert_eq!(sent["jsonrpc"], "2.0");
    assert_eq!(sent["method"], "aria2.addUri");
    assert_eq!(
        sent["params"],
        json!([
            "token:s3cret",
            ["https://x.test/a.zip"],
            { "out": "a.zip", "header": ["Referer: https://x.test/"] }
        ])
    );
}

#[tokio::test]
async fn remote_error_message_is_kept_verbatim() {
    let daemon = FakeDaemon::with_responder(|req| {
        Some(fake_daemon::error_reply(req, 1, "Unauthorized"))
    });
    let client = RpcClient::new(&config(), daemon.clone());

    let err = client.call("aria2.getVersion", vec![]).await.unwrap_err();
    assert_eq!(
        err,
        RpcError::Remote {
            code: 1,
            message: "Unauthorized".to_string()
        }
    );
    assert_eq!(err.to_string(), "Unauthorized");
    assert!(!err.is_transport());
}

#[tokio::test]
async fn notifications_are_ignored() {
    let daemon = FakeDaemon::new();
    let client = RpcClient::new(&config(), daemon.clone());
    client.connect().await.unwrap();

    daemon.push(json!({
        "jsonrpc": "2.0",
        "method": "aria2.onDownloadStart",
        "params": [{ "gid": "2089b05ecca3d829" }]
    }));
    daemon.push(json!({ "jsonrpc": "2.0", "id": "999", "result": "stray" }));

    assert!(client.global_stat().await.is_ok());
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn unanswered_call_times_out_and_late_reply_is_dropped() {
    let daemon = FakeDaemon::with_responder(|_| None);
    let cfg = DaemonConfig {
        request_timeout: 500,
        ..config()
    };
    let client = RpcClient::new(&cfg, daemon.clone());

    let started = tokio::time::Instant::now();
    let err = client.call("aria2.tellActive", vec![]).await.unwrap_err();
    assert_eq!(err, RpcError::Timeout);
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(client.pending_count(), 0);

    let id = daemon.requests()[0]["id"].clone();
    daemon.push(json!({ "jsonrpc": "2.0", "id": id, "result": [] }));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.pending_count(), 0);
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn lost_connection_rejects_pending_calls() {
    let daemon = FakeDaemon::with_responder(|_| None);
    let client = RpcClient::new(&config(), daemon.clone());

    let caller = client.clone();
    let call = tokio::spawn(async move { caller.call("aria2.tellActive", vec![]).await });
    while client.pending_count() == 0 {
        tokio::task::yield_now().await;
    }

    daemon.close();
    assert_eq!(call.await.unwrap(), Err(RpcError::ConnectionClosed));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn disconnect_rejects_pending_calls() {
    let daemon = FakeDaemon::with_responder(|_| None);
    let client = RpcClient::new(&config(), daemon.clone());

    let caller = client.clone();
    let call = tokio::spawn(async move { caller.call("aria2.tellActive", vec![]).await });
    while client.pending_count() == 0 {
        tokio::task::yield_now().await;
    }

    client.disconnect();
    assert_eq!(call.await.unwrap(), Err(RpcError::ConnectionClosed));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn failed_connect_is_reported_to_the_caller() {
    let daemon = FakeDaemon::new();
    daemon.refuse_next(1);
    let client = RpcClient::new(&config(), daemon.clone());

    let err = client.global_stat().await.unwrap_err();
    assert!(matches!(err, RpcError::Connect(_)));
    assert!(err.is_transport());
    assert_eq!(client.state(), ConnectionState::Disconnected);

    assert!(client.global_stat().await.is_ok());
    assert_eq!(daemon.opens(), 2);
}

#[tokio::test(start_paused = true)]
async fn reconnect_backs_off_until_the_ceiling() {
    let daemon = FakeDaemon::new();
    daemon.refuse_next(usize::MAX);
    let cfg = DaemonConfig {
        reconnect_interval: 100,
        max_reconnect_attempts: 3,
        ..config()
    };
    let client = RpcClient::new(&cfg, daemon.clone());

    let started = tokio::time::Instant::now();
    let err = client.reconnect().await.unwrap_err();
    assert_eq!(err, RpcError::ReconnectExhausted { attempts: 3 });
    assert_eq!(daemon.opens(), 3);
    // 100 + 200 + 400 ms
    assert!(started.elapsed() >= Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn reconnect_stops_at_first_success() {
    let daemon = FakeDaemon::new();
    daemon.refuse_next(2);
    let cfg = DaemonConfig {
        reconnect_interval: 100,
        max_reconnect_attempts: 5,
        ..config()
    };
    let client = RpcClient::new(&cfg, daemon.clone());

    client.reconnect().await.unwrap();
    assert_eq!(daemon.opens(), 3);
    assert!(client.is_connected());

    // Already connected: no new attempt.
    client.reconnect().await.unwrap();
    assert_eq!(daemon.opens(), 3);
}
