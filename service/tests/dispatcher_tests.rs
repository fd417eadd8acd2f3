//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! End-to-end dispatcher tests over loopback sockets

use smsd_config::GatewayConfig;
use smsd_service::{Dispatcher, DispatcherConfig, EchoHandler, ServiceError};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing_test::traced_test;

fn loopback() -> Arc<GatewayConfig> {
    Arc::new(GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: "0".to_string(),
        ..Default::default()
    })
}

async fn start(config: DispatcherConfig) -> Dispatcher {
    let dispatcher = Dispatcher::with_config(loopback(), config).await.unwrap();
    dispatcher.start(Arc::new(EchoHandler::new())).await.unwrap();
    dispatcher
}

async fn read_all(client: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let _ = timeout(Duration::from_secs(5), client.read_to_end(&mut received))
        .await
        .expect("server did not close the connection");
    received
}

#[tokio::test]
async fn test_ping_is_echoed_then_closed() {
    let dispatcher = start(DispatcherConfig::default()).await;

    let mut client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    client.write_all(b"PING\n").await.unwrap();

    assert_eq!(read_all(&mut client).await, b"PING\n");

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_echo_preserves_crlf_and_binary() {
    let dispatcher = start(DispatcherConfig::default()).await;

    let mut client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    client.write_all(b"\x00\xffbind\r\n").await.unwrap();

    assert_eq!(read_all(&mut client).await, b"\x00\xffbind\r\n");

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_line_split_across_writes() {
    let dispatcher = start(DispatcherConfig::default()).await;

    let mut client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    client.write_all(b"PI").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.write_all(b"NG\n").await.unwrap();

    assert_eq!(read_all(&mut client).await, b"PING\n");

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_silent_peer_does_not_block_accept() {
    let dispatcher = start(DispatcherConfig::default()).await;

    let _silent = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut second = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    second.write_all(b"PING\n").await.unwrap();
    assert_eq!(read_all(&mut second).await, b"PING\n");

    assert_eq!(dispatcher.session_count(), 1);

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_many_concurrent_sessions() {
    let dispatcher = start(DispatcherConfig::default()).await;
    let addr = dispatcher.local_addr();

    let mut tasks = Vec::new();
    for i in 0..25 {
        tasks.push(tokio::spawn(async move {
            let mut client = TcpStream::connect(addr).await.unwrap();
            let payload = format!("message-{i}\n");
            client.write_all(payload.as_bytes()).await.unwrap();
            (payload, read_all(&mut client).await)
        }));
    }

    for task in tasks {
        let (sent, received) = task.await.unwrap();
        assert_eq!(received, sent.as_bytes());
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    let metrics = dispatcher.metrics().snapshot();
    assert_eq!(metrics.total_sessions, 25);
    assert_eq!(metrics.completed_sessions, 25);
    assert_eq!(metrics.active_sessions, 0);

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
#[traced_test]
async fn test_unterminated_data_then_close_is_logged_without_echo() {
    let dispatcher = start(DispatcherConfig::default()).await;

    let mut client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    let client_addr = client.local_addr().unwrap();
    client.write_all(b"PARTIAL").await.unwrap();
    client.shutdown().await.unwrap();

    assert!(read_all(&mut client).await.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(logs_contain("Reached end of stream"));
    assert!(logs_contain(&format!("peer={client_addr}")));
    assert!(logs_contain("unterminated line"));
    assert_eq!(dispatcher.metrics().snapshot().failed_sessions, 1);

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
#[traced_test]
async fn test_close_without_data_is_logged() {
    let dispatcher = start(DispatcherConfig::default()).await;

    let client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    let client_addr = client.local_addr().unwrap();
    drop(client);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(logs_contain("peer closed the connection before sending a line"));
    assert!(logs_contain(&format!("peer={client_addr}")));

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_idle_session_is_closed() {
    let config = DispatcherConfig::default().with_idle_timeout(Duration::from_millis(100));
    let dispatcher = start(config).await;

    let mut client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    assert!(read_all(&mut client).await.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dispatcher.metrics().snapshot().idle_timeouts, 1);
    assert_eq!(dispatcher.session_count(), 0);

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_overlong_line_is_rejected() {
    let config = DispatcherConfig::default().with_max_line_length(8);
    let dispatcher = start(config).await;

    let mut client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    client.write_all(b"0123456789ABCDEF").await.unwrap();

    assert!(read_all(&mut client).await.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dispatcher.metrics().snapshot().failed_sessions, 1);

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_live_sessions() {
    let dispatcher = start(DispatcherConfig::default()).await;

    let mut client = TcpStream::connect(dispatcher.local_addr()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dispatcher.session_count(), 1);

    dispatcher.shutdown().await.unwrap();

    assert!(read_all(&mut client).await.is_empty());
    assert_eq!(dispatcher.session_count(), 0);
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let gateway = Arc::new(GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: port.to_string(),
        ..Default::default()
    });

    match Dispatcher::new(gateway).await {
        Err(ServiceError::Bind { address, .. }) => {
            assert_eq!(address, format!("127.0.0.1:{port}"));
        }
        other => panic!("expected bind failure, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_server_table_drives_dispatcher_timing() {
    let text = r#"
host = "127.0.0.1"
port = 0

[database]
user = "smsd"
password = "pw"
host = "localhost"
storable_db = "store"

[server]
idle_timeout = 7
max_line_length = 128
"#;
    let gateway = Arc::new(GatewayConfig::from_toml_str(text).unwrap());
    let dispatcher = Dispatcher::new(gateway).await.unwrap();

    assert_eq!(dispatcher.config().idle_timeout, Duration::from_secs(7));
    assert_eq!(dispatcher.config().max_line_length, 128);
}
