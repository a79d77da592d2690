use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use wms_bridge::codec::{kind, WireMessage};
use wms_bridge::legacy::{LegacyClient, LegacyGateway, LegacySettings, RetryPolicy};
use wms_bridge::simulator::{
    LegacySimulator, ProgressionSchedule, SimulatorHandle, SimulatorSettings,
};

async fn start(schedule: ProgressionSchedule) -> SimulatorHandle {
    LegacySimulator::start(SimulatorSettings {
        port: 0,
        schedule,
        ..SimulatorSettings::default()
    })
    .await
    .unwrap()
}

fn client(simulator: &SimulatorHandle) -> LegacyClient {
    LegacyClient::new(
        LegacySettings {
            host: "127.0.0.1".into(),
            port: simulator.local_addr().port(),
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(500),
        },
        RetryPolicy::none(),
    )
}

#[tokio::test]
async fn test_order_lifecycle_over_tcp() {
    let simulator = start(ProgressionSchedule::uniform(Duration::from_millis(10))).await;
    let client = client(&simulator);

    let ack = client
        .create_order("T1", "O1", Some("Warehouse A"), Some("{}"))
        .await
        .unwrap();
    assert!(ack.is_type(kind::ACK));
    assert_eq!(ack.status.as_deref(), Some("ACCEPTED"));
    assert_eq!(simulator.package_count().await, 1);

    let mut status = String::new();
    for _ in 0..100 {
        let reply = client.query_status("T1").await.unwrap();
        assert!(reply.is_type(kind::STATUS));
        status = reply.status.unwrap();
        if status == "DELIVERED" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, "DELIVERED");

    simulator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_stops_progression() {
    let simulator = start(ProgressionSchedule::uniform(Duration::from_millis(30))).await;
    let client = client(&simulator);

    client.create_order("T1", "O1", None, None).await.unwrap();
    let ack = client.cancel_order("T1", "O1").await.unwrap();
    assert!(ack.is_type(kind::ACK));
    assert_eq!(ack.status.as_deref(), Some("CANCELLED"));

    tokio::time::sleep(Duration::from_millis(150)).await;
    let reply = client.query_status("T1").await.unwrap();
    assert_eq!(reply.status.as_deref(), Some("CANCELLED"));

    let missing = client.cancel_order("T404", "O404").await.unwrap();
    assert!(missing.is_type(kind::ERROR));
    assert_eq!(missing.data.as_deref(), Some("Package not found: T404"));

    simulator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_connection_survives_bad_lines() {
    let simulator = start(ProgressionSchedule::uniform(Duration::from_secs(60))).await;
    let stream = TcpStream::connect(simulator.local_addr()).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let script = [
        "garbage",
        "PING|1|||||||",
        "NOPE|2|||||||",
        "ORDER|3|T1|O1|CREATE||||",
        "QUERY|4|T1||STATUS||||",
    ];
    let mut replies = Vec::new();
    for line in script {
        writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .unwrap();
        let reply = lines.next_line().await.unwrap().unwrap();
        replies.push(WireMessage::decode(&reply).unwrap());
    }

    assert!(replies[0].is_type(kind::ERROR));
    assert!(replies[0]
        .data
        .as_deref()
        .unwrap()
        .starts_with("Invalid message format"));
    assert!(replies[1].is_type(kind::PONG));
    assert_eq!(replies[1].sequence_number.as_deref(), Some("1"));
    assert_eq!(replies[2].data.as_deref(), Some("Unknown message type: NOPE"));
    assert!(replies[3].is_type(kind::ACK));
    assert_eq!(replies[4].status.as_deref(), Some("PROCESSING"));

    simulator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_many_concurrent_clients() {
    let simulator = start(ProgressionSchedule::uniform(Duration::from_millis(5))).await;
    let client = std::sync::Arc::new(client(&simulator));

    let mut handles = Vec::new();
    for i in 0..50 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let tracking_id = format!("T{i}");
            client
                .create_order(&tracking_id, &format!("O{i}"), None, None)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_type(kind::ACK));
    }

    assert_eq!(simulator.package_count().await, 50);
    assert!(client.ping().await);
    simulator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_releases_listener() {
    let simulator = start(ProgressionSchedule::default()).await;
    let addr = simulator.local_addr();
    assert!(simulator.is_running());

    // Progressions still pending are abandoned.
    client(&simulator)
        .create_order("T1", "O1", None, None)
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(2), simulator.shutdown())
        .await
        .unwrap()
        .unwrap();

    TcpListener::bind(addr).await.unwrap();
}
