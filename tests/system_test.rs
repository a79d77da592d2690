use std::sync::Arc;
use std::time::Duration;
use wms_bridge::config::AdapterConfig;
use wms_bridge::lifecycle::{AdapterSystem, ComponentStatus};
use wms_bridge::model::PackageStatus;
use wms_bridge::orchestrator::OrchestratorError;
use wms_bridge::publish::InMemoryBus;

fn fast_config() -> AdapterConfig {
    AdapterConfig {
        legacy_connect_timeout_ms: 200,
        legacy_read_timeout_ms: 500,
        legacy_max_attempts: 1,
        legacy_retry_delay_ms: 1,
        legacy_retry_max_delay_ms: 1,
        store_shards: 2,
        worker_pool_size: 4,
        ..AdapterConfig::default()
    }
}

fn with_simulator() -> AdapterConfig {
    AdapterConfig {
        simulator_enabled: true,
        simulator_host: "127.0.0.1".to_string(),
        simulator_port: 0,
        simulator_time_scale: 0.001,
        ..fast_config()
    }
}

fn order(order_id: &str, tracking_id: &str) -> Vec<u8> {
    format!(
        r#"{{"order_id":"{order_id}","tracking_id":"{tracking_id}","customer_id":"C1","origin":"Dock 1","destination":"Elm St 4"}}"#
    )
    .into_bytes()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_lifecycle_against_simulator() {
    let bus = Arc::new(InMemoryBus::new());
    let system = AdapterSystem::start(&with_simulator(), bus.clone())
        .await
        .unwrap();

    assert_eq!(system.submit_order(order("O1", "T1")).await.unwrap(), 1);
    let package = system
        .orchestrator()
        .find_package("T1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(package.status, PackageStatus::Processing);

    let health = system.health().await;
    assert_eq!(health.overall_status, ComponentStatus::Up);
    assert_eq!(health.mock_wms_server, Some(ComponentStatus::Up));
    assert_eq!(health.mock_packages_count, Some(1));

    let mut status = PackageStatus::Processing;
    for _ in 0..50 {
        status = system
            .orchestrator()
            .query_package_status("T1")
            .await
            .unwrap()
            .status;
        if status == PackageStatus::Delivered {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, PackageStatus::Delivered);
    let delivered = system
        .orchestrator()
        .find_package("T1")
        .await
        .unwrap()
        .unwrap();
    assert!(delivered.actual_delivery_date.is_some());

    let err = system
        .orchestrator()
        .cancel_order("T1", "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidState { .. }));

    system.submit_order(order("O2", "T2")).await.unwrap();
    assert_eq!(system.submit_cancellation("T2:customer request").await.unwrap(), 1);
    let cancelled = system
        .orchestrator()
        .find_package("T2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, PackageStatus::Failed);
    assert_eq!(cancelled.notes.as_deref(), Some("customer request"));

    system.shutdown().await.unwrap();
    assert!(!bus.messages("package-status").is_empty());
    assert!(!bus.messages("warehouse-events").is_empty());
}

#[tokio::test]
async fn test_unreachable_wms_fails_orders() {
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = AdapterConfig {
        legacy_host: "127.0.0.1".to_string(),
        legacy_port: port,
        ..fast_config()
    };
    let system = AdapterSystem::start(&config, Arc::new(InMemoryBus::new()))
        .await
        .unwrap();

    assert_eq!(system.submit_order(order("O1", "T1")).await.unwrap(), 1);
    let package = system
        .orchestrator()
        .find_package("T1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(package.status, PackageStatus::Failed);

    let health = system.health().await;
    assert_eq!(health.wms_tcp_connection, ComponentStatus::Down);
    assert_eq!(health.overall_status, ComponentStatus::Down);
    assert_eq!(health.mock_wms_server, None);
    assert!(system.simulator().is_none());

    system.shutdown().await.unwrap();
}
