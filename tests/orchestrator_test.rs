use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wms_bridge::codec::{kind, WireMessage};
use wms_bridge::legacy::{LegacyError, LegacyGateway};
use wms_bridge::model::{
    EventType, OrderMessage, Package, PackageStatus, PackageStatusMessage, WarehouseEvent,
    WarehouseEventMessage,
};
use wms_bridge::orchestrator::{OrchestratorError, OrderOutcome, TrackingOrchestrator};
use wms_bridge::publish::{EventPublisher, InMemoryBus, MessageBus, PublishError, TopicSettings};
use wms_bridge::store::{PackageStore, ShardedStore, StoreError, Transition, Transitioned};

// --- Scripted legacy system ---

#[derive(Default)]
struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<WireMessage, LegacyError>>>,
    sent: Mutex<Vec<WireMessage>>,
}

impl ScriptedGateway {
    fn then(self, reply: Result<WireMessage, LegacyError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    fn sent(&self) -> Vec<WireMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LegacyGateway for ScriptedGateway {
    async fn send(&self, message: WireMessage) -> Result<WireMessage, LegacyError> {
        self.sent.lock().unwrap().push(message);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unreachable_wms()))
    }
}

fn unreachable_wms() -> LegacyError {
    LegacyError::Exhausted {
        attempts: 3,
        last: Box::new(LegacyError::ReadTimeout(Duration::from_millis(10))),
    }
}

fn ack() -> WireMessage {
    WireMessage::new(kind::ACK).with_status("ACCEPTED")
}

fn status(value: &str) -> WireMessage {
    WireMessage::new(kind::STATUS)
        .with_tracking_id("T1")
        .with_status(value)
        .with_location("Hub 7")
}

struct Harness {
    orchestrator: TrackingOrchestrator,
    gateway: Arc<ScriptedGateway>,
    store: Arc<ShardedStore>,
    bus: Arc<InMemoryBus>,
}

fn harness(gateway: ScriptedGateway) -> Harness {
    let (actors, store) = ShardedStore::new(4, 32);
    for actor in actors {
        tokio::spawn(actor.run(()));
    }
    let store = Arc::new(store);
    let gateway = Arc::new(gateway);
    let bus = Arc::new(InMemoryBus::new());
    let publisher = EventPublisher::new(bus.clone(), TopicSettings::default());
    let orchestrator = TrackingOrchestrator::new(store.clone(), gateway.clone(), publisher);
    Harness {
        orchestrator,
        gateway,
        store,
        bus,
    }
}

fn order(order_id: &str, tracking_id: &str) -> OrderMessage {
    OrderMessage {
        order_id: Some(order_id.to_string()),
        tracking_id: Some(tracking_id.to_string()),
        customer_id: Some("C1".to_string()),
        origin: Some("Warehouse A".to_string()),
        destination: Some("X".to_string()),
        ..OrderMessage::default()
    }
}

/// History oldest first.
async fn chronological(h: &Harness, tracking_id: &str) -> Vec<WarehouseEvent> {
    let mut events = h.orchestrator.package_history(tracking_id).await.unwrap();
    events.reverse();
    events
}

fn kinds(events: &[WarehouseEvent]) -> Vec<EventType> {
    events.iter().map(|e| e.event_type).collect()
}

// --- processNewOrder ---

#[tokio::test]
async fn test_accepted_order_ends_processing() {
    let h = harness(ScriptedGateway::default().then(Ok(ack())));

    let outcome = h
        .orchestrator
        .process_new_order(&order("O1", "T1"))
        .await
        .unwrap();
    assert!(matches!(outcome, OrderOutcome::Accepted(ref p) if p.status == PackageStatus::Processing));

    let package = h.store.find("T1").await.unwrap().unwrap();
    assert_eq!(package.status, PackageStatus::Processing);
    assert_eq!(package.destination.as_deref(), Some("X"));

    let events = chronological(&h, "T1").await;
    assert_eq!(
        kinds(&events),
        [EventType::OrderCreated, EventType::PackageStatusChanged]
    );
    assert_eq!(events[1].previous_status, Some(PackageStatus::Received));
    assert_eq!(events[1].new_status, Some(PackageStatus::Processing));

    let sent = h.gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].operation.as_deref(), Some("CREATE"));
    assert_eq!(sent[0].location.as_deref(), Some("Warehouse A"));
    let data: OrderMessage = serde_json::from_str(sent[0].data.as_deref().unwrap()).unwrap();
    assert_eq!(data.order_id.as_deref(), Some("O1"));

    let status = h.bus.wait_for("package-status", 1, Duration::from_secs(1)).await;
    let status: PackageStatusMessage = status[0].json().unwrap();
    assert_eq!(status.status, PackageStatus::Processing);
    assert_eq!(status.previous_status, Some(PackageStatus::Received));
    assert_eq!(status.notes.as_deref(), Some("Order accepted by WMS"));
    assert_eq!(package.notes, None);
    let events = h.bus.wait_for("warehouse-events", 2, Duration::from_secs(1)).await;
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_package_and_created_event_exist_before_legacy_call() {
    struct Probe {
        store: Arc<ShardedStore>,
        seen: Mutex<Option<(Package, Vec<WarehouseEvent>)>>,
    }

    #[async_trait]
    impl LegacyGateway for Probe {
        async fn send(&self, _message: WireMessage) -> Result<WireMessage, LegacyError> {
            let package = self.store.find("T1").await.unwrap().unwrap();
            let events = self.store.events("T1").await.unwrap();
            *self.seen.lock().unwrap() = Some((package, events));
            Ok(ack())
        }
    }

    let (actors, store) = ShardedStore::new(2, 8);
    for actor in actors {
        tokio::spawn(actor.run(()));
    }
    let store = Arc::new(store);
    let probe = Arc::new(Probe {
        store: store.clone(),
        seen: Mutex::new(None),
    });
    let publisher = EventPublisher::new(Arc::new(InMemoryBus::new()), TopicSettings::default());
    let orchestrator = TrackingOrchestrator::new(store, probe.clone(), publisher);

    orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    let (package, events) = probe.seen.lock().unwrap().take().unwrap();
    assert_eq!(package.status, PackageStatus::Received);
    assert_eq!(kinds(&events), [EventType::OrderCreated]);
}

#[tokio::test]
async fn test_legacy_error_reply_fails_package() {
    let reply = WireMessage::new(kind::ERROR).with_data("Warehouse full");
    let h = harness(ScriptedGateway::default().then(Ok(reply)));

    let outcome = h
        .orchestrator
        .process_new_order(&order("O1", "T1"))
        .await
        .unwrap();
    assert!(matches!(outcome, OrderOutcome::Rejected(ref p) if p.status == PackageStatus::Failed));

    let events = chronological(&h, "T1").await;
    assert_eq!(
        kinds(&events),
        [
            EventType::OrderCreated,
            EventType::PackageStatusChanged,
            EventType::ErrorOccurred
        ]
    );
    assert_eq!(events[1].new_status, Some(PackageStatus::Failed));
    assert_eq!(events[2].description, "Order rejected by WMS: Warehouse full");
}

#[tokio::test]
async fn test_communication_failure_fails_package() {
    let h = harness(ScriptedGateway::default().then(Err(unreachable_wms())));

    let outcome = h
        .orchestrator
        .process_new_order(&order("O1", "T1"))
        .await
        .unwrap();
    assert!(matches!(outcome, OrderOutcome::Failed(_)));

    let events = chronological(&h, "T1").await;
    assert_eq!(events.last().unwrap().event_type, EventType::ErrorOccurred);
    assert!(events
        .last()
        .unwrap()
        .description
        .starts_with("Error processing order:"));
    assert_eq!(
        h.store.find("T1").await.unwrap().unwrap().status,
        PackageStatus::Failed
    );
}

#[tokio::test]
async fn test_unexpected_reply_type_is_rejection() {
    let h = harness(ScriptedGateway::default().then(Ok(WireMessage::new(kind::PONG))));

    let outcome = h
        .orchestrator
        .process_new_order(&order("O1", "T1"))
        .await
        .unwrap();
    assert!(matches!(outcome, OrderOutcome::Rejected(_)));
}

#[tokio::test]
async fn test_invalid_order_is_dropped_with_audit_event() {
    let h = harness(ScriptedGateway::default());
    let mut invalid = order("O9", "");
    invalid.tracking_id = None;

    let err = h.orchestrator.process_new_order(&invalid).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Validation(_)));
    assert!(!err.is_retryable());
    assert!(h.gateway.sent().is_empty());
    assert!(h.store.all().await.unwrap().is_empty());

    let published = h.bus.wait_for("warehouse-events", 1, Duration::from_secs(1)).await;
    let event: WarehouseEventMessage = published[0].json().unwrap();
    assert_eq!(event.event_type, EventType::ErrorOccurred);
    assert_eq!(event.order_id.as_deref(), Some("O9"));
}

#[tokio::test]
async fn test_blank_ids_are_invalid() {
    let h = harness(ScriptedGateway::default());
    let err = h
        .orchestrator
        .process_new_order(&order("  ", "T1"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Validation(_)));
}

#[tokio::test]
async fn test_redelivered_order_is_duplicate() {
    let h = harness(ScriptedGateway::default().then(Ok(ack())).then(Ok(ack())));

    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();
    let again = h
        .orchestrator
        .process_new_order(&order("O1", "T1"))
        .await
        .unwrap();

    assert!(matches!(again, OrderOutcome::Duplicate(_)));
    assert_eq!(h.gateway.sent().len(), 1);
    assert_eq!(chronological(&h, "T1").await.len(), 2);
}

#[tokio::test]
async fn test_order_left_received_is_resumed() {
    let h = harness(ScriptedGateway::default().then(Ok(ack())));
    let order = order("O1", "T1");
    let package = Package::received("T1", "O1", &order);
    let created = WarehouseEvent::new(EventType::OrderCreated, &package, "created earlier");
    h.store.insert(package, created).await.unwrap();

    let outcome = h.orchestrator.process_new_order(&order).await.unwrap();

    assert!(matches!(outcome, OrderOutcome::Accepted(_)));
    assert_eq!(
        kinds(&chronological(&h, "T1").await),
        [EventType::OrderCreated, EventType::PackageStatusChanged]
    );
}

// --- updatePackageStatus ---

#[tokio::test]
async fn test_delivery_date_follows_delivered_status() {
    let h = harness(ScriptedGateway::default().then(Ok(ack())));
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    let shipped = h
        .orchestrator
        .update_package_status("T1", PackageStatus::Shipped, None, None)
        .await
        .unwrap();
    assert!(shipped.actual_delivery_date.is_none());
    assert_eq!(shipped.current_location.as_deref(), Some("Warehouse A"));

    let delivered = h
        .orchestrator
        .update_package_status(
            "T1",
            PackageStatus::Delivered,
            Some("Front door".into()),
            Some("Signed by J".into()),
        )
        .await
        .unwrap();
    assert!(delivered.actual_delivery_date.is_some());
    assert_eq!(delivered.current_location.as_deref(), Some("Front door"));
    assert_eq!(delivered.notes.as_deref(), Some("Signed by J"));
    assert!(delivered.updated_at > shipped.updated_at);

    let returned = h
        .orchestrator
        .update_package_status("T1", PackageStatus::Returned, None, None)
        .await
        .unwrap();
    assert!(returned.actual_delivery_date.is_none());

    let last = h.orchestrator.package_history("T1").await.unwrap();
    assert_eq!(last[0].previous_status, Some(PackageStatus::Delivered));
    assert_eq!(last[0].new_status, Some(PackageStatus::Returned));
}

#[tokio::test]
async fn test_update_unknown_package_is_not_found() {
    let h = harness(ScriptedGateway::default());
    let err = h
        .orchestrator
        .update_package_status("T404", PackageStatus::Picked, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(id) if id == "T404"));
}

#[tokio::test]
async fn test_concurrent_updates_do_not_lose_transitions() {
    let h = harness(ScriptedGateway::default().then(Ok(ack())));
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    let statuses = [
        PackageStatus::Picked,
        PackageStatus::Packed,
        PackageStatus::Shipped,
        PackageStatus::Returned,
    ];
    let mut handles = Vec::new();
    for i in 0..24 {
        let orchestrator = h.orchestrator.clone();
        let status = statuses[i % statuses.len()];
        handles.push(tokio::spawn(async move {
            orchestrator
                .update_package_status("T1", status, None, None)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let events = chronological(&h, "T1").await;
    assert_eq!(events.len(), 2 + 24);
    for pair in events[1..].windows(2) {
        assert_eq!(pair[1].previous_status, pair[0].new_status);
    }
}

// --- queryPackageStatus ---

#[tokio::test]
async fn test_query_falls_back_to_local_state_on_failure() {
    let h = harness(
        ScriptedGateway::default()
            .then(Ok(ack()))
            .then(Err(unreachable_wms())),
    );
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();
    let before = h.store.find("T1").await.unwrap().unwrap();

    let package = h.orchestrator.query_package_status("T1").await.unwrap();

    assert_eq!(package, before);
    assert_eq!(chronological(&h, "T1").await.len(), 2);
}

#[tokio::test]
async fn test_query_applies_newer_live_status() {
    let h = harness(
        ScriptedGateway::default()
            .then(Ok(ack()))
            .then(Ok(status("SHIPPED"))),
    );
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    let package = h.orchestrator.query_package_status("T1").await.unwrap();

    assert_eq!(package.status, PackageStatus::Shipped);
    assert_eq!(package.current_location.as_deref(), Some("Hub 7"));
    let latest = &h.orchestrator.package_history("T1").await.unwrap()[0];
    assert_eq!(latest.description, "Status updated from WMS query");
    assert_eq!(latest.previous_status, Some(PackageStatus::Processing));
    assert_eq!(h.gateway.sent()[1].message_type.as_deref(), Some("QUERY"));
    assert_eq!(package.notes, None);

    let published = h.bus.wait_for("package-status", 2, Duration::from_secs(1)).await;
    let refreshed: PackageStatusMessage = published[1].json().unwrap();
    assert_eq!(refreshed.status, PackageStatus::Shipped);
    assert_eq!(refreshed.notes.as_deref(), Some("Status updated from WMS query"));
}

#[tokio::test]
async fn test_query_with_same_status_records_nothing() {
    let h = harness(
        ScriptedGateway::default()
            .then(Ok(ack()))
            .then(Ok(status("accepted"))),
    );
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    let package = h.orchestrator.query_package_status("T1").await.unwrap();

    assert_eq!(package.status, PackageStatus::Processing);
    assert_eq!(chronological(&h, "T1").await.len(), 2);
}

#[tokio::test]
async fn test_query_unknown_package_is_not_found() {
    let h = harness(ScriptedGateway::default());
    let err = h.orchestrator.query_package_status("T404").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(_)));
    assert!(h.gateway.sent().is_empty());
}

// --- cancelOrder ---

#[tokio::test]
async fn test_cancel_moves_package_to_failed() {
    let h = harness(ScriptedGateway::default().then(Ok(ack())).then(Ok(ack())));
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    let package = h
        .orchestrator
        .cancel_order("T1", "Customer request")
        .await
        .unwrap();

    assert_eq!(package.status, PackageStatus::Failed);
    assert_eq!(package.notes.as_deref(), Some("Customer request"));
    let latest = &h.orchestrator.package_history("T1").await.unwrap()[0];
    assert_eq!(latest.event_type, EventType::OrderCancelled);
    assert_eq!(latest.description, "Order cancelled: Customer request");

    let sent = h.gateway.sent();
    assert_eq!(sent[1].operation.as_deref(), Some("CANCEL"));
    assert_eq!(sent[1].order_id.as_deref(), Some("O1"));

    let published = h.bus.wait_for("package-status", 2, Duration::from_secs(1)).await;
    let cancelled = published
        .iter()
        .map(|p| p.json::<PackageStatusMessage>().unwrap())
        .find(|m| m.status == PackageStatus::Failed)
        .unwrap();
    assert_eq!(cancelled.notes.as_deref(), Some("Customer request"));
    assert_eq!(cancelled.previous_status, Some(PackageStatus::Processing));
}

#[tokio::test]
async fn test_cancel_after_shipment_is_invalid_and_changes_nothing() {
    for blocked in [PackageStatus::Shipped, PackageStatus::Delivered] {
        let h = harness(ScriptedGateway::default().then(Ok(ack())));
        h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();
        h.orchestrator
            .update_package_status("T1", blocked, None, None)
            .await
            .unwrap();
        let before = h.store.find("T1").await.unwrap().unwrap();
        let history = chronological(&h, "T1").await;

        let err = h.orchestrator.cancel_order("T1", "too late").await.unwrap_err();

        assert!(matches!(err, OrchestratorError::InvalidState { status, .. } if status == blocked));
        assert_eq!(h.store.find("T1").await.unwrap().unwrap(), before);
        assert_eq!(chronological(&h, "T1").await, history);
        assert_eq!(h.gateway.sent().len(), 1);
    }
}

#[tokio::test]
async fn test_cancel_communication_failure_propagates() {
    let h = harness(
        ScriptedGateway::default()
            .then(Ok(ack()))
            .then(Err(unreachable_wms())),
    );
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    let err = h.orchestrator.cancel_order("T1", "whatever").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::Communication(_)));
    assert!(err.is_retryable());
    assert_eq!(
        h.store.find("T1").await.unwrap().unwrap().status,
        PackageStatus::Processing
    );
}

#[tokio::test]
async fn test_cancel_unknown_package_is_not_found() {
    let h = harness(ScriptedGateway::default());
    let err = h.orchestrator.cancel_order("T404", "x").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(_)));
}

// --- history and queries ---

#[tokio::test]
async fn test_history_of_unknown_package_is_not_found() {
    let h = harness(ScriptedGateway::default());
    let err = h.orchestrator.package_history("T404").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(_)));
}

#[tokio::test]
async fn test_query_helpers() {
    let h = harness(
        ScriptedGateway::default()
            .then(Ok(ack()))
            .then(Ok(WireMessage::new(kind::ERROR).with_data("no"))),
    );
    h.orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();
    h.orchestrator.process_new_order(&order("O2", "T2")).await.unwrap();

    let failed = h
        .orchestrator
        .packages_by_status(PackageStatus::Failed)
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].tracking_id, "T2");
    assert_eq!(
        h.orchestrator.packages_by_customer("C1").await.unwrap().len(),
        2
    );
    let counts = h.orchestrator.status_counts().await.unwrap();
    assert_eq!(counts[&PackageStatus::Processing], 1);
    assert_eq!(counts[&PackageStatus::Failed], 1);
    assert!(h.orchestrator.find_package("T3").await.unwrap().is_none());
}

// --- failure bookkeeping and publication order ---

/// Store whose first transition and first event append report an outage.
struct FlakyStore {
    inner: ShardedStore,
    transition_failed: AtomicBool,
    append_failed: AtomicBool,
}

impl FlakyStore {
    fn new(inner: ShardedStore) -> Self {
        Self {
            inner,
            transition_failed: AtomicBool::new(false),
            append_failed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PackageStore for FlakyStore {
    async fn insert(&self, package: Package, event: WarehouseEvent) -> Result<(), StoreError> {
        self.inner.insert(package, event).await
    }

    async fn find(&self, tracking_id: &str) -> Result<Option<Package>, StoreError> {
        self.inner.find(tracking_id).await
    }

    async fn transition(&self, tracking_id: &str, transition: Transition) -> Result<Transitioned, StoreError> {
        if !self.transition_failed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("blip".into()));
        }
        self.inner.transition(tracking_id, transition).await
    }

    async fn append_event(&self, tracking_id: &str, event: WarehouseEvent) -> Result<(), StoreError> {
        if !self.append_failed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("blip".into()));
        }
        self.inner.append_event(tracking_id, event).await
    }

    async fn events(&self, tracking_id: &str) -> Result<Vec<WarehouseEvent>, StoreError> {
        self.inner.events(tracking_id).await
    }

    async fn all(&self) -> Result<Vec<Package>, StoreError> {
        self.inner.all().await
    }
}

#[tokio::test]
async fn test_failed_order_always_records_error_event() {
    let (actors, inner) = ShardedStore::new(2, 8);
    for actor in actors {
        tokio::spawn(actor.run(()));
    }
    let store = Arc::new(FlakyStore::new(inner));
    let publisher = EventPublisher::new(Arc::new(InMemoryBus::new()), TopicSettings::default());
    let orchestrator =
        TrackingOrchestrator::new(store.clone(), Arc::new(ScriptedGateway::default()), publisher);
    let order = order("O1", "T1");

    // The FAILED write hits the outage: nothing is recorded and the package stays RECEIVED.
    let err = orchestrator.process_new_order(&order).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(
        store.find("T1").await.unwrap().unwrap().status,
        PackageStatus::Received
    );

    // Redelivery resumes and records the failure together with its error event.
    let outcome = orchestrator.process_new_order(&order).await.unwrap();
    assert!(matches!(outcome, OrderOutcome::Failed(ref p) if p.status == PackageStatus::Failed));

    let again = orchestrator.process_new_order(&order).await.unwrap();
    assert!(matches!(again, OrderOutcome::Duplicate(_)));

    let mut history = orchestrator.package_history("T1").await.unwrap();
    history.reverse();
    assert_eq!(
        kinds(&history),
        [
            EventType::OrderCreated,
            EventType::PackageStatusChanged,
            EventType::ErrorOccurred
        ]
    );
}

/// Holds back the first status message it sees.
struct SlowFirstBus {
    inner: InMemoryBus,
    delayed: AtomicBool,
}

#[async_trait]
impl MessageBus for SlowFirstBus {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if topic == "package-status" && !self.delayed.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.publish(topic, key, payload).await
    }
}

#[tokio::test]
async fn test_status_messages_keep_transition_order() {
    let (actors, store) = ShardedStore::new(2, 8);
    for actor in actors {
        tokio::spawn(actor.run(()));
    }
    let bus = Arc::new(SlowFirstBus {
        inner: InMemoryBus::new(),
        delayed: AtomicBool::new(false),
    });
    let publisher = EventPublisher::new(bus.clone(), TopicSettings::default());
    let orchestrator = TrackingOrchestrator::new(
        Arc::new(store),
        Arc::new(ScriptedGateway::default().then(Ok(ack()))),
        publisher,
    );
    orchestrator.process_new_order(&order("O1", "T1")).await.unwrap();

    for status in [PackageStatus::Picked, PackageStatus::Packed, PackageStatus::Shipped] {
        orchestrator
            .update_package_status("T1", status, None, None)
            .await
            .unwrap();
    }
    orchestrator.publisher().flush().await;

    let order: Vec<PackageStatus> = bus
        .inner
        .messages("package-status")
        .iter()
        .map(|p| p.json::<PackageStatusMessage>().unwrap().status)
        .collect();
    assert_eq!(
        order,
        [
            PackageStatus::Processing,
            PackageStatus::Picked,
            PackageStatus::Packed,
            PackageStatus::Shipped
        ]
    );
}
