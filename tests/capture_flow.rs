//! Engine and capture loop driven end to end: in-memory host, fake collector.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tabtrail::host::{HostTab, HostWindow, SnapshotHost, TabId, WindowId};
use tabtrail::signals::Signal;
use tabtrail::tracking::{TrackingAction, TrackingState};
use tabtrail::{start_capture, CaptureConfig, CaptureController, CaptureEngine, HttpCollector};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> CaptureConfig {
    CaptureConfig {
        api_base: server.uri(),
        health_timeout_ms: 500,
        request_timeout_ms: 500,
        ..CaptureConfig::default()
    }
}

fn host_with(url: &str, title: &str) -> Arc<SnapshotHost> {
    let host = SnapshotHost::new(vec![HostWindow {
        id: Some(WindowId(1)),
        focused: true,
        tabs: vec![HostTab {
            id: Some(TabId(11)),
            window_id: Some(WindowId(1)),
            url: Some(url.into()),
            title: Some(title.into()),
            active: true,
        }],
    }]);
    host.set_last_focused(Some(WindowId(1))).expect("focus");
    Arc::new(host)
}

fn engine_for(server: &MockServer, host: Arc<SnapshotHost>) -> CaptureEngine {
    let config = config_for(server);
    let collector = HttpCollector::new(config.clone()).expect("client");
    CaptureEngine::new(host, Arc::new(collector), &config)
}

async fn mount_collector(server: &MockServer, state: &str) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tracking/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": state,
            "idle_seconds": 0
        })))
        .mount(server)
        .await;
}

async fn ingested(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .expect("recording enabled")
        .into_iter()
        .filter(|request| request.url.path() == "/api/v1/events/ingest")
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect()
}

#[tokio::test]
async fn active_collector_receives_classified_events() {
    let server = MockServer::start().await;
    mount_collector(&server, "ACTIVE").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/events/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let host = host_with("https://github.com/rust-lang/rust/pull/4242", "Fix it");
    let mut engine = engine_for(&server, host);

    let report = engine.reconcile().await;
    assert_eq!(report.state, TrackingState::Active);
    assert!(report.reachable);

    engine
        .handle_signal(Signal::tab_activated(TabId(11), Utc::now()))
        .await
        .expect("emitted");

    let events = ingested(&server).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], json!("TAB_ACTIVATED"));
    assert_eq!(events[0]["tab_id"], json!(11));
    assert_eq!(events[0]["domain"], json!("github.com"));
    assert_eq!(events[0]["description"], json!("Reviewed PR #4242 on rust-lang/rust"));
}

#[tokio::test]
async fn stopped_tracking_sends_nothing() {
    let server = MockServer::start().await;
    mount_collector(&server, "STOPPED").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/events/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, host_with("https://example.com/", "Example"));
    engine.reconcile().await;

    assert!(engine.poll(Utc::now()).await.is_none());
    assert!(engine
        .handle_signal(Signal::tab_activated(TabId(11), Utc::now()))
        .await
        .is_none());
}

#[tokio::test]
async fn rapid_double_activation_is_collapsed() {
    let server = MockServer::start().await;
    mount_collector(&server, "ACTIVE").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/events/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, host_with("https://example.com/", "Example"));
    engine.reconcile().await;

    let first = Utc::now();
    engine
        .handle_signal(Signal::tab_activated(TabId(11), first))
        .await
        .expect("first emits");
    let second = first + chrono::Duration::milliseconds(500);
    assert!(engine
        .handle_signal(Signal::tab_activated(TabId(11), second))
        .await
        .is_none());
}

#[tokio::test]
async fn failed_ingest_marks_the_collector_unreachable() {
    let server = MockServer::start().await;
    mount_collector(&server, "ACTIVE").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/events/ingest"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let host = host_with("https://example.com/a", "A");
    let mut engine = engine_for(&server, host.clone());
    engine.reconcile().await;

    assert!(engine.poll(Utc::now()).await.is_none());
    let report = engine.report();
    assert!(!report.reachable);
    assert_eq!(report.state, TrackingState::Active);

    host.replace(vec![HostWindow {
        id: Some(WindowId(1)),
        focused: true,
        tabs: vec![HostTab {
            id: Some(TabId(12)),
            window_id: Some(WindowId(1)),
            url: Some("https://example.com/b".into()),
            title: Some("B".into()),
            active: true,
        }],
    }])
    .expect("replace");
    assert!(engine.poll(Utc::now()).await.is_none());
}

async fn remount_with_broken_status(server: &MockServer, response: ResponseTemplate) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tracking/status"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn status_failure_behind_a_healthy_collector_closes_the_gate() {
    let broken = [
        ResponseTemplate::new(500),
        ResponseTemplate::new(200).set_body_string("{\"state\": "),
    ];

    for response in broken {
        let server = MockServer::start().await;
        mount_collector(&server, "ACTIVE").await;

        let mut engine = engine_for(&server, host_with("https://example.com/", "Example"));
        let report = engine.reconcile().await;
        assert!(report.reachable);
        assert!(report.snapshot.is_some());

        remount_with_broken_status(&server, response).await;
        let report = engine.reconcile().await;
        assert!(!report.reachable);
        assert_eq!(report.state, TrackingState::Active);
        assert_eq!(report.snapshot, None);
        assert!(engine.poll(Utc::now()).await.is_none());
    }
}

#[tokio::test]
async fn reconciliation_overrides_an_optimistic_start() {
    let server = MockServer::start().await;
    mount_collector(&server, "STOPPED").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tracking/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, host_with("https://example.com/", "Example"));
    engine.reconcile().await;

    let report = engine.command(TrackingAction::Start).await;
    assert_eq!(report.state, TrackingState::Stopped);
    assert!(report.reachable);
}

#[tokio::test]
async fn capture_loop_reconciles_on_start_and_reports_signals() {
    let server = MockServer::start().await;
    mount_collector(&server, "ACTIVE").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/events/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = CaptureConfig {
        poll_interval_ms: 60_000,
        ..config_for(&server)
    };
    let host = host_with("https://www.notion.so/Roadmap-123", "Roadmap");
    let collector = HttpCollector::new(config.clone()).expect("client");
    let engine = CaptureEngine::new(host, Arc::new(collector), &config);

    let mut controller = CaptureController::new();
    let mut handle = controller.start(engine, &config).expect("started");

    let report = handle.check_collector().await.expect("loop running");
    assert_eq!(report.state, TrackingState::Active);
    assert!(report.reachable);

    handle
        .signals()
        .tab_activated(TabId(11))
        .await
        .expect("signal accepted");

    let emitted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let report = handle.changed().await.expect("loop running");
            if let Some(last) = report.last_emitted {
                return last;
            }
        }
    })
    .await
    .expect("event within timeout");
    assert_eq!(emitted.url, "https://www.notion.so/Roadmap-123");

    let windows = handle.debug_windows().await.expect("windows");
    assert_eq!(windows.len(), 1);

    controller.stop().await.expect("stopped");
}

#[tokio::test]
async fn start_capture_wires_the_http_collector() {
    let server = MockServer::start().await;
    mount_collector(&server, "PAUSED").await;

    let host = host_with("https://example.com/", "Example");
    let (mut controller, handle) = start_capture(host, config_for(&server)).expect("started");

    let report = handle.check_collector().await.expect("loop running");
    assert_eq!(report.state, TrackingState::Paused);
    assert!(report.reachable);

    controller.stop().await.expect("stopped");
}
