use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use tradereplay_agent::{ContentAgent, KeywordDetector, PopupController, WsChannel};
use tradereplay_config::{AgentConfig, CoordinatorConfig};
use tradereplay_coordinator::{BackgroundCoordinator, CoordinatorService};
use tradereplay_protocols::{DomEvent, ElementSnapshot, Push, TabInfo};
use tradereplay_store::MemoryStore;

use super::*;

const CHART: &str = "https://www.tradingview.com/chart/abc";

struct Running {
    bridge: Bridge,
    addr: std::net::SocketAddr,
    shutdown: CancellationToken,
    _server: JoinHandle<Result<(), BridgeError>>,
}

impl Running {
    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start() -> Running {
    let bridge = Bridge::new();
    let config = CoordinatorConfig {
        badge_clear_ms: 60_000,
        ..Default::default()
    };
    let coordinator = BackgroundCoordinator::new(Arc::new(MemoryStore::new()), bridge.host(), config);
    let (handle, _task) = CoordinatorService::spawn(coordinator);

    let listener = Bridge::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = {
        let bridge = bridge.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { bridge.serve(listener, handle, shutdown).await })
    };

    Running {
        bridge,
        addr,
        shutdown,
        _server: server,
    }
}

async fn content_agent(running: &Running, tab_id: i64) -> (ContentAgent, UnboundedReceiver<Push>) {
    let tab = TabInfo::new(tab_id, CHART).with_window(1);
    let (channel, pushes) = WsChannel::connect(&running.ws_url(), Some(tab)).await.unwrap();
    let agent = ContentAgent::new(
        Arc::new(channel),
        Box::new(KeywordDetector::new("tradingview")),
        &AgentConfig::default(),
    );
    agent.connect().await.unwrap();
    (agent, pushes)
}

async fn popup(running: &Running) -> (PopupController, UnboundedReceiver<Push>) {
    let (channel, pushes) = WsChannel::connect(&running.ws_url(), None).await.unwrap();
    (PopupController::new(Arc::new(channel), Duration::from_secs(5)), pushes)
}

async fn next_push(rx: &mut UnboundedReceiver<Push>) -> Push {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("push in time")
        .expect("push channel open")
}

fn buy_button() -> ElementSnapshot {
    ElementSnapshot::new("buy-btn", "button")
        .with_text("Buy")
        .with_attr("data-symbol", "BTCUSD")
}

#[tokio::test]
async fn test_bind_rejects_bad_address() {
    let err = Bridge::bind("not-an-address").await.unwrap_err();
    assert!(matches!(err, BridgeError::Bind(_)));
}

#[tokio::test]
async fn test_content_agent_registers_over_bridge() {
    let running = start().await;
    let (agent, _pushes) = content_agent(&running, 7).await;
    assert!(agent.state().is_connected());

    let (popup, _popup_pushes) = popup(&running).await;
    let diag = popup.diagnostics().await.unwrap();
    assert_eq!(diag.registered_tabs, vec![7]);
    assert_eq!(running.bridge.state().tab_ids(), vec![7]);
    assert_eq!(running.bridge.connection_count(), 2);
}

#[tokio::test]
async fn test_toggle_reaches_content_agent() {
    let running = start().await;
    let (agent, mut pushes) = content_agent(&running, 7).await;
    let (popup, _popup_pushes) = popup(&running).await;
    assert!(!agent.is_recording());

    assert!(popup.toggle_recording().await.unwrap());
    let push = next_push(&mut pushes).await;
    assert_eq!(push, Push::RecordingStatusUpdate { is_recording: true });

    agent.handle_push(&push);
    assert!(agent.is_recording());
}

#[tokio::test]
async fn test_trade_is_broadcast_to_popup() {
    let running = start().await;
    let (agent, mut pushes) = content_agent(&running, 7).await;
    let (popup, mut popup_pushes) = popup(&running).await;

    popup.toggle_recording().await.unwrap();
    agent.handle_push(&next_push(&mut pushes).await);
    assert_eq!(agent.attach(&[buy_button()]), 1);

    let trade = agent
        .on_dom_event(&DomEvent::Click { element: buy_button() })
        .await
        .unwrap()
        .expect("trade recorded");
    assert_eq!(trade.instrument, "BTCUSD");
    assert_eq!(trade.url, CHART);

    match next_push(&mut popup_pushes).await {
        Push::TradesUpdated { trade: pushed, trade_count } => {
            assert_eq!(pushed.id, trade.id);
            assert_eq!(trade_count, 1);
        }
        other => panic!("unexpected push {:?}", other),
    }

    let recent = popup.recent_trades(5).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(*running.bridge.state().badge.lock(), "1");
}

#[tokio::test]
async fn test_capture_is_rejected_over_bridge() {
    let running = start().await;
    let (_agent, _pushes) = content_agent(&running, 7).await;
    let (popup, _popup_pushes) = popup(&running).await;

    let err = popup.capture_screenshot(Some(7)).await.unwrap_err();
    assert!(err.to_string().contains("unavailable"), "{}", err);
}

#[tokio::test]
async fn test_health_reports_connections() {
    let running = start().await;
    let (_agent, _pushes) = content_agent(&running, 3).await;

    let body: serde_json::Value = reqwest::get(format!("http://{}/health", running.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 1);
    assert_eq!(body["tabs"], serde_json::json!([3]));
    assert_eq!(body["coordinator"]["registeredTabs"], serde_json::json!([3]));
}

#[tokio::test]
async fn test_closed_tab_is_unregistered() {
    let running = start().await;
    let (agent, _pushes) = content_agent(&running, 7).await;
    let (popup, _popup_pushes) = popup(&running).await;
    drop(agent);

    let state = running.bridge.state();
    let mut cleared = false;
    for _ in 0..100 {
        let diag = popup.diagnostics().await.unwrap();
        if state.tab_ids().is_empty() && diag.registered_tabs.is_empty() {
            cleared = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(cleared, "tab 7 still registered after its socket closed");
    assert_eq!(running.bridge.connection_count(), 1);
}
