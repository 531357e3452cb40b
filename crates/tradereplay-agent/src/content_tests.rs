use std::time::Duration;

use tradereplay_protocols::{Direction, Response, ResponseBody};

use super::*;
use crate::detect::KeywordDetector;
use crate::testing::{RecordingSleeper, ScriptedChannel};

fn agent(channel: Arc<ScriptedChannel>, sleeper: Arc<RecordingSleeper>) -> ContentAgent {
    ContentAgent::new(
        channel,
        Box::new(KeywordDetector::new("tradingview")),
        &AgentConfig::default(),
    )
    .with_sleeper(sleeper)
}

fn buy_button() -> ElementSnapshot {
    ElementSnapshot::new("buy-btn", "button")
        .with_text("Buy")
        .with_attr("data-symbol", "BTCUSD")
}

fn ms(delays: &[Duration]) -> Vec<u64> {
    delays.iter().map(|d| d.as_millis() as u64).collect()
}

#[tokio::test]
async fn test_connect_registers_and_syncs_recording() {
    let channel = ScriptedChannel::new();
    channel.respond(
        Request::GetRecordingStatus,
        Response::ok(ResponseBody::Recording { is_recording: true }),
    );
    let agent = agent(channel.clone(), RecordingSleeper::new());

    agent.connect().await.unwrap();
    assert_eq!(agent.state(), ConnectionState::Connected);
    assert!(agent.is_recording());
    assert_eq!(
        channel.sent(),
        vec!["PING", "CONTENT_SCRIPT_READY", "GET_RECORDING_STATUS"]
    );
    assert_eq!(
        channel.sent_requests()[1],
        Request::ContentScriptReady {
            platform: Some("tradingview".into())
        }
    );
}

#[tokio::test]
async fn test_connect_backs_off_then_succeeds() {
    let channel = ScriptedChannel::new();
    channel.fail_times(3, ChannelError::Disconnected("worker asleep".into()));
    let sleeper = RecordingSleeper::new();
    let agent = agent(channel.clone(), sleeper.clone());

    agent.connect().await.unwrap();
    assert_eq!(ms(&sleeper.delays()), vec![3000, 4500, 6750]);
    assert_eq!(
        channel.sent().iter().filter(|t| **t == "PING").count(),
        4
    );
    assert!(agent.state().is_connected());
}

#[tokio::test]
async fn test_connect_gives_up_after_budget() {
    let channel = ScriptedChannel::new();
    channel.fail_with(ChannelError::Disconnected("gone".into()));
    let sleeper = RecordingSleeper::new();
    let agent = agent(channel.clone(), sleeper.clone());

    let err = agent.connect().await.unwrap_err();
    assert!(matches!(err, ChannelError::Disconnected(_)));
    assert_eq!(agent.state(), ConnectionState::GaveUp);
    assert_eq!(sleeper.delays(), BackoffPolicy::default().schedule());
    assert_eq!(channel.sent().len(), 11);
}

#[tokio::test]
async fn test_manual_reconnect_after_giving_up() {
    let channel = ScriptedChannel::new();
    channel.fail_with(ChannelError::Disconnected("gone".into()));
    let agent = agent(channel.clone(), RecordingSleeper::new());
    assert!(agent.connect().await.is_err());

    channel.recover();
    agent.reconnect().await.unwrap();
    assert_eq!(agent.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_ping_timeout_counts_as_failure() {
    let channel = ScriptedChannel::new();
    channel.hang(true);
    let agent = agent(channel.clone(), RecordingSleeper::new());

    let err = agent.connect().await.unwrap_err();
    assert_eq!(
        err,
        ChannelError::Timeout {
            request: "PING".into(),
            timeout_ms: 5000
        }
    );
    assert_eq!(agent.state(), ConnectionState::GaveUp);
}

#[tokio::test]
async fn test_push_updates_mirror() {
    let agent = agent(ScriptedChannel::new(), RecordingSleeper::new());
    agent.handle_push(&Push::RecordingStatusUpdate { is_recording: true });
    assert!(agent.is_recording());
    agent.handle_push(&Push::RecordingStatusUpdate { is_recording: false });
    assert!(!agent.is_recording());
}

#[tokio::test]
async fn test_detection_dropped_while_not_recording() {
    let channel = ScriptedChannel::new();
    let agent = agent(channel.clone(), RecordingSleeper::new());
    agent.attach(&[buy_button()]);

    let event = DomEvent::Click {
        element: buy_button(),
    };
    assert_eq!(agent.on_dom_event(&event).await.unwrap(), None);
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn test_detection_forwarded_while_recording() {
    let channel = ScriptedChannel::new();
    let agent = agent(channel.clone(), RecordingSleeper::new());
    agent.attach(&[buy_button()]);
    agent.handle_push(&Push::RecordingStatusUpdate { is_recording: true });

    let trade = agent
        .on_dom_event(&DomEvent::Click {
            element: buy_button(),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(trade.instrument, "BTCUSD");
    assert_eq!(trade.direction, Direction::Buy);

    let sent = channel.sent_requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[1],
        Request::CaptureScreenshot {
            tab_id: None,
            reason: Some("trade_detected".into())
        }
    );
}

#[tokio::test]
async fn test_click_on_unattached_element_ignored() {
    let channel = ScriptedChannel::new();
    let agent = agent(channel.clone(), RecordingSleeper::new());
    agent.handle_push(&Push::RecordingStatusUpdate { is_recording: true });

    let event = DomEvent::Click {
        element: buy_button(),
    };
    assert_eq!(agent.on_dom_event(&event).await.unwrap(), None);
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn test_attach_counts_new_elements_only() {
    let agent = agent(ScriptedChannel::new(), RecordingSleeper::new());
    let sell = ElementSnapshot::new("sell-btn", "button").with_text("Sell");
    assert_eq!(agent.attach(&[buy_button(), sell.clone()]), 2);
    assert_eq!(agent.attach(&[buy_button(), sell]), 0);
}

#[tokio::test]
async fn test_screenshot_failure_keeps_trade() {
    let channel = ScriptedChannel::new();
    channel.respond(
        Request::CaptureScreenshot {
            tab_id: None,
            reason: None,
        },
        Response::failure("Capture API unavailable: bridge"),
    );
    let agent = agent(channel.clone(), RecordingSleeper::new());
    agent.attach(&[buy_button()]);
    agent.handle_push(&Push::RecordingStatusUpdate { is_recording: true });

    let trade = agent
        .on_dom_event(&DomEvent::Click {
            element: buy_button(),
        })
        .await
        .unwrap();
    assert!(trade.is_some());
}

#[tokio::test]
async fn test_trade_rejection_is_returned() {
    let channel = ScriptedChannel::new();
    channel.respond(
        Request::TradeDetected {
            trade: Default::default(),
        },
        Response::failure("Storage error"),
    );
    let agent = agent(channel, RecordingSleeper::new());
    agent.attach(&[buy_button()]);
    agent.handle_push(&Push::RecordingStatusUpdate { is_recording: true });

    let err = agent
        .on_dom_event(&DomEvent::Click {
            element: buy_button(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ChannelError::Rejected("Storage error".into()));
}

#[tokio::test]
async fn test_toggle_recording_updates_mirror() {
    let agent = agent(ScriptedChannel::new(), RecordingSleeper::new());
    assert!(agent.toggle_recording().await.unwrap());
    assert!(agent.is_recording());
}
