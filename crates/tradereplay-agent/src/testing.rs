//! Scripted channel and clock for agent tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use tradereplay_protocols::{
    ChannelError, MessageChannel, Request, Response, ResponseBody, Sleeper, TradeRecord,
};

#[derive(Default)]
struct Script {
    responses: HashMap<&'static str, Response>,
    failure: Option<ChannelError>,
    failures_left: u32,
    hang: bool,
    sent: Vec<Request>,
}

/// Channel that answers from a script and records what was sent.
#[derive(Default)]
pub struct ScriptedChannel {
    script: Mutex<Script>,
}

impl ScriptedChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request with this request's tag with `response`.
    pub fn respond(&self, request: Request, response: Response) {
        self.script.lock().responses.insert(request.tag(), response);
    }

    /// Fail every request until cleared.
    pub fn fail_with(&self, error: ChannelError) {
        let mut script = self.script.lock();
        script.failure = Some(error);
        script.failures_left = u32::MAX;
    }

    /// Fail the next `times` requests, then answer normally.
    pub fn fail_times(&self, times: u32, error: ChannelError) {
        let mut script = self.script.lock();
        script.failure = Some(error);
        script.failures_left = times;
    }

    pub fn recover(&self) {
        let mut script = self.script.lock();
        script.failure = None;
        script.failures_left = 0;
    }

    /// Never answer.
    pub fn hang(&self, hang: bool) {
        self.script.lock().hang = hang;
    }

    pub fn sent(&self) -> Vec<&'static str> {
        self.script.lock().sent.iter().map(Request::tag).collect()
    }

    pub fn sent_requests(&self) -> Vec<Request> {
        self.script.lock().sent.clone()
    }

    fn default_response(request: &Request) -> Response {
        let body = match request {
            Request::Ping => ResponseBody::Pong {
                ready: true,
                id: "background_test".into(),
            },
            Request::ContentScriptReady { .. } => ResponseBody::Registered { registered: true },
            Request::GetRecordingStatus => ResponseBody::Recording {
                is_recording: false,
            },
            Request::ToggleRecording { is_recording } => ResponseBody::Recording {
                is_recording: is_recording.unwrap_or(true),
            },
            Request::TradeDetected { trade } => ResponseBody::Trade {
                trade: TradeRecord::from_draft(trade.clone(), None, chrono::Utc::now()),
            },
            Request::CaptureScreenshot { .. } => ResponseBody::Screenshot {
                data_url: "data:image/png;base64,AAAA".into(),
            },
            Request::GetTrades => ResponseBody::Trades { trades: vec![] },
            Request::GetScreenshots => ResponseBody::Screenshots {
                screenshots: vec![],
            },
            Request::ClearTrades => ResponseBody::Cleared { cleared: 0 },
            Request::DiagnosticPing => ResponseBody::Empty {},
        };
        Response::ok(body)
    }
}

#[async_trait]
impl MessageChannel for ScriptedChannel {
    async fn send(&self, request: Request) -> Result<Response, ChannelError> {
        let outcome = {
            let mut script = self.script.lock();
            script.sent.push(request.clone());
            if script.hang {
                None
            } else if script.failures_left > 0 {
                script.failures_left -= 1;
                let error = script.failure.clone();
                Some(Err(error.unwrap_or(ChannelError::Disconnected("scripted".into()))))
            } else {
                Some(Ok(script
                    .responses
                    .get(request.tag())
                    .cloned()
                    .unwrap_or_else(|| Self::default_response(&request))))
            }
        };

        match outcome {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

/// Records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}
