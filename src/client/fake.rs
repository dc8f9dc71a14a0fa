//! Scripted in-memory transport for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use super::transport::{HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub body: String,
}

/// Answers requests from a queue of scripted replies and records every call.
///
/// When built with [`FakeTransport::gated`], every call is recorded at once
/// but waits for one permit on the gate before answering, letting tests act
/// while a probe or run is in flight.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push(Ok(HttpResponse::new(status, reason(status), body.to_string())));
    }

    pub fn push_raw(&self, status: u16, body: &'static str) {
        self.push(Ok(HttpResponse::new(status, reason(status), body)));
    }

    pub fn push_unreachable(&self) {
        self.push(Err(TransportError(
            "error sending request: Connection refused (os error 111)".to_string(),
        )));
    }

    fn push(&self, reply: Result<HttpResponse, TransportError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of hide/extract calls, excluding health probes.
    pub fn operation_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == "POST")
            .count()
    }

    async fn pass_gate(&self) -> Result<(), TransportError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| TransportError(e.to_string()))?
                .forget();
        }
        Ok(())
    }

    fn next_reply(&self) -> Result<HttpResponse, TransportError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no scripted reply".to_string())))
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: "GET",
            url: url.to_string(),
            body: String::new(),
        });
        self.pass_gate().await?;
        self.next_reply()
    }

    async fn post_json(
        &self,
        url: &str,
        body: String,
        _timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: "POST",
            url: url.to_string(),
            body,
        });
        self.pass_gate().await?;
        self.next_reply()
    }
}
