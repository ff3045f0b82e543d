//! Background dispatcher: owns the stored configuration and performs the
//! outbound webhook call.
//!
//! The dispatcher runs as its own task and answers `sendToN8n` envelopes
//! from page relays. Every send is single-shot: one best-effort POST, no
//! retry, no queueing. Failed sends surface a structured outcome and leave
//! the dispatcher ready for the next attempt.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::record::{ProfileRecord, TestPayload};
use crate::settings::{self, SharedSettings};

/// List value that marks a dry-run send. Matching profiles are reported as
/// sent without any network call.
pub const TEST_LIST_SENTINEL: &str = "Test";

/// Request union the dispatcher answers, in the original wire shape
/// `{"action": "sendToN8n", "profileData": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DispatchRequest {
    #[serde(rename_all = "camelCase")]
    SendToN8n { profile_data: ProfileRecord },
}

/// Structured result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub success: bool,
    pub message: String,
}

impl DispatchOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// The dispatcher context is unreachable (task gone or reply dropped).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("background dispatcher is not reachable")]
    Unreachable,
}

pub(crate) struct DispatchEnvelope {
    pub(crate) request: DispatchRequest,
    pub(crate) reply: oneshot::Sender<DispatchOutcome>,
}

/// Cloneable handle for sending requests to the dispatcher task.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<DispatchEnvelope>,
}

impl DispatcherHandle {
    pub(crate) fn channel(buffer: usize) -> (Self, mpsc::Receiver<DispatchEnvelope>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Send one request and wait for its outcome. The reply channel stays
    /// open until the dispatcher finishes the attempt, so a slow webhook
    /// call never drops its response.
    pub async fn send(&self, request: DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DispatchEnvelope { request, reply })
            .await
            .map_err(|_| DispatchError::Unreachable)?;
        rx.await.map_err(|_| DispatchError::Unreachable)
    }
}

/// Background dispatcher context.
pub struct Dispatcher {
    settings: SharedSettings,
    client: Client,
}

impl Dispatcher {
    /// Spawn the dispatcher task and return the handle relays talk to.
    /// The task runs until every handle is dropped.
    pub fn spawn(settings: SharedSettings) -> DispatcherHandle {
        let (handle, mut rx) = DispatcherHandle::channel(16);
        let dispatcher = Self {
            settings,
            client: Client::new(),
        };
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let outcome = dispatcher.handle(envelope.request).await;
                // Receiver may have given up waiting; nothing to do then.
                let _ = envelope.reply.send(outcome);
            }
            debug!("dispatcher task shutting down");
        });
        handle
    }

    async fn handle(&self, request: DispatchRequest) -> DispatchOutcome {
        match request {
            DispatchRequest::SendToN8n { profile_data } => self.forward_profile(profile_data).await,
        }
    }

    /// One best-effort delivery of a scraped profile.
    async fn forward_profile(&self, profile: ProfileRecord) -> DispatchOutcome {
        let webhook_url = {
            let settings = self.settings.lock().await;
            settings.webhook_url().map(str::to_string)
        };
        let Some(webhook_url) = webhook_url else {
            return DispatchOutcome::failure(
                "No webhook URL set. Please go to settings and enter your webhook URL.",
            );
        };

        if profile.list == TEST_LIST_SENTINEL {
            info!(person = %profile.person_name, "test mode, skipping webhook call");
            return DispatchOutcome::ok("Test mode: skipping webhook call");
        }

        debug!(
            url = %webhook_url,
            payload = %serde_json::to_string(&profile).unwrap_or_default(),
            "posting profile to webhook"
        );

        match self
            .client
            .post(&webhook_url)
            .header("Content-Type", "application/json")
            .json(&profile)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(person = %profile.person_name, "profile data sent");
                DispatchOutcome::ok("Profile data sent successfully")
            }
            Ok(response) => {
                let status = response.status().as_u16();
                warn!(status, "webhook rejected profile data");
                DispatchOutcome::failure(format!("Webhook failed (HTTP {status})"))
            }
            Err(err) => {
                warn!(error = %err, "webhook call failed");
                DispatchOutcome::failure(format!("Network error: {err}"))
            }
        }
    }
}

/// Connectivity check for the settings surface: validate the candidate URL
/// shape, POST the fixed test payload, and report the status. Same
/// status-class interpretation as a real send, same single-shot policy.
pub async fn send_connectivity_test(url: &str) -> DispatchOutcome {
    let url = match settings::validate_webhook_url(url) {
        Ok(parsed) => parsed,
        Err(err) => return DispatchOutcome::failure(err.to_string()),
    };

    let payload = TestPayload::new();
    match Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => {
            DispatchOutcome::ok(format!("Test successful! (HTTP {})", response.status().as_u16()))
        }
        Ok(response) => {
            DispatchOutcome::failure(format!("Test failed: HTTP {}", response.status().as_u16()))
        }
        Err(err) => DispatchOutcome::failure(format!("Network error: {err}")),
    }
}
