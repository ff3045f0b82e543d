//! Page relay: the per-page context that owns field extraction.
//!
//! One relay task per loaded profile page. It answers two message kinds
//! from the popup: `getProfileData` (extract and return the record) and
//! `sendToN8n` (extract, forward to the background dispatcher, relay the
//! outcome back). Each inbound envelope carries its own reply sender, so
//! the response channel stays open for as long as the handler needs.

use scraper::Html;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::dispatcher::{DispatchRequest, DispatcherHandle};
use crate::extractor::{self, ExtractError};
use crate::record::{FormData, ProfileRecord};

/// The page a relay serves: its URL and the markup captured at load time.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Request union the relay answers, in the original wire shape
/// `{"action": "...", "formData": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageRequest {
    /// Extract the profile and return it without sending anywhere.
    #[serde(rename_all = "camelCase")]
    GetProfileData { form_data: FormData },
    /// Extract the profile and forward it to the dispatcher.
    #[serde(rename_all = "camelCase")]
    SendToN8n { form_data: FormData },
}

/// Response union: `data` for successful extraction queries, `message` for
/// send outcomes and failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ProfileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PageResponse {
    pub fn with_data(data: ProfileRecord) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// The page's relay task is gone. The page was closed or never loaded a
/// relay in the first place.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("page relay is not reachable")]
    Unreachable,
}

pub(crate) struct PageEnvelope {
    pub(crate) request: PageRequest,
    pub(crate) reply: oneshot::Sender<PageResponse>,
}

/// Cloneable handle for sending requests to one page's relay task.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<PageEnvelope>,
}

impl RelayHandle {
    pub(crate) fn channel(buffer: usize) -> (Self, mpsc::Receiver<PageEnvelope>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Send one request and wait for the relay's response.
    pub async fn request(&self, request: PageRequest) -> Result<PageResponse, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PageEnvelope { request, reply })
            .await
            .map_err(|_| RelayError::Unreachable)?;
        rx.await.map_err(|_| RelayError::Unreachable)
    }
}

/// Per-page relay context.
pub struct PageRelay {
    page: PageSnapshot,
    dispatcher: DispatcherHandle,
}

impl PageRelay {
    /// Spawn a relay task for one page. The task runs until every handle
    /// is dropped.
    pub fn spawn(page: PageSnapshot, dispatcher: DispatcherHandle) -> RelayHandle {
        let (handle, mut rx) = RelayHandle::channel(8);
        let relay = Self { page, dispatcher };
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let response = relay.handle(envelope.request).await;
                let _ = envelope.reply.send(response);
            }
            debug!(url = %relay.page.url, "page relay shutting down");
        });
        handle
    }

    async fn handle(&self, request: PageRequest) -> PageResponse {
        debug!(url = %self.page.url, ?request, "relay request");
        match request {
            PageRequest::GetProfileData { form_data } => match self.extract(&form_data) {
                Ok(data) => PageResponse::with_data(data),
                Err(err) => PageResponse::failure(extraction_failure(&err)),
            },
            PageRequest::SendToN8n { form_data } => {
                let profile = match self.extract(&form_data) {
                    Ok(profile) => profile,
                    Err(err) => return PageResponse::failure(extraction_failure(&err)),
                };
                match self
                    .dispatcher
                    .send(DispatchRequest::SendToN8n {
                        profile_data: profile,
                    })
                    .await
                {
                    Ok(outcome) => PageResponse {
                        success: outcome.success,
                        data: None,
                        message: Some(outcome.message),
                    },
                    Err(err) => PageResponse::failure(err.to_string()),
                }
            }
        }
    }

    /// Parse-and-extract in one synchronous step. The parsed document is
    /// not `Send` and must never be held across an await point, so it
    /// lives and dies inside this call.
    fn extract(&self, form: &FormData) -> Result<ProfileRecord, ExtractError> {
        let doc = Html::parse_document(&self.page.html);
        extractor::extract_profile(&doc, &self.page.url, form)
    }
}

fn extraction_failure(err: &ExtractError) -> String {
    format!("Failed to extract profile data: {err}")
}
