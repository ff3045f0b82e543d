//! Popup controller: the user-facing entry point for one-click sends.
//!
//! The controller checks that the active page is actually an individual
//! profile before anything crosses a channel, keeps at most one send chain
//! in flight, and turns the relay/dispatcher outcome into the message the
//! user sees.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::record::FormData;
use crate::relay::{PageRequest, RelayError, RelayHandle};

/// Domain marker an eligible URL must contain.
pub const HOST_MARKER: &str = "linkedin.com";

/// Path markers identifying an individual profile page (standard profile,
/// Sales Navigator lead, Sales Navigator people view).
pub const PROFILE_PATH_MARKERS: [&str; 3] = ["/in/", "/sales/lead/", "/sales/people/"];

/// Remediation hint shown when the page has no relay behind it. The tab
/// predates the extension, so a refresh fixes it.
const RELAY_NOT_LOADED_HINT: &str =
    "Page relay not loaded. Refresh the LinkedIn page and try again.";

/// Why a page URL is not eligible for a send. The two cases carry the
/// distinct user-facing messages the popup renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("Please navigate to a LinkedIn profile page")]
    NotLinkedIn,
    #[error("Please navigate to a LinkedIn profile page (not feed, search, or company page)")]
    NotAProfilePage,
}

/// Check that `url` points at an individual profile page. Feed, search,
/// company, and off-domain pages are rejected here, locally; nothing is
/// sent to the page relay for them.
pub fn validate_profile_page(url: &str) -> Result<(), EligibilityError> {
    if !url.contains(HOST_MARKER) {
        return Err(EligibilityError::NotLinkedIn);
    }
    if !PROFILE_PATH_MARKERS.iter().any(|m| url.contains(m)) {
        return Err(EligibilityError::NotAProfilePage);
    }
    Ok(())
}

/// Final outcome of one send, rendered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub success: bool,
    pub message: String,
}

impl SendReport {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Controller for one popup instance. Cheap to clone; clones share the
/// form state and the in-flight flag.
#[derive(Clone)]
pub struct PopupController {
    relay: RelayHandle,
    form: Arc<Mutex<FormData>>,
    in_flight: Arc<AtomicBool>,
}

impl PopupController {
    pub fn new(relay: RelayHandle) -> Self {
        Self {
            relay,
            form: Arc::new(Mutex::new(FormData::default())),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the whole form (list / stars / notes).
    pub async fn set_form(&self, form: FormData) {
        *self.form.lock().await = form;
    }

    /// Update just the free-text notes field.
    pub async fn set_notes(&self, notes: impl Into<String>) {
        self.form.lock().await.notes = notes.into();
    }

    pub async fn notes(&self) -> String {
        self.form.lock().await.notes.clone()
    }

    /// Run one end-to-end send for the page at `page_url`.
    ///
    /// Returns `None` when a send is already in flight: the second click
    /// is a no-op and must not produce a second relay message. Otherwise
    /// the returned report is the final outcome; the notes field is
    /// cleared when the send succeeded.
    pub async fn send_to_webhook(&self, page_url: &str) -> Option<SendReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("send already in flight, ignoring");
            return None;
        }
        let report = self.run_send(page_url).await;
        self.in_flight.store(false, Ordering::SeqCst);
        Some(report)
    }

    async fn run_send(&self, page_url: &str) -> SendReport {
        if let Err(err) = validate_profile_page(page_url) {
            return SendReport::failure(err.to_string());
        }

        let form_data = self.form.lock().await.clone();
        debug!(url = page_url, "sending profile data to relay");

        match self.relay.request(PageRequest::SendToN8n { form_data }).await {
            Ok(response) if response.success => {
                info!(url = page_url, "profile send succeeded");
                self.form.lock().await.notes.clear();
                SendReport::ok(
                    response
                        .message
                        .unwrap_or_else(|| "Profile data sent successfully".to_string()),
                )
            }
            Ok(response) => SendReport::failure(
                response
                    .message
                    .unwrap_or_else(|| "Failed to send profile data".to_string()),
            ),
            Err(RelayError::Unreachable) => SendReport::failure(RELAY_NOT_LOADED_HINT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::PageResponse;

    const LEAD_URL: &str = "https://www.linkedin.com/sales/lead/12345";

    fn controller() -> (PopupController, tokio::sync::mpsc::Receiver<crate::relay::PageEnvelope>) {
        let (handle, rx) = RelayHandle::channel(4);
        (PopupController::new(handle), rx)
    }

    #[test]
    fn test_eligibility_markers() {
        assert!(validate_profile_page("https://www.linkedin.com/in/someone").is_ok());
        assert!(validate_profile_page(LEAD_URL).is_ok());
        assert!(validate_profile_page("https://www.linkedin.com/sales/people/abc,NAME").is_ok());

        assert_eq!(
            validate_profile_page("https://www.google.com/search?q=x"),
            Err(EligibilityError::NotLinkedIn)
        );
        assert_eq!(
            validate_profile_page("https://www.linkedin.com/feed/"),
            Err(EligibilityError::NotAProfilePage)
        );
        assert_eq!(
            validate_profile_page("https://www.linkedin.com/company/acme/"),
            Err(EligibilityError::NotAProfilePage)
        );
    }

    #[tokio::test]
    async fn test_ineligible_page_never_reaches_relay() {
        let (popup, mut rx) = controller();

        let report = popup
            .send_to_webhook("https://www.linkedin.com/feed/")
            .await
            .unwrap();
        assert!(!report.success);
        assert!(report.message.contains("not feed, search, or company page"));

        let report = popup.send_to_webhook("https://example.com/in/x").await.unwrap();
        assert!(!report.success);

        assert!(rx.try_recv().is_err(), "relay should have received nothing");
    }

    #[tokio::test]
    async fn test_second_send_while_in_flight_is_a_no_op() {
        let (popup, mut rx) = controller();

        let first = tokio::spawn({
            let popup = popup.clone();
            async move { popup.send_to_webhook(LEAD_URL).await }
        });

        // First send is now parked on the relay reply.
        let envelope = rx.recv().await.unwrap();

        let second = popup.send_to_webhook(LEAD_URL).await;
        assert!(second.is_none(), "second click must be ignored");

        envelope
            .reply
            .send(PageResponse::ok("Profile data sent successfully"))
            .unwrap();

        let report = first.await.unwrap().unwrap();
        assert!(report.success);

        assert!(rx.try_recv().is_err(), "exactly one relay call expected");

        // Flag released: a later send goes through again.
        let third = tokio::spawn({
            let popup = popup.clone();
            async move { popup.send_to_webhook(LEAD_URL).await }
        });
        let envelope = rx.recv().await.unwrap();
        envelope.reply.send(PageResponse::ok("ok")).unwrap();
        assert!(third.await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_success_clears_notes() {
        let (popup, mut rx) = controller();
        popup.set_notes("call next week").await;

        let send = tokio::spawn({
            let popup = popup.clone();
            async move { popup.send_to_webhook(LEAD_URL).await }
        });
        let envelope = rx.recv().await.unwrap();

        // The relayed form carries the notes.
        let PageRequest::SendToN8n { form_data } = envelope.request else {
            panic!("expected sendToN8n");
        };
        assert_eq!(form_data.notes, "call next week");

        envelope.reply.send(PageResponse::ok("sent")).unwrap();
        let report = send.await.unwrap().unwrap();
        assert!(report.success);
        assert_eq!(popup.notes().await, "");
    }

    #[tokio::test]
    async fn test_failure_keeps_notes() {
        let (popup, mut rx) = controller();
        popup.set_notes("keep me").await;

        let send = tokio::spawn({
            let popup = popup.clone();
            async move { popup.send_to_webhook(LEAD_URL).await }
        });
        let envelope = rx.recv().await.unwrap();
        envelope
            .reply
            .send(PageResponse::failure("Webhook failed (HTTP 500)"))
            .unwrap();

        let report = send.await.unwrap().unwrap();
        assert!(!report.success);
        assert!(report.message.contains("500"));
        assert_eq!(popup.notes().await, "keep me");
    }

    #[tokio::test]
    async fn test_unreachable_relay_maps_to_refresh_hint() {
        let (popup, rx) = controller();
        drop(rx);

        let report = popup.send_to_webhook(LEAD_URL).await.unwrap();
        assert!(!report.success);
        assert!(report.message.contains("Refresh the LinkedIn page"));
    }
}
