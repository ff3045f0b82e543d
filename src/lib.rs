//! leadhook scrapes LinkedIn profile pages and relays the data to an
//! n8n webhook.
//!
//! Three cooperating contexts, each an independent task with no shared
//! memory: the popup controller triggers a send, the page relay extracts
//! fields from its page, and the background dispatcher reads the stored
//! webhook URL and performs the HTTP call. All cross-context traffic is
//! typed request/response messages over channels.

pub mod dispatcher;
pub mod extractor;
pub mod logging;
pub mod popup;
pub mod record;
pub mod relay;
pub mod settings;

// Re-export the send-chain types at crate root for convenience
pub use dispatcher::{
    DispatchOutcome, DispatchRequest, Dispatcher, DispatcherHandle, send_connectivity_test,
};
pub use popup::{PopupController, SendReport, validate_profile_page};
pub use record::{EducationEntry, ExperienceEntry, FormData, Position, ProfileRecord, TestPayload};
pub use relay::{PageRelay, PageRequest, PageResponse, PageSnapshot, RelayHandle};
pub use settings::{SettingsStore, SharedSettings};
