//! Persisted extension configuration.
//!
//! A single TOML document holding the webhook URL. The settings surface
//! writes it, the dispatcher re-reads it on every send, and `clear` wipes
//! it. Gets and sets are atomic single-value operations; there is nothing
//! transactional here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

/// Settings handle shared across contexts. The dispatcher holds one; the
/// settings surface holds another.
pub type SharedSettings = Arc<Mutex<SettingsStore>>;

/// Validation failure for a candidate webhook URL.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("please enter a webhook URL")]
    Empty,
    #[error("URL must start with http:// or https://")]
    Scheme,
    #[error("please enter a valid URL")]
    Invalid(#[from] url::ParseError),
}

/// On-disk document shape. Kept separate from the store so new keys can be
/// added without touching call sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    webhook_url: Option<String>,
}

/// File-backed key-value store for extension configuration.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    doc: SettingsDocument,
}

impl SettingsStore {
    /// Load settings from `path`, or from `~/.leadhook/settings.toml` when
    /// no path is given. A missing file is an empty store, not an error.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(default_path);
        let doc = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings at {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse settings at {}", path.display()))?
        } else {
            SettingsDocument::default()
        };
        Ok(Self { path, doc })
    }

    /// Convenience wrapper producing the shared handle the contexts expect.
    pub fn shared(path: Option<PathBuf>) -> Result<SharedSettings> {
        Ok(Arc::new(Mutex::new(Self::open(path)?)))
    }

    /// The configured webhook URL, if one has been saved.
    pub fn webhook_url(&self) -> Option<&str> {
        self.doc.webhook_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Validate and persist a webhook URL.
    pub fn set_webhook_url(&mut self, url: &str) -> Result<()> {
        let parsed = validate_webhook_url(url)?;
        self.doc.webhook_url = Some(parsed.to_string());
        self.save()
    }

    /// Drop all persisted settings, removing the backing file.
    pub fn clear(&mut self) -> Result<()> {
        self.doc = SettingsDocument::default();
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(&self.doc)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

fn default_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".leadhook").join("settings.toml")
}

/// URL-shape check applied before a webhook URL is saved or test-posted:
/// non-empty, parseable, http(s) only.
pub fn validate_webhook_url(url: &str) -> Result<Url, SettingsError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(SettingsError::Empty);
    }
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(SettingsError::Scheme),
    }
}
