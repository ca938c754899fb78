//! Fetches the published version descriptor.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::UpdateError;
use crate::version::is_newer_version;

/// `package.json` of the default branch; its `version` is the latest release.
pub const DESCRIPTOR_URL: &str =
    "https://raw.githubusercontent.com/Adib23704/Tuya-Smart-Taskbar/refs/heads/master/package.json";
pub const DOWNLOAD_URL: &str = "https://github.com/Adib23704/Tuya-Smart-Taskbar/releases/latest";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Descriptor {
    version: Option<String>,
}

/// Result of one check, as sent to the about window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub available: bool,
    pub current_version: String,
    pub latest_version: String,
    pub download_url: String,
}

/// HTTP client for the version descriptor.
pub struct UpdateChecker {
    http: reqwest::Client,
    url: String,
}

impl UpdateChecker {
    pub fn new() -> Result<Self, UpdateError> {
        Self::with_url(DESCRIPTOR_URL)
    }

    /// Checker reading the descriptor from `url` (used by tests).
    pub fn with_url(url: impl Into<String>) -> Result<Self, UpdateError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Compares the published version with `current`.
    pub async fn check(&self, current: &str) -> Result<UpdateInfo, UpdateError> {
        debug!(url = %self.url, "checking for update");
        let resp = self.http.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(UpdateError::Status(resp.status().as_u16()));
        }

        let text = resp.text().await?;
        let descriptor: Descriptor =
            serde_json::from_str(&text).map_err(|e| UpdateError::Descriptor(e.to_string()))?;
        let latest = descriptor
            .version
            .ok_or_else(|| UpdateError::Descriptor("no version field".into()))?;

        let available = is_newer_version(&latest, current);
        info!(%current, %latest, available, "update check finished");

        Ok(UpdateInfo {
            available,
            current_version: current.to_string(),
            latest_version: latest,
            download_url: DOWNLOAD_URL.to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct Seen {
    available: bool,
    latest: Option<String>,
    notified: bool,
}

/// Remembers the last check so a release is announced only once.
#[derive(Debug, Default)]
pub struct UpdateState {
    seen: Mutex<Seen>,
}

impl UpdateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a result; `true` when it is a newly detected update.
    pub fn record(&self, info: &UpdateInfo) -> bool {
        let Ok(mut seen) = self.seen.lock() else {
            return false;
        };
        let newly = info.available && !seen.available;
        seen.available = info.available;
        seen.latest = Some(info.latest_version.clone());
        newly
    }

    /// `true` the first time it is called while an update is pending; the
    /// desktop notification is shown at most once per run.
    pub fn claim_notification(&self) -> bool {
        let Ok(mut seen) = self.seen.lock() else {
            return false;
        };
        if !seen.available || seen.notified {
            return false;
        }
        seen.notified = true;
        true
    }

    /// Latest version, when it is newer than the running one.
    pub fn pending(&self) -> Option<String> {
        let seen = self.seen.lock().ok()?;
        if seen.available {
            seen.latest.clone()
        } else {
            None
        }
    }
}
