//! Client settings
//!
//! Every field has a default so a partial settings file (or none at all)
//! still yields a usable configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Route classification lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSettings {
    /// Path prefixes that carry the admin credential.
    #[serde(default = "default_elevated_prefixes")]
    pub elevated_prefixes: Vec<String>,

    /// Routes allowed to go out with no credential.
    #[serde(default = "default_public_routes")]
    pub public_routes: Vec<String>,

    /// Routes whose 401 answers never purge a stored credential.
    #[serde(default = "default_login_routes")]
    pub login_routes: Vec<String>,
}

fn default_elevated_prefixes() -> Vec<String> {
    vec!["/admin".to_string()]
}

fn default_public_routes() -> Vec<String> {
    ["/auth/login", "/auth/register", "/admin/login", "/health"]
        .map(String::from)
        .to_vec()
}

fn default_login_routes() -> Vec<String> {
    ["/auth/login", "/admin/login"].map(String::from).to_vec()
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            elevated_prefixes: default_elevated_prefixes(),
            public_routes: default_public_routes(),
            login_routes: default_login_routes(),
        }
    }
}

/// Settings for the executor, sync engine and push registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// API base, e.g. `https://api.example.org/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deadline for JSON requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Deadline for multipart and binary uploads, in seconds.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Interval between reconciliation cycles, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Page size for the notification and announcement reads.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Attempts per push-token step.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Base backoff between push-token attempts, in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Where credentials are persisted. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,

    /// Route classification.
    #[serde(default)]
    pub routes: RouteSettings,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_upload_timeout_secs() -> u64 {
    300
}

const fn default_poll_interval_secs() -> u64 {
    15
}

const fn default_page_size() -> u32 {
    20
}

const fn default_retry_max_attempts() -> u32 {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    1000
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            page_size: default_page_size(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            credentials_path: None,
            routes: RouteSettings::default(),
        }
    }
}

impl ClientSettings {
    /// Parses `base_url`, forcing a trailing slash so relative joins keep
    /// the base path.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute http(s).
    pub fn base_url(&self) -> DomainResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl(format!(
                "unsupported scheme `{}`",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        Ok(url)
    }

    /// JSON request deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Upload deadline.
    #[must_use]
    pub const fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    /// Polling interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Base backoff for push-token retries.
    #[must_use]
    pub const fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Checks ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> DomainResult<()> {
        self.base_url()?;
        let positive = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("upload_timeout_secs", self.upload_timeout_secs),
            ("poll_interval_secs", self.poll_interval_secs),
            ("page_size", u64::from(self.page_size)),
            ("retry_max_attempts", u64::from(self.retry_max_attempts)),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(DomainError::InvalidSetting {
                field,
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.upload_timeout_secs < self.request_timeout_secs {
            return Err(DomainError::InvalidSetting {
                field: "upload_timeout_secs",
                reason: "must not be shorter than request_timeout_secs".to_string(),
            });
        }
        Ok(())
    }
}
