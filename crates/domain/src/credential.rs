//! Credential scopes and the routing table that selects them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::RouteSettings;

/// Which stored bearer credential a request carries.
///
/// The two scopes are stored independently and never mixed in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScope {
    /// Resident session.
    Standard,
    /// Admin session.
    Elevated,
}

impl CredentialScope {
    /// Key under which the credential is persisted.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Standard => "resident_token",
            Self::Elevated => "admin_token",
        }
    }

    /// Both scopes, in storage order.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Standard, Self::Elevated]
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Elevated => f.write_str("elevated"),
        }
    }
}

/// Resolves a route path to its credential policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    elevated_prefixes: Vec<String>,
    public_routes: Vec<String>,
    login_routes: Vec<String>,
}

impl RouteTable {
    /// Builds a table from explicit lists.
    #[must_use]
    pub fn new(
        elevated_prefixes: Vec<String>,
        public_routes: Vec<String>,
        login_routes: Vec<String>,
    ) -> Self {
        Self {
            elevated_prefixes,
            public_routes,
            login_routes,
        }
    }

    /// Scope whose credential `path` must carry.
    #[must_use]
    pub fn scope_for(&self, path: &str) -> CredentialScope {
        let path = strip_query(path);
        if self
            .elevated_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            CredentialScope::Elevated
        } else {
            CredentialScope::Standard
        }
    }

    /// Whether `path` may be called without any stored credential.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.public_routes.iter().any(|r| matches_prefix(path, r))
    }

    /// Whether `path` is a login route. A 401 from a login route is a
    /// plain bad-password answer and never purges credentials.
    #[must_use]
    pub fn is_login(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.login_routes.iter().any(|r| matches_prefix(path, r))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::from(&RouteSettings::default())
    }
}

impl From<&RouteSettings> for RouteTable {
    fn from(settings: &RouteSettings) -> Self {
        Self::new(
            settings.elevated_prefixes.clone(),
            settings.public_routes.clone(),
            settings.login_routes.clone(),
        )
    }
}

fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or_default()
}

/// Segment-aware prefix match: `/admin` matches `/admin` and `/admin/x`
/// but not `/administrators`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
