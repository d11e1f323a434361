//! Runtime configuration for the allocation engine.
//!
//! Configuration is plain data: embedders build it in code, or deserialize
//! it from JSON, and pass it to the services that need it. Every field has a
//! production default so partial documents are accepted.

use crate::task::domain::AdmissionRules;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliefConfig {
    /// Claim admission settings.
    pub admission: AdmissionConfig,
}

impl ReliefConfig {
    /// Parses configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when the document is malformed or a
    /// field has the wrong type.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// Creates a configuration with short timeouts for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            admission: AdmissionConfig {
                lock_timeout_ms: 250,
                ..AdmissionConfig::default()
            },
        }
    }
}

/// Settings for the claim admission protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Maximum simultaneously active claims a single user may hold.
    pub max_active_claims_per_user: u32,
    /// Upper bound on waiting for a contended task lock, in milliseconds.
    pub lock_timeout_ms: u64,
    /// Attempts made by `claim_with_retry` before giving up.
    pub retry_attempts: u32,
    /// Whether releasing a slot on a full task makes it available again.
    pub reopen_on_release: bool,
}

impl AdmissionConfig {
    /// Returns the lock timeout as a [`Duration`].
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Returns the limits re-evaluated during admission.
    #[must_use]
    pub const fn rules(&self) -> AdmissionRules {
        AdmissionRules {
            max_active_claims_per_user: self.max_active_claims_per_user,
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_active_claims_per_user: 3,
            lock_timeout_ms: 5_000,
            retry_attempts: 3,
            reopen_on_release: true,
        }
    }
}
