//! Harness configuration
//!
//! Read from an INI credentials file:
//!
//! ```ini
//! [server]
//! host = http://rgw.local:7480
//!
//! [user]
//! accessKeyID = ...
//! secretAccessKey = ...
//! ```
//!
//! Any key can be overridden from the environment as `RGW__SECTION__KEY`.

use crate::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Gateway location
#[derive(Clone, Debug, Deserialize)]
pub struct ServerSection {
    pub host: String,
}

/// Signing credentials
#[derive(Clone, Deserialize)]
pub struct UserSection {
    #[serde(rename = "accessKeyID", alias = "accesskeyid")]
    pub access_key_id: String,
    #[serde(rename = "secretAccessKey", alias = "secretaccesskey")]
    pub secret_access_key: String,
}

impl std::fmt::Debug for UserSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSection")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

/// Optional client tuning
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub region: String,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    /// Signature validity window (seconds)
    pub signature_ttl_secs: u64,
    /// Multipart part size (bytes)
    pub part_size: usize,
}

impl Default for ClientSection {
    fn default() -> Self {
        let defaults = rgw_client::Config::default();
        Self {
            region: defaults.region,
            timeout_secs: defaults.timeout.as_secs(),
            signature_ttl_secs: defaults.signature_ttl.as_secs(),
            part_size: defaults.part_size,
        }
    }
}

/// Complete harness configuration
#[derive(Clone, Debug, Deserialize)]
pub struct HarnessConfig {
    pub server: ServerSection,
    pub user: UserSection,
    #[serde(default)]
    pub client: ClientSection,
}

impl HarnessConfig {
    /// Load from an INI file plus `RGW__*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Ini))
            .add_source(
                config::Environment::with_prefix("RGW")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Client configuration for these settings
    pub fn client_config(&self) -> rgw_client::Config {
        let mut config = rgw_client::Config::new(self.server.host.clone())
            .with_credentials(self.user.access_key_id.clone(), self.user.secret_access_key.clone())
            .with_region(self.client.region.clone())
            .with_timeout(Duration::from_secs(self.client.timeout_secs))
            .with_part_size(self.client.part_size);
        config.signature_ttl = Duration::from_secs(self.client.signature_ttl_secs);
        config
    }
}
