//! Host platform (splunkd) connection settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostConfig {
    /// Verify the management port certificate. splunkd ships a self-signed one.
    #[serde(default)]
    pub verify_tls: bool,

    /// Overrides the `server_uri` handed over in the input definition.
    #[serde(default)]
    pub server_uri: String,
}

impl HostConfig {
    /// The management URI to use, preferring the configured override.
    #[must_use]
    pub fn resolve_server_uri<'a>(&'a self, from_definition: &'a str) -> &'a str {
        if self.server_uri.is_empty() {
            from_definition
        } else {
            &self.server_uri
        }
    }
}
