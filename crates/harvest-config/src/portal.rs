//! Vendor portal (Check Point Harmony) configuration.

use serde::{Deserialize, Serialize};

fn default_domain() -> String {
    String::from("portal.checkpoint.com")
}

fn default_secret_realm() -> String {
    String::from("ta_for_cpharmony_realm")
}

const fn default_verify_tls() -> bool {
    true
}

const fn default_hours_ago() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    /// Region code prefixed to the portal hosts (`ap`, `eu`, ...). Empty for
    /// the global portal.
    #[serde(default)]
    pub region: String,

    /// Portal base domain.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Explicit gateway base URL. Empty derives it from region and domain.
    #[serde(default)]
    pub gateway_url: String,

    /// Explicit portal base URL. Empty derives it from region and domain.
    #[serde(default)]
    pub portal_url: String,

    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Credential store realm holding the portal password.
    #[serde(default = "default_secret_realm")]
    pub secret_realm: String,

    /// Lookback used when an input leaves `query_hours_ago` empty.
    #[serde(default = "default_hours_ago")]
    pub default_hours_ago: u32,

    /// Dotted path promoted to the event time, e.g. `Base.OpTimeUTC`. Empty
    /// disables promotion.
    #[serde(default)]
    pub event_time_field: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            domain: default_domain(),
            gateway_url: String::new(),
            portal_url: String::new(),
            verify_tls: default_verify_tls(),
            secret_realm: default_secret_realm(),
            default_hours_ago: default_hours_ago(),
            event_time_field: String::new(),
        }
    }
}

impl PortalConfig {
    fn region_prefix(&self) -> String {
        if self.region.is_empty() {
            String::new()
        } else {
            format!("{}.", self.region)
        }
    }

    /// Base URL of the API gateway (auth and threat hunting).
    #[must_use]
    pub fn gateway_base(&self) -> String {
        if !self.gateway_url.is_empty() {
            return self.gateway_url.trim_end_matches('/').to_string();
        }
        format!("https://cloudinfra-gw.{}{}", self.region_prefix(), self.domain)
    }

    /// Base URL of the user-facing portal.
    #[must_use]
    pub fn portal_base(&self) -> String {
        if !self.portal_url.is_empty() {
            return self.portal_url.trim_end_matches('/').to_string();
        }
        format!("https://{}{}", self.region_prefix(), self.domain)
    }

    /// The configured event time path, if promotion is enabled.
    #[must_use]
    pub fn event_time_path(&self) -> Option<&str> {
        Some(self.event_time_field.as_str()).filter(|p| !p.is_empty())
    }
}
