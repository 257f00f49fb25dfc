//! Backend service selector.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which external data source a query definition targets.
///
/// The lookup table stores this as a free-text `service` column:
///
/// ```text
/// crt.sh          → CrtSh
/// google_cse      → GoogleCse
/// google_get      → GoogleGet
/// duckduckgo_*    → DuckDuckGo
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    CrtSh,
    GoogleCse,
    GoogleGet,
    DuckDuckGo,
}

impl Service {
    /// Processing order of the aggregator partitions.
    pub const PARTITION_ORDER: [Self; 4] =
        [Self::CrtSh, Self::GoogleCse, Self::GoogleGet, Self::DuckDuckGo];

    /// Parse a lookup `service` column. Unknown selectors yield `None`.
    #[must_use]
    pub fn from_selector(raw: &str) -> Option<Self> {
        match raw {
            "crt.sh" => Some(Self::CrtSh),
            "google_cse" => Some(Self::GoogleCse),
            "google_get" => Some(Self::GoogleGet),
            other if other.starts_with("duckduckgo_") => Some(Self::DuckDuckGo),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CrtSh => "crt.sh",
            Self::GoogleCse => "google_cse",
            Self::GoogleGet => "google_get",
            Self::DuckDuckGo => "duckduckgo",
        }
    }

    /// Whether queries for this service are templates rendered per entity.
    ///
    /// crt.sh queries search the entity's site directly.
    #[must_use]
    pub const fn uses_template(self) -> bool {
        !matches!(self, Self::CrtSh)
    }

    /// Whether the aggregator pauses after each query of this partition.
    #[must_use]
    pub const fn is_paced(self) -> bool {
        matches!(self, Self::GoogleGet | Self::DuckDuckGo)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("crt.sh", Some(Service::CrtSh))]
    #[case("google_cse", Some(Service::GoogleCse))]
    #[case("google_get", Some(Service::GoogleGet))]
    #[case("duckduckgo_get", Some(Service::DuckDuckGo))]
    #[case("duckduckgo_news", Some(Service::DuckDuckGo))]
    #[case("duckduckgo", None)]
    #[case("bing", None)]
    #[case("", None)]
    fn parses_selectors(#[case] raw: &str, #[case] expected: Option<Service>) {
        assert_eq!(Service::from_selector(raw), expected);
    }

    #[test]
    fn only_web_search_is_paced() {
        assert!(!Service::CrtSh.is_paced());
        assert!(!Service::GoogleCse.is_paced());
        assert!(Service::GoogleGet.is_paced());
        assert!(Service::DuckDuckGo.is_paced());
    }

    #[test]
    fn crt_sh_does_not_render_templates() {
        assert!(!Service::CrtSh.uses_template());
        assert!(Service::GoogleCse.uses_template());
    }
}
