//! Result records.
//!
//! A [`ResultRecord`] is one normalized output unit: the backend's own fields
//! plus a [`RecordMetadata`] block. Serialized, the source fields sit at the top
//! level of the JSON object and the metadata block sits under `dork_metadata`,
//! which is the shape the host-side searches and dashboards expect.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::Service;

/// Retrieval count attached by a backend.
///
/// The custom search engine reports a plain count, the scraping backends a
/// human-readable `"<n> of <m> requested"` summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Retrieved {
    Count(usize),
    Summary(String),
}

/// Metadata attached to every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub label: String,
    pub entity: String,
    /// Domain (crt.sh) or rendered query text (web search).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_retrieved: Option<Retrieved>,
    /// Total result count reported by the source, when it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<String>,
}

impl RecordMetadata {
    #[must_use]
    pub fn new(label: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entity: entity.into(),
            query: None,
            results_retrieved: None,
            total_results: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_retrieved(mut self, retrieved: Retrieved) -> Self {
        self.results_retrieved = Some(retrieved);
        self
    }

    #[must_use]
    pub fn with_total_results(mut self, total: impl Into<String>) -> Self {
        self.total_results = Some(total.into());
        self
    }

    /// Label and entity are both present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.label.is_empty() && !self.entity.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Certificate transparency
// ---------------------------------------------------------------------------

/// One certificate-transparency log entry as returned by crt.sh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_ca_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    /// Newline-separated names covered by the certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Log entry time, e.g. `2024-03-01T10:22:41.512`.
    pub entry_timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// Fields the log returns that are not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRecord {
    #[serde(flatten)]
    pub entry: CtLogEntry,
    #[serde(rename = "dork_metadata")]
    pub metadata: RecordMetadata,
}

// ---------------------------------------------------------------------------
// Custom search engine
// ---------------------------------------------------------------------------

/// One item of a custom-search-engine response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSearchItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_url: Option<String>,
    /// `htmlTitle`, `pagemap`, `cacheId` and anything else the engine sends.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomSearchRecord {
    #[serde(flatten)]
    pub item: CustomSearchItem,
    #[serde(rename = "dork_metadata")]
    pub metadata: RecordMetadata,
}

// ---------------------------------------------------------------------------
// Scraped web search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebEngine {
    Google,
    DuckDuckGo,
}

/// One hit scraped from a web search results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebSearchRecord {
    #[serde(skip)]
    pub engine: WebEngine,
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(rename = "dork_metadata")]
    pub metadata: RecordMetadata,
}

// ---------------------------------------------------------------------------
// Union
// ---------------------------------------------------------------------------

/// One normalized output unit, tagged by the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResultRecord {
    Certificate(CertificateRecord),
    CustomSearch(CustomSearchRecord),
    WebSearch(WebSearchRecord),
}

impl ResultRecord {
    #[must_use]
    pub const fn metadata(&self) -> &RecordMetadata {
        match self {
            Self::Certificate(r) => &r.metadata,
            Self::CustomSearch(r) => &r.metadata,
            Self::WebSearch(r) => &r.metadata,
        }
    }

    /// The backend that produced this record.
    #[must_use]
    pub const fn service(&self) -> Service {
        match self {
            Self::Certificate(_) => Service::CrtSh,
            Self::CustomSearch(_) => Service::GoogleCse,
            Self::WebSearch(r) => match r.engine {
                WebEngine::Google => Service::GoogleGet,
                WebEngine::DuckDuckGo => Service::DuckDuckGo,
            },
        }
    }

    /// Render the record as the JSON payload of a host event.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a flattened field cannot be serialized.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
