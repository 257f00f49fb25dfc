//! Input and validation definitions read from stdin.
//!
//! Streaming mode gets an `<input>` document with every configured stanza;
//! `--validate-arguments` gets an `<items>` document with the single stanza
//! being created or edited.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::HostError;

/// Parameter name to value, as configured on a stanza.
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawStanza {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "param", default)]
    params: Vec<RawParam>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfiguration {
    #[serde(rename = "stanza", default)]
    stanzas: Vec<RawStanza>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    #[serde(default)]
    server_host: String,
    server_uri: String,
    session_key: String,
    #[serde(default)]
    checkpoint_dir: String,
    #[serde(default)]
    configuration: RawConfiguration,
}

#[derive(Debug, Deserialize)]
struct RawItems {
    #[serde(default)]
    server_host: String,
    server_uri: String,
    session_key: String,
    #[serde(default)]
    checkpoint_dir: String,
    item: RawStanza,
}

fn collect_params(raw: Vec<RawParam>) -> Params {
    raw.into_iter().map(|p| (p.name, p.value)).collect()
}

/// One configured input, e.g. `dork://acme`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    pub name: String,
    pub params: Params,
}

impl Stanza {
    /// The name after the `scheme://` prefix.
    #[must_use]
    pub fn input_name(&self) -> &str {
        self.name
            .split_once("://")
            .map_or(self.name.as_str(), |(_, rest)| rest)
    }

    /// A parameter value, treating empty as absent.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Everything the host hands a connector in streaming mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDefinition {
    pub server_host: String,
    pub server_uri: String,
    pub session_key: String,
    pub checkpoint_dir: String,
    pub stanzas: Vec<Stanza>,
}

impl InputDefinition {
    /// Parse an `<input>` document.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Xml`] if the document is malformed or lacks
    /// `server_uri` or `session_key`.
    pub fn parse(xml: &str) -> Result<Self, HostError> {
        let raw: RawInput = quick_xml::de::from_str(xml).map_err(|e| HostError::Xml(e.to_string()))?;
        Ok(Self {
            server_host: raw.server_host,
            server_uri: raw.server_uri,
            session_key: raw.session_key,
            checkpoint_dir: raw.checkpoint_dir,
            stanzas: raw
                .configuration
                .stanzas
                .into_iter()
                .map(|s| Stanza {
                    name: s.name,
                    params: collect_params(s.params),
                })
                .collect(),
        })
    }
}

/// The stanza under validation plus the host connection details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDefinition {
    pub server_host: String,
    pub server_uri: String,
    pub session_key: String,
    pub checkpoint_dir: String,
    pub stanza: Stanza,
}

impl ValidationDefinition {
    /// Parse an `<items>` document.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Xml`] if the document is malformed or has no
    /// `<item>`.
    pub fn parse(xml: &str) -> Result<Self, HostError> {
        let raw: RawItems = quick_xml::de::from_str(xml).map_err(|e| HostError::Xml(e.to_string()))?;
        Ok(Self {
            server_host: raw.server_host,
            server_uri: raw.server_uri,
            session_key: raw.session_key,
            checkpoint_dir: raw.checkpoint_dir,
            stanza: Stanza {
                name: raw.item.name,
                params: collect_params(raw.item.params),
            },
        })
    }
}
