//! Modular input scheme, printed on `--scheme`.

use serde::{Serialize, Serializer};

use crate::error::HostError;

/// Declared type of an input argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String,
    Number,
    Boolean,
}

impl DataType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One argument of an input stanza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_type: DataType,
    pub required_on_create: bool,
    pub required_on_edit: bool,
}

impl Argument {
    /// A string argument, optional on create and edit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            data_type: DataType::String,
            required_on_create: false,
            required_on_edit: false,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    #[must_use]
    pub const fn required_on_create(mut self, required: bool) -> Self {
        self.required_on_create = required;
        self
    }

    #[must_use]
    pub const fn required_on_edit(mut self, required: bool) -> Self {
        self.required_on_edit = required;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct Endpoint {
    args: Args,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct Args {
    #[serde(rename = "arg")]
    items: Vec<Argument>,
}

/// What the host shows for an input type and which arguments it takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "scheme")]
pub struct Scheme {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ask the host to run `--validate-arguments` on create and edit.
    pub use_external_validation: bool,
    pub use_single_instance: bool,
    streaming_mode: &'static str,
    endpoint: Endpoint,
}

impl Scheme {
    /// An XML-streaming, externally validated, multi-instance scheme.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            use_external_validation: true,
            use_single_instance: false,
            streaming_mode: "xml",
            endpoint: Endpoint::default(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.endpoint.args.items.push(argument);
        self
    }

    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.endpoint.args.items
    }

    /// Render as the host's `<scheme>` document.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Xml`] if serialization fails.
    pub fn to_xml(&self) -> Result<String, HostError> {
        quick_xml::se::to_string(self).map_err(|e| HostError::Xml(e.to_string()))
    }
}
