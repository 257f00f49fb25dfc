//! Entities and query definitions.
//!
//! Both are loaded per invocation from host lookup tables, where every column
//! is a string. The constructors here take one lookup row each.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::enums::Service;
use crate::errors::{CoreError, TemplateError};
use crate::template;

/// A lookup row: column name to cell value.
pub type Row = BTreeMap<String, String>;

/// Literal values of the `disabled` column that switch a row off.
const DISABLED_VALUES: [&str; 3] = ["1", "true", "True"];

/// Whether a `disabled` cell switches its row off.
#[must_use]
pub fn is_disabled_flag(value: &str) -> bool {
    DISABLED_VALUES.contains(&value)
}

/// A named target of investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    /// Identifier (lookup column `entity`), copied into record metadata.
    pub id: String,
    /// Display name (lookup column `org_name`).
    pub name: Option<String>,
    /// Domain searched by the certificate-transparency backend.
    pub site: String,
    pub disabled: bool,
    /// Every column of the row, available to query templates.
    pub attributes: Row,
}

impl Entity {
    /// Build an entity from a lookup row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] when the `entity` column is absent or
    /// empty; records must always name their entity.
    pub fn from_row(row: Row) -> Result<Self, CoreError> {
        let id = row
            .get("entity")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or(CoreError::MissingColumn { column: "entity" })?;

        Ok(Self {
            id,
            name: row.get("org_name").filter(|v| !v.is_empty()).cloned(),
            site: row.get("site").cloned().unwrap_or_default(),
            disabled: row.get("disabled").is_some_and(|v| is_disabled_flag(v)),
            attributes: row,
        })
    }

    /// Render a query template with this entity's attributes.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template names an attribute this entity
    /// lacks, or cannot be parsed.
    pub fn render(&self, query_template: &str) -> Result<String, TemplateError> {
        template::render(query_template, &self.attributes)
    }
}

/// A parametrized search bound to one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDefinition {
    /// Raw `service` column, kept for logging unknown selectors.
    pub selector: String,
    /// Free-text classification tag copied into record metadata.
    pub label: String,
    /// Query template with `{column}` placeholders.
    pub template: String,
    pub disabled: bool,
}

impl QueryDefinition {
    /// Build a query definition from a lookup row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] when `service` or `label` is absent
    /// or empty.
    pub fn from_row(row: &Row) -> Result<Self, CoreError> {
        let selector = row
            .get("service")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or(CoreError::MissingColumn { column: "service" })?;
        let label = row
            .get("label")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or(CoreError::MissingColumn { column: "label" })?;

        Ok(Self {
            selector,
            label,
            template: row.get("query").cloned().unwrap_or_default(),
            disabled: row.get("disabled").is_some_and(|v| is_disabled_flag(v)),
        })
    }

    /// The backend this definition targets, if the selector is known.
    #[must_use]
    pub fn service(&self) -> Option<Service> {
        Service::from_selector(&self.selector)
    }
}
