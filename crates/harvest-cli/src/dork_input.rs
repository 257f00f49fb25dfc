//! The `dork` modular input.
//!
//! Each run pulls the entity and query lookups from the host, enumerates
//! every enabled (query x entity) pair through the dork backends, and writes
//! one event per result record.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use harvest_config::HarvestConfig;
use harvest_core::entities::Row;
use harvest_core::{Entity, QueryDefinition, ResultRecord};
use harvest_dork::{Aggregator, Dispatcher, DorkClient, DorkSettings};
use harvest_host::timestamp::event_time;
use harvest_host::validate::numeric_param;
use harvest_host::{
    Argument, Event, EventWriter, HostError, HostService, InputDefinition, ModularInput, Scheme,
    Stanza, ValidationDefinition,
};
use serde_json::{Map, Value};

use crate::cli::DorkManualArgs;

/// Log file stem under the host's log directory.
pub const CONNECTOR: &str = "ta_for_dorks";

/// Environment variable holding the custom search API key for manual runs.
pub const CSE_API_KEY_ENV: &str = "CSE_API_KEY";

pub const DEFAULT_ENTITIES_LOOKUP: &str = "dork_entities.csv";
pub const DEFAULT_QUERIES_LOOKUP: &str = "dork_queries.csv";
const DEFAULT_GOOGLE_MAX_WAIT: u32 = 5;

/// Stanza parameters after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DorkParams {
    pub cse_id: String,
    pub query_date_range: u32,
    pub google_get_max_wait: u32,
    pub entities_lookup: String,
    pub queries_lookup: String,
}

impl DorkParams {
    /// Read and check a stanza's parameters, applying defaults for empty ones.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidParameter`] for a non-numeric
    /// `query_date_range` or `google_get_max_wait`.
    pub fn from_stanza(stanza: &Stanza) -> Result<Self, HostError> {
        Ok(Self {
            cse_id: stanza.param("cse_id").unwrap_or_default().to_string(),
            query_date_range: numeric_param(stanza, "query_date_range", 0)?,
            google_get_max_wait: numeric_param(
                stanza,
                "google_get_max_wait",
                DEFAULT_GOOGLE_MAX_WAIT,
            )?,
            entities_lookup: stanza
                .param("entities_lookup")
                .unwrap_or(DEFAULT_ENTITIES_LOOKUP)
                .to_string(),
            queries_lookup: stanza
                .param("queries_lookup")
                .unwrap_or(DEFAULT_QUERIES_LOOKUP)
                .to_string(),
        })
    }

    #[must_use]
    pub fn settings(&self, cse_api_key: String) -> DorkSettings {
        DorkSettings {
            cse_id: self.cse_id.clone(),
            cse_api_key,
            query_date_range: self.query_date_range,
            google_get_max_wait: u64::from(self.google_get_max_wait),
        }
    }
}

#[must_use]
pub fn scheme() -> Scheme {
    Scheme::new("Dorks")
        .description("Streams events containing dork search results.")
        .argument(
            Argument::new("query_date_range")
                .title("Query Date Range (days)")
                .description("Filter results by discovery/index date, where supported. 0 = all time."),
        )
        .argument(
            Argument::new("cse_id")
                .title("Google CSE ID (optional)")
                .description("If using Google CSE, define the API key on the add-on's setup page."),
        )
        .argument(
            Argument::new("google_get_max_wait")
                .title("Google search max delay (seconds)")
                .description("Extra random wait, up to this many seconds, after each web search query."),
        )
        .argument(
            Argument::new("entities_lookup")
                .title("Entities lookup")
                .description("Lookup table of entities. Defaults to dork_entities.csv."),
        )
        .argument(
            Argument::new("queries_lookup")
                .title("Queries lookup")
                .description("Lookup table of query definitions. Defaults to dork_queries.csv."),
        )
}

/// Build entities from lookup rows, skipping rows without an `entity` column.
#[must_use]
pub fn entities_from_rows(rows: Vec<Row>) -> Vec<Entity> {
    rows.into_iter()
        .filter_map(|row| match Entity::from_row(row) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(%e, "skipping entity row");
                None
            }
        })
        .collect()
}

/// Build query definitions from lookup rows, skipping incomplete rows.
#[must_use]
pub fn queries_from_rows(rows: &[Row]) -> Vec<QueryDefinition> {
    rows.iter()
        .filter_map(|row| match QueryDefinition::from_row(row) {
            Ok(query) => Some(query),
            Err(e) => {
                tracing::warn!(%e, "skipping query row");
                None
            }
        })
        .collect()
}

/// One host event for `record`.
///
/// # Errors
///
/// Fails if the record cannot be serialized.
pub fn record_event(
    stanza: &str,
    record: &ResultRecord,
    time_path: Option<&str>,
) -> anyhow::Result<Event> {
    let data = record.to_payload()?;
    let time = match time_path {
        Some(path) => event_time(&serde_json::to_value(record)?, path),
        None => None,
    };
    Ok(Event::new(stanza, data).with_time(time))
}

/// Run one enumeration and write every record it yields, returning the
/// number of events written.
///
/// # Errors
///
/// Fails if an event cannot be rendered or written.
pub async fn write_records<D: Dispatcher, W: Write>(
    aggregator: &Aggregator<'_, D>,
    entities: Vec<Entity>,
    queries: Vec<QueryDefinition>,
    stanza: &str,
    time_path: Option<&str>,
    writer: &mut EventWriter<W>,
) -> anyhow::Result<usize> {
    let mut run = aggregator.enumerate(entities, queries);
    let mut written = 0;
    while let Some(batch) = run.next_batch().await {
        for record in &batch {
            writer.write_event(&record_event(stanza, record, time_path)?)?;
            written += 1;
        }
    }
    Ok(written)
}

pub struct DorkInput {
    config: HarvestConfig,
}

impl DorkInput {
    #[must_use]
    pub const fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    async fn stream_stanza<W: Write>(
        &self,
        service: &HostService,
        stanza: &Stanza,
        writer: &mut EventWriter<W>,
    ) -> anyhow::Result<()> {
        let params = DorkParams::from_stanza(stanza)?;
        let realm = &self.config.dork.secret_realm;
        let cse_api_key = service.find_password(realm).await?.unwrap_or_else(|| {
            tracing::warn!(%realm, "no custom search API key stored");
            String::new()
        });

        let entities = entities_from_rows(service.lookup_rows(&params.entities_lookup).await?);
        let queries = queries_from_rows(&service.lookup_rows(&params.queries_lookup).await?);
        tracing::info!(
            stanza = %stanza.name,
            entities = entities.len(),
            enabled_queries = queries.iter().filter(|q| !q.disabled).count(),
            "starting queries"
        );

        let client = DorkClient::new(
            self.config.dork.clone(),
            &self.config.http,
            params.settings(cse_api_key),
        )?;
        let written = write_records(
            &client.aggregator(),
            entities,
            queries,
            &stanza.name,
            self.config.dork.event_time_path(),
            writer,
        )
        .await?;
        tracing::info!(stanza = %stanza.name, written, "finished queries");
        Ok(())
    }
}

impl ModularInput for DorkInput {
    type Error = anyhow::Error;

    fn scheme(&self) -> Scheme {
        scheme()
    }

    fn validate(&self, definition: &ValidationDefinition) -> anyhow::Result<()> {
        DorkParams::from_stanza(&definition.stanza)?;
        Ok(())
    }

    async fn stream_events<W: Write>(
        &self,
        inputs: &InputDefinition,
        writer: &mut EventWriter<W>,
    ) -> anyhow::Result<()> {
        let service = HostService::new(
            &inputs.server_uri,
            inputs.session_key.clone(),
            &self.config.host,
            &self.config.http,
        )?;
        for stanza in &inputs.stanzas {
            self.stream_stanza(&service, stanza, writer)
                .await
                .with_context(|| format!("stanza {} failed", stanza.name))?;
        }
        Ok(())
    }
}

// ── Manual runs ────────────────────────────────────────────────────

/// Parse a JSON array of objects into lookup rows. Non-string cells are
/// rendered as JSON text, `null` as empty.
///
/// # Errors
///
/// Fails unless `raw` is a JSON array of objects.
pub fn parse_rows(raw: &str) -> anyhow::Result<Vec<Row>> {
    let objects: Vec<Map<String, Value>> =
        serde_json::from_str(raw).context("expected a JSON array of objects")?;
    Ok(objects
        .into_iter()
        .map(|object| {
            object
                .into_iter()
                .map(|(column, value)| {
                    let cell = match value {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (column, cell)
                })
                .collect()
        })
        .collect())
}

fn read_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_rows(&raw).with_context(|| format!("invalid rows in {}", path.display()))
}

/// Run the enumeration off the host and print every record as JSON.
///
/// # Errors
///
/// Fails if a lookup file cannot be read or parsed, or the client cannot be
/// built.
pub async fn run_manual(config: &HarvestConfig, args: &DorkManualArgs) -> anyhow::Result<()> {
    let entities = entities_from_rows(read_rows(&args.entities)?);
    let queries = queries_from_rows(&read_rows(&args.queries)?);
    let settings = DorkSettings {
        cse_id: args.cse_id.clone(),
        cse_api_key: std::env::var(CSE_API_KEY_ENV).unwrap_or_default(),
        query_date_range: args.query_date_range,
        google_get_max_wait: args.google_get_max_wait,
    };

    let client = DorkClient::new(config.dork.clone(), &config.http, settings)?;
    let records = client
        .aggregator()
        .enumerate(entities, queries)
        .collect_all()
        .await;
    tracing::info!(records = records.len(), "manual run finished");
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
