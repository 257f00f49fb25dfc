//! The `cpharmony` modular input: active attacks from the Check Point Harmony
//! threat hunting API.

use std::io::Write;

use anyhow::Context;
use harvest_config::{HarvestConfig, PortalConfig};
use harvest_host::timestamp::event_time;
use harvest_host::validate::{numeric_param, required_param};
use harvest_host::{
    Argument, Event, EventWriter, HostError, HostService, InputDefinition, ModularInput, Scheme,
    Stanza, ValidationDefinition,
};
use harvest_portal::PortalSession;
use serde_json::Value;

use crate::cli::CpharmonyManualArgs;

/// Log file stem under the host's log directory.
pub const CONNECTOR: &str = "ta_for_cpharmony";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpharmonyParams {
    pub hours_ago: u32,
    pub username: String,
    pub region: Option<String>,
}

impl CpharmonyParams {
    /// Read and check a stanza's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidParameter`] for a non-numeric
    /// `query_hours_ago` or a missing `username`.
    pub fn from_stanza(stanza: &Stanza, default_hours_ago: u32) -> Result<Self, HostError> {
        Ok(Self {
            hours_ago: numeric_param(stanza, "query_hours_ago", default_hours_ago)?,
            username: required_param(stanza, "username")?.to_string(),
            region: stanza.param("region").map(str::to_string),
        })
    }

    /// `base` with this stanza's region, if it names one.
    #[must_use]
    pub fn portal_config(&self, base: &PortalConfig) -> PortalConfig {
        region_override(base, self.region.as_deref())
    }
}

fn region_override(base: &PortalConfig, region: Option<&str>) -> PortalConfig {
    let mut config = base.clone();
    if let Some(region) = region {
        config.region = region.to_string();
    }
    config
}

#[must_use]
pub fn scheme() -> Scheme {
    Scheme::new("CPHarmony")
        .description("Streams events containing Check Point Harmony active attacks.")
        .argument(
            Argument::new("query_hours_ago")
                .title("Query Age (hours ago)")
                .description("Start of the threat hunting date range, in hours before now."),
        )
        .argument(
            Argument::new("username")
                .title("Username")
                .description("Portal account. Set its password on the add-on's setup page.")
                .required_on_create(true),
        )
        .argument(
            Argument::new("region")
                .title("Region (optional)")
                .description("Portal region code, e.g. ap. Empty uses the configured region."),
        )
}

/// Array records expand to one record per element.
#[must_use]
pub fn flatten_records(records: Vec<Value>) -> Vec<Value> {
    records
        .into_iter()
        .flat_map(|record| match record {
            Value::Array(items) => items,
            other => vec![other],
        })
        .collect()
}

fn log_op_time(record: &Value) {
    match record.get("Base") {
        Some(base) => match base.get("OpTimeUTC") {
            Some(op_time) => tracing::info!(%op_time, "writing event with Base.OpTimeUTC"),
            None => tracing::info!("writing event with no OpTimeUTC in Base"),
        },
        None => tracing::info!("writing event with no Base"),
    }
}

/// One host event for `record`.
///
/// # Errors
///
/// Fails if the record cannot be serialized.
pub fn record_event(stanza: &str, record: &Value, time_path: Option<&str>) -> anyhow::Result<Event> {
    let data = serde_json::to_string(record)?;
    let time = time_path.and_then(|path| event_time(record, path));
    Ok(Event::new(stanza, data).with_time(time))
}

/// Write `records` as events, returning how many were written.
///
/// # Errors
///
/// Fails if an event cannot be rendered or written.
pub fn write_records<W: Write>(
    stanza: &str,
    records: Vec<Value>,
    time_path: Option<&str>,
    writer: &mut EventWriter<W>,
) -> anyhow::Result<usize> {
    let records = flatten_records(records);
    for record in &records {
        log_op_time(record);
        writer.write_event(&record_event(stanza, record, time_path)?)?;
    }
    Ok(records.len())
}

pub struct CpharmonyInput {
    config: HarvestConfig,
}

impl CpharmonyInput {
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
        let params = CpharmonyParams::from_stanza(stanza, self.config.portal.default_hours_ago)?;
        let realm = &self.config.portal.secret_realm;
        let password = match service.require_password(realm).await {
            Ok(password) => password,
            Err(HostError::MissingCredential { realm }) => {
                tracing::error!(%realm, stanza = %stanza.name, "no portal password stored");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let mut session =
            PortalSession::new(&params.portal_config(&self.config.portal), &self.config.http)?;
        if !session.login(&params.username, &password).await {
            tracing::error!(stanza = %stanza.name, username = %params.username, "failed to log in");
            return Ok(());
        }

        tracing::debug!(hours_ago = params.hours_ago, "starting queries");
        let records = session.query_active_attacks(params.hours_ago).await?;
        let written = write_records(
            &stanza.name,
            records,
            self.config.portal.event_time_path(),
            writer,
        )?;
        tracing::info!(stanza = %stanza.name, written, "finished queries");
        Ok(())
    }
}

impl ModularInput for CpharmonyInput {
    type Error = anyhow::Error;

    fn scheme(&self) -> Scheme {
        scheme()
    }

    fn validate(&self, definition: &ValidationDefinition) -> anyhow::Result<()> {
        CpharmonyParams::from_stanza(&definition.stanza, self.config.portal.default_hours_ago)?;
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

/// Log in, query active attacks and print the records as JSON.
///
/// # Errors
///
/// Fails if login is rejected or the query returns an unexpected status.
pub async fn run_manual(config: &HarvestConfig, args: &CpharmonyManualArgs) -> anyhow::Result<()> {
    let portal = region_override(&config.portal, args.region.as_deref());
    let mut session = PortalSession::new(&portal, &config.http)?;
    if !session.login(&args.username, &args.password).await {
        anyhow::bail!("failed to log in to {}", session.gateway_base());
    }

    let records = flatten_records(session.query_active_attacks(args.hours_ago).await?);
    tracing::info!(records = records.len(), "manual run finished");
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stanza(pairs: &[(&str, &str)]) -> Stanza {
        Stanza {
            name: "cpharmony://soc".into(),
            params: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn params_use_configured_default_lookback() {
        let params =
            CpharmonyParams::from_stanza(&stanza(&[("username", "soc@acme.com")]), 1).unwrap();
        assert_eq!(
            params,
            CpharmonyParams {
                hours_ago: 1,
                username: "soc@acme.com".into(),
                region: None,
            }
        );
    }

    #[test]
    fn username_is_required() {
        let err = CpharmonyParams::from_stanza(&stanza(&[("query_hours_ago", "4")]), 1).unwrap_err();
        assert!(err.to_string().contains("username"), "{err}");
    }

    #[test]
    fn non_numeric_lookback_is_rejected() {
        let err = CpharmonyParams::from_stanza(
            &stanza(&[("username", "u"), ("query_hours_ago", "1.5")]),
            1,
        )
        .unwrap_err();
        assert!(err.to_string().contains("query_hours_ago"), "{err}");
    }

    #[test]
    fn stanza_region_overrides_config() {
        let params = CpharmonyParams::from_stanza(
            &stanza(&[("username", "u"), ("region", "ap")]),
            1,
        )
        .unwrap();
        let config = params.portal_config(&PortalConfig {
            region: "eu".into(),
            ..Default::default()
        });
        assert_eq!(config.region, "ap");
        assert_eq!(config.gateway_base(), "https://cloudinfra-gw.ap.portal.checkpoint.com");

        let config = region_override(&PortalConfig::default(), None);
        assert_eq!(config.region, "");
    }

    #[test]
    fn arrays_are_flattened_one_level() {
        let records = vec![
            json!([{"id": 1}, {"id": 2}]),
            json!({"id": 3}),
            json!([]),
        ];
        assert_eq!(
            flatten_records(records),
            vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]
        );
    }

    #[test]
    fn op_time_becomes_event_time() {
        let record = json!({"Base": {"OpTimeUTC": 1_717_243_200_000_u64}, "Ioc": "x"});

        let event = record_event("cpharmony://soc", &record, Some("Base.OpTimeUTC")).unwrap();
        assert_eq!(event.time, Some(1_717_243_200.0));

        let event = record_event("cpharmony://soc", &record, None).unwrap();
        assert_eq!(event.time, None);
        let data: Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data, record);
    }

    #[test]
    fn write_records_counts_flattened_events() {
        let mut writer = EventWriter::new(Vec::new());
        let written = write_records(
            "cpharmony://soc",
            vec![json!([{"Base": {}}, {"Base": {"OpTimeUTC": 1}}]), json!({"other": true})],
            None,
            &mut writer,
        )
        .unwrap();

        assert_eq!(written, 3);
        assert_eq!(writer.written(), 3);
    }

    #[test]
    fn scheme_requires_username() {
        let scheme = scheme();
        let username = scheme
            .arguments()
            .iter()
            .find(|a| a.name == "username")
            .unwrap();
        assert!(username.required_on_create);
        assert_eq!(scheme.title, "CPHarmony");
    }
}
