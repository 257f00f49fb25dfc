//! The cpharmony input end to end against a scripted host and portal.

mod common;

use harvest_cli::cpharmony_input::CpharmonyInput;
use harvest_config::{HarvestConfig, PortalConfig};
use harvest_host::{HostError, Mode};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::MockServer;

fn input_for(server: &MockServer) -> CpharmonyInput {
    CpharmonyInput::new(HarvestConfig {
        portal: PortalConfig {
            gateway_url: server.base.clone(),
            portal_url: server.base.clone(),
            event_time_field: "Base.OpTimeUTC".into(),
            ..Default::default()
        },
        ..Default::default()
    })
}

fn input_xml(server: &MockServer) -> String {
    format!(
        r#"<input><server_uri>{}</server_uri><session_key>sess</session_key><configuration>
<stanza name="cpharmony://soc"><param name="query_hours_ago">24</param>
<param name="username">soc@acme.com</param></stanza></configuration></input>"#,
        server.base
    )
}

fn passwords() -> (u16, String) {
    let body = json!({"entry": [
        {"content": {"realm": "ta_for_cpharmony_realm", "clear_password": "pw"}}
    ]});
    (200, body.to_string())
}

fn login_ok() -> (u16, String) {
    (200, json!({"csrf": "tok-123"}).to_string())
}

#[tokio::test]
async fn active_attacks_become_events() {
    let records = json!({"data": {"searchRecords": {
        "metadata": {"totalRows": 2},
        "records": [
            {"Base": {"OpTimeUTC": 1_717_243_200_000_u64}, "DetectionEvent": {"name": "Ransomware"}},
            {"DetectionEvent": {"name": "Exploit"}}
        ]
    }}});
    let server = MockServer::start(vec![
        passwords(),
        login_ok(),
        (200, "<html></html>".to_string()),
        (200, "{}".to_string()),
        (200, records.to_string()),
    ]);

    let mut out = Vec::new();
    harvest_host::run(&input_for(&server), Mode::Stream, input_xml(&server).as_bytes(), &mut out)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.matches("<event stanza=\"cpharmony://soc\">").count(), 2);
    assert_eq!(out.matches("<time>").count(), 1);
    assert!(out.contains("<time>1717243200.000</time>"), "{out}");
    assert!(out.contains("Exploit"));

    let requests = server.requests();
    assert_eq!(requests.len(), 5);
    let login: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(login["email"], json!("soc@acme.com"));
    assert_eq!(login["password"], json!("pw"));
}

#[tokio::test]
async fn rejected_login_emits_nothing() {
    let server = MockServer::start(vec![passwords(), (403, "{}".to_string())]);

    let mut out = Vec::new();
    harvest_host::run(&input_for(&server), Mode::Stream, input_xml(&server).as_bytes(), &mut out)
        .await
        .unwrap();

    assert!(out.is_empty());
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn missing_password_emits_nothing() {
    let server = MockServer::start(vec![(200, json!({"entry": []}).to_string())]);

    let mut out = Vec::new();
    harvest_host::run(&input_for(&server), Mode::Stream, input_xml(&server).as_bytes(), &mut out)
        .await
        .unwrap();

    assert!(out.is_empty());
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn credential_store_failure_aborts() {
    let server = MockServer::start(vec![(401, "{}".to_string())]);

    let mut out = Vec::new();
    let err = harvest_host::run(&input_for(&server), Mode::Stream, input_xml(&server).as_bytes(), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, HostError::Input(_)));
    assert!(out.is_empty());
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn unexpected_query_status_aborts() {
    let server = MockServer::start(vec![
        passwords(),
        login_ok(),
        (200, String::new()),
        (200, String::new()),
        (500, "upstream timeout".to_string()),
    ]);

    let mut out = Vec::new();
    let err = harvest_host::run(&input_for(&server), Mode::Stream, input_xml(&server).as_bytes(), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, HostError::Input(_)));
    assert!(out.is_empty());
}
