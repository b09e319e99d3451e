//! End-to-end runs against mocked IP source and provider APIs.

use crate::config::{Config, Credential, Zones};
use crate::error::DdnsError;
use crate::providers::HcloudClient;
use crate::reconciler::{Action, Reconciler};
use crate::resolver::HttpIpResolver;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn config(server: &MockServer, a: bool, aaaa: bool) -> Config {
    let mut zones = Zones::new();
    zones.insert("example.com".to_string(), vec!["home".to_string()]);

    let mut config = Config {
        api_token: Credential::new("test-token"),
        record_ttl: 600,
        zones,
        ..Config::default()
    };
    config.a.enabled = a;
    config.a.source = format!("{}/ip4", server.uri());
    config.aaaa.enabled = aaaa;
    config.aaaa.source = format!("{}/ip6", server.uri());
    config
}

async fn serve_ip(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn serve_rrset(server: &MockServer, record_type: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/zones/example.com/rrsets/home/{}", record_type)))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn expect_create(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/zones/example.com/rrsets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(times)
        .mount(server)
        .await;
}

async fn expect_set_records(server: &MockServer, record_type: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/v1/zones/example.com/rrsets/home/{}/actions/set_records",
            record_type
        )))
        .respond_with(ResponseTemplate::new(201))
        .expect(times)
        .mount(server)
        .await;
}

fn rrset_with(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "rrset": {"name": "home", "type": "A", "ttl": 600, "records": [{"value": value}]}
    }))
}

#[tokio::test]
async fn test_aaaa_only_creates_missing_record() {
    let server = MockServer::start().await;
    let config = config(&server, false, true);

    serve_ip(&server, "/ip6", "2001:db8::1\n").await;
    serve_rrset(&server, "AAAA", ResponseTemplate::new(404)).await;
    Mock::given(method("POST"))
        .and(path("/v1/zones/example.com/rrsets"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({
            "name": "home",
            "type": "AAAA",
            "ttl": 600,
            "records": [{"value": "2001:db8::1"}]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    expect_set_records(&server, "AAAA", 0).await;

    let resolver = HttpIpResolver::new(TIMEOUT).unwrap();
    let client =
        HcloudClient::with_base_url(&config.api_token, TIMEOUT, server.uri()).unwrap();
    let report = Reconciler::new(&config, resolver, client).run().await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].action, Action::Create);
}

#[tokio::test]
async fn test_stale_a_record_is_updated() {
    let server = MockServer::start().await;
    let config = config(&server, true, false);

    serve_ip(&server, "/ip4", "203.0.113.5").await;
    serve_rrset(&server, "A", rrset_with("203.0.113.9")).await;
    Mock::given(method("POST"))
        .and(path(
            "/v1/zones/example.com/rrsets/home/A/actions/set_records",
        ))
        .and(body_json(json!({"records": [{"value": "203.0.113.5"}]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    expect_create(&server, 0).await;

    let resolver = HttpIpResolver::new(TIMEOUT).unwrap();
    let client =
        HcloudClient::with_base_url(&config.api_token, TIMEOUT, server.uri()).unwrap();
    let report = Reconciler::new(&config, resolver, client).run().await.unwrap();

    assert_eq!(
        report.outcomes[0].action,
        Action::Update {
            previous: Some("203.0.113.9".to_string())
        }
    );
}

#[tokio::test]
async fn test_current_a_record_is_left_alone() {
    let server = MockServer::start().await;
    let config = config(&server, true, false);

    serve_ip(&server, "/ip4", "203.0.113.5").await;
    serve_rrset(&server, "A", rrset_with("203.0.113.5")).await;
    expect_create(&server, 0).await;
    expect_set_records(&server, "A", 0).await;

    let resolver = HttpIpResolver::new(TIMEOUT).unwrap();
    let client =
        HcloudClient::with_base_url(&config.api_token, TIMEOUT, server.uri()).unwrap();
    let report = Reconciler::new(&config, resolver, client).run().await.unwrap();

    assert_eq!(report.outcomes[0].action, Action::UpToDate);
    assert_eq!(report.changed(), 0);
}

#[tokio::test]
async fn test_provider_failure_aborts_run() {
    let server = MockServer::start().await;
    let config = config(&server, true, false);

    serve_ip(&server, "/ip4", "203.0.113.5").await;
    serve_rrset(
        &server,
        "A",
        ResponseTemplate::new(500).set_body_string("internal server error"),
    )
    .await;
    expect_create(&server, 0).await;
    expect_set_records(&server, "A", 0).await;

    let resolver = HttpIpResolver::new(TIMEOUT).unwrap();
    let client =
        HcloudClient::with_base_url(&config.api_token, TIMEOUT, server.uri()).unwrap();
    let result = Reconciler::new(&config, resolver, client).run().await;

    match result {
        Err(DdnsError::Provider { status, body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal server error");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_family_source_makes_no_provider_calls() {
    let server = MockServer::start().await;
    let config = config(&server, true, false);

    serve_ip(&server, "/ip4", "2001:db8::1").await;
    Mock::given(path("/v1/zones/example.com/rrsets/home/A"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;
    expect_create(&server, 0).await;

    let resolver = HttpIpResolver::new(TIMEOUT).unwrap();
    let client =
        HcloudClient::with_base_url(&config.api_token, TIMEOUT, server.uri()).unwrap();
    let result = Reconciler::new(&config, resolver, client).run().await;

    assert!(matches!(result, Err(DdnsError::Validation(_))));
}
