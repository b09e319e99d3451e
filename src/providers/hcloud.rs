//! Hetzner Cloud DNS provider (resource record sets API).

use super::DnsProvider;
use crate::config::Credential;
use crate::error::{DdnsError, Result};
use crate::record::{DesiredRecord, RecordTarget, RecordType, RemoteRecord};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.hetzner.cloud";

/// Hetzner Cloud DNS client.
///
/// Borrows the API token for the lifetime of the client.
pub struct HcloudClient<'a> {
    client: reqwest::Client,
    api_token: &'a Credential,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RrSetResponse {
    rrset: RrSet,
}

#[derive(Debug, Serialize, Deserialize)]
struct RrSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(default)]
    records: Vec<RrSetRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RrSetRecord {
    value: String,
}

impl<'a> HcloudClient<'a> {
    /// Create a new Hetzner Cloud client.
    pub fn new(api_token: &'a Credential, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_token, timeout, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        api_token: &'a Credential,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn rrset_url(&self, target: &RecordTarget, record_type: RecordType) -> String {
        format!(
            "{}/v1/zones/{}/rrsets/{}/{}",
            self.base_url, target.zone, target.name, record_type
        )
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_token.expose())
    }

    /// Send an authenticated request and insist on `expected`.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: String,
        expected: &[StatusCode],
    ) -> Result<reqwest::Response> {
        let response = request
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if expected.contains(&status) {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(DdnsError::Provider {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

fn single_value(value: String) -> Vec<RrSetRecord> {
    vec![RrSetRecord { value }]
}

#[async_trait]
impl<'a> DnsProvider for HcloudClient<'a> {
    async fn read_record(
        &self,
        target: &RecordTarget,
        record_type: RecordType,
    ) -> Result<RemoteRecord> {
        let url = self.rrset_url(target, record_type);
        tracing::debug!("GET {}", url);

        let response = self
            .send(
                self.client.get(&url).header(CONTENT_TYPE, "application/json"),
                format!("read rrset {}/{}", target, record_type),
                &[StatusCode::OK, StatusCode::NOT_FOUND],
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RemoteRecord::Absent);
        }

        let body = response.text().await?;
        let parsed: RrSetResponse = serde_json::from_str(&body)?;
        let mut records = parsed.rrset.records.into_iter();

        let Some(first) = records.next() else {
            return Ok(RemoteRecord::Empty);
        };

        let extra = records.count();
        if extra > 0 {
            tracing::warn!(
                "{} {} holds {} additional values, only {} is considered",
                target,
                record_type,
                extra,
                first.value
            );
        }

        Ok(RemoteRecord::Present(first.value))
    }

    async fn create_record(&self, desired: &DesiredRecord) -> Result<()> {
        let url = format!("{}/v1/zones/{}/rrsets", self.base_url, desired.target.zone);
        tracing::debug!("POST {}", url);

        let payload = RrSet {
            name: Some(desired.target.name.clone()),
            record_type: Some(desired.record_type.to_string()),
            ttl: Some(desired.ttl),
            records: single_value(desired.value()),
        };

        self.send(
            self.client.post(&url).json(&payload),
            format!("create rrset {}/{}", desired.target, desired.record_type),
            &[StatusCode::CREATED],
        )
        .await?;

        Ok(())
    }

    async fn update_record(&self, desired: &DesiredRecord) -> Result<()> {
        let url = format!(
            "{}/actions/set_records",
            self.rrset_url(&desired.target, desired.record_type)
        );
        tracing::debug!("POST {}", url);

        let payload = RrSet {
            name: None,
            record_type: None,
            ttl: None,
            records: single_value(desired.value()),
        };

        self.send(
            self.client.post(&url).json(&payload),
            format!("set records of {}/{}", desired.target, desired.record_type),
            &[StatusCode::CREATED],
        )
        .await?;

        Ok(())
    }
}
