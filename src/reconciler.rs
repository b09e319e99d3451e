//! Reconciliation of DNS records with the current public address.

use crate::config::Config;
use crate::error::{DdnsError, Result};
use crate::providers::DnsProvider;
use crate::record::{parse_address, DesiredRecord, RecordTarget, RecordType, RemoteRecord};
use crate::resolver::IpSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

/// What a record needs to match the desired address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// No record set exists yet.
    Create,
    /// The record set holds another value (or none).
    Update { previous: Option<String> },
    /// The record already holds the address.
    UpToDate,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::Update { previous: Some(prev) } => write!(f, "update (was {})", prev),
            Action::Update { previous: None } => f.write_str("update (was empty)"),
            Action::UpToDate => f.write_str("up to date"),
        }
    }
}

/// Decide the corrective action for one record.
///
/// Values are compared as parsed addresses. A remote value that does not
/// parse is treated as stale. With `force`, an equal value is rewritten.
pub fn decide(remote: &RemoteRecord, candidate: IpAddr, force: bool) -> Action {
    match remote {
        RemoteRecord::Absent => Action::Create,
        RemoteRecord::Empty => Action::Update { previous: None },
        RemoteRecord::Present(value) => {
            let current = parse_address(value);
            if current.is_none() {
                tracing::warn!("Remote value {:?} is not an IP address", value);
            }
            if current == Some(candidate) && !force {
                Action::UpToDate
            } else {
                Action::Update {
                    previous: Some(value.clone()),
                }
            }
        }
    }
}

/// Result of reconciling one (zone, name, type) triple.
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub target: RecordTarget,
    pub record_type: RecordType,
    pub address: IpAddr,
    #[serde(flatten)]
    pub action: Action,
    pub timestamp: DateTime<Utc>,
}

/// Outcomes of a whole run, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    /// Number of targets that were created or updated.
    pub fn changed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.action != Action::UpToDate)
            .count()
    }
}

/// Drives resolution, comparison and provider calls for every enabled target.
///
/// Work is strictly sequential and the first error aborts the run.
pub struct Reconciler<'a, S, P> {
    config: &'a Config,
    source: S,
    provider: P,
    force: bool,
}

impl<'a, S: IpSource, P: DnsProvider> Reconciler<'a, S, P> {
    pub fn new(config: &'a Config, source: S, provider: P) -> Self {
        Self {
            config,
            source,
            provider,
            force: false,
        }
    }

    /// Rewrite records even when they already hold the address.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Reconcile every enabled record type and apply the changes.
    pub async fn run(&self) -> Result<RunReport> {
        self.walk(true).await
    }

    /// Compute the actions a run would take without changing anything.
    pub async fn plan(&self) -> Result<RunReport> {
        self.walk(false).await
    }

    async fn walk(&self, apply: bool) -> Result<RunReport> {
        let mut report = RunReport::default();

        for record_type in self.config.enabled_types() {
            let targets = self.config.targets(record_type);
            if targets.is_empty() {
                tracing::debug!("No {} targets configured, skipping", record_type);
                continue;
            }

            let address = self.resolve_candidate(record_type).await?;

            for target in targets {
                let desired = DesiredRecord {
                    target,
                    record_type,
                    address,
                    ttl: self.config.record_ttl,
                };
                let action = self.reconcile(&desired, apply).await?;

                report.outcomes.push(TargetOutcome {
                    target: desired.target,
                    record_type,
                    address,
                    action,
                    timestamp: Utc::now(),
                });
            }
        }

        Ok(report)
    }

    /// Fetch the candidate address for a record type and check its family.
    pub async fn resolve_candidate(&self, record_type: RecordType) -> Result<IpAddr> {
        let source = &self.config.record(record_type).source;
        let candidate = self.source.resolve(source).await?;

        let address = parse_address(&candidate).ok_or_else(|| {
            DdnsError::Validation(format!(
                "{} returned invalid ip address {:?}",
                source, candidate
            ))
        })?;

        if !record_type.matches(&address) {
            return Err(DdnsError::Validation(format!(
                "{} returned {} which cannot be used for {} records",
                source, address, record_type
            )));
        }

        tracing::debug!("Resolved {} address {} from {}", record_type, address, source);
        Ok(address)
    }

    async fn reconcile(&self, desired: &DesiredRecord, apply: bool) -> Result<Action> {
        let remote = self
            .provider
            .read_record(&desired.target, desired.record_type)
            .await?;
        let action = decide(&remote, desired.address, self.force);

        if !apply {
            return Ok(action);
        }

        match &action {
            Action::Create => {
                tracing::info!(
                    "Creating record {} of type {} with {}",
                    desired.target,
                    desired.record_type,
                    desired.address
                );
                self.provider.create_record(desired).await?;
            }
            Action::Update { .. } => {
                tracing::info!(
                    "Updating record {} of type {} with {}",
                    desired.target,
                    desired.record_type,
                    desired.address
                );
                self.provider.update_record(desired).await?;
            }
            Action::UpToDate => {
                tracing::info!(
                    "Skipping update of {} with type {} because address is already up to date",
                    desired.target,
                    desired.record_type
                );
            }
        }

        Ok(action)
    }
}
