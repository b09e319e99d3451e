//! Configuration management for hcloud-dyndns.
//!
//! A config file is parsed into [`ConfigFile`], where every field is optional,
//! and then merged onto [`Config::default`] to produce the effective
//! configuration. Loading never mutates shared defaults.

use crate::error::{DdnsError, Result};
use crate::record::{RecordTarget, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const DEFAULT_TTL: u32 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_IPV4_SOURCE: &str = "https://ipv4.seeip.org";
const DEFAULT_IPV6_SOURCE: &str = "https://ipv6.seeip.org";

/// Zone name mapped to the record names that should carry the address.
pub type Zones = BTreeMap<String, Vec<String>>;

/// Bearer token for the DNS provider API.
///
/// `Debug` is redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Provider API token.
    pub api_token: Credential,
    /// TTL in seconds used when creating records.
    pub record_ttl: u32,
    /// Targets shared by both record types.
    pub zones: Zones,
    /// IPv4 (`A`) record settings.
    pub a: RecordConfig,
    /// IPv6 (`AAAA`) record settings.
    pub aaaa: RecordConfig,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

/// Settings for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordConfig {
    pub enabled: bool,
    /// URL returning the public address as the whole response body.
    pub source: String,
    /// Overrides the global zones for this record type.
    pub zones: Option<Zones>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: Credential::default(),
            record_ttl: DEFAULT_TTL,
            zones: Zones::new(),
            a: RecordConfig {
                enabled: false,
                source: DEFAULT_IPV4_SOURCE.to_string(),
                zones: None,
            },
            aaaa: RecordConfig {
                enabled: false,
                source: DEFAULT_IPV6_SOURCE.to_string(),
                zones: None,
            },
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// On-disk configuration. Missing fields fall back to [`Config::default`].
///
/// Keys are snake_case; the PascalCase keys of the legacy JSON layout are
/// accepted as well. Unknown keys, including unsupported record types such
/// as `CNAME`, are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// API token, or `$VAR` to read it from the environment.
    #[serde(alias = "HetznerApiKey", skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(alias = "RecordTTL", skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<u32>,

    #[serde(alias = "TimeoutSecs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(alias = "Zones", skip_serializing_if = "Option::is_none")]
    pub zones: Option<Zones>,

    #[serde(rename = "A", alias = "a", skip_serializing_if = "Option::is_none")]
    pub a: Option<RecordFile>,

    #[serde(rename = "AAAA", alias = "aaaa", skip_serializing_if = "Option::is_none")]
    pub aaaa: Option<RecordFile>,
}

/// On-disk settings for one record type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordFile {
    #[serde(alias = "Enabled", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(alias = "Source", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(alias = "Zones", skip_serializing_if = "Option::is_none")]
    pub zones: Option<Zones>,
}

impl ConfigFile {
    /// Parse a config file body. TOML when `path` ends in `.toml`, JSON otherwise.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(content)?)
        } else {
            serde_json::from_str(content).map_err(|e| {
                DdnsError::Config(format!("Could not parse {}: {}", path.display(), e))
            })
        }
    }

    /// Generate example configuration.
    pub fn example() -> Self {
        let mut zones = Zones::new();
        zones.insert(
            "example.com".to_string(),
            vec!["home".to_string(), "vpn".to_string()],
        );

        Self {
            api_token: Some("$HCLOUD_TOKEN".to_string()),
            record_ttl: Some(DEFAULT_TTL),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            zones: Some(zones),
            a: Some(RecordFile {
                enabled: Some(true),
                source: Some(DEFAULT_IPV4_SOURCE.to_string()),
                zones: None,
            }),
            aaaa: Some(RecordFile {
                enabled: Some(false),
                source: Some(DEFAULT_IPV6_SOURCE.to_string()),
                zones: None,
            }),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl RecordConfig {
    fn merge(defaults: RecordConfig, file: Option<RecordFile>) -> RecordConfig {
        let file = file.unwrap_or_default();
        RecordConfig {
            enabled: file.enabled.unwrap_or(defaults.enabled),
            source: file.source.unwrap_or(defaults.source),
            zones: file.zones.or(defaults.zones),
        }
    }
}

impl Config {
    /// Overlay `file` onto `defaults`.
    ///
    /// The credential is taken verbatim; `$VAR` references are resolved by
    /// [`Config::resolve_credential`].
    pub fn merge(defaults: Config, file: ConfigFile) -> Config {
        Config {
            api_token: file
                .api_token
                .map(Credential::new)
                .unwrap_or(defaults.api_token),
            record_ttl: file.record_ttl.unwrap_or(defaults.record_ttl),
            zones: file.zones.unwrap_or(defaults.zones),
            a: RecordConfig::merge(defaults.a, file.a),
            aaaa: RecordConfig::merge(defaults.aaaa, file.aaaa),
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }

    /// Load, merge, resolve and validate configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DdnsError::Config(format!("Could not read {}: {}", path.display(), e))
        })?;

        let file = ConfigFile::parse(path, &content)?;
        let config = Self::merge(Self::default(), file).resolve_credential()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace a `$VAR` credential with the value of that environment variable.
    pub fn resolve_credential(mut self) -> Result<Self> {
        if let Some(var_name) = self.api_token.expose().strip_prefix('$') {
            let value = std::env::var(var_name).map_err(|_| {
                DdnsError::Config(format!("Environment variable {} not set", var_name))
            })?;
            self.api_token = Credential::new(value);
        }
        Ok(self)
    }

    /// Settings for a record type.
    pub fn record(&self, record_type: RecordType) -> &RecordConfig {
        match record_type {
            RecordType::A => &self.a,
            RecordType::Aaaa => &self.aaaa,
        }
    }

    /// Record types that are enabled, in processing order.
    pub fn enabled_types(&self) -> Vec<RecordType> {
        RecordType::ALL
            .into_iter()
            .filter(|t| self.record(*t).enabled)
            .collect()
    }

    /// All (zone, name) targets for a record type.
    pub fn targets(&self, record_type: RecordType) -> Vec<RecordTarget> {
        let zones = self.record(record_type).zones.as_ref().unwrap_or(&self.zones);
        zones
            .iter()
            .flat_map(|(zone, names)| names.iter().map(move |name| RecordTarget::new(zone, name)))
            .collect()
    }

    /// Check the configuration before any network activity.
    pub fn validate(&self) -> Result<()> {
        let token = self.api_token.expose();
        if token.trim().is_empty() {
            return Err(DdnsError::Config("API token is empty".to_string()));
        }
        if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DdnsError::Config(
                "API token contains whitespace or control characters".to_string(),
            ));
        }

        if self.record_ttl == 0 {
            return Err(DdnsError::Config("record_ttl must be positive".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(DdnsError::Config("timeout_secs must be positive".to_string()));
        }

        validate_zones(&self.zones)?;

        for record_type in RecordType::ALL {
            let record = self.record(record_type);
            if !record.enabled {
                continue;
            }
            validate_source(record_type, &record.source)?;
            if let Some(zones) = &record.zones {
                validate_zones(zones)?;
            }
            if self.targets(record_type).is_empty() {
                tracing::warn!("{} records are enabled but no zones are configured", record_type);
            }
        }

        Ok(())
    }
}

fn validate_source(record_type: RecordType, source: &str) -> Result<()> {
    let url = reqwest::Url::parse(source).map_err(|e| {
        DdnsError::Config(format!("Invalid {} source URL {}: {}", record_type, source, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(DdnsError::Config(format!(
            "Unsupported scheme {} in {} source URL {}",
            scheme, record_type, source
        ))),
    }
}

fn validate_zones(zones: &Zones) -> Result<()> {
    for (zone, names) in zones {
        if zone.trim().is_empty() {
            return Err(DdnsError::Config("Zone name is empty".to_string()));
        }
        if names.is_empty() {
            return Err(DdnsError::Config(format!(
                "Zone {} has no record names",
                zone
            )));
        }
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(DdnsError::Config(format!(
                "Zone {} has an empty record name",
                zone
            )));
        }
    }
    Ok(())
}
