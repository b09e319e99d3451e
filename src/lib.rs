//! # hcloud-dyndns
//!
//! A dynamic DNS updater for Hetzner Cloud DNS, written in Rust.
//!
//! It looks up the caller's public IPv4 and/or IPv6 address from a plain-text
//! echo service and makes the configured `A`/`AAAA` resource record sets
//! match it, creating them when missing.
//!
//! ## Features
//!
//! - Any number of zones and record names per record type
//! - Address comparison on parsed values, not strings
//! - JSON or TOML configuration with `$ENV` token references
//! - Dry-run status view and a simple daemon mode
//!
//! ## Usage
//!
//! ```bash
//! # Reconcile once (suitable for cron or a systemd timer)
//! hcloud-dyndns --config dyndns.json
//!
//! # Show what would change
//! hcloud-dyndns status
//!
//! # Re-run every five minutes
//! hcloud-dyndns daemon --interval 300
//! ```

pub mod config;
pub mod error;
pub mod providers;
pub mod reconciler;
pub mod record;
pub mod resolver;

#[cfg(test)]
mod scenarios;

pub use config::Config;
pub use error::{DdnsError, Result};
pub use reconciler::Reconciler;
pub use resolver::HttpIpResolver;
