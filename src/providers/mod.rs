//! DNS provider clients.

mod hcloud;


pub use hcloud::HcloudClient;

use crate::error::Result;
use crate::record::{DesiredRecord, RecordTarget, RecordType, RemoteRecord};
use async_trait::async_trait;

/// Read and write access to single-value address record sets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Get the current state of a record set.
    async fn read_record(
        &self,
        target: &RecordTarget,
        record_type: RecordType,
    ) -> Result<RemoteRecord>;

    /// Create a record set holding the desired address and TTL.
    async fn create_record(&self, desired: &DesiredRecord) -> Result<()>;

    /// Replace the values of an existing record set, keeping its TTL.
    async fn update_record(&self, desired: &DesiredRecord) -> Result<()>;
}
