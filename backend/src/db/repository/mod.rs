//! Repository traits for store monitoring data.
//!
//! The report engine reads through [`StoreDataRepository`]; the ingest layer
//! writes through [`IngestRepository`]. Implementations must be `Send + Sync`
//! and hand out their own sessions internally: every aggregation worker
//! clones the repository handle and must not share a session with another
//! worker.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{BusinessHour, Poll};

/// Read-side repository operations used by the report engine.
#[async_trait]
pub trait StoreDataRepository: Send + Sync {
    /// Check the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Distinct store ids appearing in polls, schedules, or timezones.
    /// Order is unspecified; callers sort.
    async fn store_ids(&self) -> RepositoryResult<Vec<String>>;

    /// The most recent poll timestamp across all stores, if any polls exist.
    /// This is the dataset horizon the report's `now` is sampled from.
    async fn latest_poll_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>>;

    /// Polls for one store with `from <= timestamp_utc <= to`, ascending.
    async fn polls_for_store(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Poll>>;

    /// All weekly schedule rows for one store. Empty means open 24/7.
    async fn business_hours(&self, store_id: &str) -> RepositoryResult<Vec<BusinessHour>>;

    /// The store's IANA timezone string, if one was ingested.
    async fn timezone(&self, store_id: &str) -> RepositoryResult<Option<String>>;
}

/// Write-side repository operations used by the CSV ingest layer.
#[async_trait]
pub trait IngestRepository: Send + Sync {
    /// Store polls, truncating existing rows first when `replace` is set.
    /// Returns the number of rows stored.
    async fn store_polls(&self, polls: Vec<Poll>, replace: bool) -> RepositoryResult<usize>;

    /// Store schedule rows, truncating first when `replace` is set.
    async fn store_business_hours(
        &self,
        rows: Vec<BusinessHour>,
        replace: bool,
    ) -> RepositoryResult<usize>;

    /// Store timezone assignments, truncating first when `replace` is set.
    async fn store_timezones(
        &self,
        rows: Vec<crate::models::StoreTimezone>,
        replace: bool,
    ) -> RepositoryResult<usize>;

    /// Record the checksum of an ingested source file.
    async fn record_source_checksum(
        &self,
        source: &str,
        checksum: &str,
    ) -> RepositoryResult<()>;

    /// The checksum recorded for a source file at its last ingest.
    async fn source_checksum(&self, source: &str) -> RepositoryResult<Option<String>>;
}

/// Combined repository interface: everything the application needs.
pub trait FullRepository: StoreDataRepository + IngestRepository {}

impl<T: StoreDataRepository + IngestRepository> FullRepository for T {}
