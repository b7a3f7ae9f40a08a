//! In-memory local repository implementation.
//!
//! Stores all monitoring data in `HashMap`/`Vec` structures behind a
//! process-local lock, giving fast, deterministic, isolated execution for
//! unit tests and local development. Poll vectors are kept sorted by
//! timestamp so range reads come back ascending without per-query sorts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::db::repository::{
    ErrorContext, IngestRepository, RepositoryError, RepositoryResult, StoreDataRepository,
};
use crate::models::{BusinessHour, Poll, StoreTimezone};

/// In-memory local repository.
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    polls: HashMap<String, Vec<Poll>>,
    business_hours: HashMap<String, Vec<BusinessHour>>,
    timezones: HashMap<String, String>,
    source_checksums: HashMap<String, String>,

    // Test hooks
    failing_stores: HashSet<String>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            polls: HashMap::new(),
            business_hours: HashMap::new(),
            timezones: HashMap::new(),
            source_checksums: HashMap::new(),
            failing_stores: HashSet::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().unwrap().is_healthy = healthy;
    }

    /// Make every read for `store_id` fail, for testing per-store error
    /// recovery in the report orchestrator.
    pub fn fail_store(&self, store_id: impl Into<String>) {
        self.data.write().unwrap().failing_stores.insert(store_id.into());
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap();
        let healthy = data.is_healthy;
        *data = LocalData {
            is_healthy: healthy,
            ..Default::default()
        };
    }

    /// Number of polls stored across all stores.
    pub fn poll_count(&self) -> usize {
        self.data.read().unwrap().polls.values().map(Vec::len).sum()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().unwrap().is_healthy {
            return Err(RepositoryError::connection("repository is not healthy"));
        }
        Ok(())
    }

    fn check_store(&self, store_id: &str, operation: &str) -> RepositoryResult<()> {
        if self.data.read().unwrap().failing_stores.contains(store_id) {
            return Err(RepositoryError::query_with_context(
                "simulated store failure",
                ErrorContext::new(operation).with_store_id(store_id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreDataRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().unwrap().is_healthy)
    }

    async fn store_ids(&self) -> RepositoryResult<Vec<String>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let ids: HashSet<&String> = data
            .polls
            .keys()
            .chain(data.business_hours.keys())
            .chain(data.timezones.keys())
            .collect();
        Ok(ids.into_iter().cloned().collect())
    }

    async fn latest_poll_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(data
            .polls
            .values()
            .filter_map(|polls| polls.last())
            .map(|poll| poll.timestamp_utc)
            .max())
    }

    async fn polls_for_store(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Poll>> {
        self.check_health()?;
        self.check_store(store_id, "polls_for_store")?;
        let data = self.data.read().unwrap();
        Ok(data
            .polls
            .get(store_id)
            .map(|polls| {
                polls
                    .iter()
                    .filter(|p| p.timestamp_utc >= from && p.timestamp_utc <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn business_hours(&self, store_id: &str) -> RepositoryResult<Vec<BusinessHour>> {
        self.check_health()?;
        self.check_store(store_id, "business_hours")?;
        let data = self.data.read().unwrap();
        Ok(data
            .business_hours
            .get(store_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn timezone(&self, store_id: &str) -> RepositoryResult<Option<String>> {
        self.check_health()?;
        self.check_store(store_id, "timezone")?;
        Ok(self.data.read().unwrap().timezones.get(store_id).cloned())
    }
}

#[async_trait]
impl IngestRepository for LocalRepository {
    async fn store_polls(&self, polls: Vec<Poll>, replace: bool) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if replace {
            data.polls.clear();
        }
        let count = polls.len();
        let mut touched: HashSet<String> = HashSet::new();
        for poll in polls {
            touched.insert(poll.store_id.clone());
            data.polls.entry(poll.store_id.clone()).or_default().push(poll);
        }
        for store_id in touched {
            if let Some(store_polls) = data.polls.get_mut(&store_id) {
                store_polls.sort_by_key(|p| p.timestamp_utc);
            }
        }
        Ok(count)
    }

    async fn store_business_hours(
        &self,
        rows: Vec<BusinessHour>,
        replace: bool,
    ) -> RepositoryResult<usize> {
        self.check_health()?;
        for row in &rows {
            if row.day_of_week > 6 {
                return Err(RepositoryError::validation_with_context(
                    format!("day_of_week {} out of range 0..=6", row.day_of_week),
                    ErrorContext::new("store_business_hours")
                        .with_entity("business_hour")
                        .with_store_id(&row.store_id),
                ));
            }
        }
        let mut data = self.data.write().unwrap();
        if replace {
            data.business_hours.clear();
        }
        let count = rows.len();
        for row in rows {
            data.business_hours
                .entry(row.store_id.clone())
                .or_default()
                .push(row);
        }
        Ok(count)
    }

    async fn store_timezones(
        &self,
        rows: Vec<StoreTimezone>,
        replace: bool,
    ) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if replace {
            data.timezones.clear();
        }
        let count = rows.len();
        for row in rows {
            data.timezones.insert(row.store_id, row.timezone);
        }
        Ok(count)
    }

    async fn record_source_checksum(
        &self,
        source: &str,
        checksum: &str,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .unwrap()
            .source_checksums
            .insert(source.to_string(), checksum.to_string());
        Ok(())
    }

    async fn source_checksum(&self, source: &str) -> RepositoryResult<Option<String>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .unwrap()
            .source_checksums
            .get(source)
            .cloned())
    }
}
