//! Analytical queries over the record store
//!
//! Every query snapshots the store and recomputes its result from scratch;
//! nothing derived is cached. Querying an empty store is an error rather
//! than an empty success.

pub mod aggregate;
pub mod temporal;

use tracing::debug;

use crate::error::{InsightsError, Result};
use crate::models::{CountryTally, DailyLoginCount, TeamInsight, UserRecord};
use crate::store::RecordStore;

pub use aggregate::{is_superuser, DEFAULT_TOP_COUNTRIES, SUPERUSER_MIN_SCORE};

/// Query front-end bound to a store
#[derive(Clone)]
pub struct Analytics {
    store: RecordStore,
    top_countries_limit: usize,
}

impl Analytics {
    pub fn new(store: RecordStore, top_countries_limit: usize) -> Self {
        Self {
            store,
            top_countries_limit,
        }
    }

    async fn records(&self) -> Result<Vec<UserRecord>> {
        let records = self.store.snapshot().await;
        if records.is_empty() {
            return Err(InsightsError::EmptyStore);
        }
        Ok(records)
    }

    pub async fn superusers(&self) -> Result<Vec<UserRecord>> {
        let records = self.records().await?;
        let found = aggregate::superusers(&records);
        debug!(scanned = records.len(), found = found.len(), "superusers");
        Ok(found)
    }

    /// Top countries by superuser count; `limit` falls back to the configured default
    pub async fn top_countries(&self, limit: Option<usize>) -> Result<Vec<CountryTally>> {
        let records = self.records().await?;
        let limit = limit.unwrap_or(self.top_countries_limit);
        Ok(aggregate::top_countries(&records, limit))
    }

    pub async fn team_insights(&self) -> Result<Vec<TeamInsight>> {
        let records = self.records().await?;
        let teams = aggregate::team_insights(&records);
        debug!(teams = teams.len(), "team insights");
        Ok(teams)
    }

    pub async fn active_users_per_day(&self) -> Result<Vec<DailyLoginCount>> {
        let records = self.records().await?;
        Ok(temporal::active_users_per_day(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::record;

    #[tokio::test]
    async fn test_queries_on_empty_store_fail() {
        let analytics = Analytics::new(RecordStore::new(), DEFAULT_TOP_COUNTRIES);

        assert!(matches!(analytics.superusers().await, Err(InsightsError::EmptyStore)));
        assert!(matches!(analytics.top_countries(None).await, Err(InsightsError::EmptyStore)));
        assert!(matches!(analytics.team_insights().await, Err(InsightsError::EmptyStore)));
        assert!(matches!(
            analytics.active_users_per_day().await,
            Err(InsightsError::EmptyStore)
        ));
    }

    #[tokio::test]
    async fn test_top_countries_uses_configured_limit() {
        let store = RecordStore::new();
        for (i, country) in ["BR", "US", "PT"].iter().enumerate() {
            let mut r = record(i as u128 + 1, "u");
            r.score = 990;
            r.country = country.to_string();
            store.put(r).await;
        }

        let analytics = Analytics::new(store, 2);
        assert_eq!(analytics.top_countries(None).await.unwrap().len(), 2);
        assert_eq!(analytics.top_countries(Some(10)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_non_empty_store_without_matches_is_ok() {
        let store = RecordStore::new();
        store.put(record(1, "low score")).await;

        let analytics = Analytics::new(store, DEFAULT_TOP_COUNTRIES);
        assert!(analytics.superusers().await.unwrap().is_empty());
        assert_eq!(analytics.team_insights().await.unwrap().len(), 1);
    }
}
