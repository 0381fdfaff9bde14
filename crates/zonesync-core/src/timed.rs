//! Time-bounded provider calls
//!
//! Every call through [`TimedProvider`] is bounded by the configured provider
//! timeout. An elapsed timeout is reported as
//! [`Error::ProviderUnavailable`]; the mutation it carried is never assumed
//! to have happened.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::{ChangeRequest, ChangeStatus, CreatedZone, ProviderZone, RecordSet, ZoneProvider};

/// A [`ZoneProvider`] handle with a per-call deadline
#[derive(Clone)]
pub struct TimedProvider {
    inner: Arc<dyn ZoneProvider>,
    timeout: Duration,
}

impl TimedProvider {
    pub fn new(inner: Arc<dyn ZoneProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(&self, op: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        debug!("{}: {}", self.inner.provider_name(), op);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::unavailable(
                self.inner.provider_name(),
                format!("{} timed out after {:?}", op, self.timeout),
            )),
        }
    }

    pub async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        self.bounded("list_zones", self.inner.list_zones()).await
    }

    pub async fn create_zone(&self, name: &str) -> Result<CreatedZone> {
        self.bounded("create_zone", self.inner.create_zone(name))
            .await
    }

    pub async fn delete_zone(&self, zone_id: &str) -> Result<()> {
        self.bounded("delete_zone", self.inner.delete_zone(zone_id))
            .await
    }

    pub async fn get_zone(&self, zone_id: &str) -> Result<ProviderZone> {
        self.bounded("get_zone", self.inner.get_zone(zone_id)).await
    }

    pub async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        self.bounded("list_record_sets", self.inner.list_record_sets(zone_id))
            .await
    }

    pub async fn submit_change(&self, zone_id: &str, change: &ChangeRequest) -> Result<String> {
        self.bounded("submit_change", self.inner.submit_change(zone_id, change))
            .await
    }

    pub async fn get_change_status(&self, change_id: &str) -> Result<ChangeStatus> {
        self.bounded("get_change_status", self.inner.get_change_status(change_id))
            .await
    }
}

impl std::fmt::Debug for TimedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedProvider")
            .field("provider", &self.inner.provider_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SlowProvider;

    #[async_trait]
    impl ZoneProvider for SlowProvider {
        async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
        async fn create_zone(&self, _name: &str) -> Result<CreatedZone> {
            unimplemented!()
        }
        async fn delete_zone(&self, _zone_id: &str) -> Result<()> {
            Ok(())
        }
        async fn get_zone(&self, zone_id: &str) -> Result<ProviderZone> {
            Ok(ProviderZone {
                id: zone_id.to_string(),
                name: "a.com.".to_string(),
            })
        }
        async fn list_record_sets(&self, _zone_id: &str) -> Result<Vec<RecordSet>> {
            Ok(vec![])
        }
        async fn submit_change(&self, _zone_id: &str, _change: &ChangeRequest) -> Result<String> {
            Err(Error::rejected("slow", "InvalidChangeBatch"))
        }
        async fn get_change_status(&self, _change_id: &str) -> Result<ChangeStatus> {
            Ok(ChangeStatus::Pending)
        }
        fn provider_name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_provider_unavailable() {
        let provider = TimedProvider::new(Arc::new(SlowProvider), Duration::from_secs(5));
        let err = provider.list_zones().await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("list_zones timed out"));
    }

    #[tokio::test]
    async fn test_fast_calls_pass_through() {
        let provider = TimedProvider::new(Arc::new(SlowProvider), Duration::from_secs(5));
        let zone = provider.get_zone("Z1").await.unwrap();
        assert_eq!(zone.id, "Z1");
    }

    #[tokio::test]
    async fn test_provider_errors_are_not_rewritten() {
        let provider = TimedProvider::new(Arc::new(SlowProvider), Duration::from_secs(5));
        let change = ChangeRequest {
            action: crate::traits::ChangeAction::Create,
            name: "www.a.com.".to_string(),
            kind: crate::model::RecordKind::A,
            ttl: 60,
            values: vec!["1.2.3.4".to_string()],
            comment: "test".to_string(),
        };
        let err = provider.submit_change("Z1", &change).await.unwrap_err();
        assert!(matches!(err, Error::ProviderRejected { .. }));
    }
}
