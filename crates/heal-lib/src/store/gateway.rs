//! Read gateway over the document store
//!
//! Fetches and decodes the records the services need: a screening's cycle
//! history keyed by `(user_id, screening_id)` and a user's landing data.

use super::{DocumentPath, DocumentStore};
use crate::codec::{decode_cycle_history, DocumentCodec};
use crate::error::{HealError, Result};
use crate::models::{CycleHistory, User};
use crate::observability::ServiceMetrics;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Source of cycle history records
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Fetch the cycle history captured by a screening.
    ///
    /// Fails with `ScreeningNotFound` when the screening does not exist and
    /// returns `Ok(None)` when it exists without a `cycle_history` payload.
    async fn cycle_history(
        &self,
        user_id: &str,
        screening_id: &str,
    ) -> Result<Option<CycleHistory>>;
}

/// Source of user documents
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user; `Ok(None)` when no such user exists
    async fn user(&self, user_id: &str) -> Result<Option<User>>;
}

/// Gateway backed by a `DocumentStore`
#[derive(Clone)]
pub struct StoreGateway {
    store: Arc<dyn DocumentStore>,
    metrics: ServiceMetrics,
}

impl StoreGateway {
    pub fn new(store: Arc<dyn DocumentStore>, metrics: ServiceMetrics) -> Self {
        Self { store, metrics }
    }

    async fn timed_get(&self, path: &DocumentPath) -> Result<Option<super::Document>> {
        let started = Instant::now();
        let result = self.store.get(path).await;
        self.metrics
            .observe_store_read_latency(started.elapsed().as_secs_f64());
        result
    }
}

#[async_trait]
impl HistoryStore for StoreGateway {
    /// Only the `cycle_history` field is decoded; the rest of the screening
    /// does not affect predictions.
    async fn cycle_history(
        &self,
        user_id: &str,
        screening_id: &str,
    ) -> Result<Option<CycleHistory>> {
        let path = DocumentPath::screening(user_id, screening_id)?;
        let doc = self
            .timed_get(&path)
            .await?
            .ok_or_else(|| HealError::ScreeningNotFound {
                user_id: user_id.to_string(),
                screening_id: screening_id.to_string(),
            })?;

        let history = match doc.get("cycle_history").filter(|v| !v.is_null()) {
            Some(value) => Some(decode_cycle_history(&path, value)?),
            None => None,
        };
        debug!(
            user_id = %user_id,
            screening_id = %screening_id,
            has_history = history.is_some(),
            "Fetched screening history"
        );
        Ok(history)
    }
}

#[async_trait]
impl UserStore for StoreGateway {
    async fn user(&self, user_id: &str) -> Result<Option<User>> {
        let path = DocumentPath::user(user_id)?;
        match self.timed_get(&path).await? {
            Some(doc) => User::decode(&path, &doc).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CycleRegularity, Screening};
    use crate::store::{Document, MemoryStore};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn gateway_with(path: DocumentPath, document: Document) -> StoreGateway {
        let store = MemoryStore::new("test");
        store.set(&path, document).await.unwrap();
        StoreGateway::new(Arc::new(store), ServiceMetrics::new())
    }

    #[tokio::test]
    async fn test_missing_screening_is_not_found() {
        let gateway = StoreGateway::new(Arc::new(MemoryStore::new("test")), ServiceMetrics::new());
        let err = gateway
            .cycle_history("usr_100", "scr_missing")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Screening not found");
    }

    #[tokio::test]
    async fn test_screening_without_history_is_none() {
        let path = DocumentPath::screening("usr_100", "scr_001").unwrap();
        let gateway = gateway_with(path, doc(json!({ "version": "v1.0" }))).await;

        let history = gateway.cycle_history("usr_100", "scr_001").await.unwrap();
        assert!(history.is_none());
    }

    #[tokio::test]
    async fn test_screening_with_history() {
        let path = DocumentPath::screening("usr_100", "scr_001").unwrap();
        let gateway = gateway_with(
            path,
            doc(json!({
                "cycle_history": {
                    "recent_periods": ["2026-02-01T10:00:00Z"],
                    "avg_cycle_length": 30,
                    "cycle_regularity": "irregular"
                }
            })),
        )
        .await;

        let history = gateway
            .cycle_history("usr_100", "scr_001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(history.avg_cycle_length, Some(30));
        assert_eq!(history.cycle_regularity, CycleRegularity::Irregular);
    }

    #[tokio::test]
    async fn test_invalid_ids_rejected() {
        let gateway = StoreGateway::new(Arc::new(MemoryStore::new("test")), ServiceMetrics::new());
        let err = gateway.cycle_history("", "scr_001").await.unwrap_err();
        assert!(matches!(err, HealError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_user_lookup() {
        let path = DocumentPath::user("usr_100").unwrap();
        let gateway = gateway_with(path, doc(json!({ "profile": { "name": "Priya" } }))).await;

        let user = gateway.user("usr_100").await.unwrap().unwrap();
        assert_eq!(user.profile.unwrap().name.as_deref(), Some("Priya"));
        assert!(gateway.user("usr_999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_ignores_unrelated_field_types() {
        let path = DocumentPath::screening("usr_100", "scr_001").unwrap();
        let gateway = gateway_with(
            path,
            doc(json!({
                "version": 1,
                "source": ["app"],
                "started_at": "not a timestamp",
                "cycle_history": {
                    "recent_periods": ["2026-02-01T10:00:00Z"],
                    "avg_cycle_length": 30,
                    "cycle_regularity": "irregular"
                }
            })),
        )
        .await;

        let history = gateway
            .cycle_history("usr_100", "scr_001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(history.avg_cycle_length, Some(30));
        assert_eq!(history.recent_periods.len(), 1);

        // Decoding the whole screening stays strict
        let path = DocumentPath::screening("usr_100", "scr_001").unwrap();
        let stored = gateway.store.get(&path).await.unwrap().unwrap();
        let err = Screening::decode(&path, &stored).unwrap_err();
        assert!(matches!(err, HealError::MalformedDocument { .. }));
    }

    #[tokio::test]
    async fn test_malformed_history_payload_is_error() {
        let path = DocumentPath::screening("usr_100", "scr_001").unwrap();
        let gateway = gateway_with(path, doc(json!({ "cycle_history": "soon" }))).await;

        let err = gateway.cycle_history("usr_100", "scr_001").await.unwrap_err();
        assert!(matches!(err, HealError::MalformedDocument { .. }));
    }

    #[tokio::test]
    async fn test_null_history_is_none() {
        let path = DocumentPath::screening("usr_100", "scr_001").unwrap();
        let gateway = gateway_with(path, doc(json!({ "cycle_history": null }))).await;

        assert!(gateway
            .cycle_history("usr_100", "scr_001")
            .await
            .unwrap()
            .is_none());
    }
}
