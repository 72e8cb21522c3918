//! Best-effort prediction persistence

use super::{PredictionRecord, PredictionStore, StoreError, StoreId};
use crate::health::{Component, ComponentStatus, HealthRegistry};
use crate::models::StudentRecord;
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::predictor::StylePrediction;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Writes predictions to an optional store without ever failing the caller.
///
/// A failed write is logged, counted, and marks the `store` health component
/// degraded; the next successful write restores it.
#[derive(Clone)]
pub struct PredictionRecorder {
    store: Option<Arc<dyn PredictionStore>>,
    health: HealthRegistry,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl PredictionRecorder {
    pub fn new(
        store: Option<Arc<dyn PredictionStore>>,
        health: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            store,
            health,
            metrics,
            logger,
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn PredictionStore>> {
        self.store.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Persist one prediction and report the outcome as a value
    pub async fn record(
        &self,
        prediction: &StylePrediction,
        input: StudentRecord,
    ) -> Result<StoreId, StoreError> {
        self.persist(PredictionRecord::new(prediction, input)).await
    }

    /// Persist in a detached task; `None` when persistence is disabled
    pub fn spawn_record(
        &self,
        prediction: &StylePrediction,
        input: StudentRecord,
    ) -> Option<JoinHandle<Result<StoreId, StoreError>>> {
        if !self.is_enabled() {
            return None;
        }
        let record = PredictionRecord::new(prediction, input);
        let recorder = self.clone();
        Some(tokio::spawn(async move { recorder.persist(record).await }))
    }

    async fn persist(&self, record: PredictionRecord) -> Result<StoreId, StoreError> {
        let store = self.store.as_ref().ok_or(StoreError::Disabled)?;
        let prediction_id = record.prediction_id.clone();

        match store.insert(record).await {
            Ok(id) => {
                debug!(store_id = %id, prediction_id = %prediction_id, "Prediction persisted");
                if self.health.status_of(Component::Store).await != Some(ComponentStatus::Healthy) {
                    self.health.set_healthy(Component::Store).await;
                }
                Ok(id)
            }
            Err(e) => {
                self.metrics.inc_persist_failures();
                self.logger.log_persist_failure(&prediction_id, &e.to_string());
                let message = format!("{} store write failed: {}", store.name(), e);
                self.health.set_degraded(Component::Store, message).await;
                Err(e)
            }
        }
    }
}
