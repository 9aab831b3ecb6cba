//! Prediction service
//!
//! Fetches a screening's cycle history through the gateway, runs the
//! engine and records the outcome. Failures that are not the caller's
//! fault degrade the `predictor` health component until the next success.

use super::engine::{predict_next_period, Prediction, PredictionBasis};
use crate::error::Result;
use crate::health::{components, HealthRegistry};
use crate::observability::{outcomes, ServiceMetrics, StructuredLogger};
use crate::store::HistoryStore;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct PredictionService {
    history: Arc<dyn HistoryStore>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl PredictionService {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            history,
            metrics,
            logger,
            health: None,
        }
    }

    /// Report service failures to `registry`
    pub fn with_health(mut self, registry: HealthRegistry) -> Self {
        self.health = Some(registry);
        self
    }

    /// Predict the next period for a screening, relative to `today`.
    ///
    /// `Ok(None)` means the screening has no cycle history; a missing
    /// screening is an error.
    pub async fn predict_next_period(
        &self,
        user_id: &str,
        screening_id: &str,
        today: NaiveDate,
    ) -> Result<Option<Prediction>> {
        let started = Instant::now();

        let history = match self.history.cycle_history(user_id, screening_id).await {
            Ok(history) => history,
            Err(e) => {
                self.metrics
                    .observe_prediction_latency(started.elapsed().as_secs_f64());
                let outcome = if e.is_not_found() {
                    outcomes::NOT_FOUND
                } else {
                    outcomes::ERROR
                };
                self.metrics.inc_predictions(outcome);
                self.logger
                    .log_prediction_failed(user_id, screening_id, &e.to_string());
                if !e.is_request_error() {
                    if let Some(health) = &self.health {
                        health
                            .set_degraded(components::PREDICTOR, format!("Prediction failed: {}", e))
                            .await;
                    }
                }
                return Err(e);
            }
        };
        if let Some(health) = &self.health {
            health.set_healthy(components::PREDICTOR).await;
        }

        let prediction = predict_next_period(history.as_ref(), today);
        self.metrics
            .observe_prediction_latency(started.elapsed().as_secs_f64());

        match &prediction {
            Some(p) => {
                let outcome = match p.basis {
                    PredictionBasis::Anchored => outcomes::ANCHORED,
                    PredictionBasis::Fallback => outcomes::FALLBACK,
                };
                self.metrics.inc_predictions(outcome);
                self.logger.log_prediction(
                    user_id,
                    screening_id,
                    &p.date.to_string(),
                    p.basis.as_str(),
                    p.cycle_length_days,
                    p.adjustment_days,
                );
            }
            None => {
                self.metrics.inc_predictions(outcomes::UNAVAILABLE);
                self.logger.log_prediction_unavailable(user_id, screening_id);
            }
        }

        Ok(prediction)
    }
}
