//! Landing page summary

use crate::error::Result;
use crate::models::UserLanding;
use crate::observability::{outcomes, ServiceMetrics, StructuredLogger};
use crate::store::UserStore;
use std::sync::Arc;

/// Builds the landing view from a user's stored profile and summary
#[derive(Clone)]
pub struct LandingService {
    users: Arc<dyn UserStore>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl LandingService {
    pub fn new(users: Arc<dyn UserStore>, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        Self {
            users,
            metrics,
            logger,
        }
    }

    /// Landing data for `user_id`, `Ok(None)` when the user does not exist
    pub async fn landing(&self, user_id: &str) -> Result<Option<UserLanding>> {
        let user = match self.users.user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                self.metrics.inc_landing_requests(outcomes::ERROR);
                return Err(e);
            }
        };

        let outcome = if user.is_some() {
            outcomes::SERVED
        } else {
            outcomes::NOT_FOUND
        };
        self.metrics.inc_landing_requests(outcome);
        self.logger.log_landing(user_id, user.is_some());

        Ok(user.map(UserLanding::from))
    }
}
