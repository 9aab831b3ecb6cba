//! Heal backend library
//!
//! This crate provides the core functionality for:
//! - Cycle history storage and explicit document mapping
//! - Next-period date prediction
//! - Landing page summaries
//! - Demo data seeding
//! - Health checks and observability

pub mod codec;
pub mod error;
pub mod health;
pub mod landing;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod seed;
pub mod store;

pub use error::{HealError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use landing::LandingService;
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{Prediction, PredictionBasis, PredictionService};
