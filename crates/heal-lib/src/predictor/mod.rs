//! Cycle prediction engine

mod engine;
mod service;

pub use engine::{
    irregularity_adjustment, predict_next_period, predict_next_period_in, Prediction,
    PredictionBasis, IRREGULAR_ADJUSTMENT_DAYS, VERY_IRREGULAR_ADJUSTMENT_DAYS,
};
pub use service::PredictionService;
