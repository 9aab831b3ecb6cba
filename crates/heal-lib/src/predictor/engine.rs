//! Next-period date calculation
//!
//! Anchors on the most recent recorded period start and adds the average
//! cycle length plus a fixed buffer for irregular cycles. A history with no
//! recorded periods falls back to the reference date as its anchor.

use crate::models::{CycleHistory, CycleRegularity};
use chrono::{Duration, Local, NaiveDate, TimeZone};
use serde::Serialize;

/// Days added for an `irregular` cycle
pub const IRREGULAR_ADJUSTMENT_DAYS: i32 = 2;

/// Days added for a `very_irregular` cycle
pub const VERY_IRREGULAR_ADJUSTMENT_DAYS: i32 = 5;

/// What a prediction was anchored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionBasis {
    /// The most recent recorded period start
    Anchored,
    /// The reference date, because no periods were recorded
    Fallback,
}

impl PredictionBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionBasis::Anchored => "anchored",
            PredictionBasis::Fallback => "fallback",
        }
    }
}

/// A computed next-period date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub date: NaiveDate,
    pub basis: PredictionBasis,
    pub cycle_length_days: i32,
    pub adjustment_days: i32,
}

impl Prediction {
    /// Fallback predictions have no historical anchor
    pub fn is_low_confidence(&self) -> bool {
        self.basis == PredictionBasis::Fallback
    }
}

pub fn irregularity_adjustment(regularity: CycleRegularity) -> i32 {
    match regularity {
        CycleRegularity::Regular => 0,
        CycleRegularity::Irregular => IRREGULAR_ADJUSTMENT_DAYS,
        CycleRegularity::VeryIrregular => VERY_IRREGULAR_ADJUSTMENT_DAYS,
    }
}

/// Predict the next period start, reading period instants in local time.
///
/// Returns `None` only when there is no history at all.
pub fn predict_next_period(history: Option<&CycleHistory>, today: NaiveDate) -> Option<Prediction> {
    predict_next_period_in(history, today, &Local)
}

/// Predict the next period start, reading period instants in `tz`
pub fn predict_next_period_in<Tz: TimeZone>(
    history: Option<&CycleHistory>,
    today: NaiveDate,
    tz: &Tz,
) -> Option<Prediction> {
    let history = history?;
    let cycle_length_days = history.cycle_length_days();

    let Some(latest) = history.latest_period() else {
        return Some(Prediction {
            date: add_days(today, i64::from(cycle_length_days)),
            basis: PredictionBasis::Fallback,
            cycle_length_days,
            adjustment_days: 0,
        });
    };

    let anchor = latest.with_timezone(tz).date_naive();
    let adjustment_days = irregularity_adjustment(history.cycle_regularity);
    let offset = i64::from(cycle_length_days) + i64::from(adjustment_days);

    Some(Prediction {
        date: add_days(anchor, offset),
        basis: PredictionBasis::Anchored,
        cycle_length_days,
        adjustment_days,
    })
}

/// Shift a date, saturating at the representable calendar bounds
fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}
