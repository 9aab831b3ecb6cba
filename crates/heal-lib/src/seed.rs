//! Demo data seeding
//!
//! Writes five demo users with their log sub-collections and one screening
//! each. Users that already exist are left untouched, and all new documents
//! are committed in a single batch. The random generator and the batch live
//! only for the duration of one `seed_demo_data` call.

use crate::error::Result;
use crate::models::{
    AssessmentLog, CycleHistory, CycleRegularity, CycleSummary, LandingPageSummary, PadLog,
    PadUsage, PeriodLog, Risk, Screening, User, UserPreferences, UserProfile, YogaAttendanceLog,
};
use crate::store::{collections, DocumentPath, DocumentStore, WriteBatch};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Map;
use tracing::debug;

pub const DEMO_USER_NAMES: [&str; 5] = ["Priya", "Ananya", "Sara", "Meera", "Ishita"];
pub const DEMO_SCREENING_ID: &str = "scr_001";

const RISK_LEVELS: [&str; 3] = ["low", "medium", "high"];
const PAD_STATUSES: [&str; 3] = ["transitioning", "stable", "normal"];
const REGULARITIES: [CycleRegularity; 3] = [
    CycleRegularity::Regular,
    CycleRegularity::Irregular,
    CycleRegularity::VeryIrregular,
];

/// Result of a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub users_skipped: usize,
    pub documents_written: usize,
}

/// Id of the `index`-th demo user
pub fn demo_user_id(index: usize) -> String {
    format!("usr_{}", 100 + index)
}

/// Seed the demo users that do not exist yet.
///
/// `seed` makes the random choices reproducible.
pub async fn seed_demo_data(store: &dyn DocumentStore, seed: Option<u64>) -> Result<SeedReport> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut batch = WriteBatch::new();
    let mut report = SeedReport::default();

    for (index, name) in DEMO_USER_NAMES.iter().enumerate() {
        let user_id = demo_user_id(index);
        let user_path = DocumentPath::user(&user_id)?;

        if store.exists(&user_path).await? {
            debug!(user_id = %user_id, "Demo user exists, skipping");
            report.users_skipped += 1;
            continue;
        }

        batch.set_entity(user_path, &demo_user(&mut rng, &user_id, name, index));
        add_sub_collections(&mut batch, &mut rng, &user_id)?;
        batch.set_entity(
            DocumentPath::screening(&user_id, DEMO_SCREENING_ID)?,
            &demo_screening(&mut rng, &user_id, index),
        );
        report.users_created += 1;
    }

    report.documents_written = batch.len();
    if !batch.is_empty() {
        store.commit(batch).await?;
    }

    Ok(report)
}

fn demo_user(rng: &mut StdRng, user_id: &str, name: &str, index: usize) -> User {
    let now = Utc::now();
    let day = index + 1;

    User {
        id: user_id.to_string(),
        user_id: Some(user_id.to_string()),
        schema_version: Some(1),
        created_at: Some(now),
        updated_at: Some(now),
        profile: Some(UserProfile {
            name: Some(name.to_string()),
        }),
        preferences: Some(UserPreferences {
            reminder_time: Some(format!("20:{}", 30 + index)),
        }),
        landing_page_summary: Some(LandingPageSummary {
            risk: Some(Risk {
                level: RISK_LEVELS.choose(rng).map(|s| s.to_string()),
                score: Some(rng.gen_range(20..80)),
            }),
            heal_journey: None,
            next_yoga: None,
            cycle: Some(CycleSummary {
                last_period_start: Some(format!("2026-02-{:02}", day)),
                last_period_end: Some(format!("2026-02-{:02}", day + 5)),
            }),
            pad_usage: Some(PadUsage {
                status: PAD_STATUSES.choose(rng).map(|s| s.to_string()),
            }),
        }),
    }
}

fn add_sub_collections(batch: &mut WriteBatch, rng: &mut StdRng, user_id: &str) -> Result<()> {
    for j in 1..=2 {
        let id = format!("asmt_{}_{}", user_id, j);
        batch.set_entity(
            DocumentPath::user_entry(user_id, collections::ASSESSMENT_LOGS, &id)?,
            &AssessmentLog {
                assessment_id: id.clone(),
                questionnaire_version: "pcos_v1".to_string(),
                answers: Map::new(),
                result: Map::new(),
            },
        );
    }

    for j in 1..=2 {
        let id = format!("per_{}_{}", user_id, j);
        let action = if j == 1 { "start" } else { "end" };
        batch.set_entity(
            DocumentPath::user_entry(user_id, collections::PERIOD_LOGS, &id)?,
            &PeriodLog {
                period_log_id: id.clone(),
                action: action.to_string(),
                date: format!("2026-02-{:02}", j),
            },
        );
    }

    for j in 1..=3 {
        let id = format!("yog_{}_{}", user_id, j);
        batch.set_entity(
            DocumentPath::user_entry(user_id, collections::YOGA_ATTENDANCE_LOGS, &id)?,
            &YogaAttendanceLog {
                attendance_id: id.clone(),
                attended: rng.gen_bool(0.5),
            },
        );
    }

    for j in 1..=2 {
        let id = format!("pad_{}_{}", user_id, j);
        batch.set_entity(
            DocumentPath::user_entry(user_id, collections::PAD_LOGS, &id)?,
            &PadLog {
                pad_log_id: id.clone(),
                action: "status_update".to_string(),
                pad_status: "transitioning".to_string(),
            },
        );
    }

    Ok(())
}

fn demo_screening(rng: &mut StdRng, user_id: &str, index: usize) -> Screening {
    let avg_cycle_length: i32 = rng.gen_range(26..=32);
    let last_start = NaiveDate::from_ymd_opt(2026, 2, 1)
        .and_then(|d| d.checked_add_signed(Duration::days(index as i64)))
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt));
    let recent_periods = last_start
        .map(|last| vec![last - Duration::days(i64::from(avg_cycle_length)), last])
        .unwrap_or_default();

    Screening {
        screening_id: DEMO_SCREENING_ID.to_string(),
        user_id: user_id.to_string(),
        version: Some("v1.0".to_string()),
        source: Some("app".to_string()),
        started_at: Some(Utc::now()),
        completed_at: None,
        cycle_history: Some(CycleHistory {
            recent_periods,
            avg_cycle_length: Some(avg_cycle_length),
            cycle_regularity: *REGULARITIES.choose(rng).unwrap_or(&CycleRegularity::Regular),
        }),
    }
}
