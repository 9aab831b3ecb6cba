//! Explicit document mapping for stored entities
//!
//! Each entity reads and writes a fixed set of top-level fields. Missing or
//! null fields fall back to defaults, fields of the wrong type make the
//! document malformed, and fields outside the set are ignored so documents
//! written by other clients still decode.

use crate::error::{HealError, Result};
use crate::models::{
    AssessmentLog, CycleHistory, CycleRegularity, PadLog, PeriodLog, Screening, User,
    YogaAttendanceLog,
};
use crate::store::{Document, DocumentPath};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Mapping between an entity and its stored document
pub trait DocumentCodec: Sized {
    /// Top-level fields this entity reads and writes
    const FIELDS: &'static [&'static str];

    fn decode(path: &DocumentPath, doc: &Document) -> Result<Self>;

    fn encode(&self) -> Document;
}

/// Fields present in `doc` that `fields` does not name
pub fn unknown_fields<'a>(doc: &'a Document, fields: &[&str]) -> Vec<&'a str> {
    doc.keys()
        .map(String::as_str)
        .filter(|k| !fields.contains(k))
        .collect()
}

fn note_unknown_fields(path: &DocumentPath, doc: &Document, fields: &[&str]) {
    let unknown = unknown_fields(doc, fields);
    if !unknown.is_empty() {
        debug!(path = %path, fields = ?unknown, "Ignoring fields outside the entity schema");
    }
}

/// Look up a field, treating JSON null as absent
fn field<'a>(doc: &'a Document, name: &str) -> Option<&'a Value> {
    doc.get(name).filter(|v| !v.is_null())
}

fn opt_string(path: &DocumentPath, doc: &Document, name: &str) -> Result<Option<String>> {
    match field(doc, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(type_error(path, name, "a string", other)),
    }
}

fn string_or_default(path: &DocumentPath, doc: &Document, name: &str) -> Result<String> {
    Ok(opt_string(path, doc, name)?.unwrap_or_default())
}

fn opt_bool(path: &DocumentPath, doc: &Document, name: &str) -> Result<Option<bool>> {
    match field(doc, name) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(type_error(path, name, "a boolean", other)),
    }
}

fn opt_i32(path: &DocumentPath, doc: &Document, name: &str) -> Result<Option<i32>> {
    match field(doc, name) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| type_error(path, name, "a 32-bit integer", v)),
    }
}

fn opt_object(path: &DocumentPath, doc: &Document, name: &str) -> Result<Map<String, Value>> {
    match field(doc, name) {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(type_error(path, name, "a map", other)),
    }
}

fn opt_timestamp(
    path: &DocumentPath,
    doc: &Document,
    name: &str,
) -> Result<Option<DateTime<Utc>>> {
    match field(doc, name) {
        None => Ok(None),
        Some(v) => timestamp_from_value(v)
            .map(Some)
            .ok_or_else(|| type_error(path, name, "a timestamp", v)),
    }
}

fn opt_nested<T: DeserializeOwned>(
    path: &DocumentPath,
    doc: &Document,
    name: &str,
) -> Result<Option<T>> {
    match field(doc, name) {
        None => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| HealError::malformed(path, format!("field `{}`: {}", name, e))),
    }
}

fn type_error(path: &DocumentPath, name: &str, expected: &str, found: &Value) -> HealError {
    HealError::malformed(
        path,
        format!("field `{}` should be {}, found {}", name, expected, value_kind(found)),
    )
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

fn put_string(doc: &mut Document, name: &str, value: &Option<String>) {
    if let Some(v) = value {
        doc.insert(name.to_string(), Value::String(v.clone()));
    }
}

fn put_timestamp(doc: &mut Document, name: &str, value: &Option<DateTime<Utc>>) {
    if let Some(ts) = value {
        doc.insert(name.to_string(), timestamp_to_value(ts));
    }
}

fn put_nested<T: Serialize>(doc: &mut Document, name: &str, value: &Option<T>) {
    if let Some(v) = value {
        if let Ok(json) = serde_json::to_value(v) {
            doc.insert(name.to_string(), json);
        }
    }
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 strings and `{ "seconds": i64, "nanos": u32 }` maps.
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Object(map) => {
            let seconds = map.get("seconds")?.as_i64()?;
            let nanos = match map.get("nanos") {
                Some(n) => u32::try_from(n.as_u64()?).ok()?,
                None => 0,
            };
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}

pub fn timestamp_to_value(ts: &DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Read a stored average cycle length.
///
/// Numbers are truncated toward zero and saturate at the `i32` bounds;
/// anything that is not a number yields `None`.
pub fn cycle_length_from_value(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return Some(n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i32)
}

pub const CYCLE_HISTORY_FIELDS: &[&str] = &["recent_periods", "avg_cycle_length", "cycle_regularity"];

/// Decode a `cycle_history` map.
///
/// Non-numeric cycle lengths and unknown regularity labels are defaulted;
/// an unparseable period timestamp makes the document malformed.
pub fn decode_cycle_history(path: &DocumentPath, value: &Value) -> Result<CycleHistory> {
    let map = match value {
        Value::Object(map) => map,
        other => return Err(type_error(path, "cycle_history", "a map", other)),
    };

    let recent_periods = match field(map, "recent_periods") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                timestamp_from_value(item).ok_or_else(|| {
                    HealError::malformed(
                        path,
                        format!("cycle_history.recent_periods[{}] is not a timestamp", i),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(type_error(path, "cycle_history.recent_periods", "an array", other))
        }
    };

    let avg_cycle_length = field(map, "avg_cycle_length").and_then(cycle_length_from_value);

    let cycle_regularity = match field(map, "cycle_regularity") {
        Some(Value::String(label)) => CycleRegularity::from_label(label).unwrap_or_else(|| {
            debug!(path = %path, label = %label, "Unrecognized cycle regularity, treating as regular");
            CycleRegularity::Regular
        }),
        _ => CycleRegularity::Regular,
    };

    Ok(CycleHistory {
        recent_periods,
        avg_cycle_length,
        cycle_regularity,
    })
}

pub fn encode_cycle_history(history: &CycleHistory) -> Value {
    let mut map = Map::new();
    map.insert(
        "recent_periods".to_string(),
        Value::Array(history.recent_periods.iter().map(timestamp_to_value).collect()),
    );
    if let Some(len) = history.avg_cycle_length {
        map.insert("avg_cycle_length".to_string(), Value::from(len));
    }
    map.insert(
        "cycle_regularity".to_string(),
        Value::String(history.cycle_regularity.as_str().to_string()),
    );
    Value::Object(map)
}

impl DocumentCodec for User {
    const FIELDS: &'static [&'static str] = &[
        "user_id",
        "schema_version",
        "created_at",
        "updated_at",
        "profile",
        "preferences",
        "landing_page_summary",
    ];

    fn decode(path: &DocumentPath, doc: &Document) -> Result<Self> {
        note_unknown_fields(path, doc, Self::FIELDS);
        Ok(Self {
            id: path.id().to_string(),
            user_id: opt_string(path, doc, "user_id")?,
            schema_version: opt_i32(path, doc, "schema_version")?,
            created_at: opt_timestamp(path, doc, "created_at")?,
            updated_at: opt_timestamp(path, doc, "updated_at")?,
            profile: opt_nested(path, doc, "profile")?,
            preferences: opt_nested(path, doc, "preferences")?,
            landing_page_summary: opt_nested(path, doc, "landing_page_summary")?,
        })
    }

    fn encode(&self) -> Document {
        let mut doc = Document::new();
        put_string(&mut doc, "user_id", &self.user_id);
        if let Some(v) = self.schema_version {
            doc.insert("schema_version".to_string(), Value::from(v));
        }
        put_timestamp(&mut doc, "created_at", &self.created_at);
        put_timestamp(&mut doc, "updated_at", &self.updated_at);
        put_nested(&mut doc, "profile", &self.profile);
        put_nested(&mut doc, "preferences", &self.preferences);
        put_nested(&mut doc, "landing_page_summary", &self.landing_page_summary);
        doc
    }
}

impl DocumentCodec for Screening {
    const FIELDS: &'static [&'static str] = &[
        "screening_id",
        "user_id",
        "version",
        "source",
        "started_at",
        "completed_at",
        "cycle_history",
    ];

    fn decode(path: &DocumentPath, doc: &Document) -> Result<Self> {
        note_unknown_fields(path, doc, Self::FIELDS);
        let cycle_history = match field(doc, "cycle_history") {
            None => None,
            Some(v) => Some(decode_cycle_history(path, v)?),
        };

        Ok(Self {
            screening_id: opt_string(path, doc, "screening_id")?
                .unwrap_or_else(|| path.id().to_string()),
            user_id: opt_string(path, doc, "user_id")?
                .or_else(|| path.user_id().map(str::to_string))
                .unwrap_or_default(),
            version: opt_string(path, doc, "version")?,
            source: opt_string(path, doc, "source")?,
            started_at: opt_timestamp(path, doc, "started_at")?,
            completed_at: opt_timestamp(path, doc, "completed_at")?,
            cycle_history,
        })
    }

    fn encode(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(
            "screening_id".to_string(),
            Value::String(self.screening_id.clone()),
        );
        doc.insert("user_id".to_string(), Value::String(self.user_id.clone()));
        put_string(&mut doc, "version", &self.version);
        put_string(&mut doc, "source", &self.source);
        put_timestamp(&mut doc, "started_at", &self.started_at);
        put_timestamp(&mut doc, "completed_at", &self.completed_at);
        if let Some(history) = &self.cycle_history {
            doc.insert("cycle_history".to_string(), encode_cycle_history(history));
        }
        doc
    }
}

impl DocumentCodec for AssessmentLog {
    const FIELDS: &'static [&'static str] =
        &["assessment_id", "questionnaire_version", "answers", "result"];

    fn decode(path: &DocumentPath, doc: &Document) -> Result<Self> {
        note_unknown_fields(path, doc, Self::FIELDS);
        Ok(Self {
            assessment_id: string_or_default(path, doc, "assessment_id")?,
            questionnaire_version: string_or_default(path, doc, "questionnaire_version")?,
            answers: opt_object(path, doc, "answers")?,
            result: opt_object(path, doc, "result")?,
        })
    }

    fn encode(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(
            "assessment_id".to_string(),
            Value::String(self.assessment_id.clone()),
        );
        doc.insert(
            "questionnaire_version".to_string(),
            Value::String(self.questionnaire_version.clone()),
        );
        doc.insert("answers".to_string(), Value::Object(self.answers.clone()));
        doc.insert("result".to_string(), Value::Object(self.result.clone()));
        doc
    }
}

impl DocumentCodec for PeriodLog {
    const FIELDS: &'static [&'static str] = &["period_log_id", "action", "date"];

    fn decode(path: &DocumentPath, doc: &Document) -> Result<Self> {
        note_unknown_fields(path, doc, Self::FIELDS);
        Ok(Self {
            period_log_id: string_or_default(path, doc, "period_log_id")?,
            action: string_or_default(path, doc, "action")?,
            date: string_or_default(path, doc, "date")?,
        })
    }

    fn encode(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(
            "period_log_id".to_string(),
            Value::String(self.period_log_id.clone()),
        );
        doc.insert("action".to_string(), Value::String(self.action.clone()));
        doc.insert("date".to_string(), Value::String(self.date.clone()));
        doc
    }
}

impl DocumentCodec for YogaAttendanceLog {
    const FIELDS: &'static [&'static str] = &["attendance_id", "attended"];

    fn decode(path: &DocumentPath, doc: &Document) -> Result<Self> {
        note_unknown_fields(path, doc, Self::FIELDS);
        Ok(Self {
            attendance_id: string_or_default(path, doc, "attendance_id")?,
            attended: opt_bool(path, doc, "attended")?.unwrap_or(false),
        })
    }

    fn encode(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(
            "attendance_id".to_string(),
            Value::String(self.attendance_id.clone()),
        );
        doc.insert("attended".to_string(), Value::Bool(self.attended));
        doc
    }
}

impl DocumentCodec for PadLog {
    const FIELDS: &'static [&'static str] = &["pad_log_id", "action", "pad_status"];

    fn decode(path: &DocumentPath, doc: &Document) -> Result<Self> {
        note_unknown_fields(path, doc, Self::FIELDS);
        Ok(Self {
            pad_log_id: string_or_default(path, doc, "pad_log_id")?,
            action: string_or_default(path, doc, "action")?,
            pad_status: string_or_default(path, doc, "pad_status")?,
        })
    }

    fn encode(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(
            "pad_log_id".to_string(),
            Value::String(self.pad_log_id.clone()),
        );
        doc.insert("action".to_string(), Value::String(self.action.clone()));
        doc.insert(
            "pad_status".to_string(),
            Value::String(self.pad_status.clone()),
        );
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LandingPageSummary, Risk, UserProfile};
    use serde_json::json;

    fn as_doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn screening_path() -> DocumentPath {
        DocumentPath::screening("usr_100", "scr_001").unwrap()
    }

    #[test]
    fn test_timestamp_formats() {
        let from_string = timestamp_from_value(&json!("2026-02-01T00:00:00Z")).unwrap();
        let from_map = timestamp_from_value(&json!({"seconds": 1769904000, "nanos": 0})).unwrap();
        assert_eq!(from_string, from_map);

        assert!(timestamp_from_value(&json!("yesterday")).is_none());
        assert!(timestamp_from_value(&json!(1769904000)).is_none());
        assert!(timestamp_from_value(&json!({"nanos": 5})).is_none());
    }

    #[test]
    fn test_cycle_length_values() {
        assert_eq!(cycle_length_from_value(&json!(30)), Some(30));
        assert_eq!(cycle_length_from_value(&json!(29.9)), Some(29));
        assert_eq!(cycle_length_from_value(&json!(-4)), Some(-4));
        assert_eq!(cycle_length_from_value(&json!(0)), Some(0));
        assert_eq!(cycle_length_from_value(&json!(1e12)), Some(i32::MAX));
        assert_eq!(cycle_length_from_value(&json!("30")), None);
        assert_eq!(cycle_length_from_value(&json!(true)), None);
    }

    #[test]
    fn test_decode_full_cycle_history() {
        let value = json!({
            "recent_periods": ["2026-01-03T08:00:00Z", {"seconds": 1769904000}],
            "avg_cycle_length": 30,
            "cycle_regularity": "very_irregular"
        });

        let history = decode_cycle_history(&screening_path(), &value).unwrap();
        assert_eq!(history.recent_periods.len(), 2);
        assert_eq!(history.avg_cycle_length, Some(30));
        assert_eq!(history.cycle_regularity, CycleRegularity::VeryIrregular);
    }

    #[test]
    fn test_decode_partial_cycle_history_defaults() {
        let value = json!({
            "avg_cycle_length": "about a month",
            "cycle_regularity": "sometimes",
            "notes": "ignored"
        });

        let history = decode_cycle_history(&screening_path(), &value).unwrap();
        assert!(history.recent_periods.is_empty());
        assert_eq!(history.avg_cycle_length, None);
        assert_eq!(history.cycle_regularity, CycleRegularity::Regular);
    }

    #[test]
    fn test_decode_cycle_history_rejects_bad_timestamp() {
        let value = json!({ "recent_periods": ["2026-02-01T00:00:00Z", "soon"] });
        let err = decode_cycle_history(&screening_path(), &value).unwrap_err();
        assert!(matches!(err, HealError::MalformedDocument { .. }));
        assert!(err.to_string().contains("recent_periods[1]"));
    }

    #[test]
    fn test_decode_cycle_history_rejects_non_map() {
        let err = decode_cycle_history(&screening_path(), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, HealError::MalformedDocument { .. }));
    }

    #[test]
    fn test_screening_without_history() {
        let doc = as_doc(json!({ "version": "v1.0", "source": "app", "cycle_history": null }));
        let screening = Screening::decode(&screening_path(), &doc).unwrap();

        assert_eq!(screening.screening_id, "scr_001");
        assert_eq!(screening.user_id, "usr_100");
        assert!(screening.cycle_history.is_none());
    }

    #[test]
    fn test_user_ignores_unknown_fields() {
        let path = DocumentPath::user("usr_100").unwrap();
        let doc = as_doc(json!({
            "user_id": "usr_100",
            "latest_risk_level": "high",
            "profile": { "name": "Priya" },
            "landing_page_summary": { "risk": { "level": "low", "score": 42 } }
        }));

        assert_eq!(unknown_fields(&doc, User::FIELDS), vec!["latest_risk_level"]);

        let user = User::decode(&path, &doc).unwrap();
        assert_eq!(user.id, "usr_100");
        assert_eq!(
            user.profile,
            Some(UserProfile {
                name: Some("Priya".to_string())
            })
        );
        let summary = user.landing_page_summary.unwrap();
        assert_eq!(summary.risk.unwrap().score, Some(42));
        assert!(user.preferences.is_none());
    }

    #[test]
    fn test_user_wrong_field_type_is_malformed() {
        let path = DocumentPath::user("usr_100").unwrap();
        let doc = as_doc(json!({ "schema_version": "one" }));
        assert!(matches!(
            User::decode(&path, &doc),
            Err(HealError::MalformedDocument { .. })
        ));

        let doc = as_doc(json!({ "profile": "Priya" }));
        assert!(User::decode(&path, &doc).is_err());
    }

    #[test]
    fn test_user_encode_decode_preserves_summary() {
        let path = DocumentPath::user("usr_101").unwrap();
        let user = User {
            id: "usr_101".to_string(),
            user_id: Some("usr_101".to_string()),
            schema_version: Some(1),
            created_at: Some(Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap()),
            landing_page_summary: Some(LandingPageSummary {
                risk: Some(Risk {
                    level: Some("medium".to_string()),
                    score: Some(55),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let decoded = User::decode(&path, &user.encode()).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_log_entities_decode_defaults() {
        let path = DocumentPath::user_entry("usr_100", "yoga_attendance_logs", "yog_1").unwrap();
        let log = YogaAttendanceLog::decode(&path, &Document::new()).unwrap();
        assert!(!log.attended);
        assert!(log.attendance_id.is_empty());

        let path = DocumentPath::user_entry("usr_100", "pad_logs", "pad_1").unwrap();
        let doc = as_doc(json!({ "pad_log_id": "pad_1", "pad_status": 3 }));
        assert!(PadLog::decode(&path, &doc).is_err());
    }
}
