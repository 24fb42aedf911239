use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Formats accepted for a reminder datetime without an explicit offset.
/// The first one is what an HTML `datetime-local` input produces.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Opaque reminder identity (UUIDv7 for new reminders, time-sortable).
///
/// Records loaded from storage may carry any string, including an empty one;
/// the scheduler treats an empty id as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(pub String);

impl ReminderId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReminderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReminderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A user-defined (text, target instant) pair with a stable identity.
///
/// `datetime` is kept exactly as the user entered it so stored records stay
/// byte-compatible; use [`Reminder::target_instant`] to resolve it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: ReminderId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub datetime: String,
}

impl Reminder {
    /// Build a reminder with a freshly generated id.
    pub fn new(text: impl Into<String>, datetime: impl Into<String>) -> Self {
        Self {
            id: ReminderId::new(),
            text: text.into(),
            datetime: datetime.into(),
        }
    }

    /// Build a reminder for an absolute UTC instant (stored as RFC 3339).
    pub fn at(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(text, at.to_rfc3339())
    }

    /// The absolute instant this reminder should fire, or `None` when the
    /// stored datetime is empty or cannot be resolved.
    pub fn target_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.datetime)
    }
}

/// Resolve a user-supplied datetime string to a UTC instant.
///
/// Accepts RFC 3339 (`2025-03-01T09:30:00+01:00`), naive local datetimes
/// (`2025-03-01T09:30`, interpreted in the local time zone) and bare dates
/// (`2025-03-01`, midnight UTC).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        // DST gap: the wall time never happened locally.
        return Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// One expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// One income entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    pub amount: f64,
}

/// Stored records may carry `null` where a value was never filled in; read
/// it the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique_and_non_empty() {
        let a = ReminderId::new();
        let b = ReminderId::new();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn whitespace_id_counts_as_empty() {
        assert!(ReminderId::from("   ").is_empty());
        assert!(ReminderId::default().is_empty());
    }

    #[test]
    fn rfc3339_datetime_resolves_exactly() {
        let r = Reminder::new("pay rent", "2030-01-15T08:00:00Z");
        let at = r.target_instant().expect("should parse");
        assert_eq!(at.to_rfc3339(), "2030-01-15T08:00:00+00:00");
    }

    #[test]
    fn offset_datetime_is_normalised_to_utc() {
        let at = parse_instant("2030-01-15T09:00:00+01:00").expect("should parse");
        assert_eq!(at.to_rfc3339(), "2030-01-15T08:00:00+00:00");
    }

    #[test]
    fn datetime_local_input_is_interpreted_locally() {
        let at = parse_instant("2030-06-01T12:30").expect("should parse");
        let expected = Local
            .with_ymd_and_hms(2030, 6, 1, 12, 30, 0)
            .earliest()
            .expect("valid local time")
            .with_timezone(&Utc);
        assert_eq!(at, expected);
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let at = parse_instant("2030-06-01").expect("should parse");
        assert_eq!(at.to_rfc3339(), "2030-06-01T00:00:00+00:00");
    }

    #[test]
    fn garbage_and_empty_do_not_resolve() {
        assert!(parse_instant("").is_none());
        assert!(parse_instant("   ").is_none());
        assert!(parse_instant("next tuesday").is_none());
        assert!(Reminder::default().target_instant().is_none());
    }

    #[test]
    fn stored_reminder_record_is_wire_compatible() {
        let json = r#"{"id":"1700000000000abc","text":"Pay rent","datetime":"2030-01-15T08:00"}"#;
        let r: Reminder = serde_json::from_str(json).unwrap();
        assert_eq!(r.id.as_str(), "1700000000000abc");
        assert_eq!(r.text, "Pay rent");

        let back = serde_json::to_string(&r).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn reminder_record_missing_fields_defaults() {
        let r: Reminder = serde_json::from_str(r#"{"text":"orphan"}"#).unwrap();
        assert!(r.id.is_empty());
        assert!(r.target_instant().is_none());
    }

    #[test]
    fn expense_date_serialises_as_calendar_date() {
        let e = Expense {
            category: "Food".into(),
            amount: 1500.5,
            date: NaiveDate::from_ymd_opt(2025, 3, 1),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"{"category":"Food","amount":1500.5,"date":"2025-03-01"}"#);
    }

    #[test]
    fn expense_without_date_loads_and_stays_dateless() {
        let e: Expense = serde_json::from_str(r#"{"category":"Rent","amount":90000}"#).unwrap();
        assert_eq!(e.date, None);
        assert_eq!(e.amount, 90_000.0);
        assert_eq!(
            serde_json::to_string(&e).unwrap(),
            r#"{"category":"Rent","amount":90000.0}"#
        );

        let e: Expense =
            serde_json::from_str(r#"{"category":null,"amount":5,"date":null}"#).unwrap();
        assert!(e.category.is_empty());
        assert_eq!(e.date, None);
    }

    #[test]
    fn null_reminder_fields_read_as_missing() {
        let r: Reminder =
            serde_json::from_str(r#"{"id":"2","text":"x","datetime":null}"#).unwrap();
        assert_eq!(r.id.as_str(), "2");
        assert!(r.datetime.is_empty());
        assert!(r.target_instant().is_none());

        let r: Reminder = serde_json::from_str(r#"{"id":null,"text":null}"#).unwrap();
        assert!(r.id.is_empty());
        assert!(r.text.is_empty());
    }
}
