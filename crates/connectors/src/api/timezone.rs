//! Rewrites datetime fields of fetched rows from the API's timezone into the
//! application's.

use crate::error::ConnectorError;
use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use model::records::row::{Row, string_field};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use tracing::{debug, warn};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATETIME_LEN: usize = 19;
const ZERO_DATETIME: &str = "0000-00-00 00:00:00";

/// An IANA zone name (`Europe/Berlin`) or a fixed offset (`+02:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timezone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl FromStr for Timezone {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(offset) = parse_offset(s) {
            return Ok(Timezone::Fixed(offset));
        }
        s.parse::<Tz>()
            .map(Timezone::Named)
            .map_err(|_| ConnectorError::InvalidTimezone(s.to_string()))
    }
}

impl Timezone {
    /// Resolves a wall-clock time in this zone to an instant. A time
    /// repeated by a DST fold resolves to the earlier instant; a time
    /// skipped by a DST gap has no instant.
    fn to_utc(self, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Timezone::Named(tz) => pick_earliest(tz.from_local_datetime(local)),
            Timezone::Fixed(offset) => pick_earliest(offset.from_local_datetime(local)),
        }
    }

    fn wall_clock(self, instant: &DateTime<Utc>) -> NaiveDateTime {
        match self {
            Timezone::Named(tz) => instant.with_timezone(&tz).naive_local(),
            Timezone::Fixed(offset) => instant.with_timezone(&offset).naive_local(),
        }
    }

    /// Converts a wall-clock time in this zone to the wall-clock time in `to`.
    pub fn convert(self, local: &NaiveDateTime, to: Timezone) -> Option<NaiveDateTime> {
        self.to_utc(local).map(|instant| to.wall_clock(&instant))
    }
}

fn pick_earliest<T: TimeZone>(result: LocalResult<DateTime<T>>) -> Option<DateTime<Utc>> {
    match result {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Parses `Z`, `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Converts the datetime fields of `rows` from `connection_tz` into `app_tz`
/// in place and returns how many values were rewritten.
///
/// Nothing happens when the connection has no timezone, the zones are the
/// same, or no candidate key is present in the first row (rows are assumed
/// to share one schema). Only `YYYY-MM-DD HH:MM:SS` strings are touched;
/// nulls and zero dates are left as they are.
pub fn normalize_timezones(
    rows: &mut [Row],
    connection_tz: Option<&str>,
    app_tz: &str,
    candidate_keys: &[String],
) -> Result<usize, ConnectorError> {
    let Some(connection_tz) = connection_tz.filter(|tz| !tz.is_empty()) else {
        return Ok(0);
    };
    if rows.is_empty() || connection_tz == app_tz || candidate_keys.is_empty() {
        return Ok(0);
    }

    let keys: Vec<&str> = candidate_keys
        .iter()
        .map(String::as_str)
        .filter(|key| rows[0].contains_key(*key))
        .collect();
    if keys.is_empty() {
        return Ok(0);
    }

    let from: Timezone = connection_tz.parse()?;
    let to: Timezone = app_tz.parse()?;

    let mut converted = 0;
    for row in rows.iter_mut() {
        for key in &keys {
            let Some(raw) = string_field(row, key) else {
                continue;
            };
            if raw.len() != DATETIME_LEN || raw == ZERO_DATETIME {
                continue;
            }

            let Ok(local) = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT) else {
                warn!(field = key, value = raw, "Value is not a datetime; left unchanged");
                continue;
            };
            let Some(target) = from.convert(&local, to) else {
                warn!(
                    field = key,
                    value = raw,
                    timezone = connection_tz,
                    "Datetime does not exist in the source timezone; left unchanged"
                );
                continue;
            };

            row.insert(
                key.to_string(),
                JsonValue::String(target.format(DATETIME_FORMAT).to_string()),
            );
            converted += 1;
        }
    }

    debug!(
        from = connection_tz,
        to = app_tz,
        converted,
        "Normalized datetime fields"
    );
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn row(value: serde_json::Value) -> Row {
        match value {
            JsonValue::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_utc_to_plus_two() {
        let mut rows = vec![row(json!({ "id": 1, "created_at": "2023-01-01 00:00:00" }))];
        let n = normalize_timezones(&mut rows, Some("UTC"), "+02:00", &keys(&["created_at"])).unwrap();

        assert_eq!(n, 1);
        assert_eq!(rows[0]["created_at"], "2023-01-01 02:00:00");
        assert_eq!(rows[0]["id"], 1);
    }

    #[test]
    fn test_zulu_source_zone() {
        let mut rows = vec![row(json!({ "at": "2023-01-01 00:00:00" }))];
        let n = normalize_timezones(&mut rows, Some("Z"), "+02:00", &keys(&["at"])).unwrap();

        assert_eq!(n, 1);
        assert_eq!(rows[0]["at"], "2023-01-01 02:00:00");
    }

    #[test]
    fn test_named_zones() {
        let mut rows = vec![
            row(json!({ "updated_at": "2023-07-01 12:00:00" })),
            row(json!({ "updated_at": "2023-01-01 12:00:00" })),
        ];
        normalize_timezones(
            &mut rows,
            Some("Europe/Berlin"),
            "America/New_York",
            &keys(&["updated_at"]),
        )
        .unwrap();

        assert_eq!(rows[0]["updated_at"], "2023-07-01 06:00:00");
        assert_eq!(rows[1]["updated_at"], "2023-01-01 06:00:00");
    }

    #[test]
    fn test_conversion_crosses_day_boundary() {
        let mut rows = vec![row(json!({ "at": "2023-12-31 23:30:00" }))];
        normalize_timezones(&mut rows, Some("UTC"), "Asia/Tokyo", &keys(&["at"])).unwrap();
        assert_eq!(rows[0]["at"], "2024-01-01 08:30:00");
    }

    #[test]
    fn test_placeholders_and_other_shapes_untouched() {
        let mut rows = vec![
            row(json!({ "at": "0000-00-00 00:00:00" })),
            row(json!({ "at": "2023-01-01" })),
            row(json!({ "at": null })),
            row(json!({ "at": "" })),
            row(json!({ "at": 1672531200 })),
        ];
        let before = rows.clone();

        let n = normalize_timezones(&mut rows, Some("UTC"), "+02:00", &keys(&["at"])).unwrap();
        assert_eq!(n, 0);
        assert_eq!(rows, before);
    }

    #[test]
    fn test_noop_conditions() {
        let original = vec![row(json!({ "at": "2023-01-01 00:00:00" }))];
        let at = keys(&["at"]);

        let mut rows = original.clone();
        assert_eq!(normalize_timezones(&mut rows, None, "+02:00", &at).unwrap(), 0);
        assert_eq!(normalize_timezones(&mut rows, Some("UTC"), "UTC", &at).unwrap(), 0);
        assert_eq!(normalize_timezones(&mut rows, Some("UTC"), "+02:00", &[]).unwrap(), 0);
        assert_eq!(rows, original);

        let mut empty: Vec<Row> = Vec::new();
        assert_eq!(normalize_timezones(&mut empty, Some("UTC"), "+02:00", &at).unwrap(), 0);
    }

    #[test]
    fn test_keys_come_from_first_row() {
        let mut rows = vec![
            row(json!({ "id": 1 })),
            row(json!({ "id": 2, "at": "2023-01-01 00:00:00" })),
        ];
        let n = normalize_timezones(&mut rows, Some("UTC"), "+02:00", &keys(&["at"])).unwrap();
        assert_eq!(n, 0);
        assert_eq!(rows[1]["at"], "2023-01-01 00:00:00");
    }

    #[test]
    fn test_invalid_timezone() {
        let mut rows = vec![row(json!({ "at": "2023-01-01 00:00:00" }))];
        let err = normalize_timezones(&mut rows, Some("Mars/Olympus"), "UTC", &keys(&["at"])).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidTimezone(tz) if tz == "Mars/Olympus"));
    }

    #[traced_test]
    #[test]
    fn test_unparsable_and_gap_values_logged() {
        let mut rows = vec![
            row(json!({ "at": "2023-13-45 99:99:99" })),
            // Clocks jump from 02:00 to 03:00 in Berlin on this date.
            row(json!({ "at": "2023-03-26 02:30:00" })),
        ];
        let n = normalize_timezones(&mut rows, Some("Europe/Berlin"), "UTC", &keys(&["at"])).unwrap();

        assert_eq!(n, 0);
        assert_eq!(rows[0]["at"], "2023-13-45 99:99:99");
        assert_eq!(rows[1]["at"], "2023-03-26 02:30:00");
        assert!(logs_contain("not a datetime"));
        assert!(logs_contain("does not exist"));
    }

    #[test]
    fn test_fold_resolves_to_earlier_instant() {
        // 02:30 happens twice in Berlin on this date; the first is CEST (+02:00).
        let mut rows = vec![row(json!({ "at": "2023-10-29 02:30:00" }))];
        normalize_timezones(&mut rows, Some("Europe/Berlin"), "UTC", &keys(&["at"])).unwrap();
        assert_eq!(rows[0]["at"], "2023-10-29 00:30:00");
    }

    #[test]
    fn test_parse_timezones() {
        assert_eq!(
            "+02:00".parse::<Timezone>().unwrap(),
            Timezone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert_eq!(
            "-0530".parse::<Timezone>().unwrap(),
            Timezone::Fixed(FixedOffset::east_opt(-(5 * 3600 + 30 * 60)).unwrap())
        );
        assert_eq!(
            "Z".parse::<Timezone>().unwrap(),
            Timezone::Fixed(FixedOffset::east_opt(0).unwrap())
        );
        assert_eq!(
            "z".parse::<Timezone>().unwrap(),
            Timezone::Fixed(FixedOffset::east_opt(0).unwrap())
        );
        assert_eq!("UTC".parse::<Timezone>().unwrap(), Timezone::Named(Tz::UTC));
        assert!("+25:00".parse::<Timezone>().is_err());
        assert!("Nowhere/City".parse::<Timezone>().is_err());
    }
}
