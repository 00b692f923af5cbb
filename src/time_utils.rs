use anyhow::{ensure, Context, Result};
use chrono::{DateTime, NaiveDate, Offset, Timelike, Utc};
use chrono_tz::Tz;

use crate::locale::Language;

/// Wall-clock fields for one render tick in the selected city's zone.
#[derive(Debug, Clone)]
pub struct ClockTime {
    pub hour24: u32,
    pub hour12: u32,
    pub minute: u32,
    pub second: u32,
    pub is_pm: bool,
    pub date_string: String,
}

impl ClockTime {
    pub fn digits(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour12, self.minute, self.second)
    }
}

pub fn snapshot(now: DateTime<Utc>, tz: Tz, language: Language) -> ClockTime {
    let local = now.with_timezone(&tz);
    let hour24 = local.hour();
    let hour12 = match hour24 {
        0 => 12,
        1..=12 => hour24,
        _ => hour24 - 12,
    };
    ClockTime {
        hour24,
        hour12,
        minute: local.minute(),
        second: local.second(),
        is_pm: hour24 >= 12,
        date_string: language.format_date(&local),
    }
}

/// Signed UTC offset in minutes for `tz` at `now`.
///
/// Derived from the zone's wall-clock fields rather than a static table:
/// format the instant as observed in the zone, reinterpret those fields as
/// UTC, and subtract the real timestamp. DST falls out of the wall-clock
/// fields. A malformed field string is an error, never a silent zero.
pub fn offset_minutes(now: DateTime<Utc>, tz: Tz) -> Result<i32> {
    let fields = now.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string();
    let (date_part, time_part) = fields
        .split_once(' ')
        .with_context(|| format!("malformed zone fields: {:?}", fields))?;

    let mut date_it = date_part.split('-');
    let year = parse_field(date_it.next(), "year")?;
    let month = parse_field(date_it.next(), "month")? as u32;
    let day = parse_field(date_it.next(), "day")? as u32;

    let mut time_it = time_part.split(':');
    let hour = parse_field(time_it.next(), "hour")? as u32;
    let minute = parse_field(time_it.next(), "minute")? as u32;
    let second = parse_field(time_it.next(), "second")? as u32;

    let synthetic = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .with_context(|| format!("zone fields out of range: {:?}", fields))?
        .and_utc()
        .timestamp();

    Ok(((synthetic - now.timestamp()) / 60) as i32)
}

fn parse_field(field: Option<&str>, what: &str) -> Result<i32> {
    let s = field.with_context(|| format!("missing {} field", what))?;
    ensure!(
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
        "{} field is not a zero-padded integer: {:?}",
        what,
        s
    );
    s.parse::<i32>()
        .with_context(|| format!("unparseable {} field: {:?}", what, s))
}

/// "GMT±HH:MM" offset label.
pub fn format_offset_label(offset_minutes: i32) -> String {
    let sign = if offset_minutes >= 0 { '+' } else { '-' };
    let absolute = offset_minutes.abs();
    format!("GMT{}{:02}:{:02}", sign, absolute / 60, absolute % 60)
}

/// Night shading for a map marker: local hour in [0,6) or [18,24).
pub fn is_night(hour24: u32) -> bool {
    hour24 < 6 || hour24 >= 18
}

/// Night flags for every city in the table, aligned with
/// [`crate::cities::CITIES`].
pub fn night_flags(now: DateTime<Utc>) -> Vec<bool> {
    crate::cities::CITIES
        .iter()
        .map(|city| is_night(now.with_timezone(&city.tz).hour()))
        .collect()
}

/// Offset label with a library fallback for the degraded path: the derived
/// offset is authoritative, but a derivation failure must not leave the
/// label showing zero.
pub fn offset_label_or_fallback(now: DateTime<Utc>, tz: Tz) -> String {
    match offset_minutes(now, tz) {
        Ok(minutes) => format_offset_label(minutes),
        Err(e) => {
            log::warn!("offset derivation failed for {}: {:#}", tz.name(), e);
            let fallback = now.with_timezone(&tz).offset().fix().local_minus_utc() / 60;
            format_offset_label(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::CITIES;
    use chrono::TimeZone;

    fn reference_offset(now: DateTime<Utc>, tz: Tz) -> i32 {
        now.with_timezone(&tz).offset().fix().local_minus_utc() / 60
    }

    #[test]
    fn offsets_match_reference_for_all_cities() {
        // One instant in northern winter, one in northern summer, and the
        // two sides of the 2024 US spring-forward transition (07:00 UTC).
        let instants = [
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 10, 6, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap(),
        ];
        for city in CITIES {
            for instant in instants {
                let derived = offset_minutes(instant, city.tz).unwrap();
                assert_eq!(
                    derived,
                    reference_offset(instant, city.tz),
                    "{} at {}",
                    city.id,
                    instant
                );
            }
        }
    }

    #[test]
    fn known_fixed_offsets() {
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(offset_minutes(winter, chrono_tz::Asia::Seoul).unwrap(), 540);
        assert_eq!(offset_minutes(winter, chrono_tz::Asia::Kolkata).unwrap(), 330);
        assert_eq!(offset_minutes(winter, chrono_tz::Europe::London).unwrap(), 0);
        assert_eq!(offset_minutes(winter, chrono_tz::America::New_York).unwrap(), -300);
    }

    #[test]
    fn dst_transition_changes_offset() {
        // New York springs forward at 2024-03-10 07:00 UTC.
        let before = Utc.with_ymd_and_hms(2024, 3, 10, 6, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 7, 1, 0).unwrap();
        assert_eq!(offset_minutes(before, chrono_tz::America::New_York).unwrap(), -300);
        assert_eq!(offset_minutes(after, chrono_tz::America::New_York).unwrap(), -240);

        // Sydney falls back at 2024-04-06 16:00 UTC.
        let before = Utc.with_ymd_and_hms(2024, 4, 6, 15, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 4, 6, 16, 1, 0).unwrap();
        assert_eq!(offset_minutes(before, chrono_tz::Australia::Sydney).unwrap(), 660);
        assert_eq!(offset_minutes(after, chrono_tz::Australia::Sydney).unwrap(), 600);
    }

    #[test]
    fn offset_label_formatting() {
        assert_eq!(format_offset_label(540), "GMT+09:00");
        assert_eq!(format_offset_label(330), "GMT+05:30");
        assert_eq!(format_offset_label(0), "GMT+00:00");
        assert_eq!(format_offset_label(-300), "GMT-05:00");
        assert_eq!(format_offset_label(-270), "GMT-04:30");
    }

    #[test]
    fn malformed_fields_fail_loudly() {
        assert!(parse_field(Some("1a"), "hour").is_err());
        assert!(parse_field(Some(""), "hour").is_err());
        assert!(parse_field(Some("-5"), "hour").is_err());
        assert!(parse_field(None, "hour").is_err());
    }

    #[test]
    fn night_flag_boundaries() {
        for hour in 0..24 {
            let expected = hour < 6 || hour >= 18;
            assert_eq!(is_night(hour), expected, "hour {}", hour);
        }
    }

    #[test]
    fn snapshot_twelve_hour_mapping() {
        // Midnight UTC is 09:00 in Seoul.
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let t = snapshot(now, chrono_tz::Asia::Seoul, Language::English);
        assert_eq!(t.hour24, 9);
        assert_eq!(t.hour12, 9);
        assert!(!t.is_pm);

        // 15:00 UTC is midnight in Seoul: hour12 must read 12, AM.
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
        let t = snapshot(now, chrono_tz::Asia::Seoul, Language::English);
        assert_eq!(t.hour24, 0);
        assert_eq!(t.hour12, 12);
        assert!(!t.is_pm);
        assert_eq!(t.digits(), "12:00:00");
    }
}
