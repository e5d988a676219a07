use time::OffsetDateTime;
use uuid::Uuid;

/// Generates a fresh correlation token: a minute-truncated UTC ISO-8601
/// timestamp plus a 6-hex-character suffix, e.g. `2024-06-01T15:30Z a1b2c3`.
///
/// Fresh on every call but not globally unique: two ids minted within the
/// same minute share the timestamp half and collide with probability 16^-6
/// on the suffix. The protocol accepts that for its single-correspondent-pair,
/// one-exchange-in-flight design; no collision check is performed.
#[must_use]
pub fn generate_session_id() -> String {
    session_id_at(OffsetDateTime::now_utc())
}

pub(crate) fn session_id_at(now: OffsetDateTime) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}Z {}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        &hex[..6]
    )
}

#[cfg(test)]
mod tests {
    use time::{Date, Month, OffsetDateTime, Time, UtcOffset};

    use super::{generate_session_id, session_id_at};

    fn fixed_instant() -> OffsetDateTime {
        let date = Date::from_calendar_date(2024, Month::June, 1).expect("valid date");
        let time = Time::from_hms(15, 30, 45).expect("valid time");
        date.with_time(time).assume_offset(UtcOffset::UTC)
    }

    #[test]
    fn session_id_truncates_to_the_minute() {
        let id = session_id_at(fixed_instant());
        let (stamp, suffix) = id.split_once(' ').expect("timestamp and suffix");
        assert_eq!(stamp, "2024-06-01T15:30Z");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn session_ids_differ_within_the_same_minute() {
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn session_id_zero_pads_timestamp_components() {
        let date = Date::from_calendar_date(2025, Month::January, 9).expect("valid date");
        let time = Time::from_hms(5, 7, 0).expect("valid time");
        let id = session_id_at(date.with_time(time).assume_offset(UtcOffset::UTC));
        assert!(id.starts_with("2025-01-09T05:07Z "));
    }
}
