//! Time helpers shared by the accessors and the history engine.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// SQL literal for the open-interval sentinel.
///
/// Must stay equal to [`open_end`]; used inside static join predicates.
pub const OPEN_END_SQL: &str = "TIMESTAMP '9999-12-31 23:59:59'";

/// Far-future `end_date` marking the currently active history row.
pub fn open_end() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Whether a history row's `end_date` is the open sentinel.
pub fn is_open(end_date: NaiveDateTime) -> bool {
    end_date == open_end()
}

/// Current wall-clock time, truncated to whole microseconds (Postgres
/// `TIMESTAMP` precision) so values read back compare equal.
pub fn now_local() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond((now.nanosecond() / 1_000) * 1_000)
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_end_matches_sql_literal() {
        let rendered = open_end().format("%Y-%m-%d %H:%M:%S").to_string();
        assert!(OPEN_END_SQL.contains(&rendered));
    }

    #[test]
    fn test_now_is_never_open() {
        assert!(!is_open(now_local()));
        assert!(is_open(open_end()));
    }

    #[test]
    fn test_now_has_microsecond_precision() {
        assert_eq!(now_local().nanosecond() % 1_000, 0);
    }
}
