use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};

// Send time defaults to 08:00 IST (UTC+5:30), the market-open morning slot.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

const DEFAULT_SEND_HOUR: u32 = 8;
const DEFAULT_SEND_MINUTE: u32 = 0;

#[derive(Debug, Clone, Copy)]
pub struct SendTime {
    pub hour: u32,
    pub minute: u32,
}

impl SendTime {
    /// DIGEST_SEND_HOUR / DIGEST_SEND_MINUTE override the default slot.
    pub fn from_env() -> Self {
        let hour = std::env::var("DIGEST_SEND_HOUR")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|h| *h < 24)
            .unwrap_or(DEFAULT_SEND_HOUR);
        let minute = std::env::var("DIGEST_SEND_MINUTE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|m| *m < 60)
            .unwrap_or(DEFAULT_SEND_MINUTE);
        Self { hour, minute }
    }
}

fn ist() -> chrono::FixedOffset {
    chrono::FixedOffset::east_opt(IST_OFFSET_SECS).expect("valid IST offset")
}

/// The next instant at the configured IST wall-clock time strictly after
/// `now_utc`: today's slot if it has not passed yet, otherwise tomorrow's.
pub fn next_run_after(now_utc: DateTime<Utc>, send_time: SendTime) -> DateTime<Utc> {
    let tz = ist();
    let now_local = now_utc.with_timezone(&tz);

    let mut date = now_local.date_naive();
    loop {
        if let Some(candidate) = date
            .and_hms_opt(send_time.hour, send_time.minute, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).single())
        {
            let candidate_utc = candidate.with_timezone(&Utc);
            if candidate_utc > now_utc {
                return candidate_utc;
            }
        }
        date += Duration::days(1);
    }
}

/// The run's local calendar date; digest_runs rows and weekly gating use it.
pub fn run_date(now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.with_timezone(&ist()).date_naive()
}

/// Weekly subscribers receive the digest only on the configured weekday.
/// DIGEST_WEEKLY_WEEKDAY accepts English weekday names; default Monday.
pub fn weekly_due(run_date: NaiveDate) -> bool {
    run_date.weekday() == configured_weekly_weekday()
}

fn configured_weekly_weekday() -> Weekday {
    std::env::var("DIGEST_WEEKLY_WEEKDAY")
        .ok()
        .and_then(|s| s.trim().parse::<Weekday>().ok())
        .unwrap_or(Weekday::Mon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SEND: SendTime = SendTime { hour: 8, minute: 0 };

    #[test]
    fn before_the_slot_runs_same_day() {
        // 2026-01-05 01:00 UTC = 06:30 IST, before 08:00 IST.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 1, 0, 0).unwrap();
        let next = next_run_after(now, SEND);
        // 08:00 IST = 02:30 UTC.
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 5, 2, 30, 0).unwrap());
    }

    #[test]
    fn after_the_slot_runs_next_day() {
        // 2026-01-05 10:00 UTC = 15:30 IST, past 08:00 IST.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        let next = next_run_after(now, SEND);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 6, 2, 30, 0).unwrap());
    }

    #[test]
    fn exactly_at_the_slot_waits_for_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 2, 30, 0).unwrap();
        let next = next_run_after(now, SEND);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 6, 2, 30, 0).unwrap());
    }

    #[test]
    fn run_date_uses_local_calendar() {
        // 2026-01-05 20:00 UTC is already 2026-01-06 in IST.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 20, 0, 0).unwrap();
        assert_eq!(run_date(now), NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
    }

    #[test]
    fn weekly_gate_defaults_to_monday() {
        // 2026-01-05 is a Monday.
        assert!(weekly_due(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()));
        assert!(!weekly_due(NaiveDate::from_ymd_opt(2026, 1, 6).unwrap()));
    }
}
