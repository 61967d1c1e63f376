use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};

/// IST is UTC+05:30 all year.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
const OPEN_MINUTE: u32 = 9 * 60 + 15;
const CLOSE_MINUTE: u32 = 15 * 60 + 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Open,
    Closed,
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketStatus::Open => write!(f, "Market Open"),
            MarketStatus::Closed => write!(f, "Market Closed"),
        }
    }
}

pub fn ist() -> Option<FixedOffset> {
    FixedOffset::east_opt(IST_OFFSET_SECS)
}

pub fn nse_status(now: DateTime<Utc>) -> MarketStatus {
    let Some(offset) = ist() else {
        return MarketStatus::Closed;
    };
    let local = now.with_timezone(&offset);

    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return MarketStatus::Closed;
    }

    let minute = local.hour() * 60 + local.minute();
    if (OPEN_MINUTE..=CLOSE_MINUTE).contains(&minute) {
        MarketStatus::Open
    } else {
        MarketStatus::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn open_between_bell_times_inclusive() {
        // 2026-03-02 is a Monday. 03:45 UTC = 09:15 IST, 10:00 UTC = 15:30 IST.
        assert_eq!(nse_status(utc(2026, 3, 2, 3, 44)), MarketStatus::Closed);
        assert_eq!(nse_status(utc(2026, 3, 2, 3, 45)), MarketStatus::Open);
        assert_eq!(nse_status(utc(2026, 3, 2, 7, 0)), MarketStatus::Open);
        assert_eq!(nse_status(utc(2026, 3, 2, 10, 0)), MarketStatus::Open);
        assert_eq!(nse_status(utc(2026, 3, 2, 10, 1)), MarketStatus::Closed);
    }

    #[test]
    fn closed_on_weekends() {
        assert_eq!(nse_status(utc(2026, 3, 7, 6, 0)), MarketStatus::Closed);
        assert_eq!(nse_status(utc(2026, 3, 8, 6, 0)), MarketStatus::Closed);
    }

    #[test]
    fn weekday_is_taken_in_ist() {
        // Sunday 22:00 UTC is already Monday 03:30 IST, still before the open.
        assert_eq!(nse_status(utc(2026, 3, 1, 22, 0)), MarketStatus::Closed);
        // Friday 09:59 UTC is Friday 15:29 IST.
        assert_eq!(nse_status(utc(2026, 3, 6, 9, 59)), MarketStatus::Open);
    }
}
