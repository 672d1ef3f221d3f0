use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LifetimeTotals {
    pub charges: i64,
    pub energy_kwh: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthlyTotals {
    pub energy_kwh: f64,
    pub cost: f64,
}

/// Aggregate over a user's charging sessions. Never persisted.
///
/// The all-zero `Default` stands in for users without any charging history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChargingStats {
    pub total: LifetimeTotals,
    pub monthly: MonthlyTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuickStats {
    pub last_charge_kwh: Option<f64>,
    pub average_duration_minutes: Option<i64>,
}

/// First instant of the calendar month containing `now`, as seen from `offset`.
pub fn month_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    offset
        .with_ymd_and_hms(local.year(), local.month(), 1, 0, 0, 0)
        .single()
        .map_or(now, |start| start.with_timezone(&Utc))
}
