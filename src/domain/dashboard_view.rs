//! View models for the dashboard page.
//!
//! Everything the template prints is computed here as plain strings, so the
//! template stays free of logic and the same snapshot always renders the same
//! markup.

use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::booking_status::{StatusRule, booking_duration, derive_status};
use crate::domain::charging_stats::{ChargingStats, QuickStats};
use crate::domain::models::{Booking, BookingEntry, UnreadableBooking, User};

pub const MISSING_VALUE: &str = "—";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub base_url: String,
    pub status_rule: StatusRule,
    pub display_offset: FixedOffset,
}

impl ViewSettings {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Inputs of one dashboard render, read once per request.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot<'a> {
    pub user: &'a User,
    pub stats: Option<ChargingStats>,
    pub quick_stats: QuickStats,
    pub bookings: &'a [BookingEntry],
    pub now: DateTime<Utc>,
    pub csrf_token: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub title: &'static str,
    pub raw_value: String,
    pub display_value: String,
    pub info: String,
    pub prefix: Option<&'static str>,
    pub suffix: Option<&'static str>,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRow {
    pub booking_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub street: String,
    pub city: String,
    pub duration: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub cancellable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuickAction {
    pub href: String,
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanel {
    pub element_id: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub user_name: String,
    pub stat_cards: Vec<StatCard>,
    pub bookings: Vec<BookingRow>,
    pub csrf_token: String,
    pub new_booking_url: String,
    pub cancel_url: String,
    pub logout_url: String,
    pub charts: Vec<ChartPanel>,
    pub quick_actions: Vec<QuickAction>,
    pub last_charge: String,
    pub average_duration: String,
}

pub fn build_dashboard_view(
    snapshot: &DashboardSnapshot<'_>,
    settings: &ViewSettings,
) -> DashboardView {
    let stats = snapshot.stats.unwrap_or_default();

    DashboardView {
        user_name: snapshot.user.name.clone(),
        stat_cards: stat_cards(&stats),
        bookings: snapshot
            .bookings
            .iter()
            .map(|entry| match entry {
                BookingEntry::Readable(booking) => booking_row(booking, snapshot.now, settings),
                BookingEntry::Unreadable(booking) => unreadable_booking_row(booking),
            })
            .collect(),
        csrf_token: snapshot.csrf_token.to_string(),
        new_booking_url: settings.url("/bookings"),
        cancel_url: settings.url("/bookings/cancel"),
        logout_url: settings.url("/logout"),
        charts: vec![
            ChartPanel {
                element_id: "energy-consumption-chart",
                title: "Energy Consumption",
            },
            ChartPanel {
                element_id: "charging-cost-chart",
                title: "Charging Costs",
            },
        ],
        quick_actions: quick_actions(settings),
        last_charge: snapshot
            .quick_stats
            .last_charge_kwh
            .map_or_else(|| MISSING_VALUE.to_string(), format_energy),
        average_duration: snapshot
            .quick_stats
            .average_duration_minutes
            .map_or_else(|| MISSING_VALUE.to_string(), |minutes| format!("{minutes} min")),
    }
}

fn stat_cards(stats: &ChargingStats) -> Vec<StatCard> {
    vec![
        StatCard {
            title: "Total Charges",
            raw_value: stats.total.charges.to_string(),
            display_value: stats.total.charges.to_string(),
            info: "Lifetime charging sessions".to_string(),
            prefix: None,
            suffix: None,
            decimals: None,
        },
        StatCard {
            title: "Total Energy",
            raw_value: stats.total.energy_kwh.to_string(),
            display_value: format_energy(stats.total.energy_kwh),
            info: "Total energy consumed".to_string(),
            prefix: None,
            suffix: Some(" kWh"),
            decimals: Some(2),
        },
        StatCard {
            title: "Total Cost",
            raw_value: stats.total.cost.to_string(),
            display_value: format_currency(stats.total.cost),
            info: "Total amount spent".to_string(),
            prefix: Some("€"),
            suffix: None,
            decimals: Some(2),
        },
        StatCard {
            title: "This Month",
            raw_value: stats.monthly.energy_kwh.to_string(),
            display_value: format_energy(stats.monthly.energy_kwh),
            info: format!("{} spent this month", format_currency(stats.monthly.cost)),
            prefix: None,
            suffix: Some(" kWh"),
            decimals: Some(2),
        },
    ]
}

fn booking_row(booking: &Booking, now: DateTime<Utc>, settings: &ViewSettings) -> BookingRow {
    let status = derive_status(booking.starts_at, booking.ends_at, now, settings.status_rule);
    let duration = match booking_duration(booking.starts_at, booking.ends_at) {
        Ok(duration) => duration.to_string(),
        Err(error) => {
            tracing::warn!(
                booking_id = booking.id,
                starts_at = %booking.starts_at,
                ends_at = %booking.ends_at,
                error = %error,
                "booking has an invalid time window"
            );
            MISSING_VALUE.to_string()
        }
    };

    let starts_at = booking.starts_at.with_timezone(&settings.display_offset);
    let ends_at = booking.ends_at.with_timezone(&settings.display_offset);

    BookingRow {
        booking_id: booking.id,
        date: starts_at.format("%b %-d, %Y").to_string(),
        start_time: starts_at.format("%-I:%M %p").to_string(),
        end_time: ends_at.format("%-I:%M %p").to_string(),
        street: booking.location.street.clone(),
        city: booking.location.city.clone(),
        duration,
        status_label: status.label(),
        status_class: status.css_class(),
        cancellable: status.is_cancellable(),
    }
}

/// Placeholder row; the stored times are unusable so nothing is derived.
fn unreadable_booking_row(booking: &UnreadableBooking) -> BookingRow {
    BookingRow {
        booking_id: booking.id,
        date: MISSING_VALUE.to_string(),
        start_time: MISSING_VALUE.to_string(),
        end_time: MISSING_VALUE.to_string(),
        street: booking.location.street.clone(),
        city: booking.location.city.clone(),
        duration: MISSING_VALUE.to_string(),
        status_label: MISSING_VALUE,
        status_class: "text-muted",
        cancellable: false,
    }
}

fn quick_actions(settings: &ViewSettings) -> Vec<QuickAction> {
    vec![
        QuickAction {
            href: settings.url("/stations"),
            icon: "fa-map-marker-alt",
            title: "Find Stations",
            description: "Locate charging stations near you",
        },
        QuickAction {
            href: settings.url("/bookings"),
            icon: "fa-calendar-plus",
            title: "New Booking",
            description: "Reserve a charging session",
        },
        QuickAction {
            href: settings.url("/history"),
            icon: "fa-history",
            title: "History",
            description: "View your charging history",
        },
        QuickAction {
            href: settings.url("/profile"),
            icon: "fa-user-cog",
            title: "Profile",
            description: "Manage your account settings",
        },
    ]
}

pub fn format_energy(kwh: f64) -> String {
    format!("{kwh:.2} kWh")
}

pub fn format_currency(amount: f64) -> String {
    format!("€{amount:.2}")
}
