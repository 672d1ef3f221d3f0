use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserCredentials {
    pub user_id: i64,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Location,
}

/// Stored booking whose start or end time could not be read back.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableBooking {
    pub id: i64,
    pub user_id: i64,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingEntry {
    Readable(Booking),
    Unreadable(UnreadableBooking),
}

impl BookingEntry {
    pub fn id(&self) -> i64 {
        match self {
            Self::Readable(booking) => booking.id,
            Self::Unreadable(booking) => booking.id,
        }
    }

    pub fn as_readable(&self) -> Option<&Booking> {
        match self {
            Self::Readable(booking) => Some(booking),
            Self::Unreadable(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: i64,
    pub location_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChargingSession {
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub energy_kwh: f64,
    pub cost: f64,
}
