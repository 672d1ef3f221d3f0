use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::app::password::{
    PasswordError, hash_password, verify_password, verify_unknown_account,
};
use crate::domain::auth_session::AuthSession;
use crate::domain::booking_status::{StatusRule, derive_status};
use crate::domain::charging_stats::{ChargingStats, QuickStats};
use crate::domain::models::{BookingEntry, NewUser, User};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database lock poisoned")]
    DbLockPoisoned,
    #[error("database operation failed: {0}")]
    Database(#[from] DbError),
    #[error("password handling failed: {0}")]
    Password(#[from] PasswordError),
    #[error("user {user_id} does not exist")]
    UnknownUser { user_id: i64 },
    #[error("booking {booking_id} was not found for this user")]
    BookingNotFound { booking_id: i64 },
    #[error("booking {booking_id} is no longer upcoming and cannot be cancelled")]
    BookingNotCancellable { booking_id: i64 },
}

pub trait DashboardQueryHandler {
    fn get_user(&self, user_id: i64) -> Result<Option<User>, ServiceError>;
    fn get_user_charging_stats(
        &self,
        user_id: i64,
        month_start: DateTime<Utc>,
    ) -> Result<Option<ChargingStats>, ServiceError>;
    fn get_user_quick_stats(&self, user_id: i64) -> Result<QuickStats, ServiceError>;
    fn list_user_bookings(&self, user_id: i64) -> Result<Vec<BookingEntry>, ServiceError>;
}

pub trait BookingCommandHandler {
    fn cancel_booking(
        &self,
        user_id: i64,
        booking_id: i64,
        now: DateTime<Utc>,
        rule: StatusRule,
    ) -> Result<(), ServiceError>;
}

pub trait AuthSessionHandler {
    fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Option<AuthSession>, ServiceError>;
    fn find_active_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthSession>, ServiceError>;
    fn logout(&self, session_id: &str) -> Result<(), ServiceError>;
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, ServiceError>;
}

pub trait UserCommandHandler {
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, ServiceError>;
}

#[derive(Clone)]
pub struct SqliteDashboardService {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteDashboardService {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| ServiceError::DbLockPoisoned)?;
        op(&connection)
    }
}

impl DashboardQueryHandler for SqliteDashboardService {
    fn get_user(&self, user_id: i64) -> Result<Option<User>, ServiceError> {
        self.with_connection(|connection| Ok(db::get_user(connection, user_id)?))
    }

    fn get_user_charging_stats(
        &self,
        user_id: i64,
        month_start: DateTime<Utc>,
    ) -> Result<Option<ChargingStats>, ServiceError> {
        self.with_connection(|connection| {
            Ok(db::get_user_charging_stats(connection, user_id, month_start)?)
        })
    }

    fn get_user_quick_stats(&self, user_id: i64) -> Result<QuickStats, ServiceError> {
        self.with_connection(|connection| Ok(db::get_user_quick_stats(connection, user_id)?))
    }

    fn list_user_bookings(&self, user_id: i64) -> Result<Vec<BookingEntry>, ServiceError> {
        self.with_connection(|connection| Ok(db::list_user_bookings(connection, user_id)?))
    }
}

impl BookingCommandHandler for SqliteDashboardService {
    fn cancel_booking(
        &self,
        user_id: i64,
        booking_id: i64,
        now: DateTime<Utc>,
        rule: StatusRule,
    ) -> Result<(), ServiceError> {
        self.with_connection(|connection| {
            let entry = db::get_user_booking(connection, user_id, booking_id)?
                .ok_or(ServiceError::BookingNotFound { booking_id })?;
            let BookingEntry::Readable(booking) = entry else {
                return Err(ServiceError::BookingNotCancellable { booking_id });
            };

            let status = derive_status(booking.starts_at, booking.ends_at, now, rule);
            if !status.is_cancellable() {
                return Err(ServiceError::BookingNotCancellable { booking_id });
            }

            if !db::cancel_booking(connection, user_id, booking_id, now)? {
                return Err(ServiceError::BookingNotFound { booking_id });
            }

            Ok(())
        })
    }
}

impl AuthSessionHandler for SqliteDashboardService {
    fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Option<AuthSession>, ServiceError> {
        // Password verification stays outside the connection lock.
        let credentials =
            self.with_connection(|connection| Ok(db::find_user_credentials(connection, email)?))?;

        let Some(credentials) = credentials else {
            verify_unknown_account(password)?;
            return Ok(None);
        };

        if !verify_password(password, &credentials.password_hash)? {
            return Ok(None);
        }

        let session = AuthSession::start(credentials.user_id, now, ttl);
        self.with_connection(|connection| Ok(db::insert_auth_session(connection, &session)?))?;
        Ok(Some(session))
    }

    fn find_active_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthSession>, ServiceError> {
        self.with_connection(|connection| {
            let Some(session) = db::get_auth_session(connection, session_id)? else {
                return Ok(None);
            };

            if session.is_expired(now) {
                db::delete_auth_session(connection, session_id)?;
                return Ok(None);
            }

            Ok(Some(session))
        })
    }

    fn logout(&self, session_id: &str) -> Result<(), ServiceError> {
        self.with_connection(|connection| {
            db::delete_auth_session(connection, session_id)?;
            Ok(())
        })
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, ServiceError> {
        self.with_connection(|connection| Ok(db::delete_expired_auth_sessions(connection, now)?))
    }
}

impl UserCommandHandler for SqliteDashboardService {
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, ServiceError> {
        let password_hash = hash_password(password)?;

        self.with_connection(|connection| {
            Ok(db::insert_user(
                connection,
                &NewUser {
                    name: name.trim().to_string(),
                    email: email.trim().to_string(),
                    password_hash,
                    created_at: now,
                },
            )?)
        })
    }
}
