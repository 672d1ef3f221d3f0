use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::domain::auth_session::AuthSession;
use crate::domain::charging_stats::{ChargingStats, LifetimeTotals, MonthlyTotals, QuickStats};
use crate::domain::models::{
    Booking, BookingEntry, Location, NewBooking, NewChargingSession, NewUser, UnreadableBooking,
    User, UserCredentials,
};

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locations (
    location_id INTEGER PRIMARY KEY AUTOINCREMENT,
    address_street TEXT NOT NULL,
    address_city TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bookings (
    booking_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users (user_id),
    location_id INTEGER NOT NULL REFERENCES locations (location_id),
    booking_datetime TEXT NOT NULL,
    booking_end_datetime TEXT NOT NULL,
    created_at TEXT NOT NULL,
    cancelled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_bookings_user_start
ON bookings (user_id, booking_datetime DESC);

CREATE TABLE IF NOT EXISTS charging_sessions (
    charging_session_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users (user_id),
    started_at TEXT NOT NULL,
    ended_at TEXT NOT NULL,
    energy_kwh REAL NOT NULL,
    cost REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_charging_sessions_user_started
ON charging_sessions (user_id, started_at DESC);

CREATE TABLE IF NOT EXISTS auth_sessions (
    session_id TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users (user_id),
    csrf_token TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_auth_sessions_expires_at
ON auth_sessions (expires_at);
"#,
)];

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
    #[error("an account with email `{email}` already exists")]
    EmailTaken { email: String },
    #[error("column {column} holds an invalid timestamp `{value}`")]
    InvalidTimestamp { column: &'static str, value: String },
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    let connection = Connection::open(path)?;
    connection.pragma_update(None, "foreign_keys", true)?;
    Ok(connection)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Timestamps are stored as RFC 3339 UTC text with millisecond precision so
/// string comparison in SQL matches chronological order.
pub fn to_db_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_db_timestamp(column: &'static str, value: String) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| DbError::InvalidTimestamp { column, value })
}

/// Emails are unique regardless of letter case.
pub fn insert_user(connection: &Connection, new_user: &NewUser) -> Result<i64, DbError> {
    let result = connection.execute(
        "INSERT INTO users (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            new_user.name,
            new_user.email,
            new_user.password_hash,
            to_db_timestamp(new_user.created_at),
        ],
    );

    match result {
        Err(rusqlite::Error::SqliteFailure(error, _))
            if error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Err(DbError::EmailTaken {
                email: new_user.email.clone(),
            })
        }
        result => {
            result?;
            Ok(connection.last_insert_rowid())
        }
    }
}

pub fn get_user(connection: &Connection, user_id: i64) -> Result<Option<User>, DbError> {
    let user = connection
        .query_row(
            "SELECT user_id, name, email FROM users WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(user)
}

pub fn find_user_credentials(
    connection: &Connection,
    email: &str,
) -> Result<Option<UserCredentials>, DbError> {
    let credentials = connection
        .query_row(
            "SELECT user_id, password_hash FROM users WHERE email = ?1 COLLATE NOCASE",
            params![email.trim()],
            |row| {
                Ok(UserCredentials {
                    user_id: row.get(0)?,
                    password_hash: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(credentials)
}

pub fn insert_location(connection: &Connection, street: &str, city: &str) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO locations (address_street, address_city) VALUES (?1, ?2)",
        params![street, city],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn insert_booking(connection: &Connection, new_booking: &NewBooking) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO bookings
             (user_id, location_id, booking_datetime, booking_end_datetime, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new_booking.user_id,
            new_booking.location_id,
            to_db_timestamp(new_booking.starts_at),
            to_db_timestamp(new_booking.ends_at),
            to_db_timestamp(new_booking.created_at),
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

const BOOKING_COLUMNS: &str = "b.booking_id, b.user_id, b.booking_datetime, b.booking_end_datetime,
         l.address_street, l.address_city
         FROM bookings b
         JOIN locations l ON l.location_id = b.location_id";

struct BookingRow {
    id: i64,
    user_id: i64,
    starts_at: String,
    ends_at: String,
    street: String,
    city: String,
}

impl BookingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            starts_at: row.get(2)?,
            ends_at: row.get(3)?,
            street: row.get(4)?,
            city: row.get(5)?,
        })
    }

    /// Keeps rows with unreadable times so callers can still list them.
    fn into_entry(self) -> BookingEntry {
        let location = Location {
            street: self.street,
            city: self.city,
        };
        let starts_at = parse_db_timestamp("booking_datetime", self.starts_at);
        let ends_at = parse_db_timestamp("booking_end_datetime", self.ends_at);

        match (starts_at, ends_at) {
            (Ok(starts_at), Ok(ends_at)) => BookingEntry::Readable(Booking {
                id: self.id,
                user_id: self.user_id,
                starts_at,
                ends_at,
                location,
            }),
            (Err(error), _) | (_, Err(error)) => {
                let column = match &error {
                    DbError::InvalidTimestamp { column, .. } => *column,
                    _ => "unknown",
                };
                tracing::warn!(
                    booking_id = self.id,
                    column,
                    error = %error,
                    "booking has an unreadable stored time"
                );
                BookingEntry::Unreadable(UnreadableBooking {
                    id: self.id,
                    user_id: self.user_id,
                    location,
                })
            }
        }
    }
}

/// All bookings of a user that were not cancelled, latest start first.
pub fn list_user_bookings(
    connection: &Connection,
    user_id: i64,
) -> Result<Vec<BookingEntry>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {BOOKING_COLUMNS}
         WHERE b.user_id = ?1 AND b.cancelled_at IS NULL
         ORDER BY b.booking_datetime DESC, b.booking_id DESC"
    ))?;

    let rows = statement.query_map(params![user_id], BookingRow::from_row)?;

    let mut bookings = Vec::new();
    for row in rows {
        bookings.push(row?.into_entry());
    }

    Ok(bookings)
}

pub fn get_user_booking(
    connection: &Connection,
    user_id: i64,
    booking_id: i64,
) -> Result<Option<BookingEntry>, DbError> {
    let row = connection
        .query_row(
            &format!(
                "SELECT {BOOKING_COLUMNS}
                 WHERE b.booking_id = ?1 AND b.user_id = ?2 AND b.cancelled_at IS NULL"
            ),
            params![booking_id, user_id],
            BookingRow::from_row,
        )
        .optional()?;

    Ok(row.map(BookingRow::into_entry))
}

/// Returns `false` when no active booking with that id belongs to the user.
pub fn cancel_booking(
    connection: &Connection,
    user_id: i64,
    booking_id: i64,
    cancelled_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let updated = connection.execute(
        "UPDATE bookings SET cancelled_at = ?1
         WHERE booking_id = ?2 AND user_id = ?3 AND cancelled_at IS NULL",
        params![to_db_timestamp(cancelled_at), booking_id, user_id],
    )?;

    Ok(updated == 1)
}

pub fn insert_charging_session(
    connection: &Connection,
    new_session: &NewChargingSession,
) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO charging_sessions (user_id, started_at, ended_at, energy_kwh, cost)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new_session.user_id,
            to_db_timestamp(new_session.started_at),
            to_db_timestamp(new_session.ended_at),
            new_session.energy_kwh,
            new_session.cost,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

/// `None` when the user has no charging history at all.
pub fn get_user_charging_stats(
    connection: &Connection,
    user_id: i64,
    month_start: DateTime<Utc>,
) -> Result<Option<ChargingStats>, DbError> {
    let stats = connection.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(energy_kwh), 0.0),
                COALESCE(SUM(cost), 0.0),
                COALESCE(SUM(CASE WHEN started_at >= ?2 THEN energy_kwh ELSE 0.0 END), 0.0),
                COALESCE(SUM(CASE WHEN started_at >= ?2 THEN cost ELSE 0.0 END), 0.0)
         FROM charging_sessions
         WHERE user_id = ?1",
        params![user_id, to_db_timestamp(month_start)],
        |row| {
            Ok(ChargingStats {
                total: LifetimeTotals {
                    charges: row.get(0)?,
                    energy_kwh: row.get(1)?,
                    cost: row.get(2)?,
                },
                monthly: MonthlyTotals {
                    energy_kwh: row.get(3)?,
                    cost: row.get(4)?,
                },
            })
        },
    )?;

    if stats.total.charges == 0 {
        return Ok(None);
    }

    Ok(Some(stats))
}

pub fn get_user_quick_stats(connection: &Connection, user_id: i64) -> Result<QuickStats, DbError> {
    let last_charge_kwh = connection
        .query_row(
            "SELECT energy_kwh FROM charging_sessions
             WHERE user_id = ?1
             ORDER BY started_at DESC, charging_session_id DESC
             LIMIT 1",
            params![user_id],
            |row| row.get::<_, f64>(0),
        )
        .optional()?;

    let mut statement = connection
        .prepare("SELECT started_at, ended_at FROM charging_sessions WHERE user_id = ?1")?;
    let rows = statement.query_map(params![user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut total_minutes = 0_i64;
    let mut counted = 0_i64;
    for row in rows {
        let (started_at, ended_at) = row?;
        let started_at = parse_db_timestamp("started_at", started_at)?;
        let ended_at = parse_db_timestamp("ended_at", ended_at)?;
        let minutes = (ended_at - started_at).num_minutes();
        if minutes >= 0 {
            total_minutes += minutes;
            counted += 1;
        }
    }

    Ok(QuickStats {
        last_charge_kwh,
        average_duration_minutes: (counted > 0).then(|| total_minutes / counted),
    })
}

pub fn insert_auth_session(connection: &Connection, session: &AuthSession) -> Result<(), DbError> {
    connection.execute(
        "INSERT INTO auth_sessions (session_id, user_id, csrf_token, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session.id,
            session.user_id,
            session.csrf_token,
            to_db_timestamp(session.created_at),
            to_db_timestamp(session.expires_at),
        ],
    )?;

    Ok(())
}

pub fn get_auth_session(
    connection: &Connection,
    session_id: &str,
) -> Result<Option<AuthSession>, DbError> {
    let row = connection
        .query_row(
            "SELECT session_id, user_id, csrf_token, created_at, expires_at
             FROM auth_sessions
             WHERE session_id = ?1",
            params![session_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, user_id, csrf_token, created_at, expires_at)) = row else {
        return Ok(None);
    };

    Ok(Some(AuthSession {
        id,
        user_id,
        csrf_token,
        created_at: parse_db_timestamp("created_at", created_at)?,
        expires_at: parse_db_timestamp("expires_at", expires_at)?,
    }))
}

pub fn delete_auth_session(connection: &Connection, session_id: &str) -> Result<bool, DbError> {
    let deleted = connection.execute(
        "DELETE FROM auth_sessions WHERE session_id = ?1",
        params![session_id],
    )?;
    Ok(deleted == 1)
}

pub fn delete_expired_auth_sessions(
    connection: &Connection,
    now: DateTime<Utc>,
) -> Result<usize, DbError> {
    let deleted = connection.execute(
        "DELETE FROM auth_sessions WHERE expires_at <= ?1",
        params![to_db_timestamp(now)],
    )?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rusqlite::{Connection, params};

    use crate::domain::auth_session::AuthSession;
    use crate::domain::models::{
        BookingEntry, Location, NewBooking, NewChargingSession, NewUser, UnreadableBooking,
    };
    use crate::test_support::open_test_connection;

    use super::{
        DbError, LATEST_SCHEMA_VERSION, cancel_booking, delete_auth_session,
        delete_expired_auth_sessions, find_user_credentials, get_auth_session, get_user,
        get_user_booking, get_user_charging_stats, get_user_quick_stats, insert_auth_session,
        insert_booking, insert_charging_session, insert_location, insert_user,
        list_user_bookings, open_connection, run_migrations, schema_version,
    };

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join(name);
        std::mem::forget(dir);
        path
    }

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn seed_user(connection: &Connection, email: &str) -> i64 {
        insert_user(
            connection,
            &NewUser {
                name: "Ada".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                created_at: ts(1, 8),
            },
        )
        .expect("user insert should succeed")
    }

    fn seed_booking(
        connection: &Connection,
        user_id: i64,
        location_id: i64,
        starts_at: DateTime<Utc>,
    ) -> i64 {
        insert_booking(
            connection,
            &NewBooking {
                user_id,
                location_id,
                starts_at,
                ends_at: starts_at + Duration::hours(2),
                created_at: ts(1, 8),
            },
        )
        .expect("booking insert should succeed")
    }

    fn seed_charge(
        connection: &Connection,
        user_id: i64,
        started_at: DateTime<Utc>,
        minutes: i64,
        energy_kwh: f64,
        cost: f64,
    ) {
        insert_charging_session(
            connection,
            &NewChargingSession {
                user_id,
                started_at,
                ended_at: started_at + Duration::minutes(minutes),
                energy_kwh,
                cost,
            },
        )
        .expect("charging session insert should succeed");
    }

    #[test]
    fn migrates_fresh_database_to_latest_version() {
        let db_path = temp_db_path("fresh.sqlite");
        let mut connection =
            open_connection(db_path.to_string_lossy().as_ref()).expect("db connection should open");

        run_migrations(&mut connection).expect("migrations should succeed");

        let version = schema_version(&connection).expect("schema version should be queryable");
        assert_eq!(version, LATEST_SCHEMA_VERSION);

        for table in [
            "users",
            "locations",
            "bookings",
            "charging_sessions",
            "auth_sessions",
        ] {
            let exists: i64 = connection
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    params![table],
                    |row| row.get(0),
                )
                .expect("table check should work");
            assert_eq!(exists, 1, "table {table} should exist");
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let db_path = temp_db_path("idempotent.sqlite");
        let mut connection =
            open_connection(db_path.to_string_lossy().as_ref()).expect("db connection should open");

        run_migrations(&mut connection).expect("first migration run should succeed");
        run_migrations(&mut connection).expect("second migration run should succeed");

        let version = schema_version(&connection).expect("schema version should be queryable");
        assert_eq!(version, LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn rejects_newer_schema_version() {
        let db_path = temp_db_path("newer.sqlite");
        let mut connection =
            open_connection(db_path.to_string_lossy().as_ref()).expect("db connection should open");
        connection
            .pragma_update(None, "user_version", LATEST_SCHEMA_VERSION + 1)
            .expect("pragma update should succeed");

        let result = run_migrations(&mut connection);
        assert!(matches!(
            result,
            Err(DbError::UnsupportedSchemaVersion { .. })
        ));
    }

    #[test]
    fn reads_user_and_credentials_case_insensitively() {
        let connection = open_test_connection("db-user");
        let user_id = seed_user(&connection, "ada@example.com");

        let user = get_user(&connection, user_id)
            .expect("query should succeed")
            .expect("user should exist");
        assert_eq!(user.name, "Ada");

        let credentials = find_user_credentials(&connection, " ADA@example.com ")
            .expect("query should succeed")
            .expect("credentials should exist");
        assert_eq!(credentials.user_id, user_id);
        assert_eq!(credentials.password_hash, "hash");

        assert_eq!(get_user(&connection, user_id + 1).expect("query"), None);
    }

    #[test]
    fn rejects_email_differing_only_in_case() {
        let connection = open_test_connection("db-user-duplicate");
        seed_user(&connection, "ada@example.com");

        let result = insert_user(
            &connection,
            &NewUser {
                name: "Ada Again".to_string(),
                email: "ADA@example.com".to_string(),
                password_hash: "hash".to_string(),
                created_at: ts(2, 8),
            },
        );
        assert!(matches!(result, Err(DbError::EmailTaken { email }) if email == "ADA@example.com"));
    }

    #[test]
    fn returns_no_stats_without_charging_history() {
        let connection = open_test_connection("db-stats-empty");
        let user_id = seed_user(&connection, "ada@example.com");

        let stats = get_user_charging_stats(&connection, user_id, ts(1, 0))
            .expect("query should succeed");
        assert_eq!(stats, None);

        let quick = get_user_quick_stats(&connection, user_id).expect("query should succeed");
        assert_eq!(quick.last_charge_kwh, None);
        assert_eq!(quick.average_duration_minutes, None);
    }

    #[test]
    fn aggregates_lifetime_and_monthly_totals() {
        let connection = open_test_connection("db-stats");
        let user_id = seed_user(&connection, "ada@example.com");
        let other_id = seed_user(&connection, "bob@example.com");

        let february = Utc
            .with_ymd_and_hms(2026, 2, 20, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        seed_charge(&connection, user_id, february, 60, 10.0, 3.0);
        seed_charge(&connection, user_id, ts(3, 10), 30, 5.5, 2.0);
        seed_charge(&connection, user_id, ts(10, 10), 90, 4.5, 1.5);
        seed_charge(&connection, other_id, ts(10, 10), 90, 100.0, 50.0);

        let stats = get_user_charging_stats(&connection, user_id, ts(1, 0))
            .expect("query should succeed")
            .expect("stats should exist");

        assert_eq!(stats.total.charges, 3);
        assert_eq!(stats.total.energy_kwh, 20.0);
        assert_eq!(stats.total.cost, 6.5);
        assert_eq!(stats.monthly.energy_kwh, 10.0);
        assert_eq!(stats.monthly.cost, 3.5);

        let quick = get_user_quick_stats(&connection, user_id).expect("query should succeed");
        assert_eq!(quick.last_charge_kwh, Some(4.5));
        assert_eq!(quick.average_duration_minutes, Some(60));
    }

    #[test]
    fn lists_active_bookings_latest_first_with_location() {
        let connection = open_test_connection("db-bookings");
        let user_id = seed_user(&connection, "ada@example.com");
        let other_id = seed_user(&connection, "bob@example.com");
        let location_id =
            insert_location(&connection, "1 Volta Street", "Turin").expect("location insert");

        let past = seed_booking(&connection, user_id, location_id, ts(2, 9));
        let future = seed_booking(&connection, user_id, location_id, ts(20, 9));
        let cancelled = seed_booking(&connection, user_id, location_id, ts(25, 9));
        seed_booking(&connection, other_id, location_id, ts(21, 9));

        assert!(
            cancel_booking(&connection, user_id, cancelled, ts(3, 9)).expect("cancel should work")
        );

        let bookings = list_user_bookings(&connection, user_id).expect("query should succeed");
        let ids: Vec<i64> = bookings.iter().map(BookingEntry::id).collect();
        assert_eq!(ids, [future, past]);

        let latest = bookings[0].as_readable().expect("times should be readable");
        assert_eq!(latest.starts_at, ts(20, 9));
        assert_eq!(latest.ends_at, ts(20, 11));
        assert_eq!(latest.location.street, "1 Volta Street");
        assert_eq!(latest.location.city, "Turin");
    }

    #[test]
    fn returns_empty_booking_list_for_new_user() {
        let connection = open_test_connection("db-bookings-empty");
        let user_id = seed_user(&connection, "ada@example.com");

        let bookings = list_user_bookings(&connection, user_id).expect("query should succeed");
        assert!(bookings.is_empty());
    }

    #[test]
    fn cancel_only_touches_own_active_booking() {
        let connection = open_test_connection("db-cancel");
        let user_id = seed_user(&connection, "ada@example.com");
        let other_id = seed_user(&connection, "bob@example.com");
        let location_id =
            insert_location(&connection, "1 Volta Street", "Turin").expect("location insert");
        let booking_id = seed_booking(&connection, user_id, location_id, ts(20, 9));

        assert!(!cancel_booking(&connection, other_id, booking_id, ts(3, 9)).expect("cancel"));
        assert!(
            get_user_booking(&connection, user_id, booking_id)
                .expect("query")
                .is_some()
        );
        assert_eq!(
            get_user_booking(&connection, other_id, booking_id).expect("query"),
            None
        );

        assert!(cancel_booking(&connection, user_id, booking_id, ts(3, 9)).expect("cancel"));
        assert!(!cancel_booking(&connection, user_id, booking_id, ts(3, 10)).expect("cancel"));
        assert_eq!(
            get_user_booking(&connection, user_id, booking_id).expect("query"),
            None
        );
    }

    #[test]
    fn keeps_booking_with_unreadable_time_in_list() {
        let connection = open_test_connection("db-invalid-ts");
        let user_id = seed_user(&connection, "ada@example.com");
        let location_id =
            insert_location(&connection, "1 Volta Street", "Turin").expect("location insert");
        let valid = seed_booking(&connection, user_id, location_id, ts(20, 9));
        connection
            .execute(
                "INSERT INTO bookings
                     (user_id, location_id, booking_datetime, booking_end_datetime, created_at)
                 VALUES (?1, ?2, '2026-03-21 10:00:00', '2026-03-21T11:00:00.000Z',
                         '2026-03-01T08:00:00.000Z')",
                params![user_id, location_id],
            )
            .expect("raw insert should succeed");
        let malformed = connection.last_insert_rowid();

        let bookings = list_user_bookings(&connection, user_id).expect("query should succeed");
        assert_eq!(bookings.len(), 2);
        assert_eq!(
            bookings
                .iter()
                .find(|entry| entry.id() == valid)
                .and_then(BookingEntry::as_readable)
                .map(|booking| booking.starts_at),
            Some(ts(20, 9))
        );
        assert_eq!(
            bookings.iter().find(|entry| entry.id() == malformed),
            Some(&BookingEntry::Unreadable(UnreadableBooking {
                id: malformed,
                user_id,
                location: Location {
                    street: "1 Volta Street".to_string(),
                    city: "Turin".to_string(),
                },
            }))
        );
        assert!(matches!(
            get_user_booking(&connection, user_id, malformed).expect("query should succeed"),
            Some(BookingEntry::Unreadable(_))
        ));
    }

    #[test]
    fn stores_reads_and_purges_auth_sessions() {
        let connection = open_test_connection("db-auth-sessions");
        let user_id = seed_user(&connection, "ada@example.com");

        let active = AuthSession::start(user_id, ts(10, 9), Duration::hours(2));
        let stale = AuthSession::start(user_id, ts(1, 9), Duration::hours(2));
        insert_auth_session(&connection, &active).expect("insert should succeed");
        insert_auth_session(&connection, &stale).expect("insert should succeed");

        let loaded = get_auth_session(&connection, &active.id)
            .expect("query should succeed")
            .expect("session should exist");
        assert_eq!(loaded, active);

        let purged = delete_expired_auth_sessions(&connection, ts(10, 9)).expect("purge");
        assert_eq!(purged, 1);
        assert_eq!(get_auth_session(&connection, &stale.id).expect("query"), None);

        assert!(delete_auth_session(&connection, &active.id).expect("delete"));
        assert!(!delete_auth_session(&connection, &active.id).expect("delete"));
    }
}
