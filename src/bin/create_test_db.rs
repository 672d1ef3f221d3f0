use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use ev_charging_dashboard::adapters::db::{
    DbError, insert_booking, insert_charging_session, insert_location, insert_user,
    open_connection, run_migrations, schema_version,
};
use ev_charging_dashboard::app::password::hash_password;
use ev_charging_dashboard::domain::models::{NewBooking, NewChargingSession, NewUser};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo";

fn main() {
    if let Err(error) = run() {
        eprintln!("failed to create test db: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut path = if cfg!(windows) {
        ".\\data\\dashboard_test.db".to_string()
    } else {
        "./data/dashboard_test.db".to_string()
    };
    let mut force = false;
    let mut seed = false;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--path" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--path requires a value".to_string());
                };
                path = value.clone();
                index += 2;
            }
            "--force" => {
                force = true;
                index += 1;
            }
            "--seed" => {
                seed = true;
                index += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    let path_ref = Path::new(&path);
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create parent directory: {error}"))?;
    }

    if force && path_ref.exists() {
        std::fs::remove_file(path_ref)
            .map_err(|error| format!("failed to remove existing db file: {error}"))?;
    }

    let mut connection = open_connection(&path).map_err(|error| error.to_string())?;
    run_migrations(&mut connection).map_err(|error| error.to_string())?;
    let version = schema_version(&connection).map_err(|error| error.to_string())?;

    println!("created/updated dashboard db at: {path}");
    println!("schema version: {version}");

    if seed {
        let user_id = seed_demo_data(&connection)?;
        println!("seeded demo user {user_id}: {DEMO_EMAIL} / {DEMO_PASSWORD}");
    }
    Ok(())
}

fn seed_demo_data(connection: &Connection) -> Result<i64, String> {
    let now = Utc::now();
    let password_hash = hash_password(DEMO_PASSWORD).map_err(|error| error.to_string())?;
    insert_demo_rows(connection, password_hash, now).map_err(|error| error.to_string())
}

fn insert_demo_rows(
    connection: &Connection,
    password_hash: String,
    now: DateTime<Utc>,
) -> Result<i64, DbError> {
    let user_id = insert_user(
        connection,
        &NewUser {
            name: "Demo Driver".to_string(),
            email: DEMO_EMAIL.to_string(),
            password_hash,
            created_at: now,
        },
    )?;

    let depot = insert_location(connection, "12 Harbour Road", "Rotterdam")?;
    let plaza = insert_location(connection, "3 Market Square", "Utrecht")?;

    for (location_id, offset_hours, length_minutes) in
        [(depot, -72, 90), (plaza, -2, 180), (depot, 26, 60), (plaza, 98, 120)]
    {
        let starts_at = now + Duration::hours(offset_hours);
        insert_booking(
            connection,
            &NewBooking {
                user_id,
                location_id,
                starts_at,
                ends_at: starts_at + Duration::minutes(length_minutes),
                created_at: now,
            },
        )?;
    }

    for (days_ago, minutes, energy_kwh, cost) in
        [(40, 95, 31.4, 10.99), (12, 50, 18.2, 6.37), (3, 70, 24.75, 8.66)]
    {
        let started_at = now - Duration::days(days_ago);
        insert_charging_session(
            connection,
            &NewChargingSession {
                user_id,
                started_at,
                ended_at: started_at + Duration::minutes(minutes),
                energy_kwh,
                cost,
            },
        )?;
    }

    Ok(user_id)
}

fn print_help() {
    println!("create_test_db");
    println!();
    println!("Usage:");
    println!("  cargo run --bin create_test_db -- [--path <file>] [--force] [--seed]");
    println!();
    println!("Options:");
    println!(
        "  --path <file>   target sqlite file (default: .\\\\data\\\\dashboard_test.db on Windows)"
    );
    println!("  --force         delete existing file before creating");
    println!("  --seed          insert a demo user with bookings and charging history");
}
