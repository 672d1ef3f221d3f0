use std::sync::{Arc, Mutex};

use crate::adapters::db::{open_connection, run_migrations};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::services::{AuthSessionHandler, SqliteDashboardService, UserCommandHandler};
use crate::domain::clock::{Clock, SystemClock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    CreateUser {
        name: String,
        email: String,
        password: String,
        db_path: Option<String>,
    },
    PurgeSessions {
        db_path: Option<String>,
    },
    Help,
}

pub fn run(args: &[String]) -> Result<(), AppError> {
    let command = parse_args(args)?;

    let db_path = match &command {
        AdminCommand::Help => {
            print_help();
            return Ok(());
        }
        AdminCommand::CreateUser { db_path, .. } | AdminCommand::PurgeSessions { db_path } => {
            match db_path {
                Some(path) => path.clone(),
                None => AppConfig::from_env()?.db_path,
            }
        }
    };

    let mut connection = open_connection(&db_path).map_err(AppError::database_init)?;
    run_migrations(&mut connection).map_err(AppError::database_init)?;
    let service = SqliteDashboardService::new(Arc::new(Mutex::new(connection)));

    execute(&service, &SystemClock, command)
}

fn execute<S, C>(service: &S, clock: &C, command: AdminCommand) -> Result<(), AppError>
where
    S: UserCommandHandler + AuthSessionHandler,
    C: Clock,
{
    match command {
        AdminCommand::CreateUser {
            name,
            email,
            password,
            ..
        } => {
            let user_id = service
                .create_user(&name, &email, &password, clock.now())
                .map_err(AppError::runtime)?;
            tracing::info!(user_id, "user created");
            println!("created user {user_id} <{}>", email.trim());
        }
        AdminCommand::PurgeSessions { .. } => {
            let purged = service
                .purge_expired_sessions(clock.now())
                .map_err(AppError::runtime)?;
            println!("purged {purged} expired session(s)");
        }
        AdminCommand::Help => print_help(),
    }

    Ok(())
}

pub fn parse_args(args: &[String]) -> Result<AdminCommand, AppError> {
    let Some((command, rest)) = args.split_first() else {
        return Err(AppError::usage("missing command; try `--help`"));
    };

    let mut name = None;
    let mut email = None;
    let mut password = None;
    let mut db_path = None;

    let mut index = 0;
    while index < rest.len() {
        let flag = rest[index].as_str();
        let slot = match flag {
            "--name" => &mut name,
            "--email" => &mut email,
            "--password" => &mut password,
            "--db" => &mut db_path,
            "--help" | "-h" => return Ok(AdminCommand::Help),
            other => return Err(AppError::usage(format!("unknown argument: {other}"))),
        };
        let Some(value) = rest.get(index + 1) else {
            return Err(AppError::usage(format!("{flag} requires a value")));
        };
        *slot = Some(value.clone());
        index += 2;
    }

    match command.as_str() {
        "create-user" => Ok(AdminCommand::CreateUser {
            name: required(name, "--name")?,
            email: required(email, "--email")?,
            password: required(password, "--password")?,
            db_path,
        }),
        "purge-sessions" => {
            if name.is_some() || email.is_some() || password.is_some() {
                return Err(AppError::usage("purge-sessions only accepts the --db option"));
            }
            Ok(AdminCommand::PurgeSessions { db_path })
        }
        "help" | "--help" | "-h" => Ok(AdminCommand::Help),
        other => Err(AppError::usage(format!("unknown command: {other}"))),
    }
}

fn required(value: Option<String>, flag: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::usage(format!("{flag} is required")))
}

fn print_help() {
    println!("dashboard_admin");
    println!();
    println!("Usage:");
    println!(
        "  dashboard_admin create-user --name <name> --email <email> --password <password> \
         [--db <file>]"
    );
    println!("  dashboard_admin purge-sessions [--db <file>]");
    println!();
    println!("Options:");
    println!("  --db <file>   sqlite file to use (default: DB_PATH)");
}
