pub mod admin;
pub mod config;
pub mod dashboard;
pub mod error;
mod logging;
pub mod password;
mod runtime;
pub mod services;

pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let config = config::AppConfig::from_env()?;

    tracing::info!(
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        app_url = %config.app_url,
        session_ttl_minutes = config.session_ttl_minutes,
        status_rule = ?config.status_rule,
        display_offset = %config.display_offset,
        cookie_secure = config.cookie_secure,
        "application bootstrap initialized"
    );

    runtime::run(config)
}

pub fn run_admin() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    logging::init_cli()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    admin::run(&args)
}
