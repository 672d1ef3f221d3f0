use std::sync::{Arc, Mutex};

use actix_web::{App, HttpServer, web};
use rusqlite::Connection;

use crate::adapters::db::{open_connection, run_migrations};
use crate::adapters::web::{WebSettings, WebState, configure_routes};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::services::{AuthSessionHandler, SqliteDashboardService};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::dashboard_view::ViewSettings;

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let mut connection = open_connection(&config.db_path).map_err(AppError::database_init)?;
    run_migrations(&mut connection).map_err(AppError::database_init)?;

    let state = build_web_state(&config, connection, Arc::new(SystemClock));
    purge_expired_sessions(&state);

    tracing::info!(bind = %config.http_bind, "http server starting");

    let server_result = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes)
        })
        .bind(&config.http_bind)?
        .run()
        .await
    });

    server_result.map_err(AppError::runtime)
}

fn build_web_state(
    config: &AppConfig,
    connection: Connection,
    clock: Arc<dyn Clock + Send + Sync>,
) -> WebState {
    WebState {
        service: SqliteDashboardService::new(Arc::new(Mutex::new(connection))),
        clock,
        settings: WebSettings {
            view: ViewSettings {
                base_url: config.app_url.clone(),
                status_rule: config.status_rule,
                display_offset: config.display_offset,
            },
            session_ttl_minutes: config.session_ttl_minutes,
            cookie_secure: config.cookie_secure,
        },
    }
}

fn purge_expired_sessions(state: &WebState) {
    match state.service.purge_expired_sessions(state.clock.now()) {
        Ok(0) => {}
        Ok(purged) => tracing::info!(purged, "expired sessions removed"),
        Err(error) => tracing::warn!(error = %error, "failed to purge expired sessions"),
    }
}
