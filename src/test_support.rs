use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::adapters::db::{open_connection, run_migrations};
use crate::app::services::SqliteDashboardService;

const TEST_DB_DIR: &str = "./target/testdb";

static TEST_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opens a fresh copy of the migrated template database.
pub fn open_test_connection(test_name: &str) -> Connection {
    let template = template_db_path();
    let test_db_path = unique_test_db_path(test_name);

    std::fs::create_dir_all(TEST_DB_DIR).expect("test db dir should be creatable");
    std::fs::copy(template, &test_db_path).expect("template db should be copied");
    open_connection(test_db_path.to_string_lossy().as_ref()).expect("test db should open")
}

pub fn open_test_service(test_name: &str) -> SqliteDashboardService {
    SqliteDashboardService::new(Arc::new(Mutex::new(open_test_connection(test_name))))
}

fn template_db_path() -> &'static Path {
    static TEMPLATE_PATH: OnceLock<PathBuf> = OnceLock::new();

    TEMPLATE_PATH.get_or_init(|| {
        let template_path = std::env::var("TEST_DB_TEMPLATE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                Path::new(TEST_DB_DIR).join(format!("template-{}.sqlite", std::process::id()))
            });

        if let Some(parent) = template_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).expect("template parent dir should be creatable");
        }

        // A template left behind by an earlier run may carry an older schema.
        if template_path.exists() {
            std::fs::remove_file(&template_path).expect("stale template should be removable");
        }

        let mut connection = open_connection(template_path.to_string_lossy().as_ref())
            .expect("template db opens");
        run_migrations(&mut connection).expect("template migrations should succeed");

        template_path
    })
}

fn unique_test_db_path(test_name: &str) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let counter = TEST_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    Path::new(TEST_DB_DIR).join(format!("{test_name}-{millis}-{counter}.sqlite"))
}
