use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Loads `.env.test`, starts logging and leaves an empty, fully migrated order store at `url`.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    recreate_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error connecting to the test store");
    db.run_migrations().await.expect("Error migrating the test store");
    db.close().await;
    debug!("🗃️ Test store ready at {url}");
}

/// A fresh store in the temp directory, so parallel tests never share a file.
pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/dd_test_store_{}.db", dir.display(), rand::random::<u64>())
}

async fn recreate_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        drop_database(url).await;
    }
    Sqlite::create_database(url).await.expect("Error creating the test store");
}

pub async fn drop_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🗃️ Could not drop the test store at {url}: {e:?}");
    }
}
