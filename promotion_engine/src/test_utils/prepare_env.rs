use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{db_types::ListingSummary, SqliteDatabase};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/lpg_test_store_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// A fresh, migrated database with a handful of listings:
///
/// | id | seller | status   |
/// |----|--------|----------|
/// | L1 | S1     | approved |
/// | L2 | S1     | approved |
/// | L3 | S2     | approved |
/// | L4 | S1     | pending  |
pub async fn seeded_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    let listings = [
        ("L1", "S1", "approved", "Toyota Vios 2020"),
        ("L2", "S1", "approved", "Honda City 2019"),
        ("L3", "S2", "approved", "Mazda 3 2021"),
        ("L4", "S1", "pending", "Kia Morning 2018"),
    ];
    for (id, seller, status, title) in listings {
        let listing = ListingSummary {
            id: id.into(),
            seller_id: seller.into(),
            status: status.to_string(),
            title: title.to_string(),
        };
        db.upsert_listing(listing).await.expect("Error inserting listing");
    }
    db
}
