use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use zeno_payment_engine::SqliteOrderStore;

/// A throwaway SQLite database in the system temp dir. One per test or scenario.
#[derive(Debug, Clone)]
pub struct TempDatabase {
    url: String,
}

impl TempDatabase {
    pub async fn create() -> Self {
        dotenvy::from_filename(".env.test").ok();
        let _ = env_logger::try_init();
        let url = format!("sqlite://{}/zpg_test_store_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
        if Sqlite::database_exists(&url).await.unwrap_or(false) {
            Sqlite::drop_database(&url).await.expect("Could not clear out stale test database");
        }
        Sqlite::create_database(&url).await.expect("Error creating test database");
        debug!("🧪️ Created test database {url}");
        Self { url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens a store on this database. Migrations run on first open.
    pub async fn open_store(&self, max_connections: u32) -> SqliteOrderStore {
        SqliteOrderStore::new_with_url(&self.url, max_connections).await.expect("Error opening test order store")
    }

    /// Closes `store` and deletes the database file.
    pub async fn remove(self, mut store: SqliteOrderStore) {
        store.close().await;
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🧪️ Could not remove test database {}: {e}", self.url);
        }
    }
}
