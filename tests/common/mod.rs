use std::sync::Arc;

use magazzino_api::db::{run_migrations, DbPool};
use sea_orm::{ConnectOptions, Database};

/// Fresh in-memory SQLite database with all migrations applied. A single
/// connection keeps the in-memory database alive for the whole test.
pub async fn test_db() -> Arc<DbPool> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1);
    let db = Database::connect(opt)
        .await
        .expect("failed to open in-memory database");
    run_migrations(&db).await.expect("migrations failed");
    Arc::new(db)
}
