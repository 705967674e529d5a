use crate::entities::{tokens, user_files, users};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, Statement};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", db_url);

    let db = connect(db_url).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn connect(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(db_url);

    // Every pooled connection to an in-memory SQLite database would see its own empty schema.
    if db_url.contains(":memory:") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(20).min_connections(1);
    }

    opt.connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    Ok(Database::connect(opt).await?)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🔄 Running schema migrations...");
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmts = vec![
        schema
            .create_table_from_entity(users::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(tokens::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(user_files::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        db.execute(builder.build(&stmt)).await?;
    }

    let indexes = [
        // (user, filename) uniqueness is enforced by the store, not only checked
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_user_files_user_filename ON user_files(user_id, filename);",
        "CREATE INDEX IF NOT EXISTS idx_user_files_uploaded_at ON user_files(user_id, uploaded_at);",
        "CREATE INDEX IF NOT EXISTS idx_tokens_expires_at ON tokens(expires_at);",
    ];

    for sql in indexes {
        db.execute(Statement::from_string(builder, sql.to_string()))
            .await?;
    }

    info!("✅ Schema ready");
    Ok(())
}
