//! Postgres pool construction and schema migration.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id    BIGSERIAL PRIMARY KEY,
        name  TEXT NULL,
        email TEXT NULL,
        notes TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id         BIGSERIAL PRIMARY KEY,
        contact_id BIGINT NOT NULL REFERENCES contacts (id),
        name       TEXT NULL,
        notes      TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS time_entries (
        id         BIGSERIAL PRIMARY KEY,
        project_id BIGINT NOT NULL REFERENCES projects (id),
        start_at   TIMESTAMPTZ NOT NULL,
        stop_at    TIMESTAMPTZ NULL,
        delta      BIGINT NULL,
        CONSTRAINT time_entries_stop_after_start CHECK (stop_at IS NULL OR stop_at >= start_at)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS projects_contact_id_idx ON projects (contact_id)",
    "CREATE INDEX IF NOT EXISTS time_entries_project_id_idx ON time_entries (project_id)",
];

/// Open a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Create the tables if they do not exist yet. Idempotent.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(statements = SCHEMA.len(), "schema migrated");
    Ok(())
}
