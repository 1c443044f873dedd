//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for members and tasks.

mod members;
mod tasks;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::{Connection, Row};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use crate::models::MemberField;

/// Database repository for all data operations.
///
/// Every operation checks a connection out of the pool for the duration of
/// the call only.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    // Migrate on one connection, closed before the pool opens
    let mut conn = SqliteConnection::connect_with(&options).await?;
    run_migrations(&mut conn).await?;
    conn.close().await?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(&members_table_ddl()).execute(&mut *conn).await?;

    // Older databases may predate some columns
    let existing = table_columns(conn, "members").await?;
    for field in MemberField::ALL {
        if !existing.contains(field.column()) {
            tracing::info!("Adding missing members column {}", field.column());
            let ddl = format!("ALTER TABLE members ADD COLUMN {}", column_definition(*field));
            sqlx::query(&ddl).execute(&mut *conn).await?;
        }
    }
    if !existing.contains("updated_at") {
        sqlx::query("ALTER TABLE members ADD COLUMN updated_at TEXT")
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            task_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            due_date TEXT,
            priority TEXT NOT NULL DEFAULT 'Μεσαία',
            status TEXT NOT NULL DEFAULT 'Εκκρεμής',
            category TEXT,
            related_to TEXT,
            created_at TEXT NOT NULL,
            completed_at TEXT
        );
        "#,
    )
    .execute(&mut *conn)
    .await?;

    // Legacy task tables carry `assigned_to` instead of `related_to`
    let task_columns = table_columns(conn, "tasks").await?;
    if !task_columns.contains("related_to") {
        tracing::info!("Adding missing tasks column related_to");
        sqlx::query("ALTER TABLE tasks ADD COLUMN related_to TEXT")
            .execute(&mut *conn)
            .await?;
        if task_columns.contains("assigned_to") {
            sqlx::query("UPDATE tasks SET related_to = assigned_to")
                .execute(&mut *conn)
                .await?;
        }
    }

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_members_name ON members(last_name, first_name);
        CREATE INDEX IF NOT EXISTS idx_members_status ON members(member_status);
        CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);
        CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn table_columns(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<HashSet<String>, sqlx::Error> {
    let columns = sqlx::query(&format!("PRAGMA table_info({})", table))
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();
    Ok(columns)
}

fn members_table_ddl() -> String {
    let columns: Vec<String> = MemberField::ALL
        .iter()
        .map(|field| column_definition(*field))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS members (\n    member_id INTEGER PRIMARY KEY AUTOINCREMENT,\n    {},\n    updated_at TEXT\n)",
        columns.join(",\n    ")
    )
}

fn column_definition(field: MemberField) -> String {
    match field.default_value() {
        Some(default) => format!("{} TEXT DEFAULT '{}'", field.column(), default),
        None => format!("{} TEXT", field.column()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{Member, MemberChanges};

    /// Repository over a fresh database file; keep the `TempDir` alive.
    pub async fn temp_repository() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }

    pub async fn seed_member(repo: &Repository, fields: &[(MemberField, &str)]) -> Member {
        let changes = fields
            .iter()
            .fold(MemberChanges::new(), |changes, (field, value)| {
                changes.with(*field, *value)
            });
        repo.create_member(&changes)
            .await
            .expect("Failed to seed member")
    }
}
