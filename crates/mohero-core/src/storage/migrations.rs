//! Database schema migrations for mohero.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: accounts, catalog, profiles and per-exercise progress.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            token       TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL,
            expires_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id                 TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            name               TEXT NOT NULL,
            progress           TEXT NOT NULL DEFAULT '{}',
            current_program_id TEXT REFERENCES programmes(id),
            current_day        INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS programmes (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            duration_days INTEGER NOT NULL CHECK (duration_days >= 1),
            difficulty    TEXT NOT NULL,
            tags          TEXT NOT NULL DEFAULT '[]',
            image         TEXT
        );

        CREATE TABLE IF NOT EXISTS jours (
            id           TEXT PRIMARY KEY,
            programme_id TEXT NOT NULL REFERENCES programmes(id) ON DELETE CASCADE,
            day_number   INTEGER NOT NULL,
            title        TEXT NOT NULL,
            description  TEXT,
            UNIQUE (programme_id, day_number)
        );

        CREATE TABLE IF NOT EXISTS exercices (
            id           TEXT PRIMARY KEY,
            jour_id      TEXT NOT NULL REFERENCES jours(id) ON DELETE CASCADE,
            name         TEXT NOT NULL,
            description  TEXT,
            kind         TEXT NOT NULL,
            target_value INTEGER NOT NULL,
            ordering     INTEGER NOT NULL DEFAULT 0,
            media_urls   TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS progression_exercice (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            exercice_id    TEXT NOT NULL REFERENCES exercices(id) ON DELETE CASCADE,
            value_achieved INTEGER NOT NULL DEFAULT 0,
            completed      INTEGER NOT NULL DEFAULT 0,
            day_number     INTEGER NOT NULL,
            UNIQUE (user_id, exercice_id)
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
        CREATE INDEX IF NOT EXISTS idx_exercices_jour ON exercices(jour_id, ordering);
        CREATE INDEX IF NOT EXISTS idx_progression_user ON progression_exercice(user_id);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: cosmetic clan tag on profiles.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("ALTER TABLE profiles ADD COLUMN clan TEXT;")?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}
