#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::{Connection, params};

pub(super) const SCHEMA_VERSION: &str = "v1";

const SQL: &str = r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL UNIQUE,
          env_indicator_color TEXT NOT NULL DEFAULT 'blue',
          host TEXT NOT NULL,
          port INTEGER NOT NULL DEFAULT 9200,
          use_tls INTEGER NOT NULL DEFAULT 0 CHECK (use_tls IN (0, 1)),
          auth_method TEXT NOT NULL DEFAULT 'none',
          username TEXT,
          password TEXT,
          api_key TEXT,
          is_default INTEGER NOT NULL DEFAULT 0 CHECK (is_default IN (0, 1)),
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_profiles_single_default
          ON profiles(is_default) WHERE is_default = 1;

        CREATE TABLE IF NOT EXISTS collections (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          description TEXT,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS folders (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          parent_folder_id INTEGER REFERENCES folders(id),
          collection_id INTEGER NOT NULL REFERENCES collections(id),
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_folders_parent
          ON folders(collection_id, parent_folder_id);

        CREATE TABLE IF NOT EXISTS requests (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          method TEXT NOT NULL DEFAULT 'GET',
          url TEXT NOT NULL,
          body TEXT,
          description TEXT,
          folder_id INTEGER REFERENCES folders(id),
          collection_id INTEGER NOT NULL REFERENCES collections(id),
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_requests_folder
          ON requests(collection_id, folder_id);
"#;

pub(super) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}

pub(super) fn schema_version(conn: &Connection) -> Result<Option<String>, StoreError> {
    use rusqlite::OptionalExtension;

    Ok(conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?)
}
