use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// All columns are TEXT on purpose: records are raw hg output and the store
// is a transport layer, not an analytics schema.
pub(crate) fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != 0 && current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            ts TEXT NOT NULL,
            node_id TEXT NOT NULL,
            rev_id TEXT NOT NULL,
            parent_ids TEXT NOT NULL,
            author TEXT NOT NULL,
            tags TEXT NOT NULL,
            branch TEXT NOT NULL,
            diffstat TEXT NOT NULL,
            files TEXT NOT NULL,
            graph_node TEXT NOT NULL,
            repo_path TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS errs (
            ts TEXT NOT NULL,
            err TEXT NOT NULL,
            repo_path TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_logs_repo ON logs(repo_path);
        CREATE INDEX IF NOT EXISTS idx_errs_repo ON errs(repo_path);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS logs;
        DROP TABLE IF EXISTS errs;
        "#,
    )?;
    Ok(())
}
