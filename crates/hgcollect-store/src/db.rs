use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use hgcollect_types::{ErrorEvent, LogRecord, Results};

use crate::schema;
use crate::Result;

/// Durable sink for collection results.
///
/// The connection sits behind a single-slot gate: at most one persist body
/// executes its transaction at any instant, so writes from concurrent
/// workers are observably sequential.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database file and initialize the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::with_connection(Connection::open(db_path)?)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Write one repository's results in a single transaction.
    ///
    /// Commits only when at least one row was inserted; an entirely empty
    /// `Results` leaves the database untouched. Any insert failure rolls
    /// back the whole transaction, never half of it.
    pub fn persist(&self, results: &Results) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let tx = conn.transaction()?;

        let mut wrote = false;

        if !results.records.is_empty() {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO logs (ts, node_id, rev_id, parent_ids, author, tags, branch, diffstat, files, graph_node, repo_path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for r in &results.records {
                stmt.execute(params![
                    r.ts,
                    r.node_id,
                    r.rev_id,
                    r.parent_ids,
                    r.author,
                    r.tags,
                    r.branch,
                    r.diffstat,
                    r.files,
                    r.graph_node,
                    r.repo_path,
                ])?;
            }
            wrote = true;
        }

        if !results.events.is_empty() {
            let mut stmt =
                tx.prepare_cached("INSERT INTO errs (ts, err, repo_path) VALUES (?1, ?2, ?3)")?;
            for e in &results.events {
                stmt.execute(params![e.ts, e.message, e.repo_path])?;
            }
            wrote = true;
        }

        if wrote {
            tx.commit()?;
        }
        // Dropping an uncommitted transaction rolls it back.
        Ok(())
    }

    /// Records previously persisted for one repository, in insertion order.
    pub fn records_for_repo(&self, repo_path: &str) -> Result<Vec<LogRecord>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT ts, node_id, rev_id, parent_ids, author, tags, branch, diffstat, files, graph_node, repo_path
             FROM logs WHERE repo_path = ?1 ORDER BY rowid",
        )?;

        let records = stmt
            .query_map([repo_path], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Every persisted record across all repositories, in write order.
    pub fn all_records(&self) -> Result<Vec<LogRecord>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT ts, node_id, rev_id, parent_ids, author, tags, branch, diffstat, files, graph_node, repo_path
             FROM logs ORDER BY rowid",
        )?;

        let records = stmt
            .query_map([], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Error events previously persisted for one repository, in insertion order.
    pub fn errors_for_repo(&self, repo_path: &str) -> Result<Vec<ErrorEvent>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT ts, err, repo_path FROM errs WHERE repo_path = ?1 ORDER BY rowid",
        )?;

        let events = stmt
            .query_map([repo_path], |row| {
                Ok(ErrorEvent {
                    ts: row.get(0)?,
                    message: row.get(1)?,
                    repo_path: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    pub fn count_records(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM logs")
    }

    pub fn count_errors(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM errs")
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogRecord> {
    Ok(LogRecord {
        ts: row.get(0)?,
        node_id: row.get(1)?,
        rev_id: row.get(2)?,
        parent_ids: row.get(3)?,
        author: row.get(4)?,
        tags: row.get(5)?,
        branch: row.get(6)?,
        diffstat: row.get(7)?,
        files: row.get(8)?,
        graph_node: row.get(9)?,
        repo_path: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rev: &str, repo: &str) -> LogRecord {
        LogRecord {
            ts: "2022-06-10 23:43:47 +0000".to_string(),
            node_id: "71efee2949bd457bac92e3f21215a1bc310fd62f".to_string(),
            rev_id: rev.to_string(),
            parent_ids: String::new(),
            author: "Some User <some.user@email.com>".to_string(),
            tags: "tip".to_string(),
            branch: "default".to_string(),
            diffstat: "1: +1/-0".to_string(),
            files: "hi.txt".to_string(),
            graph_node: "@".to_string(),
            repo_path: repo.to_string(),
        }
    }

    fn event(message: &str, repo: &str) -> ErrorEvent {
        ErrorEvent {
            ts: "2022-06-13 03:33:33 +0000".to_string(),
            message: message.to_string(),
            repo_path: repo.to_string(),
        }
    }

    #[test]
    fn persist_commits_records() {
        let store = Store::open_in_memory().unwrap();
        let results = Results {
            records: vec![record("0", "/repos/a"), record("1", "/repos/a")],
            events: vec![],
        };

        store.persist(&results).unwrap();

        let got = store.records_for_repo("/repos/a").unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].rev_id, "0");
        assert_eq!(got[1].rev_id, "1");
        assert_eq!(store.count_errors().unwrap(), 0);
    }

    #[test]
    fn persist_commits_error_events() {
        let store = Store::open_in_memory().unwrap();
        let results = Results {
            records: vec![],
            events: vec![event("it broke", "/repos/b")],
        };

        store.persist(&results).unwrap();

        let got = store.errors_for_repo("/repos/b").unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].message, "it broke");
        assert_eq!(store.count_records().unwrap(), 0);
    }

    #[test]
    fn persist_keeps_records_and_events_partitioned() {
        let store = Store::open_in_memory().unwrap();
        let results = Results {
            records: vec![record("0", "/repos/c")],
            events: vec![event("partial failure", "/repos/c")],
        };

        store.persist(&results).unwrap();

        assert_eq!(store.count_records().unwrap(), 1);
        assert_eq!(store.count_errors().unwrap(), 1);
    }

    #[test]
    fn empty_results_are_a_no_op() {
        let store = Store::open_in_memory().unwrap();

        store.persist(&Results::default()).unwrap();

        assert_eq!(store.count_records().unwrap(), 0);
        assert_eq!(store.count_errors().unwrap(), 0);
    }

    #[test]
    fn free_text_fields_survive_round_trip_unescaped() {
        // Values with SQL delimiters must land verbatim via bound parameters.
        let store = Store::open_in_memory().unwrap();
        let mut rec = record("0", "/repos/d");
        rec.author = "O'Brien, \"Pat\" <pat@o'brien.example>".to_string();
        let results = Results {
            records: vec![rec.clone()],
            events: vec![event("error: can't open 'file'; quote=\"", "/repos/d")],
        };

        store.persist(&results).unwrap();

        assert_eq!(store.records_for_repo("/repos/d").unwrap()[0].author, rec.author);
        assert_eq!(
            store.errors_for_repo("/repos/d").unwrap()[0].message,
            "error: can't open 'file'; quote=\""
        );
    }

    #[test]
    fn schema_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("collect.db");

        {
            let store = Store::open(&db_path).unwrap();
            store
                .persist(&Results {
                    records: vec![record("0", "/repos/e")],
                    events: vec![],
                })
                .unwrap();
        }

        let store = Store::open(&db_path).unwrap();
        assert_eq!(store.count_records().unwrap(), 1);
    }
}
