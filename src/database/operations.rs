use anyhow::Result;
use rusqlite::{params_from_iter, Connection};
use std::fmt;

use crate::database::models::{CatalogEntry, RecordDraft};
use crate::database::reconcile;
use crate::database::schema::CatalogTable;

/// Generic CRUD over the catalog tables; all SQL is derived from the registry
pub struct CatalogOperations;

impl CatalogOperations {
    /// Insert a validated draft, returning the new row id.
    /// The reconciler gets a chance to repair the table first; a failed check is
    /// reported and the insert still runs so SQLite can raise the real error.
    pub fn insert(conn: &Connection, draft: &RecordDraft) -> Result<i64> {
        if let Err(e) = reconcile::ensure_table_columns(conn, draft.table) {
            eprintln!(
                "Schema check before insert failed for {}: {}",
                draft.table.name(),
                e
            );
        }

        let columns: Vec<&str> = draft.table.columns().iter().map(|c| c.name).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            draft.table.name(),
            columns.join(", "),
            placeholders.join(", ")
        );

        conn.execute(&sql, params_from_iter(draft.values.iter()))?;
        Ok(conn.last_insert_rowid())
    }

    /// All rows of one catalog in id order
    pub fn get_all(conn: &Connection, table: CatalogTable) -> Result<Vec<CatalogEntry>> {
        let columns: Vec<&str> = table.columns().iter().map(|c| c.name).collect();
        let column_count = columns.len();
        let sql = format!(
            "SELECT id, {} FROM {} ORDER BY id",
            columns.join(", "),
            table.name()
        );

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], |row| CatalogEntry::from_row(row, column_count))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Delete one row, reporting whether anything was removed
    pub fn delete_by_id(conn: &Connection, table: CatalogTable, id: i64) -> Result<bool> {
        let rows_affected = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", table.name()),
            [id],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn count(conn: &Connection, table: CatalogTable) -> Result<i64> {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Wipe every user table found in sqlite_master and reset the autoincrement
    /// counters. Per-table failures are reported and the sweep continues; the
    /// returned summary lists before/after counts for whatever was cleared.
    pub fn clear_all(conn: &Connection) -> Result<Vec<TableWipe>> {
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut summary = Vec::new();
        for table_name in tables {
            if table_name == "sqlite_sequence" {
                continue;
            }

            let before = count_rows(conn, &table_name);
            if let Err(e) = conn.execute(&format!("DELETE FROM \"{}\"", table_name), []) {
                eprintln!("Error deleting from {}: {}", table_name, e);
                continue;
            }
            let after = count_rows(conn, &table_name);

            summary.push(TableWipe {
                table: table_name,
                before,
                after,
            });
        }

        if let Err(e) = conn.execute("DELETE FROM sqlite_sequence", []) {
            eprintln!("Error resetting sqlite_sequence: {}", e);
        }

        Ok(summary)
    }
}

fn count_rows(conn: &Connection, table_name: &str) -> Option<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table_name), [], |row| {
        row.get(0)
    })
    .ok()
}

/// Before/after row counts for one table of a full wipe
#[derive(Debug)]
pub struct TableWipe {
    pub table: String,
    pub before: Option<i64>,
    pub after: Option<i64>,
}

impl fmt::Display for TableWipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.before, self.after) {
            (Some(before), Some(after)) => write!(f, "{}: {} -> {}", self.table, before, after),
            _ => write!(f, "{}: cleared", self.table),
        }
    }
}
