use anyhow::{anyhow, bail, Result};
use lazy_static::lazy_static;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub mod commands;
pub mod models;
pub mod operations;
pub mod reconcile;
pub mod schema;

use operations::CatalogOperations;
use schema::CatalogTable;

/// Database manager for SQLite operations
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl DatabaseManager {
    /// Open (creating if necessary) the database and bring every catalog table
    /// in line with the registry
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Self::open_connection(&db_path)?;
        Self::prepare_schema(&conn)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    fn open_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = 1000;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Ok(conn)
    }

    /// Create missing catalog tables, then reconcile each against the registry.
    /// Reconciliation failures are reported per table and never abort startup.
    fn prepare_schema(conn: &Connection) -> Result<()> {
        for table in CatalogTable::all() {
            conn.execute_batch(&table.create_sql())?;
        }
        reconcile::reconcile_all(conn);
        Ok(())
    }

    /// Get database file path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Fixed sibling path used by quick backup/restore
    pub fn backup_path(&self) -> PathBuf {
        sibling_path(&self.db_path, ".backup")
    }

    /// Execute a function with database connection
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection.lock().unwrap();
        f(&conn)
    }

    /// Row counts per catalog plus the database file size
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        self.with_connection(|conn| {
            let mut tables = Vec::with_capacity(CatalogTable::all().len());
            for table in CatalogTable::all() {
                tables.push(TableCount {
                    table: table.name().to_string(),
                    records: CatalogOperations::count(conn, *table)?,
                });
            }

            let file_size = fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);

            Ok(DatabaseStats {
                tables,
                file_size_bytes: file_size,
            })
        })
    }

    /// Vacuum database to reclaim space
    pub fn vacuum(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("VACUUM", [])?;
            Ok(())
        })
    }

    /// Check database integrity
    pub fn check_integrity(&self) -> Result<bool> {
        self.with_connection(|conn| {
            let result: String =
                conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
            Ok(result == "ok")
        })
    }

    /// Copy the database file to `dest`, appending `.db` when the chosen name
    /// lacks it. The WAL is flushed first so the copy is self-contained.
    pub fn export_to(&self, dest: &Path) -> Result<PathBuf> {
        let conn = self.connection.lock().unwrap();
        checkpoint(&conn)?;

        let dest = if has_db_extension(dest) {
            dest.to_path_buf()
        } else {
            sibling_path(dest, ".db")
        };
        fs::copy(&self.db_path, &dest)?;

        Ok(dest)
    }

    /// Quick backup beside the database file
    pub fn backup(&self) -> Result<PathBuf> {
        let conn = self.connection.lock().unwrap();
        checkpoint(&conn)?;

        let backup = self.backup_path();
        fs::copy(&self.db_path, &backup)?;
        Ok(backup)
    }

    pub fn restore_backup(&self) -> Result<()> {
        let backup = self.backup_path();
        if !backup.exists() {
            bail!("No backup file found");
        }
        self.import_from(&backup)
    }

    /// Replace the database file with `source` and reopen, re-running table
    /// creation and reconciliation so a foreign file is brought up to shape.
    /// A failed copy reopens the original file before the error is returned.
    pub fn import_from(&self, source: &Path) -> Result<()> {
        let mut conn = self.connection.lock().unwrap();

        // flush and release the current file before it gets overwritten
        checkpoint(&conn)?;
        let placeholder = Connection::open_in_memory()?;
        drop(std::mem::replace(&mut *conn, placeholder));
        let _ = fs::remove_file(sibling_path(&self.db_path, "-wal"));
        let _ = fs::remove_file(sibling_path(&self.db_path, "-shm"));

        let copy_result = fs::copy(source, &self.db_path);

        let fresh = Self::open_connection(&self.db_path)?;
        Self::prepare_schema(&fresh)?;
        *conn = fresh;

        copy_result?;
        Ok(())
    }
}

/// Truncate the WAL into the main database file
fn checkpoint(conn: &Connection) -> Result<()> {
    // returns a (busy, log, checkpointed) row; only failure matters here
    let _: i64 = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |row| row.get(0))?;
    Ok(())
}

fn has_db_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("db"))
        .unwrap_or(false)
}

/// Append a literal suffix to a path ("tracker.db" + ".backup")
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut joined = path.as_os_str().to_os_string();
    joined.push(suffix);
    PathBuf::from(joined)
}

/// Database statistics
#[derive(Debug)]
pub struct DatabaseStats {
    pub tables: Vec<TableCount>,
    pub file_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: String,
    pub records: i64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<String> = self
            .tables
            .iter()
            .map(|t| format!("{} {}", t.records, t.table))
            .collect();
        write!(
            f,
            "Database Stats: {}, {:.2} MB",
            counts.join(", "),
            self.file_size_bytes as f64 / 1024.0 / 1024.0
        )
    }
}

lazy_static! {
    static ref DATABASE: Mutex<Option<DatabaseManager>> = Mutex::new(None);
}

/// Open the application database and install it as the process-wide handle
pub fn init(db_path: PathBuf) -> Result<()> {
    println!("Initializing database at: {}", db_path.display());
    let manager = DatabaseManager::new(db_path)?;
    *DATABASE.lock().unwrap() = Some(manager);
    Ok(())
}

/// Run a closure against the installed database manager
pub fn with_database<T, F>(f: F) -> Result<T>
where
    F: FnOnce(&DatabaseManager) -> Result<T>,
{
    let guard = DATABASE.lock().unwrap();
    let manager = guard
        .as_ref()
        .ok_or_else(|| anyhow!("Database not initialized"))?;
    f(manager)
}
