use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashSet;
use std::fmt;

use crate::database::schema::CatalogTable;

/// Known legacy spellings (normalized form) for registry column names.
/// Old databases named these columns before the schema settled.
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("manifest_id", &["manifest"]),
    ("md5", &["md5sum", "md5hash"]),
    ("crack_type", &["crack"]),
];

/// Read a table's actual columns from the database metadata, in declared order.
/// Column name sits at index 1 of each PRAGMA table_info row.
pub fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table_name))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// What reconciliation did to one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Actual columns already match the registry exactly
    UpToDate,
    /// Table had extra columns; missing registry columns were added in place
    PatchedInPlace { columns_added: usize },
    /// Table was rebuilt via rename-create-copy-drop
    Rebuilt {
        rows_copied: usize,
        columns_mapped: usize,
        columns_unmatched: usize,
    },
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::UpToDate => write!(f, "up to date"),
            ReconcileOutcome::PatchedInPlace { columns_added } => {
                write!(f, "patched in place ({} columns added)", columns_added)
            }
            ReconcileOutcome::Rebuilt {
                rows_copied,
                columns_mapped,
                columns_unmatched,
            } => write!(
                f,
                "rebuilt ({} rows copied, {} columns mapped, {} left empty)",
                rows_copied, columns_mapped, columns_unmatched
            ),
        }
    }
}

/// Bring one table in line with the registry.
///
/// Exact match does nothing. If every registry column is already present the
/// table is patched in place with ALTER TABLE ADD COLUMN (extra columns and all
/// rows are left untouched). Anything else triggers a full rebuild with
/// best-effort column mapping.
pub fn ensure_table_columns(conn: &Connection, table: CatalogTable) -> Result<ReconcileOutcome> {
    let existing = table_columns(conn, table.name())?;
    let existing_set: HashSet<&str> = existing.iter().map(String::as_str).collect();

    let expected: HashSet<&str> = table.columns().iter().map(|c| c.name).collect();
    let mut expected_full = expected.clone();
    expected_full.insert("id");

    if existing_set == expected_full {
        return Ok(ReconcileOutcome::UpToDate);
    }

    if expected.is_subset(&existing_set) {
        let mut columns_added = 0;
        for column in table.columns() {
            if existing_set.contains(column.name) {
                continue;
            }
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                table.name(),
                column.name,
                column.ty.as_sql()
            );
            match conn.execute(&sql, []) {
                Ok(_) => {
                    println!("Added missing column '{}' to table '{}'", column.name, table.name());
                    columns_added += 1;
                }
                Err(e) => {
                    eprintln!("Failed to add column {} to {}: {}", column.name, table.name(), e);
                }
            }
        }
        return Ok(ReconcileOutcome::PatchedInPlace { columns_added });
    }

    rebuild_table(conn, table, &existing)
}

/// Create all catalog tables that are missing, then reconcile each one.
/// A per-table failure is reported and the loop moves on; the database stays
/// usable with whatever shape the remaining tables have.
pub fn reconcile_all(conn: &Connection) {
    for table in CatalogTable::all() {
        match ensure_table_columns(conn, *table) {
            Ok(ReconcileOutcome::UpToDate) => {}
            Ok(outcome) => println!("Schema check for {}: {}", table.name(), outcome),
            Err(e) => eprintln!("Error during schema check for {}: {}", table.name(), e),
        }
    }
}

/// Recreate `table` with the registry shape and copy rows over with best-effort
/// column mapping. Runs inside an explicit transaction; on failure the rename is
/// rolled back and the original table is left as found.
fn rebuild_table(
    conn: &Connection,
    table: CatalogTable,
    existing: &[String],
) -> Result<ReconcileOutcome> {
    let temp_name = format!("{}_old_migrate", table.name());

    // foreign_keys cannot change inside a transaction
    conn.execute_batch("PRAGMA foreign_keys = OFF")?;

    let result = copy_into_rebuilt(conn, table, existing, &temp_name);
    if result.is_err() {
        let _ = conn.execute_batch("ROLLBACK");
    }
    let _ = conn.execute_batch("PRAGMA foreign_keys = ON");

    result
}

fn copy_into_rebuilt(
    conn: &Connection,
    table: CatalogTable,
    existing: &[String],
    temp_name: &str,
) -> Result<ReconcileOutcome> {
    conn.execute_batch("BEGIN")?;

    conn.execute(
        &format!("ALTER TABLE {} RENAME TO {}", table.name(), temp_name),
        [],
    )?;

    // Rebuilt tables carry no NOT NULL constraints so sparse legacy rows copy cleanly
    let column_sql: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("{} {}", c.name, c.ty.as_sql()))
        .collect();
    conn.execute(
        &format!(
            "CREATE TABLE {} (id INTEGER PRIMARY KEY AUTOINCREMENT, {})",
            table.name(),
            column_sql.join(", ")
        ),
        [],
    )?;

    // the old id column is carried separately below, never as a value source
    let candidates: Vec<String> = existing.iter().filter(|c| *c != "id").cloned().collect();

    let mut insert_columns = Vec::new();
    let mut select_exprs = Vec::new();
    let mut columns_mapped = 0;
    for column in table.columns() {
        insert_columns.push(column.name.to_string());
        match match_column(column.name, &candidates) {
            Some(source) => {
                columns_mapped += 1;
                // quote the source name in case it carries odd characters
                select_exprs.push(format!("\"{}\"", source));
            }
            None => select_exprs.push("NULL".to_string()),
        }
    }
    let columns_unmatched = insert_columns.len() - columns_mapped;

    // carry row ids over when the old table had them
    if existing.iter().any(|c| c == "id") {
        insert_columns.insert(0, "id".to_string());
        select_exprs.insert(0, "id".to_string());
    }

    let rows_copied = conn.execute(
        &format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            table.name(),
            insert_columns.join(", "),
            select_exprs.join(", "),
            temp_name
        ),
        [],
    )?;

    conn.execute(&format!("DROP TABLE {}", temp_name), [])?;
    conn.execute_batch("COMMIT")?;

    println!("Migrated table {} to expected schema", table.name());

    Ok(ReconcileOutcome::Rebuilt {
        rows_copied,
        columns_mapped,
        columns_unmatched,
    })
}

/// Find the old column an expected column should pull its values from.
/// Tries, in order: exact name, case-insensitive name, normalized name, known
/// legacy alias, then substring containment between normalized names. Existing
/// columns are scanned in declared order so the result is deterministic.
fn match_column(expected: &str, existing: &[String]) -> Option<String> {
    if existing.iter().any(|c| c == expected) {
        return Some(expected.to_string());
    }

    if let Some(column) = existing.iter().find(|c| c.eq_ignore_ascii_case(expected)) {
        return Some(column.clone());
    }

    let expected_norm = normalize(expected);
    if let Some(column) = existing.iter().find(|c| normalize(c) == expected_norm) {
        return Some(column.clone());
    }

    for alias in aliases_for(expected) {
        if let Some(column) = existing.iter().find(|c| normalize(c) == *alias) {
            return Some(column.clone());
        }
    }

    if !expected_norm.is_empty() {
        if let Some(column) = existing.iter().find(|c| {
            let norm = normalize(c);
            !norm.is_empty() && (norm.contains(&expected_norm) || expected_norm.contains(&norm))
        }) {
            return Some(column.clone());
        }
    }

    None
}

/// Lowercase alphanumerics only: "Manifest ID" and "manifest_id" both become
/// "manifestid".
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn aliases_for(expected: &str) -> &'static [&'static str] {
    COLUMN_ALIASES
        .iter()
        .find(|(name, _)| *name == expected)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn fresh_connection() -> Connection {
        Connection::open_in_memory().expect("open in-memory database")
    }

    fn create_registry_tables(conn: &Connection) {
        for table in CatalogTable::all() {
            conn.execute_batch(&table.create_sql()).expect("create table");
        }
    }

    #[test]
    fn normalize_strips_separators_and_case() {
        assert_eq!(normalize("Manifest ID"), "manifestid");
        assert_eq!(normalize("manifest_id"), "manifestid");
        assert_eq!(normalize("MD5-Sum"), "md5sum");
        assert_eq!(normalize("___"), "");
    }

    #[test]
    fn match_column_prefers_exact_over_fuzzy() {
        let existing = vec!["md5sum".to_string(), "md5".to_string()];
        assert_eq!(match_column("md5", &existing), Some("md5".to_string()));

        let existing = vec!["ManifestID".to_string()];
        assert_eq!(match_column("manifest_id", &existing), Some("ManifestID".to_string()));

        let existing = vec!["crack".to_string()];
        assert_eq!(match_column("crack_type", &existing), Some("crack".to_string()));

        let existing = vec!["unrelated".to_string()];
        assert_eq!(match_column("md5", &existing), None);
    }

    #[test]
    fn match_column_falls_back_to_substring() {
        // "descr" is a prefix fragment of "description" after normalization
        let existing = vec!["descr".to_string()];
        assert_eq!(match_column("description", &existing), Some("descr".to_string()));
    }

    #[test]
    fn fresh_schema_is_up_to_date() {
        let conn = fresh_connection();
        create_registry_tables(&conn);
        for table in CatalogTable::all() {
            assert_eq!(
                ensure_table_columns(&conn, *table).unwrap(),
                ReconcileOutcome::UpToDate
            );
        }
    }

    #[test]
    fn extra_columns_are_tolerated_in_place() {
        let conn = fresh_connection();
        conn.execute_batch(
            "CREATE TABLE tools (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                version TEXT,
                link TEXT,
                description TEXT,
                legacy_notes TEXT
            );
            INSERT INTO tools (name, version, legacy_notes) VALUES ('depot tool', '1.2', 'keep me');",
        )
        .unwrap();

        let outcome = ensure_table_columns(&conn, CatalogTable::Tools).unwrap();
        assert_eq!(outcome, ReconcileOutcome::PatchedInPlace { columns_added: 0 });

        // extra column and its data survive
        let notes: String = conn
            .query_row("SELECT legacy_notes FROM tools WHERE name = 'depot tool'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(notes, "keep me");
    }

    #[test]
    fn rebuild_maps_renamed_columns_and_keeps_ids() {
        let conn = fresh_connection();
        conn.execute_batch(
            "CREATE TABLE builds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                ManifestID TEXT,
                md5sum TEXT,
                junk_column TEXT
            );
            INSERT INTO builds (id, name, ManifestID, md5sum, junk_column)
            VALUES (7, 'Y1S1 build', '12345', 'abcdef', 'dropped');",
        )
        .unwrap();

        let outcome = ensure_table_columns(&conn, CatalogTable::Builds).unwrap();
        match outcome {
            ReconcileOutcome::Rebuilt {
                rows_copied,
                columns_mapped,
                columns_unmatched,
            } => {
                assert_eq!(rows_copied, 1);
                // name, manifest_id, md5 map; year/season/crack_type/link/description do not
                assert_eq!(columns_mapped, 3);
                assert_eq!(columns_unmatched, 5);
            }
            other => panic!("expected rebuild, got {:?}", other),
        }

        let columns = table_columns(&conn, "builds").unwrap();
        let expected: Vec<&str> = ["id", "name", "manifest_id", "year", "season", "crack_type", "link", "md5", "description"].to_vec();
        assert_eq!(columns, expected);

        let (id, manifest_id, md5, season): (i64, String, String, Option<String>) = conn
            .query_row(
                "SELECT id, manifest_id, md5, season FROM builds",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(id, 7);
        assert_eq!(manifest_id, "12345");
        assert_eq!(md5, "abcdef");
        assert_eq!(season, None);

        // second pass reports nothing left to do
        assert_eq!(
            ensure_table_columns(&conn, CatalogTable::Builds).unwrap(),
            ReconcileOutcome::UpToDate
        );
    }

    #[test]
    fn rebuild_without_id_column_assigns_fresh_ids() {
        let conn = fresh_connection();
        conn.execute_batch(
            "CREATE TABLE cheats (name TEXT, type TEXT);
             INSERT INTO cheats (name, type) VALUES ('wallhack', 'visual'), ('aim', 'input');",
        )
        .unwrap();

        ensure_table_columns(&conn, CatalogTable::Cheats).unwrap();

        let ids: Vec<i64> = conn
            .prepare("SELECT id FROM cheats ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn failed_rebuild_rolls_back_and_keeps_table() {
        let conn = fresh_connection();
        conn.execute_batch(
            "CREATE TABLE downloaders (name TEXT, source_url TEXT);
             INSERT INTO downloaders (name, source_url) VALUES ('aria2', 'https://example.test');
             CREATE TABLE downloaders_old_migrate (blocker INTEGER);",
        )
        .unwrap();

        // rename collides with the leftover temp table, so the rebuild must fail
        let result = ensure_table_columns(&conn, CatalogTable::Downloaders);
        assert!(result.is_err());

        let name: String = conn
            .query_row("SELECT name FROM downloaders", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "aria2");
        assert_eq!(
            table_columns(&conn, "downloaders").unwrap(),
            vec!["name".to_string(), "source_url".to_string()]
        );
    }

    #[test]
    fn reconcile_all_repairs_every_table() {
        let conn = fresh_connection();
        // one legacy table, the rest missing entirely
        conn.execute_batch("CREATE TABLE preserved (name TEXT, url TEXT)").unwrap();
        for table in CatalogTable::all() {
            conn.execute_batch(&table.create_sql()).unwrap();
        }

        reconcile_all(&conn);

        for table in CatalogTable::all() {
            assert_eq!(
                ensure_table_columns(&conn, *table).unwrap(),
                ReconcileOutcome::UpToDate,
                "table {} not reconciled",
                table.name()
            );
        }
    }
}
