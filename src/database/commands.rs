// Tauri commands for catalog CRUD and database maintenance.
// Everything crosses the boundary as Result<_, String>; the real errors live in
// the database module.

use serde::Serialize;
use std::collections::HashMap;
use tauri::command;

use crate::database::{self, TableCount};
use crate::database::models::{CatalogEntry, RecordDraft};
use crate::database::operations::CatalogOperations;
use crate::database::schema::CatalogTable;

fn resolve_table(name: &str) -> Result<CatalogTable, String> {
    CatalogTable::from_name(name).ok_or_else(|| format!("Unknown catalog table: {}", name))
}

#[command]
pub async fn get_records(table: String) -> Result<Vec<CatalogEntry>, String> {
    let table = resolve_table(&table)?;
    database::with_database(|db| db.with_connection(|conn| CatalogOperations::get_all(conn, table)))
        .map_err(|e| e.to_string())
}

#[command]
pub async fn add_record(table: String, values: HashMap<String, String>) -> Result<i64, String> {
    let table = resolve_table(&table)?;
    let draft = RecordDraft::from_form(table, &values).map_err(|e| e.to_string())?;
    database::with_database(|db| db.with_connection(|conn| CatalogOperations::insert(conn, &draft)))
        .map_err(|e| e.to_string())
}

#[command]
pub async fn delete_record(table: String, id: i64) -> Result<bool, String> {
    let table = resolve_table(&table)?;
    database::with_database(|db| {
        db.with_connection(|conn| CatalogOperations::delete_by_id(conn, table, id))
    })
    .map_err(|e| e.to_string())
}

/// Database statistics for frontend display
#[derive(Debug, Serialize)]
pub struct DatabaseStatsView {
    pub tables: Vec<TableCount>,
    pub file_size_mb: f64,
    pub database_exists: bool,
}

#[command]
pub async fn get_database_stats() -> Result<DatabaseStatsView, String> {
    let (stats, exists) = database::with_database(|db| {
        let stats = db.get_stats()?;
        Ok((stats, db.db_path().exists()))
    })
    .map_err(|e| e.to_string())?;

    Ok(DatabaseStatsView {
        tables: stats.tables,
        file_size_mb: stats.file_size_bytes as f64 / 1024.0 / 1024.0,
        database_exists: exists,
    })
}

#[command]
pub async fn vacuum_database() -> Result<String, String> {
    database::with_database(|db| db.vacuum()).map_err(|e| e.to_string())?;
    Ok("Database vacuum completed".to_string())
}

#[command]
pub async fn check_database_integrity() -> Result<bool, String> {
    database::with_database(|db| db.check_integrity()).map_err(|e| e.to_string())
}

#[command]
pub async fn clear_all_data() -> Result<String, String> {
    let wipes = database::with_database(|db| {
        db.with_connection(|conn| CatalogOperations::clear_all(conn))
    })
    .map_err(|e| e.to_string())?;

    let summary = if wipes.is_empty() {
        "No user tables found".to_string()
    } else {
        wipes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("All data cleared: {}", summary);
    Ok(summary)
}
