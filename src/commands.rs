// App-level Tauri commands: catalog metadata for the sidebar and forms, theme
// settings, and whole-file database transfer. The frontend drives its file
// pickers through the dialog plugin and hands plain paths to these commands.

use serde::Serialize;
use std::path::PathBuf;
use tauri::command;

use crate::database;
use crate::database::schema::{CatalogTable, FieldSpec};
use crate::settings::{self, AppSettings, ThemePalette};

/// Sidebar entry for one catalog
#[derive(Debug, Serialize)]
pub struct CatalogTab {
    pub name: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
}

#[command]
pub async fn get_catalog_tabs() -> Vec<CatalogTab> {
    CatalogTable::all()
        .iter()
        .map(|table| CatalogTab {
            name: table.name(),
            title: table.title(),
            icon: table.icon(),
        })
        .collect()
}

#[command]
pub async fn get_table_headers(table: String) -> Result<Vec<&'static str>, String> {
    let table = CatalogTable::from_name(&table)
        .ok_or_else(|| format!("Unknown catalog table: {}", table))?;
    Ok(table.headers())
}

#[command]
pub async fn get_form_fields(table: String) -> Result<Vec<FieldSpec>, String> {
    let table = CatalogTable::from_name(&table)
        .ok_or_else(|| format!("Unknown catalog table: {}", table))?;
    Ok(table.form_fields().to_vec())
}

#[command]
pub async fn get_settings() -> AppSettings {
    AppSettings::load(&crate::settings_path())
}

#[command]
pub async fn list_themes() -> Vec<ThemePalette> {
    settings::THEMES.to_vec()
}

#[command]
pub async fn set_theme(theme: String) -> Result<AppSettings, String> {
    if settings::theme_by_name(&theme).is_none() {
        return Err(format!("Unknown theme: {}", theme));
    }

    let path = crate::settings_path();
    let mut current = AppSettings::load(&path);
    current.theme = theme;
    current
        .save(&path)
        .map_err(|e| format!("Error saving theme setting: {}", e))?;

    Ok(current)
}

#[command]
pub async fn export_database(destination: String) -> Result<String, String> {
    let written = database::with_database(|db| db.export_to(&PathBuf::from(&destination)))
        .map_err(|e| format!("Export failed: {}", e))?;

    println!("Database exported to: {}", written.display());
    Ok(format!("Database exported to: {}", written.display()))
}

#[command]
pub async fn import_database(source: String) -> Result<String, String> {
    let source = PathBuf::from(source);
    if !source
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("db"))
        .unwrap_or(false)
    {
        return Err("Please select a .db file".to_string());
    }

    database::with_database(|db| db.import_from(&source))
        .map_err(|e| format!("Import failed: {}", e))?;

    Ok("Database imported successfully".to_string())
}

#[command]
pub async fn backup_database() -> Result<String, String> {
    let backup = database::with_database(|db| db.backup())
        .map_err(|e| format!("Export failed: {}", e))?;
    Ok(format!("Database exported to: {}", backup.display()))
}

#[command]
pub async fn restore_database_backup() -> Result<String, String> {
    database::with_database(|db| db.restore_backup()).map_err(|e| e.to_string())?;
    Ok("Database imported successfully".to_string())
}
