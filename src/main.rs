// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

mod commands;
mod database;
mod settings;

/// Per-user application data directory
fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("buildvault")
}

fn database_path() -> PathBuf {
    app_data_dir().join("tracker.db")
}

pub fn settings_path() -> PathBuf {
    app_data_dir().join("settings.json")
}

fn main() {
    // a failed open is reported, not fatal; commands answer with a clear error
    // until an import or restart brings the database back
    if let Err(e) = database::init(database_path()) {
        eprintln!("Error initializing database: {}", e);
    }

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            commands::get_catalog_tabs,
            commands::get_table_headers,
            commands::get_form_fields,
            commands::get_settings,
            commands::list_themes,
            commands::set_theme,
            commands::export_database,
            commands::import_database,
            commands::backup_database,
            commands::restore_database_backup,
            database::commands::get_records,
            database::commands::add_record,
            database::commands::delete_record,
            database::commands::get_database_stats,
            database::commands::vacuum_database,
            database::commands::check_database_integrity,
            database::commands::clear_all_data,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
