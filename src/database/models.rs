use anyhow::{bail, Result};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Result as SqliteResult, Row};
use serde::Serialize;
use std::collections::HashMap;

use crate::database::schema::{CatalogTable, FieldKind};

/// One catalog row as the frontend renders it.
/// `values` aligns with the table's registry columns (and headers); a missing
/// cell is None so the card view can skip it.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub values: Vec<Option<String>>,
}

impl CatalogEntry {
    /// Convert from a SQLite row selected as `id, <registry columns...>`
    pub fn from_row(row: &Row, column_count: usize) -> SqliteResult<Self> {
        let id: i64 = row.get(0)?;
        let mut values = Vec::with_capacity(column_count);
        for index in 0..column_count {
            values.push(display_value(row.get_ref(index + 1)?));
        }
        Ok(Self { id, values })
    }
}

fn display_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(r) => Some(r.to_string()),
        ValueRef::Text(text) => Some(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(_) => None,
    }
}

/// Validated form input, values bound in registry column order
#[derive(Debug)]
pub struct RecordDraft {
    pub table: CatalogTable,
    pub values: Vec<Value>,
}

impl RecordDraft {
    /// Build a draft from raw form values, validating against the field specs.
    /// Absent keys count as empty. Empty text stays an empty string; an empty
    /// numeric field becomes NULL. Error messages are user-facing.
    pub fn from_form(table: CatalogTable, form: &HashMap<String, String>) -> Result<Self> {
        let mut values = Vec::with_capacity(table.columns().len());

        for field in table.form_fields() {
            let raw = form.get(field.name).map(String::as_str).unwrap_or("");

            if field.required && raw.is_empty() {
                bail!("{} is required", field.label);
            }

            let value = match field.kind {
                FieldKind::Number => {
                    if raw.is_empty() {
                        Value::Null
                    } else {
                        match raw.trim().parse::<i64>() {
                            Ok(number) => Value::Integer(number),
                            Err(_) => bail!("{} must be a number", field.label),
                        }
                    }
                }
                FieldKind::Text | FieldKind::Multiline => Value::Text(raw.to_string()),
            };
            values.push(value);
        }

        Ok(Self { table, values })
    }
}
