use serde::Serialize;

/// SQLite storage class used by the catalog registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
}

impl ColumnType {
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
        }
    }
}

/// One column of a catalog table as the registry expects it
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// Input kind for the generated entry form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Multiline,
}

/// Form metadata for one catalog column, served to the frontend as-is
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

const BUILDS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "name", ty: ColumnType::Text },
    ColumnSpec { name: "manifest_id", ty: ColumnType::Text },
    ColumnSpec { name: "year", ty: ColumnType::Integer },
    ColumnSpec { name: "season", ty: ColumnType::Text },
    ColumnSpec { name: "crack_type", ty: ColumnType::Text },
    ColumnSpec { name: "link", ty: ColumnType::Text },
    ColumnSpec { name: "md5", ty: ColumnType::Text },
    ColumnSpec { name: "description", ty: ColumnType::Text },
];

const TOOLS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "name", ty: ColumnType::Text },
    ColumnSpec { name: "version", ty: ColumnType::Text },
    ColumnSpec { name: "link", ty: ColumnType::Text },
    ColumnSpec { name: "description", ty: ColumnType::Text },
];

const CHEATS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "name", ty: ColumnType::Text },
    ColumnSpec { name: "type", ty: ColumnType::Text },
    ColumnSpec { name: "link", ty: ColumnType::Text },
    ColumnSpec { name: "description", ty: ColumnType::Text },
];

const DOWNLOADERS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "name", ty: ColumnType::Text },
    ColumnSpec { name: "link", ty: ColumnType::Text },
    ColumnSpec { name: "description", ty: ColumnType::Text },
];

const PRESERVED_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "name", ty: ColumnType::Text },
    ColumnSpec { name: "link", ty: ColumnType::Text },
    ColumnSpec { name: "description", ty: ColumnType::Text },
];

const BUILDS_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "name", label: "Name", required: true, kind: FieldKind::Text },
    FieldSpec { name: "manifest_id", label: "ManifestID", required: false, kind: FieldKind::Text },
    FieldSpec { name: "year", label: "Year", required: false, kind: FieldKind::Number },
    FieldSpec { name: "season", label: "Season", required: false, kind: FieldKind::Text },
    FieldSpec { name: "crack_type", label: "CrackType", required: false, kind: FieldKind::Text },
    FieldSpec { name: "link", label: "Link", required: false, kind: FieldKind::Text },
    FieldSpec { name: "md5", label: "MD5", required: false, kind: FieldKind::Text },
    FieldSpec { name: "description", label: "Description", required: false, kind: FieldKind::Multiline },
];

const TOOLS_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "name", label: "Name", required: true, kind: FieldKind::Text },
    FieldSpec { name: "version", label: "Version", required: false, kind: FieldKind::Text },
    FieldSpec { name: "link", label: "Link", required: false, kind: FieldKind::Text },
    FieldSpec { name: "description", label: "Description", required: false, kind: FieldKind::Multiline },
];

const CHEATS_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "name", label: "Name", required: true, kind: FieldKind::Text },
    FieldSpec { name: "type", label: "Type", required: false, kind: FieldKind::Text },
    FieldSpec { name: "link", label: "Link", required: false, kind: FieldKind::Text },
    FieldSpec { name: "description", label: "Description", required: false, kind: FieldKind::Multiline },
];

const DOWNLOADERS_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "name", label: "Name", required: true, kind: FieldKind::Text },
    FieldSpec { name: "link", label: "Link", required: false, kind: FieldKind::Text },
    FieldSpec { name: "description", label: "Description", required: false, kind: FieldKind::Multiline },
];

const PRESERVED_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "name", label: "Name", required: true, kind: FieldKind::Text },
    FieldSpec { name: "link", label: "Link", required: false, kind: FieldKind::Text },
    FieldSpec { name: "description", label: "Description", required: false, kind: FieldKind::Multiline },
];

/// The five catalog tables the application manages.
/// Every piece of SQL in the crate is derived from this registry, so table and
/// column names never come from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Builds,
    Tools,
    Cheats,
    Downloaders,
    Preserved,
}

impl CatalogTable {
    pub fn all() -> &'static [CatalogTable] {
        &[
            CatalogTable::Builds,
            CatalogTable::Tools,
            CatalogTable::Cheats,
            CatalogTable::Downloaders,
            CatalogTable::Preserved,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            CatalogTable::Builds => "builds",
            CatalogTable::Tools => "tools",
            CatalogTable::Cheats => "cheats",
            CatalogTable::Downloaders => "downloaders",
            CatalogTable::Preserved => "preserved",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CatalogTable::all()
            .iter()
            .copied()
            .find(|table| table.name() == name)
    }

    /// Display title for the sidebar and content header
    pub fn title(self) -> &'static str {
        match self {
            CatalogTable::Builds => "Builds",
            CatalogTable::Tools => "Tools",
            CatalogTable::Cheats => "Cheats",
            CatalogTable::Downloaders => "Downloaders",
            CatalogTable::Preserved => "Preserved",
        }
    }

    /// Icon name the frontend maps to its icon set
    pub fn icon(self) -> &'static str {
        match self {
            CatalogTable::Builds => "build",
            CatalogTable::Tools => "construction",
            CatalogTable::Cheats => "security",
            CatalogTable::Downloaders => "download",
            CatalogTable::Preserved => "archive",
        }
    }

    /// Expected columns in declared order, id excluded
    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            CatalogTable::Builds => BUILDS_COLUMNS,
            CatalogTable::Tools => TOOLS_COLUMNS,
            CatalogTable::Cheats => CHEATS_COLUMNS,
            CatalogTable::Downloaders => DOWNLOADERS_COLUMNS,
            CatalogTable::Preserved => PRESERVED_COLUMNS,
        }
    }

    /// Form metadata, aligned 1:1 with `columns()`
    pub fn form_fields(self) -> &'static [FieldSpec] {
        match self {
            CatalogTable::Builds => BUILDS_FIELDS,
            CatalogTable::Tools => TOOLS_FIELDS,
            CatalogTable::Cheats => CHEATS_FIELDS,
            CatalogTable::Downloaders => DOWNLOADERS_FIELDS,
            CatalogTable::Preserved => PRESERVED_FIELDS,
        }
    }

    /// Column headers shown on entry cards
    pub fn headers(self) -> Vec<&'static str> {
        self.form_fields().iter().map(|field| field.label).collect()
    }

    /// CREATE TABLE IF NOT EXISTS statement for a fresh database.
    /// Required fields get NOT NULL here; reconciliation rebuilds tables without
    /// constraints so legacy rows with missing values survive the copy.
    pub fn create_sql(self) -> String {
        let mut columns = Vec::with_capacity(self.columns().len());
        for (column, field) in self.columns().iter().zip(self.form_fields()) {
            if field.required {
                columns.push(format!("{} {} NOT NULL", column.name, column.ty.as_sql()));
            } else {
                columns.push(format!("{} {}", column.name, column.ty.as_sql()));
            }
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, {})",
            self.name(),
            columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_all_catalogs() {
        assert_eq!(CatalogTable::all().len(), 5);
        for table in CatalogTable::all() {
            assert_eq!(CatalogTable::from_name(table.name()), Some(*table));
        }
        assert_eq!(CatalogTable::from_name("no_such_table"), None);
    }

    #[test]
    fn builds_has_full_shape() {
        let columns = CatalogTable::Builds.columns();
        assert_eq!(columns.len(), 8);
        assert_eq!(columns[1].name, "manifest_id");
        assert_eq!(columns[2].name, "year");
        assert_eq!(columns[2].ty, ColumnType::Integer);
    }

    #[test]
    fn form_fields_align_with_columns() {
        for table in CatalogTable::all() {
            let fields = table.form_fields();
            let columns = table.columns();
            assert_eq!(fields.len(), columns.len(), "misaligned registry for {}", table.name());
            for (field, column) in fields.iter().zip(columns) {
                assert_eq!(field.name, column.name);
            }
        }
    }

    #[test]
    fn only_name_is_required() {
        for table in CatalogTable::all() {
            for field in table.form_fields() {
                assert_eq!(field.required, field.name == "name");
            }
        }
    }

    #[test]
    fn create_sql_declares_primary_key() {
        for table in CatalogTable::all() {
            let sql = table.create_sql();
            assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS"));
            assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        }
        assert!(CatalogTable::Builds.create_sql().contains("name TEXT NOT NULL"));
        assert!(CatalogTable::Builds.create_sql().contains("year INTEGER"));
    }

    #[test]
    fn headers_match_labels() {
        assert_eq!(
            CatalogTable::Builds.headers(),
            vec!["Name", "ManifestID", "Year", "Season", "CrackType", "Link", "MD5", "Description"]
        );
        assert_eq!(CatalogTable::Preserved.headers(), vec!["Name", "Link", "Description"]);
    }
}
