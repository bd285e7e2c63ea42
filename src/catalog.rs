use crate::model::{ColumnId, Position, TableId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate connection id: {0}")]
    DuplicateConnection(String),
    #[error("Duplicate table id: {0}")]
    DuplicateTable(TableId),
    #[error("Duplicate column id {column} in table {table}")]
    DuplicateColumn { table: TableId, column: ColumnId },
    #[error("Table {table} claims connection {found} but is registered under {expected}")]
    ConnectionMismatch {
        table: TableId,
        expected: String,
        found: String,
    },
    #[error("Invalid catalog document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kind of data source behind a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceKind {
    #[default]
    Generic,
    PostgreSQL,
    MySQL,
    SqlServer,
    Oracle,
    Snowflake,
    BigQuery,
}

impl SourceKind {
    /// Parse source kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "generic" | "sql" => Some(Self::Generic),
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlserver" | "mssql" => Some(Self::SqlServer),
            "oracle" => Some(Self::Oracle),
            "snowflake" => Some(Self::Snowflake),
            "bigquery" => Some(Self::BigQuery),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SqlServer => "sqlserver",
            Self::Oracle => "oracle",
            Self::Snowflake => "snowflake",
            Self::BigQuery => "bigquery",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // Unknown engines are still usable connections.
        Ok(Self::from_str(&raw).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub id: TableId,
    pub name: String,
    pub connection_id: String,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub position: Position,
}

fn default_active() -> bool {
    true
}

impl TableDescriptor {
    pub fn column(&self, column_id: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut ColumnDescriptor> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }

    pub fn has_column(&self, column_id: &str) -> bool {
        self.column(column_id).is_some()
    }

    pub(crate) fn check_columns(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.id.as_str()) {
                return Err(CatalogError::DuplicateColumn {
                    table: self.id.clone(),
                    column: column.id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: String,
    pub display_name: String,
    pub color_tag: String,
    pub source_kind: SourceKind,
    pub tables: Vec<TableDescriptor>,
}

/// Externally supplied catalog document for one connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogInput {
    pub connection_id: String,
    pub display_name: String,
    #[serde(default)]
    pub color_tag: String,
    #[serde(default)]
    pub source_kind: SourceKind,
    pub tables: Vec<TableInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableInput {
    pub id: TableId,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInput {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl From<CatalogInput> for Connection {
    fn from(input: CatalogInput) -> Self {
        let connection_id = input.connection_id;
        let tables = input
            .tables
            .into_iter()
            .map(|t| TableDescriptor {
                id: t.id,
                name: t.name,
                connection_id: connection_id.clone(),
                columns: t
                    .columns
                    .into_iter()
                    .map(|c| ColumnDescriptor {
                        id: c.id,
                        name: c.name,
                        typ: c.typ,
                        is_primary_key: c.is_primary_key,
                        is_foreign_key: c.is_foreign_key,
                        active: true,
                        image_path: c.image_path,
                    })
                    .collect(),
                active: true,
                position: Position::default(),
            })
            .collect();

        Connection {
            id: connection_id,
            display_name: input.display_name,
            color_tag: input.color_tag,
            source_kind: input.source_kind,
            tables,
        }
    }
}

/// Read-mostly registry of every connection and the tables it exposes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    connections: Vec<Connection>,
    /// Table id -> (connection index, table index)
    table_index: HashMap<TableId, (usize, usize)>,
}

impl Catalog {
    pub fn from_inputs(inputs: Vec<CatalogInput>) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();
        for input in inputs {
            catalog.register(input.into())?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of catalog documents.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let inputs: Vec<CatalogInput> = serde_json::from_str(json)?;
        Self::from_inputs(inputs)
    }

    /// Register a connection; table ids must stay unique catalog-wide.
    pub fn register(&mut self, connection: Connection) -> Result<(), CatalogError> {
        if self.connection(&connection.id).is_some() {
            return Err(CatalogError::DuplicateConnection(connection.id));
        }

        let mut fresh = HashSet::new();
        for table in &connection.tables {
            if self.table_index.contains_key(&table.id) || !fresh.insert(table.id.as_str()) {
                return Err(CatalogError::DuplicateTable(table.id.clone()));
            }
            if table.connection_id != connection.id {
                return Err(CatalogError::ConnectionMismatch {
                    table: table.id.clone(),
                    expected: connection.id.clone(),
                    found: table.connection_id.clone(),
                });
            }
            table.check_columns()?;
        }

        let conn_idx = self.connections.len();
        for (table_idx, table) in connection.tables.iter().enumerate() {
            self.table_index
                .insert(table.id.clone(), (conn_idx, table_idx));
        }
        tracing::debug!(
            connection = %connection.id,
            tables = connection.tables.len(),
            "registered connection"
        );
        self.connections.push(connection);
        Ok(())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn table(&self, id: &str) -> Option<&TableDescriptor> {
        self.table_index
            .get(id)
            .map(|&(c, t)| &self.connections[c].tables[t])
    }

    pub fn connection_of(&self, table_id: &str) -> Option<&Connection> {
        self.table_index
            .get(table_id)
            .map(|&(c, _)| &self.connections[c])
    }

    pub fn contains_table(&self, id: &str) -> bool {
        self.table_index.contains_key(id)
    }

    pub fn table_count(&self) -> usize {
        self.table_index.len()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn column(id: &str, typ: &str, pk: bool, fk: bool) -> ColumnInput {
        ColumnInput {
            id: id.to_string(),
            name: id.to_string(),
            typ: typ.to_string(),
            is_primary_key: pk,
            is_foreign_key: fk,
            image_path: None,
        }
    }

    fn table(id: &str, columns: Vec<ColumnInput>) -> TableInput {
        TableInput {
            id: id.to_string(),
            name: id.to_string(),
            columns,
        }
    }

    /// `orders`/`customers` on PostgreSQL, `transactions`/`refunds` on MySQL.
    pub fn commerce() -> Catalog {
        Catalog::from_inputs(vec![
            CatalogInput {
                connection_id: "pg_sales".to_string(),
                display_name: "Sales (PostgreSQL)".to_string(),
                color_tag: "blue".to_string(),
                source_kind: SourceKind::PostgreSQL,
                tables: vec![
                    table(
                        "orders",
                        vec![
                            column("id", "int", true, false),
                            column("customer_id", "int", false, true),
                            column("total", "decimal", false, false),
                        ],
                    ),
                    table(
                        "customers",
                        vec![column("id", "int", true, false), column("email", "text", false, false)],
                    ),
                ],
            },
            CatalogInput {
                connection_id: "mysql_payments".to_string(),
                display_name: "Payments (MySQL)".to_string(),
                color_tag: "orange".to_string(),
                source_kind: SourceKind::MySQL,
                tables: vec![
                    table(
                        "transactions",
                        vec![
                            column("id", "bigint", true, false),
                            column("order_id", "int", false, true),
                            column("amount", "decimal", false, false),
                        ],
                    ),
                    table(
                        "refunds",
                        vec![
                            column("id", "bigint", true, false),
                            column("transaction_id", "bigint", false, true),
                        ],
                    ),
                ],
            },
        ])
        .unwrap()
    }

    /// A single clinical database.
    pub fn clinic() -> Catalog {
        Catalog::from_inputs(vec![CatalogInput {
            connection_id: "clinic_db".to_string(),
            display_name: "Clinic".to_string(),
            color_tag: "green".to_string(),
            source_kind: SourceKind::PostgreSQL,
            tables: vec![
                table(
                    "patients",
                    vec![column("id", "uuid", true, false), column("name", "text", false, false)],
                ),
                table(
                    "medical_records",
                    vec![
                        column("id", "uuid", true, false),
                        column("patient_id", "uuid", false, true),
                    ],
                ),
                table(
                    "prescriptions",
                    vec![
                        column("id", "uuid", true, false),
                        column("record_id", "uuid", false, true),
                    ],
                ),
                table(
                    "appointments",
                    vec![
                        column("id", "uuid", true, false),
                        column("patient_id", "uuid", false, true),
                    ],
                ),
            ],
        }])
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_aliases() {
        assert_eq!(SourceKind::from_str("Postgres"), Some(SourceKind::PostgreSQL));
        assert_eq!(SourceKind::from_str("mariadb"), Some(SourceKind::MySQL));
        assert_eq!(SourceKind::from_str("dbase"), None);
    }

    #[test]
    fn test_lookup_tables_across_connections() {
        let catalog = fixtures::commerce();
        assert_eq!(catalog.table_count(), 4);
        assert_eq!(catalog.table("transactions").unwrap().connection_id, "mysql_payments");
        assert_eq!(
            catalog.connection_of("orders").unwrap().source_kind,
            SourceKind::PostgreSQL
        );
        assert!(catalog.table("nope").is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{
            "connectionId": "wh",
            "displayName": "Warehouse",
            "colorTag": "purple",
            "sourceKind": "snowflake",
            "tables": [{"id": "events", "name": "events", "columns": [
                {"id": "id", "name": "id", "type": "int", "isPrimaryKey": true, "isForeignKey": false}
            ]}]
        }]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let table = catalog.table("events").unwrap();
        assert!(table.active);
        assert!(table.columns[0].is_primary_key);
        assert_eq!(catalog.connection("wh").unwrap().source_kind, SourceKind::Snowflake);
    }

    #[test]
    fn test_duplicate_table_across_connections() {
        let mut catalog = fixtures::commerce();
        let orders = catalog.table("orders").unwrap().clone();
        let err = catalog
            .register(Connection {
                id: "other".to_string(),
                display_name: "Other".to_string(),
                color_tag: String::new(),
                source_kind: SourceKind::Generic,
                tables: vec![orders],
            })
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateTable(id) if id == "orders"));
        assert_eq!(catalog.connections().len(), 2);
    }

    #[test]
    fn test_duplicate_column_within_table() {
        let json = r#"[{"connectionId": "c", "displayName": "C", "tables": [
            {"id": "t", "name": "t", "columns": [
                {"id": "a", "name": "a", "type": "int"},
                {"id": "a", "name": "a2", "type": "int"}
            ]}
        ]}]"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_table_must_belong_to_registering_connection() {
        let mut catalog = fixtures::commerce();
        let mut copy = catalog.table("orders").unwrap().clone();
        copy.id = "orders_archive".to_string();
        let err = catalog
            .register(Connection {
                id: "archive".to_string(),
                display_name: "Archive".to_string(),
                color_tag: String::new(),
                source_kind: SourceKind::Generic,
                tables: vec![copy],
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ConnectionMismatch { ref table, ref found, .. }
                if table == "orders_archive" && found == "pg_sales"
        ));
        assert!(!catalog.contains_table("orders_archive"));
    }
}
