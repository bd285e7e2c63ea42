use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type TableId = String;
pub type ColumnId = String;
pub type RelationshipId = String;

/// A column addressed by its owning table.
///
/// On the wire it is the string `table.column`, split at the last dot so that
/// schema-qualified table ids such as `public.orders` survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    pub table_id: TableId,
    pub column_id: ColumnId,
}

impl ColumnRef {
    pub fn new(table_id: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            column_id: column_id.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table_id, self.column_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed column reference {0:?}, expected table.column")]
pub struct ColumnRefError(pub String);

impl FromStr for ColumnRef {
    type Err = ColumnRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().rsplit_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                Ok(Self::new(table, column))
            }
            _ => Err(ColumnRefError(s.to_string())),
        }
    }
}

impl Serialize for ColumnRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColumnRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[default]
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:N")]
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToMany => "N:N",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "1:1" => Some(Self::OneToOne),
            "1:N" => Some(Self::OneToMany),
            "N:N" | "N:M" => Some(Self::ManyToMany),
            _ => None,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    #[default]
    Full,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INNER" => Some(Self::Inner),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "FULL" | "FULL OUTER" => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a relationship came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Manual,
    Suggested,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: ColumnRef,
    pub target: ColumnRef,
    pub cardinality: Cardinality,
    pub join_type: JoinType,
    /// Cached at creation: endpoint tables belong to different connections.
    pub cross_connection: bool,
    #[serde(default)]
    pub provenance: Provenance,
}

impl Relationship {
    pub fn touches(&self, table_id: &str) -> bool {
        self.source.table_id == table_id || self.target.table_id == table_id
    }

    pub fn is_self_ref(&self) -> bool {
        self.source.table_id == self.target.table_id
    }
}

/// A relationship not yet admitted into a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDraft {
    pub source: ColumnRef,
    pub target: ColumnRef,
    pub cardinality: Cardinality,
    pub join_type: JoinType,
    pub provenance: Provenance,
    /// Reuse this id instead of minting one (snapshot rehydration).
    pub id: Option<RelationshipId>,
}

impl RelationshipDraft {
    pub fn new(source: ColumnRef, target: ColumnRef) -> Self {
        Self {
            source,
            target,
            cardinality: Cardinality::default(),
            join_type: JoinType::default(),
            provenance: Provenance::Manual,
            id: None,
        }
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ref_parse() {
        let r: ColumnRef = "medical_records.id".parse().unwrap();
        assert_eq!(r.table_id, "medical_records");
        assert_eq!(r.column_id, "id");
    }

    #[test]
    fn test_column_ref_schema_qualified_table() {
        let r: ColumnRef = "public.orders.customer_id".parse().unwrap();
        assert_eq!(r.table_id, "public.orders");
        assert_eq!(r.column_id, "customer_id");
    }

    #[test]
    fn test_column_ref_malformed() {
        assert!("orders".parse::<ColumnRef>().is_err());
        assert!(".id".parse::<ColumnRef>().is_err());
        assert!("orders.".parse::<ColumnRef>().is_err());
    }

    #[test]
    fn test_wire_strings() {
        let json = serde_json::to_string(&(Cardinality::OneToMany, JoinType::Full)).unwrap();
        assert_eq!(json, r#"["1:N","FULL"]"#);
        let back: (Cardinality, JoinType) = serde_json::from_str(r#"["N:N","LEFT"]"#).unwrap();
        assert_eq!(back, (Cardinality::ManyToMany, JoinType::Left));
        assert!(serde_json::from_str::<Cardinality>(r#""1:M""#).is_err());
    }

    #[test]
    fn test_lenient_from_str() {
        assert_eq!(Cardinality::from_str("n:m"), Some(Cardinality::ManyToMany));
        assert_eq!(JoinType::from_str("inner"), Some(JoinType::Inner));
        assert_eq!(JoinType::from_str("cross"), None);
    }
}
