use crate::model::{Cardinality, JoinType};
use crate::policy::GraphScope;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub scope: GraphScope,
    /// Used when an accepted suggestion carries no hint
    pub default_cardinality: Cardinality,
    pub default_join_type: JoinType,
    pub layout: LayoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            scope: GraphScope::Schema,
            default_cardinality: Cardinality::OneToMany,
            default_join_type: JoinType::Full,
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_gap_x: f64,
    pub layer_gap_y: f64,
    pub margin: f64,
    pub ordering_sweeps: usize,
    pub table_width: f64,
    pub header_height: f64,
    pub row_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_gap_x: 100.0,
            layer_gap_y: 80.0,
            margin: 40.0,
            ordering_sweeps: 8,
            table_width: 220.0,
            header_height: 36.0,
            row_height: 24.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_scope(mut self, scope: GraphScope) -> Self {
        self.scope = scope;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EditorConfig::from_json("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EditorConfig::from_json(
            r#"{"scope": "federation", "defaultJoinType": "INNER", "layout": {"nodeGapX": 60}}"#,
        )
        .unwrap();
        assert_eq!(config.scope, GraphScope::Federation);
        assert_eq!(config.default_join_type, JoinType::Inner);
        assert_eq!(config.default_cardinality, Cardinality::OneToMany);
        assert_eq!(config.layout.node_gap_x, 60.0);
        assert_eq!(config.layout.margin, 40.0);
    }

    #[test]
    fn test_unknown_scope_is_an_error() {
        assert!(EditorConfig::from_json(r#"{"scope": "mesh"}"#).is_err());
    }
}
