use crate::catalog::{Catalog, TableDescriptor};
use crate::graph::{GraphError, RelationshipGraph};
use crate::model::{Relationship, RelationshipDraft};
use crate::policy::ConnectionPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub tables: Vec<TableDescriptor>,
    pub relationships: Vec<Relationship>,
}

/// Something in a snapshot that could not be brought back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LoadIssue {
    /// The table no longer exists in the catalog.
    #[serde(rename_all = "camelCase")]
    OrphanReference { table_id: String },
    /// An endpoint table was dropped earlier in the load.
    #[serde(rename_all = "camelCase")]
    DanglingRelationship { relationship_id: String },
    /// The graph refused the relationship (missing column, policy, duplicate id).
    #[serde(rename_all = "camelCase")]
    RejectedRelationship { relationship_id: String, reason: String },
    #[serde(rename_all = "camelCase")]
    RejectedTable { table_id: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub tables_loaded: usize,
    pub relationships_loaded: usize,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl GraphSnapshot {
    pub fn capture(graph: &RelationshipGraph) -> Self {
        Self {
            tables: graph.tables().to_vec(),
            relationships: graph.relationships().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild a graph under `policy`, loading everything that still resolves.
    ///
    /// Column metadata comes from the catalog; activity flags and positions
    /// come from the snapshot. Relationships go through the normal admission
    /// path, so the policy is enforced again and `cross_connection` is
    /// recomputed.
    pub fn rehydrate(
        &self,
        catalog: &Catalog,
        policy: Box<dyn ConnectionPolicy>,
    ) -> (RelationshipGraph, LoadReport) {
        let mut graph = RelationshipGraph::new(policy);
        let mut report = LoadReport::default();

        for saved in &self.tables {
            let Some(current) = catalog.table(&saved.id) else {
                tracing::warn!(table = %saved.id, "snapshot table missing from catalog");
                report.issues.push(LoadIssue::OrphanReference {
                    table_id: saved.id.clone(),
                });
                continue;
            };

            let mut table = current.clone();
            table.active = saved.active;
            table.position = saved.position;
            for column in &mut table.columns {
                if let Some(saved_column) = saved.column(&column.id) {
                    column.active = saved_column.active;
                }
            }

            match graph.add_table(table) {
                Ok(()) => report.tables_loaded += 1,
                Err(e) => report.issues.push(LoadIssue::RejectedTable {
                    table_id: saved.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        for rel in &self.relationships {
            if !graph.contains_table(&rel.source.table_id) || !graph.contains_table(&rel.target.table_id) {
                report.issues.push(LoadIssue::DanglingRelationship {
                    relationship_id: rel.id.clone(),
                });
                continue;
            }

            let draft = RelationshipDraft::new(rel.source.clone(), rel.target.clone())
                .cardinality(rel.cardinality)
                .join_type(rel.join_type)
                .provenance(rel.provenance)
                .with_id(rel.id.clone());
            match graph.add_relationship(draft) {
                Ok(_) => report.relationships_loaded += 1,
                Err(e) => {
                    let reason = match e {
                        GraphError::PolicyViolation(reason) => reason,
                        other => other.to_string(),
                    };
                    report.issues.push(LoadIssue::RejectedRelationship {
                        relationship_id: rel.id.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            tables = report.tables_loaded,
            relationships = report.relationships_loaded,
            issues = report.issues.len(),
            "snapshot rehydrated"
        );
        (graph, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::model::{Cardinality, JoinType, Position, Provenance};
    use crate::policy::GraphScope;

    fn federation_graph() -> RelationshipGraph {
        let catalog = fixtures::commerce();
        let mut graph = RelationshipGraph::with_scope(GraphScope::Federation);
        for id in ["orders", "customers", "transactions"] {
            graph.add_table(catalog.table(id).unwrap().clone()).unwrap();
        }
        graph
            .add_relationship(
                RelationshipDraft::new("orders.id".parse().unwrap(), "transactions.order_id".parse().unwrap())
                    .cardinality(Cardinality::OneToOne)
                    .join_type(JoinType::Left),
            )
            .unwrap();
        graph
            .add_relationship(
                RelationshipDraft::new("customers.id".parse().unwrap(), "transactions.id".parse().unwrap())
                    .provenance(Provenance::Suggested),
            )
            .unwrap();
        graph.move_table("orders", Position::new(10.0, 20.0)).unwrap();
        graph.toggle_column_active("customers", "email").unwrap();
        graph
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let graph = federation_graph();
        let json = GraphSnapshot::capture(&graph).to_json().unwrap();
        let snapshot = GraphSnapshot::from_json(&json).unwrap();

        let (restored, report) = snapshot.rehydrate(&fixtures::commerce(), GraphScope::Federation.policy());

        assert!(report.is_clean());
        assert_eq!(GraphSnapshot::capture(&restored), GraphSnapshot::capture(&graph));
        assert_eq!(restored.table("orders").unwrap().position, Position::new(10.0, 20.0));
        assert_eq!(restored.degree("transactions"), 2);
    }

    #[test]
    fn test_wire_shape() {
        let json = GraphSnapshot::capture(&federation_graph()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rel = &value["relationships"][0];
        assert_eq!(rel["cardinality"], "1:1");
        assert_eq!(rel["joinType"], "LEFT");
        assert_eq!(rel["crossConnection"], true);
        assert_eq!(rel["source"], "orders.id");
        assert_eq!(value["tables"][0]["position"]["x"], 10.0);
    }

    #[test]
    fn test_orphan_table_is_dropped_and_rest_loads() {
        let mut snapshot = GraphSnapshot::capture(&federation_graph());
        snapshot.tables[0].id = "archived_orders".to_string();
        snapshot.relationships[0].source.table_id = "archived_orders".to_string();

        let (graph, report) = snapshot.rehydrate(&fixtures::commerce(), GraphScope::Federation.policy());

        assert_eq!(graph.table_count(), 2);
        assert_eq!(graph.relationship_count(), 1);
        assert_eq!(
            report.issues,
            vec![
                LoadIssue::OrphanReference {
                    table_id: "archived_orders".to_string()
                },
                LoadIssue::DanglingRelationship {
                    relationship_id: "rel-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_policy_is_reapplied_on_load() {
        let snapshot = GraphSnapshot::capture(&federation_graph());
        let (graph, report) = snapshot.rehydrate(&fixtures::commerce(), GraphScope::Schema.policy());
        assert_eq!(graph.table_count(), 3);
        assert_eq!(graph.relationship_count(), 0);
        assert_eq!(report.issues.len(), 2);
        assert!(matches!(report.issues[0], LoadIssue::RejectedRelationship { .. }));
    }

    #[test]
    fn test_missing_column_rejects_relationship() {
        let mut snapshot = GraphSnapshot::capture(&federation_graph());
        snapshot.relationships[1].target.column_id = "legacy_id".to_string();
        let (graph, report) = snapshot.rehydrate(&fixtures::commerce(), GraphScope::Federation.policy());
        assert_eq!(graph.relationship_count(), 1);
        assert!(matches!(
            &report.issues[0],
            LoadIssue::RejectedRelationship { relationship_id, .. } if relationship_id == "rel-2"
        ));
    }

    #[test]
    fn test_issue_json_tag() {
        let issue = LoadIssue::OrphanReference {
            table_id: "t".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&issue).unwrap(),
            r#"{"kind":"orphanReference","tableId":"t"}"#
        );
    }
}
