use crate::catalog::TableDescriptor;
use crate::graph::{GraphError, RelationshipGraph};
use crate::model::{Relationship, TableId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub table_ids: Vec<TableId>,
}

#[derive(Debug, Clone)]
pub struct WorkspaceView<'g> {
    pub tables: Vec<&'g TableDescriptor>,
    pub relationships: Vec<&'g Relationship>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            table_ids: Vec::new(),
        }
    }

    /// Add a graph table; returns false if it was already included.
    pub fn include_table(&mut self, graph: &RelationshipGraph, table_id: &str) -> Result<bool, GraphError> {
        if !graph.contains_table(table_id) {
            return Err(GraphError::UnknownTable(table_id.to_string()));
        }
        if self.contains(table_id) {
            return Ok(false);
        }
        self.table_ids.push(table_id.to_string());
        Ok(true)
    }

    pub fn exclude_table(&mut self, table_id: &str) -> bool {
        let before = self.table_ids.len();
        self.table_ids.retain(|id| id != table_id);
        self.table_ids.len() != before
    }

    pub fn contains(&self, table_id: &str) -> bool {
        self.table_ids.iter().any(|id| id == table_id)
    }

    /// Drop ids of tables that no longer exist in `graph`.
    pub fn prune(&mut self, graph: &RelationshipGraph) -> usize {
        let before = self.table_ids.len();
        self.table_ids.retain(|id| graph.contains_table(id));
        before - self.table_ids.len()
    }

    pub fn view<'g>(&self, graph: &'g RelationshipGraph) -> WorkspaceView<'g> {
        let tables = self
            .table_ids
            .iter()
            .filter_map(|id| graph.table(id))
            .collect();
        let relationships = graph
            .relationships()
            .iter()
            .filter(|r| self.contains(&r.source.table_id) && self.contains(&r.target.table_id))
            .collect();
        WorkspaceView {
            tables,
            relationships,
        }
    }

    /// Distinct connection ids of the included tables, in first-seen order.
    pub fn connections<'g>(&self, graph: &'g RelationshipGraph) -> Vec<&'g str> {
        let mut out: Vec<&str> = Vec::new();
        for table in self.table_ids.iter().filter_map(|id| graph.table(id)) {
            if !out.contains(&table.connection_id.as_str()) {
                out.push(&table.connection_id);
            }
        }
        out
    }

    pub fn is_cross_source(&self, graph: &RelationshipGraph) -> bool {
        self.connections(graph).len() > 1
    }
}
