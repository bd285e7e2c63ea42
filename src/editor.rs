use crate::catalog::Catalog;
use crate::graph::{GraphError, RelationshipGraph};
use crate::measure::fit_label;
use crate::model::{Cardinality, ColumnRef, JoinType, Provenance, Relationship};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointLabel {
    pub table_name: String,
    pub connection_name: String,
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescription {
    pub id: String,
    pub source: EndpointLabel,
    pub target: EndpointLabel,
    pub cardinality: Cardinality,
    pub join_type: JoinType,
    pub cross_connection: bool,
    pub provenance: Provenance,
    pub dormant: bool,
}

pub struct EdgeEditor<'a> {
    catalog: &'a Catalog,
    graph: &'a mut RelationshipGraph,
}

impl<'a> EdgeEditor<'a> {
    pub fn new(catalog: &'a Catalog, graph: &'a mut RelationshipGraph) -> Self {
        Self { catalog, graph }
    }

    pub fn describe(&self, id: &str) -> Result<EdgeDescription, GraphError> {
        describe(self.catalog, &*self.graph, id)
    }

    /// One-line label such as `orders.id → transactions.order_id (1:N, FULL)`,
    /// fitted to `max_cells` terminal cells.
    pub fn summary(&self, id: &str, max_cells: usize) -> Result<String, GraphError> {
        let d = self.describe(id)?;
        let text = format!(
            "{}.{} → {}.{} ({}, {})",
            d.source.table_name,
            d.source.column_name,
            d.target.table_name,
            d.target.column_name,
            d.cardinality,
            d.join_type
        );
        Ok(fit_label(&text, max_cells))
    }

    pub fn edit(&mut self, id: &str, cardinality: Cardinality, join_type: JoinType) -> Result<(), GraphError> {
        self.graph.update_relationship(id, cardinality, join_type)
    }

    pub fn delete(&mut self, id: &str) -> Result<Relationship, GraphError> {
        self.graph.remove_relationship(id)
    }
}

/// Resolve a relationship's endpoints into readable labels.
pub fn describe(catalog: &Catalog, graph: &RelationshipGraph, id: &str) -> Result<EdgeDescription, GraphError> {
    let rel = graph
        .relationship(id)
        .ok_or_else(|| GraphError::UnknownRelationship(id.to_string()))?;

    Ok(EdgeDescription {
        id: rel.id.clone(),
        source: endpoint_label(catalog, graph, &rel.source)?,
        target: endpoint_label(catalog, graph, &rel.target)?,
        cardinality: rel.cardinality,
        join_type: rel.join_type,
        cross_connection: rel.cross_connection,
        provenance: rel.provenance,
        dormant: graph.is_dormant(rel),
    })
}

fn endpoint_label(
    catalog: &Catalog,
    graph: &RelationshipGraph,
    reference: &ColumnRef,
) -> Result<EndpointLabel, GraphError> {
    let table = graph
        .table(&reference.table_id)
        .ok_or_else(|| GraphError::UnknownTable(reference.table_id.clone()))?;
    let column = table
        .column(&reference.column_id)
        .ok_or_else(|| GraphError::UnknownColumn {
            table: table.id.clone(),
            column: reference.column_id.clone(),
        })?;
    // Tables added outside the catalog fall back to their raw connection id.
    let connection_name = catalog
        .connection(&table.connection_id)
        .map(|c| c.display_name.clone())
        .unwrap_or_else(|| table.connection_id.clone());

    Ok(EndpointLabel {
        table_name: table.name.clone(),
        connection_name,
        column_name: column.name.clone(),
    })
}
