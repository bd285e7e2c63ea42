use crate::catalog::{CatalogError, TableDescriptor};
use crate::model::{
    Cardinality, ColumnRef, JoinType, Position, Relationship, RelationshipDraft, RelationshipId,
    TableId,
};
use crate::policy::{ConnectionPolicy, GraphScope, ProposedEdge, Verdict};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Invalid endpoint {reference}: {reason}")]
    InvalidEndpoint { reference: ColumnRef, reason: String },
    #[error("Policy violation: {0}")]
    PolicyViolation(String),
    #[error("Duplicate table id: {0}")]
    DuplicateTable(TableId),
    #[error("Duplicate column id {column} in table {table}")]
    DuplicateColumn { table: TableId, column: String },
    #[error("Duplicate relationship id: {0}")]
    DuplicateRelationship(RelationshipId),
    #[error("Unknown table: {0}")]
    UnknownTable(TableId),
    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: TableId, column: String },
    #[error("Unknown relationship: {0}")]
    UnknownRelationship(RelationshipId),
}

/// What `remove_table` took out of the graph.
#[derive(Debug, Clone, Serialize)]
pub struct RemovedTable {
    pub table: TableDescriptor,
    pub relationships: Vec<Relationship>,
}

/// Tables and relationships of one editing session.
///
/// Every mutator either applies completely or returns an error without
/// touching the graph.
#[derive(Debug)]
pub struct RelationshipGraph {
    policy: Box<dyn ConnectionPolicy>,
    /// Insertion order is preserved; layout tie-breaks rely on it.
    tables: Vec<TableDescriptor>,
    table_index: HashMap<TableId, usize>,
    relationships: Vec<Relationship>,
    relationship_index: HashMap<RelationshipId, usize>,
    /// Table id -> incident relationship ids (a self reference is listed once)
    adjacency: HashMap<TableId, Vec<RelationshipId>>,
    next_relationship: u64,
}

impl RelationshipGraph {
    pub fn new(policy: Box<dyn ConnectionPolicy>) -> Self {
        Self {
            policy,
            tables: Vec::new(),
            table_index: HashMap::new(),
            relationships: Vec::new(),
            relationship_index: HashMap::new(),
            adjacency: HashMap::new(),
            next_relationship: 1,
        }
    }

    pub fn with_scope(scope: GraphScope) -> Self {
        Self::new(scope.policy())
    }

    pub fn scope(&self) -> GraphScope {
        self.policy.scope()
    }

    /// Never mint a relationship id below `rel-{next}`. Used when a graph
    /// replaces another whose ids may still be referenced elsewhere.
    pub fn reserve_ids_from(&mut self, next: u64) {
        self.next_relationship = self.next_relationship.max(next);
    }

    pub fn next_id_seq(&self) -> u64 {
        self.next_relationship
    }

    // ---- tables ----------------------------------------------------------

    pub fn add_table(&mut self, table: TableDescriptor) -> Result<(), GraphError> {
        if self.table_index.contains_key(&table.id) {
            return Err(GraphError::DuplicateTable(table.id));
        }
        if let Err(CatalogError::DuplicateColumn { table, column }) = table.check_columns() {
            return Err(GraphError::DuplicateColumn { table, column });
        }

        tracing::debug!(table = %table.id, connection = %table.connection_id, "table added");
        self.table_index.insert(table.id.clone(), self.tables.len());
        self.adjacency.insert(table.id.clone(), Vec::new());
        self.tables.push(table);
        Ok(())
    }

    /// Remove a table together with every relationship touching it.
    pub fn remove_table(&mut self, id: &str) -> Result<RemovedTable, GraphError> {
        let idx = *self
            .table_index
            .get(id)
            .ok_or_else(|| GraphError::UnknownTable(id.to_string()))?;

        let incident = self.adjacency.remove(id).unwrap_or_default();
        let mut removed = Vec::with_capacity(incident.len());
        for rel_id in &incident {
            if let Some(rel) = self.detach_relationship(rel_id) {
                removed.push(rel);
            }
        }

        let table = self.tables.remove(idx);
        self.reindex_tables();

        tracing::info!(
            table = %table.id,
            cascaded = removed.len(),
            "table removed"
        );
        Ok(RemovedTable {
            table,
            relationships: removed,
        })
    }

    /// Flip a table's active flag; its columns follow.
    ///
    /// Incident relationships stay in the graph and become dormant.
    pub fn toggle_table_active(&mut self, id: &str) -> Result<bool, GraphError> {
        let table = self.table_mut(id)?;
        table.active = !table.active;
        let active = table.active;
        for column in &mut table.columns {
            column.active = active;
        }
        tracing::debug!(table = %id, active, "table toggled");
        Ok(active)
    }

    pub fn toggle_column_active(&mut self, table_id: &str, column_id: &str) -> Result<bool, GraphError> {
        let table = self.table_mut(table_id)?;
        let column = table
            .column_mut(column_id)
            .ok_or_else(|| GraphError::UnknownColumn {
                table: table_id.to_string(),
                column: column_id.to_string(),
            })?;
        column.active = !column.active;
        tracing::debug!(table = %table_id, column = %column_id, active = column.active, "column toggled");
        Ok(column.active)
    }

    pub fn move_table(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        self.table_mut(id)?.position = position;
        Ok(())
    }

    // ---- relationships ---------------------------------------------------

    /// Admit a relationship after endpoint resolution and the policy check.
    pub fn add_relationship(&mut self, draft: RelationshipDraft) -> Result<RelationshipId, GraphError> {
        let source_table = self.resolve_endpoint(&draft.source)?;
        let target_table = self.resolve_endpoint(&draft.target)?;

        let edge = ProposedEdge {
            source: &draft.source,
            target: &draft.target,
            source_table,
            target_table,
        };
        if let Verdict::Reject(reason) = self.policy.evaluate(&edge, self) {
            tracing::warn!(
                source = %draft.source,
                target = %draft.target,
                scope = %self.scope(),
                %reason,
                "relationship rejected by policy"
            );
            return Err(GraphError::PolicyViolation(reason));
        }
        let cross_connection = edge.crosses_connections();

        let id = match draft.id {
            Some(id) if self.relationship_index.contains_key(&id) => {
                return Err(GraphError::DuplicateRelationship(id));
            }
            Some(id) => id,
            None => self.mint_relationship_id(),
        };

        let relationship = Relationship {
            id: id.clone(),
            source: draft.source,
            target: draft.target,
            cardinality: draft.cardinality,
            join_type: draft.join_type,
            cross_connection,
            provenance: draft.provenance,
        };

        self.link(&relationship.source.table_id, &id);
        if !relationship.is_self_ref() {
            self.link(&relationship.target.table_id, &id);
        }
        self.relationship_index.insert(id.clone(), self.relationships.len());
        tracing::debug!(
            relationship = %id,
            source = %relationship.source,
            target = %relationship.target,
            cross_connection,
            "relationship added"
        );
        self.relationships.push(relationship);
        Ok(id)
    }

    pub fn update_relationship(
        &mut self,
        id: &str,
        cardinality: Cardinality,
        join_type: JoinType,
    ) -> Result<(), GraphError> {
        let idx = self.relationship_idx(id)?;
        let rel = &mut self.relationships[idx];
        rel.cardinality = cardinality;
        rel.join_type = join_type;
        tracing::debug!(relationship = %id, %cardinality, %join_type, "relationship updated");
        Ok(())
    }

    pub fn remove_relationship(&mut self, id: &str) -> Result<Relationship, GraphError> {
        let rel = self
            .detach_relationship(id)
            .ok_or_else(|| GraphError::UnknownRelationship(id.to_string()))?;
        tracing::debug!(relationship = %id, "relationship removed");
        Ok(rel)
    }

    // ---- queries ---------------------------------------------------------

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn table(&self, id: &str) -> Option<&TableDescriptor> {
        self.table_index.get(id).map(|&i| &self.tables[i])
    }

    pub fn contains_table(&self, id: &str) -> bool {
        self.table_index.contains_key(id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationship_index.get(id).map(|&i| &self.relationships[i])
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Relationships touching `table_id`, in insertion order.
    pub fn incident(&self, table_id: &str) -> Vec<&Relationship> {
        self.adjacency
            .get(table_id)
            .map(|ids| ids.iter().filter_map(|id| self.relationship(id)).collect())
            .unwrap_or_default()
    }

    /// In-degree plus out-degree.
    pub fn degree(&self, table_id: &str) -> usize {
        self.adjacency.get(table_id).map_or(0, Vec::len)
    }

    /// A relationship is dormant while any endpoint table or column is inactive.
    pub fn is_dormant(&self, relationship: &Relationship) -> bool {
        [&relationship.source, &relationship.target]
            .into_iter()
            .any(|r| !self.endpoint_active(r))
    }

    pub fn dormant_relationships(&self) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| self.is_dormant(r))
            .collect()
    }

    // ---- internals -------------------------------------------------------

    fn table_mut(&mut self, id: &str) -> Result<&mut TableDescriptor, GraphError> {
        match self.table_index.get(id) {
            Some(&i) => Ok(&mut self.tables[i]),
            None => Err(GraphError::UnknownTable(id.to_string())),
        }
    }

    fn relationship_idx(&self, id: &str) -> Result<usize, GraphError> {
        self.relationship_index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownRelationship(id.to_string()))
    }

    fn resolve_endpoint(&self, reference: &ColumnRef) -> Result<&TableDescriptor, GraphError> {
        let table = self
            .table(&reference.table_id)
            .ok_or_else(|| GraphError::InvalidEndpoint {
                reference: reference.clone(),
                reason: format!("table {} is not in the graph", reference.table_id),
            })?;
        if !table.has_column(&reference.column_id) {
            return Err(GraphError::InvalidEndpoint {
                reference: reference.clone(),
                reason: format!(
                    "column {} does not belong to table {}",
                    reference.column_id, table.id
                ),
            });
        }
        Ok(table)
    }

    fn endpoint_active(&self, reference: &ColumnRef) -> bool {
        self.table(&reference.table_id)
            .filter(|t| t.active)
            .and_then(|t| t.column(&reference.column_id))
            .is_some_and(|c| c.active)
    }

    fn mint_relationship_id(&mut self) -> RelationshipId {
        loop {
            let id = format!("rel-{}", self.next_relationship);
            self.next_relationship += 1;
            if !self.relationship_index.contains_key(&id) {
                return id;
            }
        }
    }

    fn link(&mut self, table_id: &str, rel_id: &str) {
        self.adjacency
            .entry(table_id.to_string())
            .or_default()
            .push(rel_id.to_string());
    }

    /// Take a relationship out of the edge list, its index and the adjacency of
    /// both endpoint tables.
    fn detach_relationship(&mut self, id: &str) -> Option<Relationship> {
        let idx = self.relationship_index.remove(id)?;
        let rel = self.relationships.remove(idx);
        for (i, r) in self.relationships.iter().enumerate().skip(idx) {
            self.relationship_index.insert(r.id.clone(), i);
        }
        let other = if rel.source.table_id == rel.target.table_id {
            None
        } else {
            Some(&rel.target.table_id)
        };
        for table_id in std::iter::once(&rel.source.table_id).chain(other) {
            if let Some(ids) = self.adjacency.get_mut(table_id) {
                ids.retain(|r| r != id);
            }
        }
        Some(rel)
    }

    fn reindex_tables(&mut self) {
        self.table_index = self
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
    }
}
