use crate::catalog::{Catalog, CatalogError};
use crate::config::EditorConfig;
use crate::editor::{EdgeDescription, EdgeEditor};
use crate::graph::{GraphError, RelationshipGraph, RemovedTable};
use crate::layout::{Layout, LayoutEngine};
use crate::model::{Cardinality, ColumnRef, JoinType, Position, RelationshipDraft, RelationshipId};
use crate::policy::GraphScope;
use crate::snapshot::{GraphSnapshot, LoadReport, SnapshotError};
use crate::suggestion::{IngestReport, LedgerError, SuggestionInput, SuggestionLedger};
use crate::workspace::{Workspace, WorkspaceView};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("Table {0} is not in the catalog")]
    NotInCatalog(String),
    #[error("Unknown workspace: {0}")]
    UnknownWorkspace(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    catalog: Catalog,
    graph: RelationshipGraph,
    ledger: SuggestionLedger,
    layout_engine: LayoutEngine,
    workspaces: Vec<Workspace>,
}

impl EditorSession {
    pub fn new(catalog: Catalog, config: EditorConfig) -> Self {
        tracing::info!(
            scope = %config.scope,
            connections = catalog.connections().len(),
            tables = catalog.table_count(),
            "session opened"
        );
        Self {
            graph: RelationshipGraph::with_scope(config.scope),
            ledger: SuggestionLedger::with_defaults(config.default_cardinality, config.default_join_type),
            layout_engine: LayoutEngine::from(&config.layout),
            workspaces: Vec::new(),
            catalog,
            config,
        }
    }

    pub fn scope(&self) -> GraphScope {
        self.graph.scope()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn ledger(&self) -> &SuggestionLedger {
        &self.ledger
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ---- tables ----------------------------------------------------------

    /// Add catalog tables by id. All ids are checked before any is added.
    #[instrument(skip(self))]
    pub fn add_tables(&mut self, ids: &[&str]) -> Result<usize, SessionError> {
        let mut tables = Vec::with_capacity(ids.len());
        for (i, &id) in ids.iter().enumerate() {
            let table = self
                .catalog
                .table(id)
                .ok_or_else(|| SessionError::NotInCatalog(id.to_string()))?;
            if self.graph.contains_table(id) || ids[..i].contains(&id) {
                return Err(GraphError::DuplicateTable(id.to_string()).into());
            }
            tables.push(table.clone());
        }

        let added = tables.len();
        for table in tables {
            self.graph.add_table(table)?;
        }
        Ok(added)
    }

    #[instrument(skip(self))]
    pub fn remove_table(&mut self, id: &str) -> Result<RemovedTable, SessionError> {
        let removed = self.graph.remove_table(id)?;
        for workspace in &mut self.workspaces {
            workspace.exclude_table(id);
        }
        Ok(removed)
    }

    pub fn toggle_table_active(&mut self, id: &str) -> Result<bool, SessionError> {
        Ok(self.graph.toggle_table_active(id)?)
    }

    pub fn toggle_column_active(&mut self, table_id: &str, column_id: &str) -> Result<bool, SessionError> {
        Ok(self.graph.toggle_column_active(table_id, column_id)?)
    }

    pub fn move_table(&mut self, id: &str, position: Position) -> Result<(), SessionError> {
        Ok(self.graph.move_table(id, position)?)
    }

    // ---- relationships ---------------------------------------------------

    /// Connect two columns with the configured default shape.
    #[instrument(skip(self, source, target), fields(source = %source, target = %target))]
    pub fn connect(&mut self, source: ColumnRef, target: ColumnRef) -> Result<RelationshipId, SessionError> {
        let draft = RelationshipDraft::new(source, target)
            .cardinality(self.config.default_cardinality)
            .join_type(self.config.default_join_type);
        Ok(self.graph.add_relationship(draft)?)
    }

    pub fn connect_with(&mut self, draft: RelationshipDraft) -> Result<RelationshipId, SessionError> {
        Ok(self.graph.add_relationship(draft)?)
    }

    pub fn describe_relationship(&self, id: &str) -> Result<EdgeDescription, SessionError> {
        Ok(crate::editor::describe(&self.catalog, &self.graph, id)?)
    }

    pub fn edit_relationship(
        &mut self,
        id: &str,
        cardinality: Cardinality,
        join_type: JoinType,
    ) -> Result<(), SessionError> {
        Ok(self.edge_editor().edit(id, cardinality, join_type)?)
    }

    pub fn delete_relationship(&mut self, id: &str) -> Result<(), SessionError> {
        self.edge_editor().delete(id)?;
        Ok(())
    }

    pub fn edge_editor(&mut self) -> EdgeEditor<'_> {
        EdgeEditor::new(&self.catalog, &mut self.graph)
    }

    // ---- layout ----------------------------------------------------------

    /// Compute a fresh layout and move every table to it.
    #[instrument(skip(self))]
    pub fn auto_layout(&mut self) -> Layout {
        let layout = self.layout_engine.layout(&self.graph);
        let moved = layout.apply(&mut self.graph);
        tracing::info!(moved, crossings = layout.crossings, "auto layout applied");
        layout
    }

    // ---- suggestions -----------------------------------------------------

    pub fn ingest_suggestions(&mut self, batch: Vec<SuggestionInput>) -> IngestReport {
        self.ledger.ingest(batch)
    }

    pub fn ingest_suggestions_json(&mut self, json: &str) -> Result<IngestReport, SessionError> {
        let batch: Vec<SuggestionInput> = serde_json::from_str(json)?;
        Ok(self.ingest_suggestions(batch))
    }

    #[instrument(skip(self))]
    pub fn accept_suggestion(&mut self, id: &str) -> Result<RelationshipId, SessionError> {
        Ok(self.ledger.accept(id, &mut self.graph)?)
    }

    #[instrument(skip(self))]
    pub fn reject_suggestion(&mut self, id: &str) -> Result<(), SessionError> {
        Ok(self.ledger.reject(id)?)
    }

    // ---- workspaces ------------------------------------------------------

    pub fn create_workspace(&mut self, name: &str, description: &str) -> String {
        let id = format!("ws-{}", self.workspaces.len() + 1);
        self.workspaces.push(Workspace::new(id.clone(), name, description));
        id
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn add_to_workspace(&mut self, workspace_id: &str, table_id: &str) -> Result<bool, SessionError> {
        let workspace = self
            .workspaces
            .iter_mut()
            .find(|w| w.id == workspace_id)
            .ok_or_else(|| SessionError::UnknownWorkspace(workspace_id.to_string()))?;
        Ok(workspace.include_table(&self.graph, table_id)?)
    }

    pub fn workspace_view(&self, workspace_id: &str) -> Result<WorkspaceView<'_>, SessionError> {
        self.workspaces
            .iter()
            .find(|w| w.id == workspace_id)
            .map(|w| w.view(&self.graph))
            .ok_or_else(|| SessionError::UnknownWorkspace(workspace_id.to_string()))
    }

    // ---- persistence -----------------------------------------------------

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.graph)
    }

    /// Replace the graph with `snapshot`, loading whatever still resolves.
    #[instrument(skip(self, snapshot))]
    pub fn restore(&mut self, snapshot: &GraphSnapshot) -> LoadReport {
        let (mut graph, report) = snapshot.rehydrate(&self.catalog, self.config.scope.policy());
        // Accepted suggestions may still name ids of deleted relationships.
        graph.reserve_ids_from(self.graph.next_id_seq());
        self.graph = graph;
        for workspace in &mut self.workspaces {
            workspace.prune(&self.graph);
        }
        report
    }

    pub fn restore_json(&mut self, json: &str) -> Result<LoadReport, SessionError> {
        let snapshot = GraphSnapshot::from_json(json)?;
        Ok(self.restore(&snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::suggestion::SuggestionState;

    fn col(s: &str) -> ColumnRef {
        s.parse().unwrap()
    }

    fn session(catalog: Catalog, scope: GraphScope) -> EditorSession {
        EditorSession::new(catalog, EditorConfig::default().with_scope(scope))
    }

    #[test]
    fn test_orders_transactions_under_federation() {
        let mut s = session(fixtures::commerce(), GraphScope::Federation);
        s.add_tables(&["orders", "transactions"]).unwrap();

        let id = s.connect(col("orders.id"), col("transactions.order_id")).unwrap();

        assert!(s.graph().relationship(&id).unwrap().cross_connection);
    }

    #[test]
    fn test_orders_transactions_under_schema() {
        let mut s = session(fixtures::commerce(), GraphScope::Schema);
        s.add_tables(&["orders", "transactions"]).unwrap();

        let err = s.connect(col("orders.id"), col("transactions.order_id")).unwrap_err();

        assert!(matches!(err, SessionError::Graph(GraphError::PolicyViolation(_))));
        assert_eq!(s.graph().relationship_count(), 0);
    }

    #[test]
    fn test_add_tables_is_all_or_nothing() {
        let mut s = session(fixtures::commerce(), GraphScope::Schema);
        let err = s.add_tables(&["orders", "invoices"]).unwrap_err();
        assert!(matches!(err, SessionError::NotInCatalog(id) if id == "invoices"));
        assert_eq!(s.graph().table_count(), 0);

        assert!(s.add_tables(&["orders", "orders"]).is_err());
        assert_eq!(s.graph().table_count(), 0);
        assert_eq!(s.add_tables(&["orders", "customers"]).unwrap(), 2);
    }

    #[test]
    fn test_accept_medical_records_suggestion() {
        let mut s = session(fixtures::clinic(), GraphScope::Schema);
        s.add_tables(&["patients", "medical_records", "prescriptions"]).unwrap();
        let report = s
            .ingest_suggestions_json(
                r#"[{"sourceRef": "medical_records.id", "targetRef": "prescriptions.record_id", "confidence": 0.98}]"#,
            )
            .unwrap();
        let id = &report.ids[0];

        let rel_id = s.accept_suggestion(id).unwrap();

        assert_eq!(s.graph().relationship_count(), 1);
        let rel = s.graph().relationship(&rel_id).unwrap();
        assert_eq!(rel.cardinality.as_str(), "1:N");
        assert_eq!(rel.join_type.as_str(), "FULL");
        assert!(s.ledger().pending().iter().all(|p| &p.id != id));
        assert!(s.ledger().accepted().iter().any(|a| &a.id == id));
    }

    #[test]
    fn test_reject_suggestion() {
        let mut s = session(fixtures::clinic(), GraphScope::Schema);
        s.add_tables(&["patients", "appointments"]).unwrap();
        let ids = s
            .ingest_suggestions(vec![SuggestionInput {
                source_ref: "patients.id".to_string(),
                target_ref: "appointments.patient_id".to_string(),
                confidence: 0.55,
                warning: Some("name match only".to_string()),
                hint: None,
            }])
            .ids;

        s.reject_suggestion(&ids[0]).unwrap();

        assert_eq!(s.graph().relationship_count(), 0);
        assert_eq!(s.ledger().get(&ids[0]).unwrap().state, SuggestionState::Rejected);
    }

    #[test]
    fn test_remove_patients_drops_two_relationships() {
        let mut s = session(fixtures::clinic(), GraphScope::Schema);
        s.add_tables(&["patients", "medical_records", "prescriptions", "appointments"])
            .unwrap();
        s.connect(col("patients.id"), col("medical_records.patient_id")).unwrap();
        s.connect(col("patients.id"), col("appointments.patient_id")).unwrap();
        s.connect(col("medical_records.id"), col("prescriptions.record_id")).unwrap();
        let ws = s.create_workspace("Care", "patient care tables");
        s.add_to_workspace(&ws, "patients").unwrap();

        let before = s.graph().relationship_count();
        s.remove_table("patients").unwrap();

        assert_eq!(s.graph().relationship_count(), before - 2);
        assert!(s.workspace_view(&ws).unwrap().tables.is_empty());
    }

    #[test]
    fn test_edit_and_delete_suggested_relationship() {
        let mut s = session(fixtures::clinic(), GraphScope::Schema);
        s.add_tables(&["medical_records", "prescriptions"]).unwrap();
        let ids = s
            .ingest_suggestions_json(
                r#"[{"sourceRef": "medical_records.id", "targetRef": "prescriptions.record_id", "confidence": 0.9}]"#,
            )
            .unwrap()
            .ids;
        let rel_id = s.accept_suggestion(&ids[0]).unwrap();

        s.edit_relationship(&rel_id, Cardinality::OneToOne, JoinType::Inner).unwrap();
        let d = s.describe_relationship(&rel_id).unwrap();
        assert_eq!((d.cardinality, d.join_type), (Cardinality::OneToOne, JoinType::Inner));

        s.delete_relationship(&rel_id).unwrap();
        assert_eq!(s.graph().relationship_count(), 0);
        assert_eq!(s.ledger().accepted().len(), 1);
    }

    #[test]
    fn test_auto_layout_is_idempotent() {
        let mut s = session(fixtures::clinic(), GraphScope::Schema);
        s.add_tables(&["patients", "medical_records", "prescriptions", "appointments"])
            .unwrap();
        s.connect(col("patients.id"), col("medical_records.patient_id")).unwrap();
        s.connect(col("medical_records.id"), col("prescriptions.record_id")).unwrap();

        let first = s.auto_layout();
        let positions: Vec<Position> = s.graph().tables().iter().map(|t| t.position).collect();
        let second = s.auto_layout();
        let again: Vec<Position> = s.graph().tables().iter().map(|t| t.position).collect();

        assert_eq!(first, second);
        assert_eq!(positions, again);
    }

    #[test]
    fn test_edits_do_not_move_tables() {
        let mut s = session(fixtures::clinic(), GraphScope::Schema);
        s.add_tables(&["patients", "appointments"]).unwrap();
        s.move_table("patients", Position::new(500.0, 10.0)).unwrap();
        s.connect(col("patients.id"), col("appointments.patient_id")).unwrap();
        assert_eq!(
            s.graph().table("patients").unwrap().position,
            Position::new(500.0, 10.0)
        );
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut s = session(fixtures::commerce(), GraphScope::Federation);
        s.add_tables(&["orders", "transactions"]).unwrap();
        s.connect(col("orders.id"), col("transactions.order_id")).unwrap();
        s.auto_layout();
        let json = s.snapshot().to_json().unwrap();

        let mut fresh = session(fixtures::commerce(), GraphScope::Federation);
        let report = fresh.restore_json(&json).unwrap();

        assert!(report.is_clean());
        assert_eq!(fresh.snapshot(), s.snapshot());
        let next = fresh.connect(col("transactions.id"), col("orders.id")).unwrap();
        assert_ne!(next, s.graph().relationships()[0].id);
    }

    #[test]
    fn test_restore_keeps_accepted_ids_unique() {
        let mut s = session(fixtures::clinic(), GraphScope::Schema);
        s.add_tables(&["patients", "medical_records", "prescriptions"]).unwrap();
        s.connect(col("patients.id"), col("medical_records.patient_id")).unwrap();
        let ids = s
            .ingest_suggestions_json(
                r#"[{"sourceRef": "medical_records.id", "targetRef": "prescriptions.record_id", "confidence": 0.9}]"#,
            )
            .unwrap()
            .ids;
        let accepted = s.accept_suggestion(&ids[0]).unwrap();
        s.delete_relationship(&accepted).unwrap();
        let snapshot = s.snapshot();

        let report = s.restore(&snapshot);
        let fresh = s.connect(col("patients.id"), col("prescriptions.id")).unwrap();

        assert!(report.is_clean());
        assert_ne!(fresh, accepted);
        assert_eq!(
            s.ledger().get(&ids[0]).unwrap().relationship_id.as_deref(),
            Some(accepted.as_str())
        );
        assert!(s.graph().relationship(&accepted).is_none());
    }
}
