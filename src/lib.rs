pub mod catalog;
pub mod config;
pub mod editor;
pub mod graph;
pub mod layout;
pub mod measure;
pub mod model;
pub mod policy;
pub mod session;
pub mod snapshot;
pub mod suggestion;
pub mod workspace;

use wasm_bindgen::prelude::*;

use catalog::Catalog;
use config::EditorConfig;
use model::{Cardinality, ColumnRef, JoinType, Position, RelationshipDraft};
use session::EditorSession;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Editing session exposed to JavaScript. Structured values cross the
/// boundary as JSON strings; errors come back as their display text.
#[wasm_bindgen]
pub struct WasmSession {
    inner: EditorSession,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn column_ref(s: &str) -> Result<ColumnRef, String> {
    s.parse().map_err(|e: model::ColumnRefError| e.to_string())
}

fn shape(cardinality: &str, join_type: &str) -> Result<(Cardinality, JoinType), String> {
    let cardinality =
        Cardinality::from_str(cardinality).ok_or_else(|| format!("Invalid cardinality: {}", cardinality))?;
    let join_type = JoinType::from_str(join_type).ok_or_else(|| format!("Invalid join type: {}", join_type))?;
    Ok((cardinality, join_type))
}

#[wasm_bindgen]
impl WasmSession {
    /// `catalog` is a JSON array of connections; `config` an optional
    /// editor config document.
    #[wasm_bindgen(constructor)]
    pub fn new(catalog: &str, config: Option<String>) -> Result<WasmSession, String> {
        let catalog = Catalog::from_json(catalog).map_err(|e| e.to_string())?;
        let config = match config.as_deref() {
            Some(json) => EditorConfig::from_json(json).map_err(|e| e.to_string())?,
            None => EditorConfig::default(),
        };
        Ok(WasmSession {
            inner: EditorSession::new(catalog, config),
        })
    }

    #[wasm_bindgen(js_name = "addTables")]
    pub fn add_tables(&mut self, ids: Vec<String>) -> Result<usize, String> {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.inner.add_tables(&ids).map_err(|e| e.to_string())
    }

    /// Returns the removed relationships as JSON.
    #[wasm_bindgen(js_name = "removeTable")]
    pub fn remove_table(&mut self, id: &str) -> Result<String, String> {
        let removed = self.inner.remove_table(id).map_err(|e| e.to_string())?;
        to_json(&removed.relationships)
    }

    #[wasm_bindgen(js_name = "toggleTableActive")]
    pub fn toggle_table_active(&mut self, id: &str) -> Result<bool, String> {
        self.inner.toggle_table_active(id).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "toggleColumnActive")]
    pub fn toggle_column_active(&mut self, table_id: &str, column_id: &str) -> Result<bool, String> {
        self.inner
            .toggle_column_active(table_id, column_id)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "moveTable")]
    pub fn move_table(&mut self, id: &str, x: f64, y: f64) -> Result<(), String> {
        self.inner
            .move_table(id, Position::new(x, y))
            .map_err(|e| e.to_string())
    }

    /// Connect `table.column` refs; returns the new relationship id.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        cardinality: Option<String>,
        join_type: Option<String>,
    ) -> Result<String, String> {
        let (source, target) = (column_ref(source)?, column_ref(target)?);
        let config = self.inner.config();
        let (cardinality, join_type) = shape(
            cardinality.as_deref().unwrap_or(config.default_cardinality.as_str()),
            join_type.as_deref().unwrap_or(config.default_join_type.as_str()),
        )?;
        let draft = RelationshipDraft::new(source, target)
            .cardinality(cardinality)
            .join_type(join_type);
        self.inner.connect_with(draft).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "editRelationship")]
    pub fn edit_relationship(&mut self, id: &str, cardinality: &str, join_type: &str) -> Result<(), String> {
        let (cardinality, join_type) = shape(cardinality, join_type)?;
        self.inner
            .edit_relationship(id, cardinality, join_type)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "deleteRelationship")]
    pub fn delete_relationship(&mut self, id: &str) -> Result<(), String> {
        self.inner.delete_relationship(id).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "describeRelationship")]
    pub fn describe_relationship(&self, id: &str) -> Result<String, String> {
        let description = self.inner.describe_relationship(id).map_err(|e| e.to_string())?;
        to_json(&description)
    }

    #[wasm_bindgen(js_name = "relationshipSummary")]
    pub fn relationship_summary(&mut self, id: &str, max_cells: usize) -> Result<String, String> {
        self.inner
            .edge_editor()
            .summary(id, max_cells)
            .map_err(|e| e.to_string())
    }

    /// Lay out and move every table; returns the layout as JSON.
    #[wasm_bindgen(js_name = "autoLayout")]
    pub fn auto_layout(&mut self) -> Result<String, String> {
        to_json(&self.inner.auto_layout())
    }

    /// Feed a JSON array of suggestions; returns the ingest report.
    #[wasm_bindgen(js_name = "ingestSuggestions")]
    pub fn ingest_suggestions(&mut self, feed: &str) -> Result<String, String> {
        let report = self.inner.ingest_suggestions_json(feed).map_err(|e| e.to_string())?;
        to_json(&report)
    }

    #[wasm_bindgen(js_name = "pendingSuggestions")]
    pub fn pending_suggestions(&self) -> Result<String, String> {
        to_json(&self.inner.ledger().pending_by_confidence())
    }

    #[wasm_bindgen(js_name = "acceptSuggestion")]
    pub fn accept_suggestion(&mut self, id: &str) -> Result<String, String> {
        self.inner.accept_suggestion(id).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "rejectSuggestion")]
    pub fn reject_suggestion(&mut self, id: &str) -> Result<(), String> {
        self.inner.reject_suggestion(id).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "createWorkspace")]
    pub fn create_workspace(&mut self, name: &str, description: &str) -> String {
        self.inner.create_workspace(name, description)
    }

    #[wasm_bindgen(js_name = "addToWorkspace")]
    pub fn add_to_workspace(&mut self, workspace_id: &str, table_id: &str) -> Result<bool, String> {
        self.inner
            .add_to_workspace(workspace_id, table_id)
            .map_err(|e| e.to_string())
    }

    pub fn workspaces(&self) -> Result<String, String> {
        to_json(&self.inner.workspaces())
    }

    pub fn snapshot(&self) -> Result<String, String> {
        self.inner.snapshot().to_json().map_err(|e| e.to_string())
    }

    /// Replace the graph with a saved snapshot; returns the load report.
    pub fn restore(&mut self, snapshot: &str) -> Result<String, String> {
        let report = self.inner.restore_json(snapshot).map_err(|e| e.to_string())?;
        to_json(&report)
    }
}
