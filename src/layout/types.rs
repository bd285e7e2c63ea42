//! Data structures for layout computation.

use crate::graph::RelationshipGraph;
use crate::model::Position;
use serde::Serialize;
use std::collections::HashMap;

/// A positioned table in the layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub layer: usize,
    /// Position within the layer, left to right
    pub order: usize,
}

/// The complete layout result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub width: f64,
    pub height: f64,
    /// Edge crossings between adjacent layers after ordering
    pub crossings: usize,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.node(id).map(|n| Position::new(n.x, n.y))
    }

    /// Write computed positions back onto the graph's tables.
    /// Returns the number of tables moved.
    pub fn apply(&self, graph: &mut RelationshipGraph) -> usize {
        self.nodes
            .iter()
            .filter(|n| graph.move_table(&n.id, Position::new(n.x, n.y)).is_ok())
            .count()
    }
}

/// Index-based view of a graph used by the layout phases.
///
/// Node indices follow table insertion order; self references are dropped
/// and parallel relationships collapse into one edge.
pub struct LayoutGraph<'a> {
    pub ids: Vec<&'a str>,
    pub column_counts: Vec<usize>,
    /// Directed source -> target adjacency
    pub succ: Vec<Vec<usize>>,
    /// Undirected neighbors, for ordering
    pub neighbors: Vec<Vec<usize>>,
}

impl<'a> LayoutGraph<'a> {
    pub fn from_graph(graph: &'a RelationshipGraph) -> Self {
        let ids: Vec<&str> = graph.tables().iter().map(|t| t.id.as_str()).collect();
        let column_counts = graph.tables().iter().map(|t| t.columns.len()).collect();
        let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let n = ids.len();
        let mut succ = vec![Vec::new(); n];
        let mut neighbors = vec![Vec::new(); n];

        for rel in graph.relationships() {
            let (Some(&from), Some(&to)) = (
                index.get(rel.source.table_id.as_str()),
                index.get(rel.target.table_id.as_str()),
            ) else {
                continue;
            };
            if from == to || succ[from].contains(&to) {
                continue;
            }
            succ[from].push(to);
            if !neighbors[from].contains(&to) {
                neighbors[from].push(to);
                neighbors[to].push(from);
            }
        }

        Self {
            ids,
            column_counts,
            succ,
            neighbors,
        }
    }
}
