//! Layout engine core implementation.

use crate::config::LayoutConfig;
use crate::graph::RelationshipGraph;
use crate::measure::TextMetrics;

use super::ordering::{build_layers, minimize_crossings};
use super::placement::place_nodes;
use super::rank::assign_ranks;
use super::types::{Layout, LayoutGraph};

/// Layout engine configuration and computation.
///
/// Holds no state between calls: the same graph always yields the same layout.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    pub(crate) metrics: TextMetrics,
    pub(crate) node_gap_x: f64,
    pub(crate) layer_gap_y: f64,
    pub(crate) margin: f64,
    pub(crate) ordering_sweeps: usize,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for LayoutEngine {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            metrics: TextMetrics {
                table_width: config.table_width,
                header_height: config.header_height,
                row_height: config.row_height,
                ..TextMetrics::default()
            },
            node_gap_x: config.node_gap_x,
            layer_gap_y: config.layer_gap_y,
            margin: config.margin,
            ordering_sweeps: config.ordering_sweeps,
        }
    }
}

impl LayoutEngine {
    /// Compute layout for the given graph. Does not move anything; see
    /// [`Layout::apply`].
    pub fn layout(&self, graph: &RelationshipGraph) -> Layout {
        let lg = LayoutGraph::from_graph(graph);

        // Phase 1: Ranking
        let ranks = assign_ranks(&lg);

        // Phase 2: Ordering
        let mut layers = build_layers(&ranks);
        let crossings = minimize_crossings(&mut layers, &lg, self.ordering_sweeps);

        // Phase 3: Coordinates
        let placement = place_nodes(
            &layers,
            &lg,
            &self.metrics,
            self.node_gap_x,
            self.layer_gap_y,
            self.margin,
        );

        tracing::debug!(
            tables = lg.ids.len(),
            layers = layers.len(),
            crossings,
            "layout computed"
        );

        Layout {
            nodes: placement.layout_nodes,
            width: placement.max_width,
            height: placement.total_height,
            crossings,
        }
    }
}
