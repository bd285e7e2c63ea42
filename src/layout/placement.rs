//! Coordinate assignment from (layer, order).

use crate::measure::TextMetrics;

use super::types::{LayoutGraph, LayoutNode};

pub struct NodePlacement {
    pub layout_nodes: Vec<LayoutNode>,
    pub max_width: f64,
    pub total_height: f64,
}

/// Place layers top to bottom, nodes left to right, each layer centered on
/// the widest one.
pub fn place_nodes(
    layers: &[Vec<usize>],
    graph: &LayoutGraph,
    metrics: &TextMetrics,
    node_gap_x: f64,
    layer_gap_y: f64,
    margin: f64,
) -> NodePlacement {
    let sizes: Vec<(f64, f64)> = graph
        .column_counts
        .iter()
        .map(|&count| metrics.table_size(count))
        .collect();

    let widest = layers
        .iter()
        .map(|l| layer_width(l, &sizes, node_gap_x))
        .fold(0.0, f64::max);

    let mut layout_nodes = Vec::with_capacity(graph.ids.len());
    let mut y = margin;

    for (layer_idx, layer) in layers.iter().enumerate() {
        let mut x = margin + (widest - layer_width(layer, &sizes, node_gap_x)) / 2.0;
        let mut max_height: f64 = 0.0;

        for (order, &v) in layer.iter().enumerate() {
            let (w, h) = sizes[v];
            layout_nodes.push(LayoutNode {
                id: graph.ids[v].to_string(),
                x,
                y,
                width: w,
                height: h,
                layer: layer_idx,
                order,
            });
            x += w + node_gap_x;
            max_height = max_height.max(h);
        }

        y += max_height + layer_gap_y;
    }

    let total_height = if layers.is_empty() {
        0.0
    } else {
        y - layer_gap_y + margin
    };
    let max_width = if layers.is_empty() {
        0.0
    } else {
        widest + margin * 2.0
    };

    NodePlacement {
        layout_nodes,
        max_width,
        total_height,
    }
}

fn layer_width(layer: &[usize], sizes: &[(f64, f64)], node_gap_x: f64) -> f64 {
    let widths: f64 = layer.iter().map(|&v| sizes[v].0).sum();
    widths + layer.len().saturating_sub(1) as f64 * node_gap_x
}
