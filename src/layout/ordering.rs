//! Ordering within layers via iterated barycenter sweeps.

use super::types::LayoutGraph;
use std::cmp::Ordering;

/// Bucket nodes by layer, each layer initially in insertion order.
pub fn build_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let Some(&max_rank) = ranks.iter().max() else {
        return vec![];
    };
    let mut layers = vec![Vec::new(); max_rank + 1];
    for (v, &r) in ranks.iter().enumerate() {
        layers[r].push(v);
    }
    layers
}

/// Average position of `node`'s neighbors inside `adjacent`, or its own
/// current slot when it has none there (so it keeps its place).
fn barycenter(node: usize, current_slot: usize, adjacent: &[usize], graph: &LayoutGraph) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &nb in &graph.neighbors[node] {
        if let Some(pos) = adjacent.iter().position(|&x| x == nb) {
            sum += pos as f64;
            count += 1;
        }
    }
    if count == 0 {
        current_slot as f64
    } else {
        sum / count as f64
    }
}

/// Reorder `layers[r]` against the fixed layer `layers[fixed]`.
fn sweep_layer(layers: &mut [Vec<usize>], graph: &LayoutGraph, r: usize, fixed: usize) {
    let adjacent = layers[fixed].clone();
    let mut scored: Vec<(usize, f64)> = layers[r]
        .iter()
        .enumerate()
        .map(|(slot, &v)| (v, barycenter(v, slot, &adjacent, graph)))
        .collect();

    // Stable: ties keep their current relative order.
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    layers[r] = scored.into_iter().map(|(v, _)| v).collect();
}

/// Count edge crossings between two adjacent layers.
fn count_crossings(upper: &[usize], lower: &[usize], graph: &LayoutGraph) -> usize {
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for (i, &u) in upper.iter().enumerate() {
        for &v in &graph.neighbors[u] {
            if let Some(j) = lower.iter().position(|&x| x == v) {
                edges.push((i, j));
            }
        }
    }

    // Brute force is fine at tens of tables.
    let mut crossings = 0;
    for i in 0..edges.len() {
        for j in (i + 1)..edges.len() {
            let (a1, b1) = edges[i];
            let (a2, b2) = edges[j];
            if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

pub fn total_crossings(layers: &[Vec<usize>], graph: &LayoutGraph) -> usize {
    layers
        .windows(2)
        .map(|pair| count_crossings(&pair[0], &pair[1], graph))
        .sum()
}

/// Alternate downward and upward sweeps, keeping the best ordering seen.
/// Stops after `max_sweeps` rounds or on the first round without improvement.
/// Returns the final crossing count.
pub fn minimize_crossings(
    layers: &mut Vec<Vec<usize>>,
    graph: &LayoutGraph,
    max_sweeps: usize,
) -> usize {
    let mut best = total_crossings(layers, graph);
    if layers.len() <= 1 || best == 0 {
        return best;
    }
    let mut best_layers = layers.clone();

    for _ in 0..max_sweeps {
        for r in 1..layers.len() {
            sweep_layer(layers, graph, r, r - 1);
        }
        for r in (0..layers.len() - 1).rev() {
            sweep_layer(layers, graph, r, r + 1);
        }

        let crossings = total_crossings(layers, graph);
        if crossings < best {
            best = crossings;
            best_layers = layers.clone();
            if best == 0 {
                break;
            }
        } else {
            break;
        }
    }

    *layers = best_layers;
    best
}
