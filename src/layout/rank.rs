//! Layer assignment by longest path from the sources.

use super::types::LayoutGraph;

/// Classify back-edges with a depth-first walk in insertion order and return
/// the binding (acyclic) successor lists.
///
/// An edge is non-binding when it points at a node still on the DFS stack.
/// Roots are tried in insertion order, so for a genuine cycle the table added
/// first ends up on top.
pub fn binding_edges(graph: &LayoutGraph) -> Vec<Vec<usize>> {
    const UNSEEN: u8 = 0;
    const ON_STACK: u8 = 1;
    const DONE: u8 = 2;

    let n = graph.ids.len();
    let mut state = vec![UNSEEN; n];
    let mut binding: Vec<Vec<usize>> = vec![Vec::new(); n];

    for root in 0..n {
        if state[root] != UNSEEN {
            continue;
        }
        // (node, next successor slot)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        state[root] = ON_STACK;

        while let Some(top) = stack.last_mut() {
            let u = top.0;
            if let Some(&v) = graph.succ[u].get(top.1) {
                top.1 += 1;
                match state[v] {
                    ON_STACK => {}
                    UNSEEN => {
                        binding[u].push(v);
                        state[v] = ON_STACK;
                        stack.push((v, 0));
                    }
                    _ => binding[u].push(v),
                }
            } else {
                state[u] = DONE;
                stack.pop();
            }
        }
    }

    binding
}

/// Assign each node a layer: 0 for nodes without binding predecessors,
/// otherwise one more than the deepest binding predecessor.
pub fn assign_ranks(graph: &LayoutGraph) -> Vec<usize> {
    let n = graph.ids.len();
    let binding = binding_edges(graph);

    let mut in_degree = vec![0usize; n];
    for targets in &binding {
        for &v in targets {
            in_degree[v] += 1;
        }
    }

    // Kahn's algorithm; the ready list stays sorted by index for determinism.
    let mut ready: Vec<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    ready.reverse();
    let mut ranks = vec![0usize; n];

    while let Some(u) = ready.pop() {
        for &v in &binding[u] {
            ranks[v] = ranks[v].max(ranks[u] + 1);
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                let at = ready.partition_point(|&x| x > v);
                ready.insert(at, v);
            }
        }
    }

    ranks
}
