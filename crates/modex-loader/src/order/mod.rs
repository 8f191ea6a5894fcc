//! Load ordering
//!
//! Packages are linearized with a dependency matrix and a FIFO work queue:
//! `M[i][j]` is set when package `i` depends on package `j`. The queue starts
//! with every package nothing depends on; taking a package off the queue
//! clears its outgoing edges and enqueues each dependency whose column became
//! empty. The working list therefore runs from dependents to dependencies and
//! is reversed at the end.
//!
//! The queue is seeded, and each row is scanned, from the highest index down.
//! After the final reversal this leaves packages that are not constrained
//! relative to each other in their input order.
//!
//! Packages caught in a cycle, and everything they (transitively) depend on,
//! never reach the queue. `order` drops them with a warning; `order_checked`
//! reports them as `ModexError::CircularDependency`.

use crate::LoaderResult;
use modex_core::error::ModexError;
use modex_core::Package;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Order packages so that each one comes after everything it depends on.
/// Packages that cannot be ordered are left out.
pub fn order<'a>(packages: &[&'a Package]) -> Vec<&'a Package> {
    let outcome = linearize(packages);

    if !outcome.unordered.is_empty() {
        let names: Vec<&str> = outcome
            .unordered
            .iter()
            .map(|&i| packages[i].name())
            .collect();
        warn!(
            "Skipping {} package(s) caught in a dependency cycle: {}",
            names.len(),
            names.join(", ")
        );
    }

    outcome.sorted.into_iter().map(|i| packages[i]).collect()
}

/// Like `order`, but fails if any package could not be ordered
pub fn order_checked<'a>(packages: &[&'a Package]) -> LoaderResult<Vec<&'a Package>> {
    let outcome = linearize(packages);

    if outcome.unordered.is_empty() {
        return Ok(outcome.sorted.into_iter().map(|i| packages[i]).collect());
    }

    let cycles = find_cycles(packages, &outcome);
    let cycle = if cycles.is_empty() {
        "unresolved dependencies".to_string()
    } else {
        cycles.join("; ")
    };

    Err(ModexError::CircularDependency {
        cycle,
        unordered: outcome
            .unordered
            .iter()
            .map(|&i| packages[i].name().to_string())
            .collect(),
    })
}

struct Linearized {
    /// Indices in load order
    sorted: Vec<usize>,
    /// Indices that never reached the queue, in input order
    unordered: Vec<usize>,
    /// Edges still set when the queue ran dry
    matrix: Vec<Vec<bool>>,
}

fn linearize(packages: &[&Package]) -> Linearized {
    let n = packages.len();
    let mut matrix: Vec<Vec<bool>> = packages
        .iter()
        .map(|a| packages.iter().map(|b| a.depends_on(b, false)).collect())
        .collect();

    let mut queue: VecDeque<usize> = (0..n).rev().filter(|&j| column_clear(&matrix, j)).collect();
    let mut sorted = Vec::with_capacity(n);

    while let Some(i) = queue.pop_front() {
        sorted.push(i);
        for m in (0..n).rev() {
            if !matrix[i][m] {
                continue;
            }
            matrix[i][m] = false;
            if column_clear(&matrix, m) {
                queue.push_back(m);
            }
        }
    }

    sorted.reverse();

    let placed: HashSet<usize> = sorted.iter().copied().collect();
    let unordered: Vec<usize> = (0..n).filter(|i| !placed.contains(i)).collect();
    debug!("Ordered {} of {} package(s)", sorted.len(), n);

    Linearized {
        sorted,
        unordered,
        matrix,
    }
}

fn column_clear(matrix: &[Vec<bool>], j: usize) -> bool {
    matrix.iter().all(|row| !row[j])
}

/// Describe every cycle among the unordered packages as `a -> b -> a`
fn find_cycles(packages: &[&Package], outcome: &Linearized) -> Vec<String> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: HashMap<usize, NodeIndex> = outcome
        .unordered
        .iter()
        .map(|&i| (i, graph.add_node(i)))
        .collect();

    for &from in &outcome.unordered {
        for &to in &outcome.unordered {
            if outcome.matrix[from][to] {
                graph.add_edge(nodes[&from], nodes[&to], ());
            }
        }
    }

    let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .collect();
    for scc in &mut components {
        scc.sort_by_key(|&node| graph[node]);
    }
    components.sort_by_key(|scc| graph[scc[0]]);

    components
        .iter()
        .map(|scc| {
            cycle_path(&graph, scc)
                .iter()
                .map(|&node| packages[graph[node]].name())
                .collect::<Vec<_>>()
                .join(" -> ")
        })
        .collect()
}

/// Shortest walk from the first node of `scc` back to itself, staying inside
/// the component. Both ends of the walk are the start node.
fn cycle_path(graph: &DiGraph<usize, ()>, scc: &[NodeIndex]) -> Vec<NodeIndex> {
    let start = scc[0];
    let members: HashSet<NodeIndex> = scc.iter().copied().collect();

    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        let mut successors: Vec<NodeIndex> = graph
            .neighbors(node)
            .filter(|next| members.contains(next))
            .collect();
        successors.sort_by_key(|&next| graph[next]);

        for next in successors {
            if next == start {
                let mut path = vec![start, node];
                let mut current = node;
                while current != start {
                    current = previous[&current];
                    path.push(current);
                }
                path.reverse();
                return path;
            }
            if !previous.contains_key(&next) {
                previous.insert(next, node);
                queue.push_back(next);
            }
        }
    }

    vec![start, start]
}
