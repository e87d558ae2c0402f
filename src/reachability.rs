//! Reachability engine (C7): direction-optimizing (Beamer-style) parallel
//! BFS over the dependency graph produced by `depgraph`.
//!
//! Top-down BFS scans the current frontier's out-edges; bottom-up BFS scans
//! every unvisited node's in-edges looking for a visited parent. Bottom-up
//! wins when the frontier is large and most nodes remain unvisited, since it
//! avoids re-touching already-visited neighbors. The switch is governed by
//! `config.bfs_alpha`/`bfs_beta`, mirroring the classic heuristic: switch to
//! bottom-up when `edges_to_check / alpha > unvisited_count`, and back to
//! top-down once `frontier_size < node_count / beta`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use rayon::prelude::*;

use crate::config::{Config, ParallelMode};
use crate::depgraph::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    TopDown,
    BottomUp,
}

/// Result of one reachability run: which declaration indices are reachable
/// from a root, and the BFS distance (depth) at which each was first found.
#[derive(Debug)]
pub struct ReachabilityResult {
    pub visited: Vec<bool>,
    pub depth: Vec<u32>,
}

impl ReachabilityResult {
    pub fn is_reachable(&self, node: usize) -> bool {
        self.visited.get(node).copied().unwrap_or(false)
    }
}

pub fn compute(graph: &DependencyGraph, config: &Config) -> ReachabilityResult {
    let n = graph.node_count;
    let visited: Vec<AtomicBool> = (0..n).map(|_| AtomicBool::new(false)).collect();
    let depth: Vec<AtomicU32> = (0..n).map(|_| AtomicU32::new(u32::MAX)).collect();

    let mut frontier: Vec<u32> = graph.roots.clone();
    for &r in &frontier {
        visited[r as usize].store(true, Ordering::Relaxed);
        depth[r as usize].store(0, Ordering::Relaxed);
    }

    let mut unvisited_count = n - frontier.len();
    let mut current_depth = 0u32;
    let mut direction = Direction::TopDown;

    while !frontier.is_empty() {
        let edges_to_check: usize = frontier
            .iter()
            .map(|&f| graph.edges[f as usize].len())
            .sum();

        direction = choose_direction(direction, edges_to_check, unvisited_count, n, config);

        let next_depth = current_depth + 1;
        let next_frontier = match config.parallel_mode {
            ParallelMode::Off => step_sequential(graph, &frontier, &visited, &depth, direction, next_depth),
            ParallelMode::Safe | ParallelMode::Maximum => {
                step_parallel(graph, &frontier, &visited, &depth, direction, next_depth, config.parallel_mode)
            }
        };

        unvisited_count = unvisited_count.saturating_sub(next_frontier.len());
        frontier = next_frontier;
        current_depth = next_depth;
    }

    ReachabilityResult {
        visited: visited.into_iter().map(|b| b.load(Ordering::Relaxed)).collect(),
        depth: depth.into_iter().map(|d| d.load(Ordering::Relaxed)).collect(),
    }
}

fn choose_direction(
    current: Direction,
    edges_to_check: usize,
    unvisited_count: usize,
    n: usize,
    config: &Config,
) -> Direction {
    if unvisited_count == 0 {
        return current;
    }
    match current {
        Direction::TopDown => {
            if edges_to_check as f64 / config.bfs_alpha > unvisited_count as f64 {
                Direction::BottomUp
            } else {
                Direction::TopDown
            }
        }
        Direction::BottomUp => {
            if (unvisited_count as f64) < (n as f64 / config.bfs_beta) {
                Direction::TopDown
            } else {
                Direction::BottomUp
            }
        }
    }
}

fn step_sequential(
    graph: &DependencyGraph,
    frontier: &[u32],
    visited: &[AtomicBool],
    depth: &[AtomicU32],
    direction: Direction,
    next_depth: u32,
) -> Vec<u32> {
    let mut next = Vec::new();
    match direction {
        Direction::TopDown => {
            for &node in frontier {
                for &neighbor in &graph.edges[node as usize] {
                    if !visited[neighbor as usize].swap(true, Ordering::Relaxed) {
                        depth[neighbor as usize].store(next_depth, Ordering::Relaxed);
                        next.push(neighbor);
                    }
                }
            }
        }
        Direction::BottomUp => {
            for node in 0..graph.node_count as u32 {
                if visited[node as usize].load(Ordering::Relaxed) {
                    continue;
                }
                if graph.reverse_edges[node as usize]
                    .iter()
                    .any(|&p| visited[p as usize].load(Ordering::Relaxed))
                {
                    visited[node as usize].store(true, Ordering::Relaxed);
                    depth[node as usize].store(next_depth, Ordering::Relaxed);
                    next.push(node);
                }
            }
        }
    }
    next
}

/// `Safe` mode uses rayon's work-stealing collect, which allocates a small
/// per-chunk buffer per task. `Maximum` mode additionally routes discovered
/// nodes through a bounded `crossbeam-channel` so producers apply
/// backpressure against a single consumer thread deduping the frontier,
/// trading a little throughput for a flat memory ceiling on very wide graphs.
fn step_parallel(
    graph: &DependencyGraph,
    frontier: &[u32],
    visited: &[AtomicBool],
    depth: &[AtomicU32],
    direction: Direction,
    next_depth: u32,
    mode: ParallelMode,
) -> Vec<u32> {
    if mode == ParallelMode::Maximum {
        return step_parallel_bounded(graph, frontier, visited, depth, direction, next_depth);
    }

    match direction {
        Direction::TopDown => frontier
            .par_iter()
            .flat_map_iter(|&node| {
                graph.edges[node as usize].iter().filter_map(move |&neighbor| {
                    if !visited[neighbor as usize].swap(true, Ordering::Relaxed) {
                        depth[neighbor as usize].store(next_depth, Ordering::Relaxed);
                        Some(neighbor)
                    } else {
                        None
                    }
                })
            })
            .collect(),
        Direction::BottomUp => (0..graph.node_count as u32)
            .into_par_iter()
            .filter_map(|node| {
                if visited[node as usize].load(Ordering::Relaxed) {
                    return None;
                }
                if graph.reverse_edges[node as usize]
                    .iter()
                    .any(|&p| visited[p as usize].load(Ordering::Relaxed))
                {
                    if !visited[node as usize].swap(true, Ordering::Relaxed) {
                        depth[node as usize].store(next_depth, Ordering::Relaxed);
                        return Some(node);
                    }
                }
                None
            })
            .collect(),
    }
}

fn step_parallel_bounded(
    graph: &DependencyGraph,
    frontier: &[u32],
    visited: &[AtomicBool],
    depth: &[AtomicU32],
    direction: Direction,
    next_depth: u32,
) -> Vec<u32> {
    let (tx, rx) = crossbeam_channel::bounded::<u32>(4096);

    let (next, _) = rayon::join(
        || {
            let mut out = Vec::new();
            while let Ok(n) = rx.recv() {
                out.push(n);
            }
            out
        },
        move || {
            match direction {
                Direction::TopDown => {
                    frontier.par_iter().for_each_with(tx.clone(), |tx, &node| {
                        for &neighbor in &graph.edges[node as usize] {
                            if !visited[neighbor as usize].swap(true, Ordering::Relaxed) {
                                depth[neighbor as usize].store(next_depth, Ordering::Relaxed);
                                let _ = tx.send(neighbor);
                            }
                        }
                    });
                }
                Direction::BottomUp => {
                    (0..graph.node_count as u32)
                        .into_par_iter()
                        .for_each_with(tx.clone(), |tx, node| {
                            if visited[node as usize].load(Ordering::Relaxed) {
                                return;
                            }
                            if graph.reverse_edges[node as usize]
                                .iter()
                                .any(|&p| visited[p as usize].load(Ordering::Relaxed))
                                && !visited[node as usize].swap(true, Ordering::Relaxed)
                            {
                                depth[node as usize].store(next_depth, Ordering::Relaxed);
                                let _ = tx.send(node);
                            }
                        });
                }
            }
            drop(tx);
        },
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: Vec<Vec<u32>>, roots: Vec<u32>) -> DependencyGraph {
        let n = edges.len();
        let mut reverse = vec![Vec::new(); n];
        for (i, outs) in edges.iter().enumerate() {
            for &o in outs {
                reverse[o as usize].push(i as u32);
            }
        }
        DependencyGraph {
            node_count: n,
            edges,
            reverse_edges: reverse,
            roots,
        }
    }

    #[test]
    fn root_reaches_direct_and_transitive_neighbors() {
        // 0 -> 1 -> 2, 3 is isolated
        let g = graph(vec![vec![1], vec![2], vec![], vec![]], vec![0]);
        let mut config = Config::default();
        config.parallel_mode = ParallelMode::Off;
        let r = compute(&g, &config);
        assert!(r.is_reachable(0));
        assert!(r.is_reachable(1));
        assert!(r.is_reachable(2));
        assert!(!r.is_reachable(3));
        assert_eq!(r.depth[2], 2);
    }

    #[test]
    fn sequential_and_parallel_safe_modes_agree() {
        let g = graph(
            vec![vec![1, 2], vec![3], vec![3], vec![4], vec![]],
            vec![0],
        );
        let mut off = Config::default();
        off.parallel_mode = ParallelMode::Off;
        let mut safe = Config::default();
        safe.parallel_mode = ParallelMode::Safe;

        let r_off = compute(&g, &off);
        let r_safe = compute(&g, &safe);
        assert_eq!(r_off.visited, r_safe.visited);
    }

    #[test]
    fn no_roots_means_nothing_is_reachable() {
        let g = graph(vec![vec![1], vec![]], vec![]);
        let r = compute(&g, &Config::default());
        assert!(!r.is_reachable(0));
        assert!(!r.is_reachable(1));
    }
}
