/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Fontana Tommaso
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![allow(dead_code)]

use decremental_bfs::tree::DecrementalBfs;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashSet, VecDeque};
use webgraph::graphs::vec_graph::VecGraph;

/// Textbook BFS over an explicit arc list, capped at `radius`; the
/// reference against which the maintained distances are checked.
pub fn reference_distances(
    num_nodes: usize,
    arcs: &[(usize, usize)],
    root: usize,
    radius: usize,
) -> Vec<usize> {
    let mut succ = vec![Vec::new(); num_nodes];
    for &(u, v) in arcs {
        succ[u].push(v);
    }
    let mut dist = vec![radius + 1; num_nodes];
    dist[root] = 0;
    let mut queue = VecDeque::from([root]);
    while let Some(u) = queue.pop_front() {
        if dist[u] == radius {
            continue;
        }
        for &v in &succ[u] {
            if dist[v] > dist[u] + 1 {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
        }
    }
    dist
}

/// Checks every stable-state invariant of the structure: optimality of the
/// distances against a fresh BFS over the surviving arcs, parents being live
/// in-neighbors one level above, and agreement of the parent and children
/// views.
pub fn check_invariants(bfs: &DecrementalBfs) {
    let num_nodes = bfs.num_nodes();
    let radius = bfs.radius();
    let arcs: Vec<(usize, usize)> = bfs.alive_arcs().collect();
    let alive: HashSet<(usize, usize)> = arcs.iter().copied().collect();
    let expected = reference_distances(num_nodes, &arcs, bfs.root(), radius);

    for v in 0..num_nodes {
        let expected_dist = (expected[v] <= radius).then_some(expected[v]);
        assert_eq!(bfs.dist(v), expected_dist, "wrong distance for node {v}");

        match bfs.parent(v) {
            Some(p) => {
                assert_ne!(v, bfs.root(), "the root has a parent");
                assert!(
                    alive.contains(&(p, v)),
                    "the tree arc ({p}, {v}) is not alive"
                );
                assert_eq!(
                    bfs.dist(p),
                    Some(bfs.dist(v).unwrap() - 1),
                    "the parent of node {v} is not one level above it"
                );
                assert!(
                    bfs.children(p).contains(&v),
                    "node {v} is missing from the children of its parent {p}"
                );
            }
            None => assert!(
                v == bfs.root() || bfs.dist(v).is_none(),
                "node {v} is in the tree but has no parent"
            ),
        }

        let mut children = bfs.children(v).to_vec();
        children.sort_unstable();
        let unique = children.len();
        children.dedup();
        assert_eq!(children.len(), unique, "duplicate children of node {v}");
        for &c in &children {
            assert_eq!(
                bfs.parent(c),
                Some(v),
                "node {c} is a child of node {v} but does not point back"
            );
        }

        let scan = bfs.scan_cursor(v);
        assert!(scan >= 1, "scan cursor of node {v} below 1");
    }
}

/// An Erdős–Rényi-style random arc list on `num_nodes` nodes, loopless.
pub fn random_arcs(num_nodes: usize, p: f64, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut arcs = Vec::new();
    for u in 0..num_nodes {
        for v in 0..num_nodes {
            if u != v && rng.random_bool(p) {
                arcs.push((u, v));
            }
        }
    }
    arcs
}

/// Builds a [`VecGraph`] with exactly `num_nodes` nodes from an arc list.
pub fn graph_with_nodes(num_nodes: usize, arcs: &[(usize, usize)]) -> VecGraph {
    let mut graph = VecGraph::empty(num_nodes);
    graph.add_arcs(arcs.iter().copied());
    graph
}

/// Draws a batch of `size` arcs from `remaining`, removing them.
pub fn draw_batch(
    remaining: &mut Vec<(usize, usize)>,
    size: usize,
    rng: &mut SmallRng,
) -> Vec<(usize, usize)> {
    let mut batch = Vec::new();
    for _ in 0..size.min(remaining.len()) {
        let at = rng.random_range(0..remaining.len());
        batch.push(remaining.swap_remove(at));
    }
    batch
}
