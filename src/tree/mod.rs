/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Fontana Tommaso
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Batch-decremental BFS trees of bounded radius.
//!
//! A [`DecrementalBfs`] maintains, over a directed graph subject to arc
//! deletions, the exact distance from a fixed root of every node within a
//! fixed radius, together with a breadth-first tree realizing those
//! distances. Between calls the structure is *stable*: distances are optimal
//! in the surviving graph, every tree node except the root has a live parent
//! one level above, and parent/children views agree. During a
//! [`batch_delete`](DecrementalBfs::batch_delete) the structure is opaque
//! and temporarily inconsistent.
//!
//! Distances never decrease under deletions, and the repair algorithm leans
//! on this: each node `v` owns a scan cursor into its in-neighbor
//! [`RankIndex`], and ranks behind the cursor are never looked at again
//! while the distance of `v` stays put, which bounds the lifetime work per
//! node by its in-degree times the radius.
//!
//! Deleted arcs that are not tree arcs are only removed from the live-arc
//! set: the in-neighbor indexes are never physically mutated, and the scan
//! predicate checks liveness instead. This keeps every scan cursor valid.

mod delete;

use crate::bfs;
use crate::rank_index::RankIndex;
use dsi_progress_logger::ProgressLog;
use nonmax::NonMaxUsize;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::HashSet;
use thiserror::Error;
use webgraph::traits::RandomAccessGraph;
use webgraph::utils::Granularity;

/// The node id passed to a fallible entry point is out of bounds.
///
/// The structure is left exactly as it was before the failing call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("node {node} does not exist (the graph has {num_nodes} nodes)")]
pub struct InvalidNodeError {
    pub node: usize,
    pub num_nodes: usize,
}

/// A single-source bounded-radius BFS tree maintained under batch arc
/// deletions.
///
/// See the [module documentation](self) for the maintained invariants, and
/// the [crate documentation](crate) for an example.
#[derive(Debug, Clone)]
pub struct DecrementalBfs {
    root: usize,
    radius: usize,
    /// Distance from the root; `radius + 1` means "beyond the radius".
    dist: Box<[usize]>,
    parent: Box<[Option<NonMaxUsize>]>,
    children: Box<[Vec<usize>]>,
    /// Scan cursor into `in_neighbors[v]`, in `[1, len + 1]`. Ranks before
    /// the cursor have been rejected as parents of `v` at its current
    /// distance and can never become valid again.
    scan: Box<[usize]>,
    in_neighbors: Box<[RankIndex<usize>]>,
    /// Remaining out-arcs; removal bookkeeping only, never traversed.
    out_neighbors: Box<[Vec<usize>]>,
    alive: HashSet<(usize, usize)>,
}

impl DecrementalBfs {
    /// Builds the structure for the given graph, root and radius.
    ///
    /// The graph is snapshotted: arcs are copied into the live-arc set and
    /// the per-node in-neighbor indexes (an in-neighbor `u` is keyed by
    /// priority `u + 1`), and the input graph is never consulted again.
    /// Initial distances come from a [parallel bounded
    /// BFS](crate::bfs::par_bounded_distances); parents and scan cursors are
    /// then initialized with one guided scan per reachable node.
    pub fn new(
        graph: &(impl RandomAccessGraph + Sync),
        root: usize,
        radius: usize,
        thread_pool: &ThreadPool,
        pl: &mut impl ProgressLog,
    ) -> Result<Self, InvalidNodeError> {
        let num_nodes = graph.num_nodes();
        if root >= num_nodes {
            return Err(InvalidNodeError {
                node: root,
                num_nodes,
            });
        }

        pl.item_name("node");
        pl.expected_updates(Some(num_nodes));
        pl.start("Building the initial tree...");

        let dist = bfs::par_bounded_distances(graph, root, radius, Granularity::default(), thread_pool);

        let mut out_neighbors = Vec::with_capacity(num_nodes);
        let mut in_lists: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
        let mut alive = HashSet::with_capacity(graph.num_arcs() as usize);
        for u in 0..num_nodes {
            let succ: Vec<usize> = graph.successors(u).into_iter().collect();
            for &v in &succ {
                in_lists[v].push(u);
                alive.insert((u, v));
            }
            out_neighbors.push(succ);
        }

        let in_neighbors: Vec<RankIndex<usize>> = thread_pool.install(|| {
            in_lists
                .into_par_iter()
                .map(|list| {
                    let mut index = RankIndex::new(num_nodes);
                    index
                        .build(list.into_iter().map(|u| (u, u + 1)).collect())
                        .expect("node ids are distinct, so priorities are too");
                    index
                })
                .collect()
        });

        let mut tree = DecrementalBfs {
            root,
            radius,
            dist,
            parent: vec![None; num_nodes].into_boxed_slice(),
            children: vec![Vec::new(); num_nodes].into_boxed_slice(),
            scan: vec![1; num_nodes].into_boxed_slice(),
            in_neighbors: in_neighbors.into_boxed_slice(),
            out_neighbors: out_neighbors.into_boxed_slice(),
            alive,
        };
        tree.init_parents(thread_pool, pl);
        pl.done();
        Ok(tree)
    }

    /// Initializes `parent`, `children` and `scan` with one guided scan per
    /// node in the tree.
    fn init_parents(&mut self, thread_pool: &ThreadPool, pl: &mut impl ProgressLog) {
        let dist = &self.dist;
        let alive = &self.alive;
        let in_neighbors = &self.in_neighbors;
        let radius = self.radius;

        let attachments: Vec<(usize, usize, usize)> = thread_pool.install(|| {
            (0..dist.len())
                .into_par_iter()
                .filter(|&v| (1..=radius).contains(&dist[v]))
                .map(|v| {
                    let level = dist[v] - 1;
                    let index = &in_neighbors[v];
                    let rank =
                        index.next_with(1, |&w| dist[w] == level && alive.contains(&(w, v)));
                    assert!(
                        rank <= index.len(),
                        "node {v} is at distance {} but has no in-neighbor at distance {level}",
                        dist[v]
                    );
                    let parent = *index.get(rank).expect("the scan returned a valid rank");
                    (v, rank, parent)
                })
                .collect()
        });

        for (v, rank, parent) in attachments {
            self.scan[v] = rank;
            self.attach(v, parent);
            pl.light_update();
        }
    }

    /// Makes `w` the tree parent of `v`, keeping both views of the relation
    /// in agreement. `v` must be detached.
    fn attach(&mut self, v: usize, w: usize) {
        debug_assert!(self.parent[v].is_none());
        self.parent[v] = Some(NonMaxUsize::new(w).expect("node index should never be usize::MAX"));
        self.children[w].push(v);
    }

    /// Detaches `v` from its tree parent `u`.
    fn detach(&mut self, v: usize, u: usize) {
        let siblings = &mut self.children[u];
        let at = siblings
            .iter()
            .position(|&c| c == v)
            .expect("the parent and children views disagree");
        siblings.swap_remove(at);
        self.parent[v] = None;
    }

    /// Returns the number of nodes, fixed at construction.
    pub fn num_nodes(&self) -> usize {
        self.dist.len()
    }

    /// Returns the root.
    pub fn root(&self) -> usize {
        self.root
    }

    /// Returns the radius.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Returns the number of arcs not deleted so far.
    pub fn num_alive_arcs(&self) -> usize {
        self.alive.len()
    }

    /// Returns the distance of `node` from the root, or `None` if it exceeds
    /// the radius.
    ///
    /// # Panics
    ///
    /// If `node` is out of bounds.
    pub fn dist(&self, node: usize) -> Option<usize> {
        let dist = self.dist[node];
        (dist <= self.radius).then_some(dist)
    }

    /// Returns the tree parent of `node`, or `None` for the root and for
    /// nodes beyond the radius.
    ///
    /// # Panics
    ///
    /// If `node` is out of bounds.
    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parent[node].map(usize::from)
    }

    /// Returns the tree children of `node`.
    ///
    /// The order is unspecified. This accessor is mainly useful for testing
    /// and debugging.
    ///
    /// # Panics
    ///
    /// If `node` is out of bounds.
    pub fn children(&self, node: usize) -> &[usize] {
        &self.children[node]
    }

    /// Returns the scan cursor of `node` into its in-neighbor index.
    ///
    /// The cursor never moves backward between two batches that leave the
    /// distance of `node` unchanged. This accessor is mainly useful for
    /// testing and debugging.
    ///
    /// # Panics
    ///
    /// If `node` is out of bounds.
    pub fn scan_cursor(&self, node: usize) -> usize {
        self.scan[node]
    }

    /// Returns an iterator over the arcs not deleted so far, in no
    /// particular order.
    ///
    /// This accessor is mainly useful for testing and debugging.
    pub fn alive_arcs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.alive.iter().copied()
    }
}
