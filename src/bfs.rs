/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Fontana Tommaso
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Bounded-radius breadth-first distance computation.
//!
//! Both functions compute, for every node, the length of a shortest directed
//! path from `root`, stopping at a fixed `radius`: nodes farther than the
//! radius (or unreachable) get the sentinel value `radius + 1`. The
//! [sequential version](bounded_distances) visits the graph level by level
//! with a single queue; the [parallel version](par_bounded_distances)
//! expands each level concurrently, with a barrier between levels, and
//! produces identical output.

use nonmax::NonMaxUsize;
use parallel_frontier::Frontier;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use sux::bits::AtomicBitVec;
use sync_cell_slice::SyncSlice;
use webgraph::traits::RandomAccessGraph;
use webgraph::utils::Granularity;

/// Computes distances from `root` up to `radius`, sequentially.
///
/// Returns a slice with one entry per node; entries equal to `radius + 1`
/// denote nodes at distance greater than `radius`.
///
/// # Panics
///
/// If `root` is not a node of the graph.
///
/// # Examples
///
/// ```
/// use decremental_bfs::bfs::bounded_distances;
/// use webgraph::graphs::vec_graph::VecGraph;
///
/// let graph = VecGraph::from_arcs([(0, 1), (1, 2), (2, 3), (1, 3)]);
/// assert_eq!(&*bounded_distances(&graph, 0, 2), &[0, 1, 2, 2]);
/// // With radius 1, nodes 2 and 3 are beyond the horizon
/// assert_eq!(&*bounded_distances(&graph, 0, 1), &[0, 1, 2, 2]);
/// ```
pub fn bounded_distances(
    graph: &impl RandomAccessGraph,
    root: usize,
    radius: usize,
) -> Box<[usize]> {
    let num_nodes = graph.num_nodes();
    let mut dist = vec![radius + 1; num_nodes].into_boxed_slice();
    dist[root] = 0;

    // As in a level-by-level visit, `None` separates nodes at different
    // distances, so the queue does not need to store distances.
    let mut queue = VecDeque::new();
    queue.push_back(Some(
        NonMaxUsize::new(root).expect("node index should never be usize::MAX"),
    ));
    queue.push_back(None);

    let mut distance = 1;
    while distance <= radius {
        match queue.pop_front() {
            Some(Some(node)) => {
                for succ in graph.successors(node.into()) {
                    if dist[succ] > distance {
                        dist[succ] = distance;
                        queue.push_back(Some(
                            NonMaxUsize::new(succ).expect("node index should never be usize::MAX"),
                        ));
                    }
                }
            }
            Some(None) => {
                if queue.is_empty() {
                    break;
                }
                distance += 1;
                queue.push_back(None);
            }
            None => break,
        }
    }
    dist
}

/// Computes distances from `root` up to `radius`, expanding each level in
/// parallel on the given thread pool.
///
/// The output is identical to that of [`bounded_distances`]: every node is
/// discovered exactly once (the visited set is claimed with an atomic swap),
/// and levels are separated by a barrier, so the distance written for a node
/// does not depend on the thread schedule.
///
/// `granularity` controls how many frontier nodes form a parallel task; see
/// [`Granularity`].
///
/// # Panics
///
/// If `root` is not a node of the graph.
pub fn par_bounded_distances(
    graph: &(impl RandomAccessGraph + Sync),
    root: usize,
    radius: usize,
    granularity: Granularity,
    thread_pool: &ThreadPool,
) -> Box<[usize]> {
    let num_nodes = graph.num_nodes();
    let num_arcs = graph.num_arcs();
    let granularity = granularity.node_granularity(num_nodes, Some(num_arcs));

    let visited = AtomicBitVec::new(num_nodes);
    let mut dist = vec![radius + 1; num_nodes].into_boxed_slice();
    dist[root] = 0;
    visited.set(root, true, Ordering::Relaxed);

    let mut curr_frontier = Frontier::with_threads(thread_pool, None);
    curr_frontier.as_mut()[0] = vec![root];
    let mut next_frontier = Frontier::with_threads(thread_pool, None);
    let mut distance = 1;

    {
        let dist_sync = dist.as_sync_slice();
        while !curr_frontier.is_empty() && distance <= radius {
            thread_pool.install(|| {
                curr_frontier.par_iter().chunks(granularity).for_each(|chunk| {
                    for &node in chunk {
                        for succ in graph.successors(node) {
                            if !visited.swap(succ, true, Ordering::Relaxed) {
                                // Each node is claimed by exactly one thread,
                                // so these writes are disjoint.
                                unsafe { dist_sync[succ].set(distance) };
                                next_frontier.push(succ);
                            }
                        }
                    }
                });
            });
            distance += 1;
            std::mem::swap(&mut curr_frontier, &mut next_frontier);
            next_frontier.clear();
        }
    }
    dist
}
