/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Fontana Tommaso
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{DecrementalBfs, InvalidNodeError};
use dsi_progress_logger::ProgressLog;
use log::debug;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Outcome of advancing the scan cursor of one suspect node.
#[derive(Clone, Copy)]
enum Advance {
    /// A live in-neighbor at the level below was found at this rank.
    Found { rank: usize, parent: usize },
    /// The scan ran off the end of the in-neighbor index.
    Exhausted,
}

impl DecrementalBfs {
    /// Deletes a batch of arcs and repairs distances, parents, children and
    /// scan cursors.
    ///
    /// Arcs already deleted, listed twice in the batch, or simply absent
    /// from the original graph are skipped silently. Nodes that the batch
    /// pushes beyond the radius are detached from the tree and their
    /// distance becomes `None`.
    ///
    /// The batch is atomic from the caller's perspective: the structure is
    /// stable again when this method returns. Both endpoints of every arc
    /// are validated up front, so on error nothing has been deleted.
    ///
    /// Internally, the batch runs in three passes: the pruning of the
    /// deleted arcs (serial); one guided scan per node that lost its tree
    /// arc, looking for a replacement parent on the same level (parallel);
    /// and a level-by-level repair of the nodes whose distance must grow,
    /// parallel within each level with a barrier between levels. Children
    /// lists are only touched in serial merge steps, so the post-state is
    /// identical to that of a sequential execution.
    pub fn batch_delete(
        &mut self,
        arcs: impl IntoIterator<Item = (usize, usize)>,
        thread_pool: &ThreadPool,
        pl: &mut impl ProgressLog,
    ) -> Result<(), InvalidNodeError> {
        let num_nodes = self.num_nodes();
        let mut batch = Vec::new();
        for (u, v) in arcs {
            for node in [u, v] {
                if node >= num_nodes {
                    return Err(InvalidNodeError { node, num_nodes });
                }
            }
            batch.push((u, v));
        }

        pl.item_name("arc");
        pl.expected_updates(Some(batch.len()));
        pl.start("Deleting arcs...");

        // Pass 1: prune. Non-tree arcs die by leaving the live-arc set;
        // tree arcs additionally detach their head.
        let mut detached = Vec::new();
        for (u, v) in batch {
            pl.light_update();
            if !self.alive.remove(&(u, v)) {
                continue;
            }
            let at = self.out_neighbors[u]
                .iter()
                .position(|&x| x == v)
                .expect("the live-arc set and the out-lists disagree");
            self.out_neighbors[u].swap_remove(at);
            if self.parent[v].map(usize::from) == Some(u) {
                self.detach(v, u);
                detached.push(v);
            }
        }

        // Pass 2: look for a replacement parent on the same level. Nodes
        // that find one are done; the others are about to sink, and are
        // bucketed by their current distance for the repair phases.
        let outcomes = self.advance_scans(&detached, None, thread_pool);
        let mut seeds: Vec<Vec<usize>> = vec![Vec::new(); self.radius + 1];
        for (&v, outcome) in detached.iter().zip(outcomes.iter()) {
            match *outcome {
                Advance::Found { rank, parent } => {
                    self.scan[v] = rank;
                    self.attach(v, parent);
                }
                Advance::Exhausted => {
                    self.scan[v] = self.in_neighbors[v].len() + 1;
                    seeds[self.dist[v]].push(v);
                }
            }
        }
        let reattached = detached.len() - seeds.iter().map(Vec::len).sum::<usize>();

        // Pass 3: level-by-level repair. At phase `target` every suspect has
        // recorded distance `target`; a scan hit certifies that distance,
        // while exhaustion bumps the node to `target + 1`, drags its
        // children into the next phase, and resets its cursor (the only
        // move that may send the cursor backward). `target + 1` collapses
        // into the beyond-the-radius sentinel at the last phase.
        let mut pending: usize = seeds.iter().map(Vec::len).sum();
        let mut suspects: Vec<usize> = Vec::new();
        let mut sunk = 0usize;
        for target in 1..=self.radius {
            let phase_seeds = std::mem::take(&mut seeds[target]);
            pending -= phase_seeds.len();
            suspects.extend(phase_seeds);
            if suspects.is_empty() {
                if pending == 0 {
                    break;
                }
                continue;
            }

            let outcomes = self.advance_scans(&suspects, Some(target), thread_pool);

            let mut carried = Vec::new();
            for (&v, outcome) in suspects.iter().zip(outcomes.iter()) {
                match *outcome {
                    Advance::Found { rank, parent } => {
                        self.scan[v] = rank;
                        self.attach(v, parent);
                    }
                    Advance::Exhausted => {
                        self.scan[v] = 1;
                        self.dist[v] = target + 1;
                        sunk += 1;
                        for c in std::mem::take(&mut self.children[v]) {
                            self.parent[c] = None;
                            carried.push(c);
                        }
                        carried.push(v);
                    }
                }
            }
            suspects = carried;
        }

        // Anything still suspect was bumped past the radius by the last
        // phase and is already detached.
        debug_assert!(suspects.iter().all(|&v| self.dist[v] > self.radius));
        debug_assert!(suspects.iter().all(|&v| self.parent[v].is_none()));

        debug!(
            "batch done: {} tree arcs lost, {} reattached on the same level, {} distance bumps, {} arcs alive",
            detached.len(),
            reattached,
            sunk,
            self.alive.len()
        );
        pl.done();
        Ok(())
    }

    /// Advances the scan cursor of every suspect, in parallel, without
    /// touching the structure; the returned outcomes are applied by the
    /// caller in a serial merge.
    ///
    /// With `target == None` each node looks for a parent one level above
    /// its own recorded distance (pass 2); with `target == Some(t)` all
    /// suspects are at recorded distance `t` and look one level below `t`.
    /// Distance reads happen strictly between phases, so scans at phase `t`
    /// see the values finalized by phase `t - 1`.
    fn advance_scans(
        &self,
        suspects: &[usize],
        target: Option<usize>,
        thread_pool: &ThreadPool,
    ) -> Vec<Advance> {
        let dist = &self.dist;
        let alive = &self.alive;
        let in_neighbors = &self.in_neighbors;
        let scan = &self.scan;

        thread_pool.install(|| {
            suspects
                .par_iter()
                .map(|&v| {
                    let level = target.unwrap_or(dist[v]) - 1;
                    debug_assert_eq!(dist[v], target.unwrap_or(dist[v]));
                    let index = &in_neighbors[v];
                    let rank =
                        index.next_with(scan[v], |&w| dist[w] == level && alive.contains(&(w, v)));
                    if rank <= index.len() {
                        let parent = *index.get(rank).expect("the scan returned a valid rank");
                        Advance::Found { rank, parent }
                    } else {
                        Advance::Exhausted
                    }
                })
                .collect()
        })
    }
}
