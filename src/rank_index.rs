/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Fontana Tommaso
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A rank/priority index over a bounded priority universe.
//!
//! A [`RankIndex`] stores pairs (value, priority), with distinct priorities
//! in the universe `[1, max_priority]`, and answers queries both by
//! *priority* and by *rank*: rank 1 is the element with the largest priority,
//! rank [`len`](RankIndex::len) the one with the smallest. Since priorities
//! are distinct, ranks are unambiguous.
//!
//! The representation is a segment tree over the priority universe whose
//! nodes are allocated lazily: each internal node counts the elements stored
//! in its subinterval, and each leaf stores the element currently keyed by
//! that priority, if any. The tree shape depends only on the universe, so
//! mutations never move elements around, and ranks shift only when elements
//! are inserted or removed.
//!
//! The distinguishing primitive is [`next_with`](RankIndex::next_with), a
//! guided linear scan returning the smallest rank at least equal to a
//! starting rank whose value satisfies a predicate. The scan examines windows
//! of doubling width, so its cost is linear in the number of ranks it skips
//! rather than quadratic, and wide windows are reduced in parallel.

use rayon::prelude::*;
use thiserror::Error;

/// Sibling subtrees are built by [`rayon::join`] above this input size.
const PAR_BUILD_THRESHOLD: usize = 1024;
/// Scan windows at least this wide are reduced in parallel.
const PAR_SCAN_THRESHOLD: usize = 1024;

/// Errors returned by [`RankIndex`] operations whose preconditions are
/// violated.
///
/// All of these are local: the index is left exactly as it was before the
/// failing call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankIndexError {
    /// The rank is not in `[1, len]`.
    #[error("rank {rank} out of range (the index stores {len} elements)")]
    RankOutOfRange { rank: usize, len: usize },
    /// The priority is not in `[1, max_priority]`.
    #[error("priority {priority} out of range (the universe is [1, {max_priority}])")]
    PriorityOutOfRange { priority: usize, max_priority: usize },
    /// Two input pairs share the same priority.
    #[error("duplicate priority {priority}")]
    DuplicatePriority { priority: usize },
    /// No stored element has the given priority.
    #[error("no element has priority {priority}")]
    PriorityNotFound { priority: usize },
    /// The target priority of a re-keying is already taken.
    #[error("priority {priority} is already occupied")]
    PriorityOccupied { priority: usize },
}

#[derive(Debug, Clone)]
struct Node<T> {
    /// Number of elements stored in this subinterval.
    count: usize,
    /// The element keyed by this priority; meaningful at leaves only.
    item: Option<T>,
    left: Option<Box<Node<T>>>,
    right: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn empty() -> Self {
        Node {
            count: 0,
            item: None,
            left: None,
            right: None,
        }
    }

    #[inline(always)]
    fn count_of(node: &Option<Box<Node<T>>>) -> usize {
        node.as_deref().map_or(0, |n| n.count)
    }
}

/// A dynamic collection of (value, priority) pairs indexed by rank and by
/// priority.
///
/// See the [module documentation](self) for the data model. All ranks and
/// priorities are 1-based; rank 1 is the element with the *largest* priority.
///
/// # Examples
///
/// ```
/// use decremental_bfs::rank_index::RankIndex;
///
/// let mut index = RankIndex::new(1000);
/// index.build(vec![("a", 10), ("b", 150), ("c", 999), ("d", 500), ("e", 1)])?;
///
/// assert_eq!(index.len(), 5);
/// assert_eq!(index.get(1)?, &"c");
/// assert_eq!(index.get(5)?, &"e");
/// assert_eq!(index.find(150)?, (&"b", 3));
///
/// // The smallest rank from 2 on whose value is not "d"
/// assert_eq!(index.next_with(2, |v| *v != "d"), 3);
/// # Ok::<(), decremental_bfs::rank_index::RankIndexError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RankIndex<T> {
    max_priority: usize,
    root: Option<Box<Node<T>>>,
}

impl<T> RankIndex<T> {
    /// Creates an empty index over the priority universe `[1, max_priority]`.
    pub fn new(max_priority: usize) -> Self {
        RankIndex {
            max_priority,
            root: None,
        }
    }

    /// Returns the upper end of the priority universe.
    pub fn max_priority(&self) -> usize {
        self.max_priority
    }

    /// Returns the number of stored elements.
    pub fn len(&self) -> usize {
        Node::count_of(&self.root)
    }

    /// Returns whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn check_rank(&self, rank: usize) -> Result<(), RankIndexError> {
        let len = self.len();
        if rank < 1 || rank > len {
            return Err(RankIndexError::RankOutOfRange { rank, len });
        }
        Ok(())
    }

    #[inline]
    fn check_priority(&self, priority: usize) -> Result<(), RankIndexError> {
        if priority < 1 || priority > self.max_priority {
            return Err(RankIndexError::PriorityOutOfRange {
                priority,
                max_priority: self.max_priority,
            });
        }
        Ok(())
    }

    /// Descends to the leaf holding the element of given rank.
    ///
    /// The rank must have been validated by the caller; a descent that falls
    /// off the tree means the subtree counts are corrupted.
    fn leaf_at_rank(&self, mut rank: usize) -> &Node<T> {
        let mut node = self
            .root
            .as_deref()
            .expect("rank descent on an empty tree");
        let (mut lo, mut hi) = (1, self.max_priority);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let right_count = Node::count_of(&node.right);
            if rank <= right_count {
                node = node.right.as_deref().expect("inconsistent subtree counts");
                lo = mid + 1;
            } else {
                rank -= right_count;
                node = node.left.as_deref().expect("inconsistent subtree counts");
                hi = mid;
            }
        }
        node
    }

    #[inline]
    fn rank_unchecked(&self, rank: usize) -> &T {
        self.leaf_at_rank(rank)
            .item
            .as_ref()
            .expect("leaf without an element")
    }

    /// Returns the value of the element with the `rank`-th largest priority.
    pub fn get(&self, rank: usize) -> Result<&T, RankIndexError> {
        self.check_rank(rank)?;
        Ok(self.rank_unchecked(rank))
    }

    /// Replaces the value of the element with the `rank`-th largest priority.
    pub fn set_value(&mut self, rank: usize, value: T) -> Result<(), RankIndexError> {
        self.check_rank(rank)?;
        let mut rank = rank;
        let mut node = self
            .root
            .as_deref_mut()
            .expect("rank descent on an empty tree");
        let (mut lo, mut hi) = (1, self.max_priority);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let right_count = Node::count_of(&node.right);
            if rank <= right_count {
                node = node
                    .right
                    .as_deref_mut()
                    .expect("inconsistent subtree counts");
                lo = mid + 1;
            } else {
                rank -= right_count;
                node = node
                    .left
                    .as_deref_mut()
                    .expect("inconsistent subtree counts");
                hi = mid;
            }
        }
        debug_assert!(node.item.is_some(), "leaf without an element");
        node.item = Some(value);
        Ok(())
    }

    /// Returns the value and rank of the element with the given priority.
    pub fn find(&self, priority: usize) -> Result<(&T, usize), RankIndexError> {
        self.check_priority(priority)?;
        let absent = RankIndexError::PriorityNotFound { priority };
        let mut node = self.root.as_deref().ok_or(absent)?;
        let (mut lo, mut hi) = (1, self.max_priority);
        // Rank = 1 + number of stored elements with a larger priority
        let mut rank = 1;
        loop {
            if node.count == 0 {
                return Err(absent);
            }
            if lo == hi {
                return node.item.as_ref().map(|item| (item, rank)).ok_or(absent);
            }
            let mid = (lo + hi) / 2;
            if priority <= mid {
                rank += Node::count_of(&node.right);
                node = node.left.as_deref().ok_or(absent)?;
                hi = mid;
            } else {
                node = node.right.as_deref().ok_or(absent)?;
                lo = mid + 1;
            }
        }
    }

    /// Returns whether an element with the given priority is stored.
    ///
    /// The priority may lie outside the universe, in which case the answer
    /// is `false`.
    pub fn contains_priority(&self, priority: usize) -> bool {
        if priority < 1 || priority > self.max_priority {
            return false;
        }
        self.find(priority).is_ok()
    }

    /// Removes and returns the element with the `rank`-th largest priority.
    ///
    /// The ranks of all elements with a smaller priority decrease by one.
    pub fn remove(&mut self, rank: usize) -> Result<T, RankIndexError> {
        self.check_rank(rank)?;
        let root = self
            .root
            .as_deref_mut()
            .expect("rank descent on an empty tree");
        Ok(Self::remove_rec(root, 1, self.max_priority, rank))
    }

    fn remove_rec(node: &mut Node<T>, lo: usize, hi: usize, rank: usize) -> T {
        node.count -= 1;
        if lo == hi {
            return node.item.take().expect("removal reached an empty leaf");
        }
        let mid = (lo + hi) / 2;
        let right_count = Node::count_of(&node.right);
        if rank <= right_count {
            Self::remove_rec(
                node.right.as_deref_mut().expect("inconsistent subtree counts"),
                mid + 1,
                hi,
                rank,
            )
        } else {
            Self::remove_rec(
                node.left.as_deref_mut().expect("inconsistent subtree counts"),
                lo,
                mid,
                rank - right_count,
            )
        }
    }

    fn insert_rec(slot: &mut Option<Box<Node<T>>>, lo: usize, hi: usize, priority: usize, value: T) {
        let node = slot.get_or_insert_with(|| Box::new(Node::empty()));
        node.count += 1;
        if lo == hi {
            debug_assert!(node.item.is_none(), "insertion over an occupied leaf");
            node.item = Some(value);
            return;
        }
        let mid = (lo + hi) / 2;
        if priority <= mid {
            Self::insert_rec(&mut node.left, lo, mid, priority, value);
        } else {
            Self::insert_rec(&mut node.right, mid + 1, hi, priority, value);
        }
    }

    /// Re-keys the element with the `rank`-th largest priority to a new,
    /// currently free priority.
    ///
    /// The element's rank changes accordingly. Note that re-keying an
    /// element to its own current priority fails with
    /// [`PriorityOccupied`](RankIndexError::PriorityOccupied).
    pub fn set_priority(&mut self, rank: usize, priority: usize) -> Result<(), RankIndexError> {
        self.check_rank(rank)?;
        self.check_priority(priority)?;
        if self.contains_priority(priority) {
            return Err(RankIndexError::PriorityOccupied { priority });
        }
        let value = self.remove(rank)?;
        Self::insert_rec(&mut self.root, 1, self.max_priority, priority, value);
        Ok(())
    }
}

impl<T: Clone + Send + Sync> RankIndex<T> {
    /// Builds the index from a list of (value, priority) pairs, replacing
    /// any prior content.
    ///
    /// Priorities must be distinct and within the universe; on error the
    /// prior content is untouched. Sibling subtrees over disjoint priority
    /// intervals are built in parallel.
    pub fn build(&mut self, mut pairs: Vec<(T, usize)>) -> Result<(), RankIndexError> {
        for &(_, priority) in &pairs {
            self.check_priority(priority)?;
        }
        pairs.sort_by_key(|pair| pair.1);
        if let Some(window) = pairs.windows(2).find(|w| w[0].1 == w[1].1) {
            return Err(RankIndexError::DuplicatePriority {
                priority: window[0].1,
            });
        }
        self.root = Self::build_from_sorted(&pairs, 1, self.max_priority);
        Ok(())
    }

    fn build_from_sorted(items: &[(T, usize)], lo: usize, hi: usize) -> Option<Box<Node<T>>> {
        if items.is_empty() {
            return None;
        }
        if lo == hi {
            // Distinct priorities: a non-empty leaf interval holds one item
            debug_assert_eq!(items.len(), 1);
            return Some(Box::new(Node {
                count: 1,
                item: Some(items[0].0.clone()),
                left: None,
                right: None,
            }));
        }
        let mid = (lo + hi) / 2;
        let at = items.partition_point(|pair| pair.1 <= mid);
        let (left_items, right_items) = items.split_at(at);
        let (left, right) = if items.len() >= PAR_BUILD_THRESHOLD {
            rayon::join(
                || Self::build_from_sorted(left_items, lo, mid),
                || Self::build_from_sorted(right_items, mid + 1, hi),
            )
        } else {
            (
                Self::build_from_sorted(left_items, lo, mid),
                Self::build_from_sorted(right_items, mid + 1, hi),
            )
        };
        Some(Box::new(Node {
            count: items.len(),
            item: None,
            left,
            right,
        }))
    }
}

impl<T: Sync> RankIndex<T> {
    /// Returns the smallest rank `j ≥ from` whose value satisfies the
    /// predicate, or `len() + 1` if there is none.
    ///
    /// Starting ranks below 1 are clamped to 1; starting ranks beyond
    /// `len()` return `len() + 1` immediately, so `from` may be the
    /// `len() + 1` returned by a previous exhausted scan.
    ///
    /// The scan examines windows of doubling width, stopping at the first
    /// window containing a satisfying rank; the cost is therefore linear in
    /// `j - from`. Windows of at least 1024 ranks are reduced in parallel.
    pub fn next_with<P: Fn(&T) -> bool + Sync>(&self, from: usize, pred: P) -> usize {
        let len = self.len();
        if len == 0 {
            return 1;
        }
        let mut start = from.max(1);
        if start > len {
            return len + 1;
        }
        let mut width = 1;
        while start <= len {
            let end = (start + width - 1).min(len);
            if let Some(rank) = self.scan_window(start, end, &pred) {
                return rank;
            }
            start += width;
            width = width.saturating_mul(2);
        }
        len + 1
    }

    /// Returns the smallest rank in `[start, end]` whose value satisfies the
    /// predicate.
    fn scan_window<P: Fn(&T) -> bool + Sync>(
        &self,
        start: usize,
        end: usize,
        pred: &P,
    ) -> Option<usize> {
        if end - start + 1 < PAR_SCAN_THRESHOLD {
            (start..=end).find(|&rank| pred(self.rank_unchecked(rank)))
        } else {
            (start..=end)
                .into_par_iter()
                .filter(|&rank| pred(self.rank_unchecked(rank)))
                .min()
        }
    }
}
