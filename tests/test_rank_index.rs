/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2025 Fontana Tommaso
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use decremental_bfs::rank_index::{RankIndex, RankIndexError};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[test]
fn test_query_and_find() -> Result<()> {
    let mut index = RankIndex::new(1000);
    index.build(vec![
        (100, 10),
        (200, 150),
        (300, 999),
        (400, 500),
        (500, 1),
    ])?;

    assert_eq!(index.len(), 5);
    assert_eq!(index.get(1)?, &300);
    assert_eq!(index.get(5)?, &500);
    // Priorities 999 and 500 are higher than 150
    assert_eq!(index.find(150)?, (&200, 3));

    let (_, rank_of_10) = index.find(10)?;
    index.set_priority(rank_of_10, 501)?;
    assert_eq!(index.find(501)?.0, &100);
    // The re-keyed element now outranks priority 500
    assert_eq!(index.find(501)?.1, 2);
    assert_eq!(index.find(500)?, (&400, 3));
    Ok(())
}

#[test]
fn test_next_with() -> Result<()> {
    let mut index = RankIndex::new(8);
    // Value i sits at rank i
    index.build((1..=8).map(|i| (i, 9 - i)).collect())?;

    let pred = |&value: &usize| value == 3 || value == 6;
    assert_eq!(index.next_with(1, pred), 3);
    assert_eq!(index.next_with(3, pred), 3);
    assert_eq!(index.next_with(4, pred), 6);
    assert_eq!(index.next_with(7, pred), 9);
    // Starting from a previously exhausted cursor is fine
    assert_eq!(index.next_with(9, pred), 9);
    assert_eq!(index.next_with(0, pred), 3);
    assert_eq!(index.next_with(1, |_| false), 9);
    Ok(())
}

#[test]
fn test_round_trip() -> Result<()> {
    let max_priority = 1000;
    let mut rng = SmallRng::seed_from_u64(0);
    let mut priorities: Vec<usize> = (1..=max_priority).collect();
    priorities.shuffle(&mut rng);
    priorities.truncate(200);

    // Each element's value is its own priority
    let mut index = RankIndex::new(max_priority);
    index.build(priorities.iter().map(|&p| (p, p)).collect())?;

    for rank in 1..=index.len() {
        let &priority = index.get(rank)?;
        assert_eq!(index.find(priority)?, (&priority, rank));
    }

    // Ranks decrease with increasing priority
    priorities.sort_unstable_by(|a, b| b.cmp(a));
    for (at, &priority) in priorities.iter().enumerate() {
        assert_eq!(index.find(priority)?.1, at + 1);
    }
    Ok(())
}

#[test]
fn test_next_with_agrees_with_linear_scan() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut index = RankIndex::new(5000);
    let mut priorities: Vec<usize> = (1..=5000).collect();
    priorities.shuffle(&mut rng);
    priorities.truncate(600);
    index.build(priorities.iter().map(|&p| (p, p)).collect())?;

    let len = index.len();
    let marked: Vec<bool> = (0..=len).map(|_| rng.random_bool(0.02)).collect();
    let pred = |&value: &usize| {
        let (_, rank) = index.find(value).unwrap();
        marked[rank]
    };
    for from in 1..=len + 1 {
        let expected = (from..=len)
            .find(|&rank| marked[rank])
            .unwrap_or(len + 1);
        assert_eq!(index.next_with(from, pred), expected, "from rank {from}");
    }
    Ok(())
}

#[test]
fn test_large_index_uses_parallel_paths() -> Result<()> {
    // Big enough to cross both the parallel build and the parallel window
    // scan thresholds
    let len = 5000;
    let mut index = RankIndex::new(len);
    index.build((1..=len).map(|p| (p, p)).collect())?;

    assert_eq!(index.len(), len);
    // Rank k holds priority len + 1 - k
    assert_eq!(index.get(1)?, &len);
    assert_eq!(index.get(len)?, &1);
    assert_eq!(index.next_with(1, |&v| v == 1), len);
    assert_eq!(index.next_with(1, |_| false), len + 1);
    Ok(())
}

#[test]
fn test_set_value() -> Result<()> {
    let mut index = RankIndex::new(16);
    index.build(vec![("a", 4), ("b", 8), ("c", 12)])?;
    index.set_value(2, "d")?;
    assert_eq!(index.get(2)?, &"d");
    assert_eq!(index.find(8)?, (&"d", 2));
    // Ranks and priorities are untouched
    assert_eq!(index.get(1)?, &"c");
    assert_eq!(index.get(3)?, &"a");
    Ok(())
}

#[test]
fn test_random_removals() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(2);
    let mut index = RankIndex::new(64);
    index.build((1..=64).map(|p| (p, p)).collect())?;

    // Tear the index down in random rank order, checking consistency as the
    // ranks shift
    for len in (1..=64usize).rev() {
        let rank = rng.random_range(1..=len);
        let removed = index.remove(rank)?;
        assert_eq!(index.len(), len - 1);
        assert!(!index.contains_priority(removed));
        for rank in 1..index.len() {
            assert!(index.get(rank)? > index.get(rank + 1)?);
        }
    }
    assert!(index.is_empty());
    assert_eq!(index.next_with(1, |_| true), 1);
    Ok(())
}

#[test]
fn test_errors() {
    let mut index = RankIndex::new(10);
    index.build(vec![(0, 5)]).unwrap();

    assert_eq!(
        index.get(0),
        Err(RankIndexError::RankOutOfRange { rank: 0, len: 1 })
    );
    assert_eq!(
        index.get(2),
        Err(RankIndexError::RankOutOfRange { rank: 2, len: 1 })
    );
    assert_eq!(
        index.find(0),
        Err(RankIndexError::PriorityOutOfRange {
            priority: 0,
            max_priority: 10
        })
    );
    assert_eq!(
        index.find(11),
        Err(RankIndexError::PriorityOutOfRange {
            priority: 11,
            max_priority: 10
        })
    );
    assert_eq!(
        index.find(6),
        Err(RankIndexError::PriorityNotFound { priority: 6 })
    );
    assert_eq!(
        index.remove(2),
        Err(RankIndexError::RankOutOfRange { rank: 2, len: 1 })
    );
    assert_eq!(
        index.set_priority(1, 5),
        Err(RankIndexError::PriorityOccupied { priority: 5 })
    );
    assert_eq!(
        index.set_priority(1, 11),
        Err(RankIndexError::PriorityOutOfRange {
            priority: 11,
            max_priority: 10
        })
    );
    assert_eq!(
        index.build(vec![(0, 1), (1, 1)]),
        Err(RankIndexError::DuplicatePriority { priority: 1 })
    );
    // All of the above left the index untouched
    assert_eq!(index.len(), 1);
    assert_eq!(index.get(1), Ok(&0));
}
