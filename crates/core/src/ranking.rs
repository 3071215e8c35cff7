//! Competition ranking by point totals.
//!
//! An entity's rank is one more than the number of peers with strictly more
//! points, so tied entities share a rank and the next rank is skipped
//! (`[100, 100, 50]` ranks as `[1, 1, 3]`).

use serde::Serialize;

/// Rank of an entity holding `points` among `peers`.
///
/// `peers` may include the entity itself; equal totals never count against it.
pub fn competition_rank<I>(points: i64, peers: I) -> u32
where
    I: IntoIterator<Item = i64>,
{
    let ahead = peers.into_iter().filter(|&p| p > points).count();
    ahead as u32 + 1
}

/// Rank every entry of a population, preserving input order.
pub fn rank_all(points: &[i64]) -> Vec<u32> {
    points
        .iter()
        .map(|&p| competition_rank(p, points.iter().copied()))
        .collect()
}

/// A leaderboard entry paired with its rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked<T> {
    pub rank: u32,
    #[serde(flatten)]
    pub entry: T,
}

/// Attach ranks to entries already sorted by descending points.
///
/// Valid for any prefix of the full ordering (a top-N leaderboard), since
/// everyone ahead of an entry is then also in the list.
pub fn rank_sorted<T, F>(entries: Vec<T>, points_of: F) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> i64,
{
    let mut ranked: Vec<Ranked<T>> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if points_of(&prev.entry) == points_of(&entry) => prev.rank,
            _ => index as u32 + 1,
        };
        ranked.push(Ranked { rank, entry });
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_points_rank_in_order() {
        assert_eq!(rank_all(&[100, 75, 50, 25]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn ties_share_rank_and_skip_next() {
        assert_eq!(rank_all(&[100, 100, 50]), vec![1, 1, 3]);
    }

    #[test]
    fn input_order_does_not_matter() {
        assert_eq!(rank_all(&[25, 100, 50, 75]), vec![4, 1, 3, 2]);
    }

    #[test]
    fn lone_entity_is_first() {
        assert_eq!(competition_rank(0, []), 1);
        assert_eq!(competition_rank(0, [0]), 1);
    }

    #[test]
    fn rank_sorted_matches_competition_rank() {
        let points = vec![100, 100, 50, 50, 10];
        let ranked = rank_sorted(points.clone(), |p| *p);
        let ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 3, 5]);
        assert_eq!(ranks, rank_all(&points));
    }

    #[test]
    fn rank_sorted_empty() {
        let ranked = rank_sorted(Vec::<i64>::new(), |p| *p);
        assert!(ranked.is_empty());
    }
}
