//! Ranker: orders scored entities by FitScore and truncates to top-N.
//!
//! Ordering is total: FitScore descending, then entity id ascending. Identical inputs
//! therefore always produce identical output. Rankings are rebuilt from scratch on each
//! call; nothing is carried between requests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::fitscore::model::{EntityId, ScoredPair};

/// Product default for top-N lists.
pub const DEFAULT_LIMIT: usize = 20;

/// An entity (coach or job) together with its score against the batch subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntity<T> {
    pub id: EntityId,
    pub entity: T,
    pub score: ScoredPair,
}

impl<T> ScoredEntity<T> {
    pub fn fitscore(&self) -> f64 {
        self.score.fitscore
    }
}

/// Sort key: higher FitScore first, ties by ascending id.
pub fn rank_order<T>(a: &ScoredEntity<T>, b: &ScoredEntity<T>) -> Ordering {
    b.fitscore()
        .total_cmp(&a.fitscore())
        .then_with(|| a.id.cmp(&b.id))
}

/// A finite, ordered result. `iter()` can be called any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<T> {
    entries: Vec<ScoredEntity<T>>,
}

impl<T> Ranking<T> {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Lazily yields `(rank, entry)` with 1-based ranks.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ScoredEntity<T>)> + '_ {
        self.entries.iter().enumerate().map(|(i, e)| (i + 1, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> IntoIterator for Ranking<T> {
    type Item = ScoredEntity<T>;
    type IntoIter = std::vec::IntoIter<ScoredEntity<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Sorts by `rank_order` and keeps the first `limit` entries.
pub fn rank<T>(mut scored: Vec<ScoredEntity<T>>, limit: usize) -> Ranking<T> {
    if limit == 0 {
        return Ranking::empty();
    }
    if limit < scored.len() {
        scored.select_nth_unstable_by(limit - 1, rank_order);
        scored.truncate(limit);
    }
    scored.sort_by(rank_order);
    Ranking { entries: scored }
}

/// Head of one partition inside the merge heap. `BinaryHeap` is a max-heap, so the
/// "greatest" head is the one that ranks first.
struct Head {
    fitscore: f64,
    id: EntityId,
    source: usize,
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fitscore
            .total_cmp(&other.fitscore)
            .then_with(|| other.id.cmp(&self.id))
            .then_with(|| other.source.cmp(&self.source))
    }
}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

/// K-way merge of rankings produced independently (one per partition).
pub fn merge_ranked<T>(partials: Vec<Ranking<T>>, limit: usize) -> Ranking<T> {
    let mut sources: Vec<std::vec::IntoIter<ScoredEntity<T>>> =
        partials.into_iter().map(IntoIterator::into_iter).collect();
    let mut pending: Vec<Option<ScoredEntity<T>>> = Vec::with_capacity(sources.len());
    let mut heap = BinaryHeap::with_capacity(sources.len());

    for (source, iter) in sources.iter_mut().enumerate() {
        let next = iter.next();
        if let Some(entry) = &next {
            heap.push(Head {
                fitscore: entry.fitscore(),
                id: entry.id,
                source,
            });
        }
        pending.push(next);
    }

    let mut entries = Vec::with_capacity(limit.min(heap.len() * 4));
    while entries.len() < limit {
        let Some(head) = heap.pop() else { break };
        if let Some(entry) = pending[head.source].take() {
            entries.push(entry);
        }
        if let Some(next) = sources[head.source].next() {
            heap.push(Head {
                fitscore: next.fitscore(),
                id: next.id,
                source: head.source,
            });
            pending[head.source] = Some(next);
        }
    }

    Ranking { entries }
}
