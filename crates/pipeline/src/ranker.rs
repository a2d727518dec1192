//! Ranker.
//!
//! Orders candidates by composite score, highest first. Ties fall through
//! to aggregate rating, review count, distance (closer first) and finally
//! store id, so identical inputs always produce the same order. A missing
//! rating, review count or distance sorts after any present value.

use crate::merger::ScoredCandidate;
use std::cmp::Ordering;

/// Sort and truncate to `limit`.
pub fn rank(mut candidates: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(ranking_order);
    candidates.truncate(limit);
    candidates
}

/// Total order used by [`rank`]; `Less` means `a` ranks higher.
pub fn ranking_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    let (a_attrs, b_attrs) = (&a.candidate.attributes, &b.candidate.attributes);
    b.composite
        .total_cmp(&a.composite)
        .then_with(|| descending_present_first(a_attrs.rating, b_attrs.rating, |x, y| x.total_cmp(y)))
        .then_with(|| descending_present_first(a_attrs.review_count, b_attrs.review_count, Ord::cmp))
        .then_with(|| match (a.candidate.distance_meters, b.candidate.distance_meters) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.store_id().cmp(&b.store_id()))
}

fn descending_present_first<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&y, &x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
