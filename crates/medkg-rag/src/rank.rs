//! Ordering of vector-channel candidates.

use std::cmp::Ordering;

use medkg_core::CandidateRecord;

/// Higher scores first; NaN after every number.
fn by_score_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Sort candidates by descending score. Equal scores keep their retrieval order.
pub fn rank(mut candidates: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    candidates.sort_by(|a, b| by_score_desc(a.score, b.score));
    candidates
}

/// The first `n` ranked candidates, or all of them when there are fewer.
pub fn top_n(ranked: &[CandidateRecord], n: usize) -> &[CandidateRecord] {
    &ranked[..n.min(ranked.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(scores: &[f32]) -> Vec<CandidateRecord> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| CandidateRecord::named(format!("c{i}"), *s))
            .collect()
    }

    fn scores(records: &[CandidateRecord]) -> Vec<f32> {
        records.iter().map(|r| r.score).collect()
    }

    fn names(records: &[CandidateRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let ranked = rank(batch(&[0.9, 0.5, 0.7]));
        assert_eq!(scores(&ranked), vec![0.9, 0.7, 0.5]);
        assert_eq!(scores(top_n(&ranked, 2)), vec![0.9, 0.7]);
    }

    #[test]
    fn ties_keep_retrieval_order() {
        let ranked = rank(batch(&[0.5, 0.8, 0.5, 0.8, 0.5]));
        assert_eq!(names(&ranked), vec!["c1", "c3", "c0", "c2", "c4"]);
    }

    #[test]
    fn nan_sinks_to_the_end() {
        let ranked = rank(batch(&[f32::NAN, 0.1, f32::NAN, 0.9]));
        assert_eq!(names(&ranked), vec!["c3", "c1", "c0", "c2"]);
    }

    #[test]
    fn top_n_bounds() {
        let ranked = rank(batch(&[0.3, 0.2]));
        assert_eq!(top_n(&ranked, 0).len(), 0);
        assert_eq!(top_n(&ranked, 5).len(), 2);
        assert!(top_n(&[], 3).is_empty());
    }

    #[test]
    fn ranking_is_a_permutation_of_the_input() {
        let input = batch(&[0.4, 0.9, 0.1, 0.4, 0.7, 0.0]);
        let ranked = rank(input.clone());
        assert_eq!(ranked.len(), input.len());
        for r in &input {
            assert!(ranked.contains(r));
        }
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
