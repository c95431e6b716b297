use crate::detection::domain::embedding::Embedding;
use crate::recognition::domain::reference_store::ReferenceStore;

/// Identifies a face embedding against the reference store.
///
/// The nearest reference is chosen by distance, and separately each
/// reference gets a boolean "same person" verdict from the tolerance. A
/// label is accepted only when the nearest reference's own verdict is
/// positive.
#[derive(Clone, Debug)]
pub struct FaceMatcher {
    tolerance: f64,
}

/// Outcome of matching one face against every reference.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub best_index: usize,
    pub distance: f64,
    pub is_match: bool,
}

impl FaceMatcher {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Distance from `candidate` to each known embedding, in order.
    pub fn distances(&self, known: &[Embedding], candidate: &Embedding) -> Vec<f64> {
        known.iter().map(|k| k.distance(candidate)).collect()
    }

    /// Per-reference verdict: `distance <= tolerance`.
    pub fn compare(&self, known: &[Embedding], candidate: &Embedding) -> Vec<bool> {
        known
            .iter()
            .map(|k| k.distance(candidate) <= self.tolerance)
            .collect()
    }

    /// Nearest reference and whether it counts as a match.
    ///
    /// Returns `None` for an empty store.
    pub fn evaluate(&self, store: &ReferenceStore, candidate: &Embedding) -> Option<MatchResult> {
        let matches = self.compare(store.embeddings(), candidate);
        let distances = self.distances(store.embeddings(), candidate);
        let (best_index, distance) = argmin(&distances)?;
        Some(MatchResult {
            best_index,
            distance,
            is_match: matches[best_index],
        })
    }

    /// Label of the accepted reference, if any.
    pub fn identify<'a>(&self, store: &'a ReferenceStore, candidate: &Embedding) -> Option<&'a str> {
        let result = self.evaluate(store, candidate)?;
        if result.is_match {
            store.label(result.best_index)
        } else {
            None
        }
    }
}

/// Index and value of the first minimum. NaN never wins.
fn argmin(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| {
            if v.is_nan() {
                return best;
            }
            match best {
                Some((_, b)) if b <= v => best,
                _ => Some((i, v)),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::reference_store::ReferenceEntry;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn emb(v: &[f32]) -> Embedding {
        Embedding::normalized(v.to_vec())
    }

    fn store(entries: &[(&str, [f32; 2])]) -> ReferenceStore {
        ReferenceStore::from_entries(entries.iter().map(|(label, v)| ReferenceEntry {
            label: label.to_string(),
            embedding: emb(v),
        }))
    }

    #[test]
    fn test_distances_in_reference_order() {
        let m = FaceMatcher::new(0.6);
        let known = vec![emb(&[1.0, 0.0]), emb(&[0.0, 1.0])];
        let d = m.distances(&known, &emb(&[1.0, 0.0]));
        assert_abs_diff_eq!(d[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(d[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_compare_uses_inclusive_tolerance() {
        let m = FaceMatcher::new(1.0);
        let known = vec![emb(&[0.0, 1.0]), emb(&[-1.0, 0.0])];
        assert_eq!(m.compare(&known, &emb(&[1.0, 0.0])), vec![true, false]);
    }

    #[test]
    fn test_identify_picks_nearest_match() {
        let s = store(&[("alice", [1.0, 0.1]), ("bob", [0.1, 1.0])]);
        let m = FaceMatcher::new(0.6);
        assert_eq!(m.identify(&s, &emb(&[0.9, 0.2])), Some("alice"));
        assert_eq!(m.identify(&s, &emb(&[0.2, 0.9])), Some("bob"));
    }

    #[test]
    fn test_identify_rejects_when_nearest_is_too_far() {
        let s = store(&[("alice", [1.0, 0.0])]);
        let m = FaceMatcher::new(0.6);
        let result = m.evaluate(&s, &emb(&[0.0, 1.0])).unwrap();
        assert_eq!(result.best_index, 0);
        assert!(!result.is_match);
        assert_eq!(m.identify(&s, &emb(&[0.0, 1.0])), None);
    }

    #[test]
    fn test_empty_store_is_no_match() {
        let m = FaceMatcher::new(0.6);
        let s = ReferenceStore::new();
        assert_eq!(m.evaluate(&s, &emb(&[1.0, 0.0])), None);
        assert_eq!(m.identify(&s, &emb(&[1.0, 0.0])), None);
    }

    #[test]
    fn test_ties_go_to_first_reference() {
        let s = store(&[("first", [1.0, 0.0]), ("second", [1.0, 0.0])]);
        let m = FaceMatcher::new(0.6);
        assert_eq!(m.identify(&s, &emb(&[1.0, 0.0])), Some("first"));
    }

    #[rstest]
    #[case::single(&[0.3], Some((0, 0.3)))]
    #[case::first_minimum(&[0.5, 0.2, 0.2], Some((1, 0.2)))]
    #[case::skips_nan(&[f64::NAN, 0.4], Some((1, 0.4)))]
    #[case::empty(&[], None)]
    fn test_argmin(#[case] values: &[f64], #[case] expected: Option<(usize, f64)>) {
        assert_eq!(argmin(values), expected);
    }
}
