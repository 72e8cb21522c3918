//! Best-of-N model selection

/// One trained run awaiting selection
#[derive(Debug, Clone)]
pub struct Candidate<M> {
    pub run: usize,
    pub seed: u64,
    pub accuracy: f64,
    pub model: M,
}

/// Keep the best candidate by held-out accuracy.
///
/// The first candidate is the baseline; a later one replaces it only when
/// its accuracy is strictly greater, so ties keep the earliest run. Returns
/// `None` only for an empty input.
pub fn select_best<M, I>(candidates: I) -> Option<Candidate<M>>
where
    I: IntoIterator<Item = Candidate<M>>,
{
    let mut iter = candidates.into_iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if candidate.accuracy > best.accuracy {
            best = candidate;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(run: usize, accuracy: f64) -> Candidate<&'static str> {
        Candidate {
            run,
            seed: 42 + run as u64,
            accuracy,
            model: "m",
        }
    }

    #[test]
    fn test_strictly_better_replaces() {
        let candidates = vec![candidate(1, 0.5), candidate(2, 0.7), candidate(3, 0.6)];
        let best = select_best(candidates).unwrap();
        assert_eq!(best.run, 2);
        assert_eq!(best.seed, 44);
    }

    #[test]
    fn test_ties_keep_earliest() {
        let candidates = vec![candidate(1, 0.6), candidate(2, 0.6), candidate(3, 0.6)];
        let best = select_best(candidates).unwrap();
        assert_eq!(best.run, 1);
    }

    #[test]
    fn test_zero_accuracy_still_selects() {
        let best = select_best(vec![candidate(1, 0.0), candidate(2, 0.0)]).unwrap();
        assert_eq!(best.run, 1);
    }

    #[test]
    fn test_empty() {
        assert!(select_best(Vec::<Candidate<()>>::new()).is_none());
    }
}
