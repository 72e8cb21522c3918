//! Stratified train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplitError {
    #[error("test size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),

    #[error("cannot split an empty label set")]
    Empty,

    #[error("split leaves the {0} partition empty")]
    EmptyPartition(&'static str),
}

/// Row indices of each partition, in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so each class keeps its proportion in both partitions.
///
/// The test size is fixed first as `ceil(n * test_size)` and spread across
/// classes by largest remainder, capped so every class keeps a training row.
/// Classes are visited in ascending label order and shuffled with a single
/// generator seeded once, so a given `(labels, test_size, seed)` always yields
/// the same partition.
pub fn stratified_split(
    labels: &[usize],
    test_size: f64,
    seed: u64,
) -> Result<SplitIndices, SplitError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SplitError::InvalidTestSize(test_size));
    }
    if labels.is_empty() {
        return Err(SplitError::Empty);
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }

    let class_sizes: Vec<usize> = by_class.values().map(Vec::len).collect();
    let n_test = (labels.len() as f64 * test_size).ceil() as usize;
    let allocation = allocate_test_rows(&class_sizes, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::with_capacity(n_test);

    for (indices, &n_class_test) in by_class.values_mut().zip(&allocation) {
        indices.shuffle(&mut rng);
        test.extend_from_slice(&indices[..n_class_test]);
        train.extend_from_slice(&indices[n_class_test..]);
    }

    if train.is_empty() {
        return Err(SplitError::EmptyPartition("train"));
    }
    if test.is_empty() {
        return Err(SplitError::EmptyPartition("test"));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

/// Largest-remainder apportionment of `n_test` rows over classes of the
/// given sizes; no class gives up its last row.
fn allocate_test_rows(class_sizes: &[usize], n_test: usize) -> Vec<usize> {
    let total: usize = class_sizes.iter().sum();
    let mut allocation: Vec<usize> = class_sizes
        .iter()
        .map(|&len| (len * n_test / total).min(len.saturating_sub(1)))
        .collect();

    let mut by_remainder: Vec<usize> = (0..class_sizes.len()).collect();
    by_remainder.sort_by_key(|&c| std::cmp::Reverse((class_sizes[c] * n_test) % total));

    let mut leftover = n_test.saturating_sub(allocation.iter().sum());
    while leftover > 0 {
        let mut assigned = false;
        for &c in &by_remainder {
            if leftover == 0 {
                break;
            }
            if allocation[c] + 1 < class_sizes[c] {
                allocation[c] += 1;
                leftover -= 1;
                assigned = true;
            }
        }
        if !assigned {
            break;
        }
    }

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced_labels(per_class: usize) -> Vec<usize> {
        (0..per_class * 4).map(|i| i % 4).collect()
    }

    #[test]
    fn test_eighty_twenty_per_class() {
        let labels = balanced_labels(25);
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
        for class in 0..4 {
            let in_test = split.test.iter().filter(|&&i| labels[i] == class).count();
            assert_eq!(in_test, 5);
        }
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let labels = balanced_labels(13);
        let split = stratified_split(&labels, 0.2, 7).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..labels.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let labels = balanced_labels(30);
        let a = stratified_split(&labels, 0.2, 42).unwrap();
        let b = stratified_split(&labels, 0.2, 42).unwrap();
        let c = stratified_split(&labels, 0.2, 43).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn test_uneven_classes_hold_out_ceil_total() {
        // 28 rows: ceil(5.6) = 6 held out, two classes give up an extra row
        let labels = balanced_labels(7);
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 6);
        assert_eq!(split.train.len(), 22);
        let per_class: Vec<usize> = (0..4)
            .map(|class| split.test.iter().filter(|&&i| labels[i] == class).count())
            .collect();
        assert_eq!(per_class, vec![2, 2, 1, 1]);
    }

    #[test]
    fn test_held_out_fraction_tracks_test_size() {
        for (per_class, expected) in [(3, 3), (13, 11), (12, 10)] {
            let labels = balanced_labels(per_class);
            let split = stratified_split(&labels, 0.2, 42).unwrap();
            assert_eq!(split.test.len(), expected, "{} rows", labels.len());
        }
    }

    #[test]
    fn test_allocation_prefers_largest_remainder() {
        // shares of 4 over [10, 6, 4]: 2.0, 1.2, 0.8
        assert_eq!(allocate_test_rows(&[10, 6, 4], 4), vec![2, 1, 1]);
        // singletons are never held out
        assert_eq!(allocate_test_rows(&[1, 1, 8], 3), vec![0, 0, 3]);
    }

    #[test]
    fn test_small_class_keeps_a_training_row() {
        // every class keeps at least one training row, singletons included
        let labels = vec![0, 0, 0, 1, 1, 2];
        let split = stratified_split(&labels, 0.6, 1).unwrap();

        let train_labels: Vec<usize> = split.train.iter().map(|&i| labels[i]).collect();
        assert!(train_labels.contains(&0));
        assert!(train_labels.contains(&1));
        assert!(train_labels.contains(&2));
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(
            stratified_split(&[0, 1], 0.0, 1),
            Err(SplitError::InvalidTestSize(0.0))
        );
        assert_eq!(
            stratified_split(&[0, 1], 1.0, 1),
            Err(SplitError::InvalidTestSize(1.0))
        );
        assert_eq!(stratified_split(&[], 0.2, 1), Err(SplitError::Empty));
        assert_eq!(
            stratified_split(&[0, 1, 2], 0.2, 1),
            Err(SplitError::EmptyPartition("test"))
        );
    }
}
