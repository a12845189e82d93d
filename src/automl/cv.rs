//! Seeded, stratified train/test split and k-fold assignment.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Indices of each class, in row order.
fn indices_by_class(y: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut by_class = vec![Vec::new(); n_classes];
    for (i, &c) in y.iter().enumerate() {
        by_class[c].push(i);
    }
    by_class
}

/// Split rows into (train, test) keeping class proportions. Every class
/// keeps at least one training row. Both outputs are sorted.
pub fn stratified_split(
    y: &[usize],
    n_classes: usize,
    train_size: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut members in indices_by_class(y, n_classes) {
        if members.is_empty() {
            continue;
        }
        members.shuffle(rng);
        let n_train = ((members.len() as f64 * train_size).round() as usize).clamp(1, members.len());
        train.extend_from_slice(&members[..n_train]);
        test.extend_from_slice(&members[n_train..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// One cross-validation fold as positions into the caller's sample list.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

/// Stratified k-fold: each class is shuffled and dealt round-robin over the
/// folds, so every fold sees every class with at least `k` members.
pub fn stratified_folds(y: &[usize], n_classes: usize, k: usize, rng: &mut StdRng) -> Vec<Fold> {
    let mut assignment = vec![0usize; y.len()];
    let mut offset = 0;
    for mut members in indices_by_class(y, n_classes) {
        members.shuffle(rng);
        for (pos, &i) in members.iter().enumerate() {
            assignment[i] = (offset + pos) % k;
        }
        // continue dealing where the previous class stopped so fold sizes stay even
        offset = (offset + members.len()) % k;
    }

    (0..k)
        .map(|fold| {
            let (valid, train): (Vec<usize>, Vec<usize>) =
                (0..y.len()).partition(|&i| assignment[i] == fold);
            Fold { train, valid }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_split_is_stratified_and_seeded() {
        let y: Vec<usize> = (0..100).map(|i| usize::from(i % 4 == 0)).collect();
        let (train_a, test_a) = stratified_split(&y, 2, 0.7, &mut StdRng::seed_from_u64(123));
        let (train_b, _) = stratified_split(&y, 2, 0.7, &mut StdRng::seed_from_u64(123));
        assert_eq!(train_a, train_b);
        assert_eq!(train_a.len() + test_a.len(), 100);

        let ones_train = train_a.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(ones_train, 18); // round(25 * 0.7)
    }

    #[test]
    fn test_folds_cover_every_row_once() {
        let y: Vec<usize> = (0..23).map(|i| i % 3).collect();
        let folds = stratified_folds(&y, 3, 5, &mut StdRng::seed_from_u64(1));
        assert_eq!(folds.len(), 5);
        let mut seen = vec![0; y.len()];
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.valid.len(), y.len());
            for &i in &fold.valid {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }
}
