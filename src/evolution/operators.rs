//! Genetic operators.
//!
//! Two combinators turn plain functions into [`GeneticOperator`]s:
//!
//! - [`Mutation`]: applies a per-individual transform to every member,
//!   preserving order and size
//! - [`Crossover`]: combines neighbouring parents until the target
//!   population size is reached
//!
//! The module also provides permutation helpers (`&[usize]` index vectors)
//! for problems such as the traveling salesperson:
//!
//! - [`order_crossover`] (OX): Davis (1985), preserves relative order
//! - [`swap_mutation`]: exchange two random positions, O(1)
//! - [`invert_mutation`]: reverse a random segment (2-opt), O(n)
//!
//! # References
//!
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Cicirello (2023), "Genetic Operators for Permutation Representation"

use super::types::GeneticOperator;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

// ============================================================================
// Combinators
// ============================================================================

/// Mutation operator: applies a transform to each individual independently.
///
/// ```
/// use evocomp::evolution::{GeneticOperator, Mutation};
/// use rand::{RngCore, SeedableRng};
///
/// let double = Mutation::new(|x: &i32, _rng: &mut dyn RngCore| Ok(x * 2));
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// assert_eq!(double.apply(vec![1, 2, 3], 3, &mut rng).unwrap(), vec![2, 4, 6]);
/// ```
pub struct Mutation<F> {
    mutate: F,
    probability: f64,
}

impl<F> Mutation<F> {
    /// Wraps a mutation function applied to every individual.
    pub fn new<I>(mutate: F) -> Self
    where
        F: Fn(&I, &mut dyn RngCore) -> Result<I>,
    {
        Self {
            mutate,
            probability: 1.0,
        }
    }

    /// Sets the per-individual mutation probability (clamped to 0.0–1.0).
    ///
    /// Individuals that are not mutated are cloned unchanged.
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl<I, F> GeneticOperator<I> for Mutation<F>
where
    I: Clone,
    F: Fn(&I, &mut dyn RngCore) -> Result<I>,
{
    fn apply(
        &self,
        population: Vec<I>,
        _population_size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<I>> {
        population
            .iter()
            .map(|individual| {
                if self.probability >= 1.0 || rng.random_bool(self.probability) {
                    (self.mutate)(individual, rng)
                } else {
                    Ok(individual.clone())
                }
            })
            .collect()
    }
}

/// Crossover operator: refills the selected parents to the target size.
///
/// Child `i` is produced from `parents[i % len]` and `parents[(i + 1) % len]`.
/// Every parent is equally likely to reproduce, regardless of fitness. By
/// default the parents keep the order the selection produced; use
/// [`shuffled`](Crossover::shuffled) to pair them randomly instead.
pub struct Crossover<F> {
    combine: F,
    sorted: bool,
}

impl<F> Crossover<F> {
    /// Wraps a function combining two parents into one child.
    pub fn new<I>(combine: F) -> Self
    where
        F: Fn(&I, &I, &mut dyn RngCore) -> Result<I>,
    {
        Self {
            combine,
            sorted: true,
        }
    }

    /// Shuffles the parents before pairing them.
    pub fn shuffled(mut self) -> Self {
        self.sorted = false;
        self
    }

    /// Whether the parents keep their incoming order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }
}

impl<I, F> GeneticOperator<I> for Crossover<F>
where
    F: Fn(&I, &I, &mut dyn RngCore) -> Result<I>,
{
    fn apply(
        &self,
        mut population: Vec<I>,
        population_size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<I>> {
        let n = population.len();
        if n == 0 {
            if population_size == 0 {
                return Ok(Vec::new());
            }
            return Err(Error::InvalidConfiguration(
                "crossover needs at least one parent".into(),
            ));
        }

        if !self.sorted {
            population.shuffle(rng);
        }

        (0..population_size)
            .map(|i| (self.combine)(&population[i % n], &population[(i + 1) % n], rng))
            .collect()
    }
}

// ============================================================================
// Permutation operators
// ============================================================================

/// Order Crossover (OX) for permutations.
///
/// Preserves the **relative order** of elements from both parents.
///
/// # Algorithm (Davis, 1985)
///
/// 1. Select a random segment `[start, end]` from parent1
/// 2. Copy segment to child at the same positions
/// 3. Fill remaining positions with elements from parent2, in their original
///    order, skipping elements already present in the child
///
/// # Errors
/// Returns [`Error::InvalidConfiguration`] if the parents have different
/// lengths, are empty, or are not both permutations of `0..n`.
pub fn order_crossover<R: Rng + ?Sized>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> Result<Vec<usize>> {
    let n = parent1.len();
    if n != parent2.len() || n == 0 {
        return Err(Error::InvalidConfiguration(format!(
            "order crossover needs non-empty parents of equal length, got {} and {}",
            n,
            parent2.len()
        )));
    }
    check_permutation(parent1, "first")?;
    check_permutation(parent2, "second")?;

    if n == 1 {
        return Ok(parent1.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    Ok(ox_build_child(parent1, parent2, start, end))
}

/// Every value in `0..perm.len()` exactly once.
fn check_permutation(perm: &[usize], which: &str) -> Result<()> {
    let n = perm.len();
    let mut seen = vec![false; n];
    for &value in perm {
        if value >= n {
            return Err(Error::InvalidConfiguration(format!(
                "order crossover: {which} parent has {value}, out of range for length {n}"
            )));
        }
        if std::mem::replace(&mut seen[value], true) {
            return Err(Error::InvalidConfiguration(format!(
                "order crossover: {which} parent repeats {value}"
            )));
        }
    }
    Ok(())
}

/// Build one OX child: copy segment from `template`, fill from `donor`.
fn ox_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut in_segment = vec![false; n];

    for i in start..=end {
        child[i] = template[i];
        in_segment[template[i]] = true;
    }

    // Fill from donor, starting after segment end, wrapping around
    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let val = donor[(end + 1 + offset) % n];
        if !in_segment[val] {
            child[pos] = val;
            pos = (pos + 1) % n;
        }
    }

    child
}

/// Swap mutation: exchange two random positions.
pub fn swap_mutation<R: Rng + ?Sized>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let i = rng.random_range(0..n);
    let j = rng.random_range(0..n);
    perm.swap(i, j);
}

/// Invert mutation: reverse a random segment (2-opt move).
pub fn invert_mutation<R: Rng + ?Sized>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    perm[start..=end].reverse();
}

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Check that a slice is a valid permutation of 0..n.
    fn is_valid_permutation(perm: &[usize], n: usize) -> bool {
        if perm.len() != n {
            return false;
        }
        let set: HashSet<usize> = perm.iter().copied().collect();
        set.len() == n && perm.iter().all(|&v| v < n)
    }

    // ---- Mutation combinator ----

    #[test]
    fn test_mutation_preserves_order_and_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Mutation::new(|x: &i32, _rng: &mut dyn RngCore| Ok(x + 10));
        let out = op.apply(vec![1, 2, 3, 4], 4, &mut rng).unwrap();
        assert_eq!(out, vec![11, 12, 13, 14]);
    }

    #[test]
    fn test_mutation_zero_probability_is_identity() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Mutation::new(|x: &i32, _rng: &mut dyn RngCore| Ok(x + 10)).with_probability(0.0);
        let out = op.apply(vec![1, 2, 3], 3, &mut rng).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_mutation_probability_clamped() {
        let op = Mutation::new(|x: &i32, _rng: &mut dyn RngCore| Ok(*x)).with_probability(1.5);
        assert!((op.probability() - 1.0).abs() < 1e-12);
        let op = Mutation::new(|x: &i32, _rng: &mut dyn RngCore| Ok(*x)).with_probability(-0.5);
        assert!((op.probability() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_mutation_partial_probability_mutates_some() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Mutation::new(|_x: &i32, _rng: &mut dyn RngCore| Ok(1)).with_probability(0.5);
        let out = op.apply(vec![0; 1000], 1000, &mut rng).unwrap();
        let mutated = out.iter().filter(|&&x| x == 1).count();
        assert!(
            (300..700).contains(&mutated),
            "expected about half mutated, got {mutated}"
        );
    }

    #[test]
    fn test_mutation_error_propagates() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Mutation::new(|x: &i32, _rng: &mut dyn RngCore| {
            if *x == 2 {
                Err(anyhow::anyhow!("cannot mutate 2").into())
            } else {
                Ok(*x)
            }
        });
        let err = op.apply(vec![1, 2, 3], 3, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Callback(_)));
    }

    // ---- Crossover combinator ----

    #[test]
    fn test_crossover_pairs_neighbours_in_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Crossover::new(|a: &i32, b: &i32, _rng: &mut dyn RngCore| Ok(a * 10 + b));
        let out = op.apply(vec![1, 2, 3], 5, &mut rng).unwrap();
        assert_eq!(out, vec![12, 23, 31, 12, 23]);
    }

    #[test]
    fn test_crossover_shuffled_keeps_parent_set() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Crossover::new(|a: &i32, _b: &i32, _rng: &mut dyn RngCore| Ok(*a)).shuffled();
        assert!(!op.is_sorted());
        let mut out = op.apply(vec![1, 2, 3, 4], 4, &mut rng).unwrap();
        out.sort();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_crossover_singleton_pairs_with_itself() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Crossover::new(|a: &i32, b: &i32, _rng: &mut dyn RngCore| Ok(a + b));
        assert_eq!(op.apply(vec![4], 3, &mut rng).unwrap(), vec![8, 8, 8]);
    }

    #[test]
    fn test_crossover_empty_parents() {
        let mut rng = StdRng::seed_from_u64(42);
        let op = Crossover::new(|a: &i32, _b: &i32, _rng: &mut dyn RngCore| Ok(*a));
        let err = op.apply(Vec::new(), 3, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    // ---- OX Crossover ----

    #[test]
    fn test_ox_produces_valid_permutations() {
        let mut rng = StdRng::seed_from_u64(42);
        let p1 = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = vec![7, 6, 5, 4, 3, 2, 1, 0];

        for _ in 0..100 {
            let child = order_crossover(&p1, &p2, &mut rng).unwrap();
            assert!(is_valid_permutation(&child, 8), "OX child not valid: {child:?}");
        }
    }

    #[test]
    fn test_ox_single_element() {
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(order_crossover(&[0], &[0], &mut rng).unwrap(), vec![0]);
    }

    #[test]
    fn test_ox_mismatched_lengths() {
        let mut rng = StdRng::seed_from_u64(42);
        assert!(order_crossover(&[0, 1], &[0], &mut rng).is_err());
        assert!(order_crossover(&[], &[], &mut rng).is_err());
    }

    #[test]
    fn test_ox_rejects_non_permutations() {
        let mut rng = StdRng::seed_from_u64(42);
        let valid = [0, 1, 2];
        for bad in [[0, 1, 3], [0, 0, 2], [5, 1, 2]] {
            for (p1, p2) in [(&bad, &valid), (&valid, &bad)] {
                assert!(matches!(
                    order_crossover(p1, p2, &mut rng),
                    Err(Error::InvalidConfiguration(_))
                ));
            }
        }
        assert!(order_crossover(&[3], &[0], &mut rng).is_err());
    }

    #[test]
    fn test_ox_identical_parents() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = vec![3, 1, 4, 0, 2];
        for _ in 0..20 {
            assert_eq!(order_crossover(&p, &p, &mut rng).unwrap(), p);
        }
    }

    // ---- Swap / Invert Mutation ----

    #[test]
    fn test_swap_preserves_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let mut perm: Vec<usize> = (0..10).collect();
            swap_mutation(&mut perm, &mut rng);
            assert!(is_valid_permutation(&perm, 10));
        }
    }

    #[test]
    fn test_swap_single_element() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut perm = vec![0];
        swap_mutation(&mut perm, &mut rng);
        assert_eq!(perm, vec![0]);
    }

    #[test]
    fn test_invert_eventually_changes_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let original: Vec<usize> = (0..5).collect();
        let mut changed = false;
        for _ in 0..100 {
            let mut perm = original.clone();
            invert_mutation(&mut perm, &mut rng);
            assert!(is_valid_permutation(&perm, 5));
            if perm != original {
                changed = true;
            }
        }
        assert!(changed, "invert should change the permutation eventually");
    }

    #[test]
    fn test_random_segment_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let (start, end) = random_segment(10, &mut rng);
            assert!(start <= end);
            assert!(end < 10);
        }
    }
}
