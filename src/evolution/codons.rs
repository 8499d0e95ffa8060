//! Symbol-index strategies: the seam between randomness, or genotype
//! decoding, and the generators.
//!
//! A [`SymbolIndex`] is asked for an alternative index in `[0, bound)` each
//! time a generator expands a rule. [`Codons`] turns a finite codon sequence
//! into such a strategy by reading it cyclically, the classic grammatical
//! evolution "wrapping" operator.

use super::mapper::MappingError;
use super::{BitChromosome, Chromosome, Genotype, IntegerChromosome};
use crate::grammar::{Cfg, Rule};
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Chooses which alternative of a rule to expand.
pub trait SymbolIndex<T> {
    /// Returns an index in `[0, bound)` for `rule`.
    fn next(&self, rule: &Rule<T>, bound: NonZeroUsize) -> usize;
}

impl<T, F> SymbolIndex<T> for F
where
    F: Fn(&Rule<T>, NonZeroUsize) -> usize,
{
    fn next(&self, rule: &Rule<T>, bound: NonZeroUsize) -> usize {
        self(rule, bound)
    }
}

/// Uniformly random alternative selection.
#[derive(Debug)]
pub struct RandomIndex {
    rng: Mutex<StdRng>,
}

impl RandomIndex {
    /// Seeds from OS entropy through the thread-local generator.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_rng(&mut rand::rng())),
        }
    }

    /// Reproducible selection for a fixed `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SymbolIndex<T> for RandomIndex {
    fn next(&self, _rule: &Rule<T>, bound: NonZeroUsize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(0..bound.get())
    }
}

/// A non-empty codon sequence read cyclically.
///
/// The cursor is atomic, so a `Codons` shared between threads hands out every
/// position exactly once per cycle. The interleaving between threads is not
/// deterministic.
#[derive(Debug)]
pub struct Codons {
    values: Vec<u32>,
    cursor: AtomicUsize,
}

impl Codons {
    /// Wraps `values` as codons, starting at the first one.
    ///
    /// # Arguments
    /// * `values` - The codon values, must not be empty
    ///
    /// # Returns
    /// * `Result<Codons, MappingError>` - `InvalidLength` for an empty sequence
    pub fn from_values(values: Vec<u32>) -> Result<Self, MappingError> {
        if values.is_empty() {
            return Err(MappingError::InvalidLength);
        }
        Ok(Self {
            values,
            cursor: AtomicUsize::new(0),
        })
    }

    /// One codon per byte of `chromosome`, each in `[0, 256)`. A partial last
    /// byte is zero-padded.
    pub fn from_bits(chromosome: &BitChromosome) -> Result<Self, MappingError> {
        let bytes = chromosome.to_bytes();
        if bytes.is_empty() {
            return Err(MappingError::TooFewBits {
                bits: chromosome.len(),
            });
        }
        Self::from_values(bytes.into_iter().map(u32::from).collect())
    }

    /// One codon per gene of `chromosome`.
    pub fn from_integers(chromosome: &IntegerChromosome) -> Result<Self, MappingError> {
        Self::from_values(chromosome.genes().to_vec())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the codon under the cursor and advances it, wrapping to the
    /// start after the last codon.
    pub fn next_value(&self) -> u32 {
        let len = self.values.len();
        let position = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        self.values[position]
    }
}

impl<T> SymbolIndex<T> for Codons {
    fn next(&self, _rule: &Rule<T>, bound: NonZeroUsize) -> usize {
        self.next_value() as usize % bound.get()
    }
}

/// One independent codon sequence per grammar rule.
///
/// Rule `i` (in grammar order) reads chromosome `i` of the genotype. The
/// per-rule `Codons` are built on first use and keep their own cursor, so
/// drawing for one rule never moves another rule's position. Meant for a
/// single decode on a single thread.
pub struct RuleCodons {
    chromosome_of: HashMap<String, usize>,
    // Genes wait here until their rule is first drawn, then move into `codons`.
    genes: Vec<Cell<Vec<u32>>>,
    codons: Vec<OnceCell<Codons>>,
}

impl std::fmt::Debug for RuleCodons {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCodons")
            .field("chromosome_of", &self.chromosome_of)
            .field("codons", &self.codons)
            .finish_non_exhaustive()
    }
}

impl RuleCodons {
    /// Pairs the rules of `cfg` with the chromosomes of `genotype`.
    ///
    /// # Arguments
    /// * `cfg` - The grammar whose rules select the chromosomes
    /// * `genotype` - One non-empty integer chromosome per rule, in rule order
    ///
    /// # Returns
    /// * `Result<RuleCodons, MappingError>` - Fails on a count, kind or length mismatch
    pub fn new<T>(cfg: &Cfg<T>, genotype: &Genotype) -> Result<Self, MappingError> {
        if genotype.len() != cfg.rules().len() {
            return Err(MappingError::ChromosomeCount {
                expected: cfg.rules().len(),
                found: genotype.len(),
            });
        }

        let genes: Vec<Cell<Vec<u32>>> = genotype
            .chromosomes()
            .iter()
            .enumerate()
            .map(|(index, chromosome)| match chromosome {
                Chromosome::Integer(c) if c.is_empty() => Err(MappingError::EmptyChromosome(index)),
                Chromosome::Integer(c) => Ok(Cell::new(c.genes().to_vec())),
                Chromosome::Bit(_) => Err(MappingError::ChromosomeKind {
                    index,
                    expected: "integer",
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let chromosome_of = cfg
            .rules()
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.start().name().to_string(), i))
            .collect();

        Ok(Self {
            chromosome_of,
            codons: genes.iter().map(|_| OnceCell::new()).collect(),
            genes,
        })
    }

    fn codons_for(&self, index: usize) -> Option<&Codons> {
        let cell = self.codons.get(index)?;
        if let Some(codons) = cell.get() {
            return Some(codons);
        }
        let codons = Codons::from_values(self.genes.get(index)?.take()).ok()?;
        Some(cell.get_or_init(|| codons))
    }
}

impl<T> SymbolIndex<T> for RuleCodons {
    fn next(&self, rule: &Rule<T>, bound: NonZeroUsize) -> usize {
        let codons = self
            .chromosome_of
            .get(rule.start().name())
            .and_then(|&index| self.codons_for(index));
        match codons {
            Some(codons) => codons.next(rule, bound),
            None => {
                warn!(
                    "No chromosome for rule {}, choosing its first alternative",
                    rule.start()
                );
                0
            }
        }
    }
}
