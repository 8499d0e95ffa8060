//! Genotype to grammar mappings.
//!
//! A codec pairs an [`Encoding`], which describes and creates genotypes, with
//! a decoder that turns one genotype into a symbol-index strategy and runs a
//! generator with it. Three layouts are supported: a single bit chromosome
//! read as bytes, a single integer chromosome, and one integer chromosome per
//! grammar rule.

use super::codons::{Codons, RuleCodons};
use super::{Chromosome, ChromosomeShape, Encoding, Genotype, GenotypeError};
use crate::generator::Generator;
use crate::grammar::{Cfg, Rule};
use log::debug;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Codon sequence length must be positive")]
    InvalidLength,
    #[error("Invalid codon range {start}..{end}: range must not be empty")]
    InvalidRange { start: u32, end: u32 },
    #[error("Expected {expected} chromosomes but the genotype has {found}")]
    ChromosomeCount { expected: usize, found: usize },
    #[error("Chromosome {index} must be a {expected} chromosome")]
    ChromosomeKind { index: usize, expected: &'static str },
    #[error("A bit chromosome of {bits} bits holds no codon")]
    TooFewBits { bits: usize },
    #[error("Chromosome {0} holds no codons")]
    EmptyChromosome(usize),
    #[error("Failed to create genotype: {0}")]
    Genotype(#[from] GenotypeError),
}

/// Encodes objects as genotypes and decodes genotypes back.
pub trait Codec {
    type Output;

    /// The genotype layout this codec decodes.
    fn encoding(&self) -> &Encoding;

    /// Maps `genotype` to an object.
    fn decode(&self, genotype: &Genotype) -> Result<Self::Output, MappingError>;
}

fn single_chromosome(genotype: &Genotype) -> Result<&Chromosome, MappingError> {
    match genotype.chromosomes() {
        [chromosome] => Ok(chromosome),
        chromosomes => Err(MappingError::ChromosomeCount {
            expected: 1,
            found: chromosomes.len(),
        }),
    }
}

/// Reads a single bit chromosome as byte-sized codons.
pub struct BitChromosomeMapper<'a, T, F> {
    cfg: &'a Cfg<T>,
    encoding: Encoding,
    generator: F,
}

impl<'a, T, F, G> BitChromosomeMapper<'a, T, F>
where
    F: Fn(Codons) -> G,
    G: Generator<T>,
{
    /// Creates a bit codec over `cfg`.
    ///
    /// # Arguments
    /// * `cfg` - The grammar generated from
    /// * `length` - Number of bits in the chromosome, eight per codon with a zero-padded last codon
    /// * `generator` - Builds the generator run with the decoded codons
    ///
    /// # Returns
    /// * `Result<BitChromosomeMapper, MappingError>` - `TooFewBits` if `length` is zero
    pub fn new(cfg: &'a Cfg<T>, length: usize, generator: F) -> Result<Self, MappingError> {
        if length == 0 {
            return Err(MappingError::TooFewBits { bits: length });
        }
        Ok(Self {
            cfg,
            encoding: Encoding::new(vec![ChromosomeShape::Bits { length }]),
            generator,
        })
    }
}

impl<T, F, G> Codec for BitChromosomeMapper<'_, T, F>
where
    F: Fn(Codons) -> G,
    G: Generator<T>,
{
    type Output = G::Output;

    fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    fn decode(&self, genotype: &Genotype) -> Result<G::Output, MappingError> {
        let Chromosome::Bit(chromosome) = single_chromosome(genotype)? else {
            return Err(MappingError::ChromosomeKind {
                index: 0,
                expected: "bit",
            });
        };
        let codons = Codons::from_bits(chromosome)?;
        debug!("Decoding bit genotype into {} codons", codons.len());
        Ok((self.generator)(codons).generate(self.cfg))
    }
}

/// Reads a single integer chromosome as codons.
pub struct IntegerChromosomeMapper<'a, T, F> {
    cfg: &'a Cfg<T>,
    encoding: Encoding,
    generator: F,
}

impl<'a, T, F, G> IntegerChromosomeMapper<'a, T, F>
where
    F: Fn(Codons) -> G,
    G: Generator<T>,
{
    /// Creates an integer codec over `cfg`.
    ///
    /// # Arguments
    /// * `cfg` - The grammar generated from
    /// * `range` - Allowed codon values, must not be empty
    /// * `length` - Number of codons, must be positive
    /// * `generator` - Builds the generator run with the decoded codons
    ///
    /// # Returns
    /// * `Result<IntegerChromosomeMapper, MappingError>` - `InvalidRange` or `InvalidLength` on bad shapes
    pub fn new(cfg: &'a Cfg<T>, range: Range<u32>, length: usize, generator: F) -> Result<Self, MappingError> {
        if range.is_empty() {
            return Err(MappingError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if length == 0 {
            return Err(MappingError::InvalidLength);
        }
        Ok(Self {
            cfg,
            encoding: Encoding::new(vec![ChromosomeShape::Integers { range, length }]),
            generator,
        })
    }
}

impl<T, F, G> Codec for IntegerChromosomeMapper<'_, T, F>
where
    F: Fn(Codons) -> G,
    G: Generator<T>,
{
    type Output = G::Output;

    fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    fn decode(&self, genotype: &Genotype) -> Result<G::Output, MappingError> {
        let Chromosome::Integer(chromosome) = single_chromosome(genotype)? else {
            return Err(MappingError::ChromosomeKind {
                index: 0,
                expected: "integer",
            });
        };
        if chromosome.is_empty() {
            return Err(MappingError::EmptyChromosome(0));
        }
        let codons = Codons::from_integers(chromosome)?;
        debug!("Decoding integer genotype of {} codons", codons.len());
        Ok((self.generator)(codons).generate(self.cfg))
    }
}

/// One integer chromosome per rule, with genes in `[0, alternatives)` of
/// that rule.
pub struct RuleChromosomeMapper<'a, T, F> {
    cfg: &'a Cfg<T>,
    encoding: Encoding,
    generator: F,
}

impl<'a, T, F, G> RuleChromosomeMapper<'a, T, F>
where
    F: Fn(RuleCodons) -> G,
    G: Generator<T>,
{
    /// Creates a per-rule codec over `cfg`.
    ///
    /// # Arguments
    /// * `cfg` - The grammar generated from
    /// * `length` - Chromosome length for each rule, must be positive
    /// * `generator` - Builds the generator run with the decoded per-rule codons
    ///
    /// # Returns
    /// * `Result<RuleChromosomeMapper, MappingError>` - `InvalidLength` if `length` is zero for any rule
    pub fn new<L>(cfg: &'a Cfg<T>, length: L, generator: F) -> Result<Self, MappingError>
    where
        L: Fn(&Rule<T>) -> usize,
    {
        let shapes = cfg
            .rules()
            .iter()
            .map(|rule| {
                let alternatives = u32::try_from(rule.alternative_count().get()).unwrap_or(u32::MAX);
                match length(rule) {
                    0 => Err(MappingError::InvalidLength),
                    length => Ok(ChromosomeShape::Integers {
                        range: 0..alternatives,
                        length,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cfg,
            encoding: Encoding::new(shapes),
            generator,
        })
    }
}

impl<T, F, G> Codec for RuleChromosomeMapper<'_, T, F>
where
    F: Fn(RuleCodons) -> G,
    G: Generator<T>,
{
    type Output = G::Output;

    fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    fn decode(&self, genotype: &Genotype) -> Result<G::Output, MappingError> {
        let codons = RuleCodons::new(self.cfg, genotype)?;
        debug!("Decoding per-rule genotype of {} chromosomes", genotype.len());
        Ok((self.generator)(codons).generate(self.cfg))
    }
}
