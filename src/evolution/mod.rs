pub mod codons;
pub mod mapper;

use rand::Rng;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenotypeError {
    #[error("Invalid gene range {start}..{end}: range must not be empty")]
    InvalidRange { start: u32, end: u32 },
    #[error("Gene {gene} lies outside of range {start}..{end}")]
    GeneOutOfRange { gene: u32, start: u32, end: u32 },
}

/// A fixed-length vector of bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitChromosome {
    bits: Vec<bool>,
}

impl BitChromosome {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// A chromosome of `length` cleared bits.
    pub fn zeros(length: usize) -> Self {
        Self {
            bits: vec![false; length],
        }
    }

    pub fn random(length: usize, rng: &mut impl Rng) -> Self {
        Self {
            bits: (0..length).map(|_| rng.random()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Packs the bits into `ceil(len / 8)` unsigned bytes, with bit `8k + j`
    /// landing in bit `j` of byte `k`. The high bits of a partial last byte
    /// are zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (j, &bit)| byte | (u8::from(bit) << j))
            })
            .collect()
    }
}

/// A fixed-length vector of unsigned genes, each within `range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerChromosome {
    range: Range<u32>,
    genes: Vec<u32>,
}

impl IntegerChromosome {
    pub fn new(range: Range<u32>, genes: Vec<u32>) -> Result<Self, GenotypeError> {
        if range.is_empty() {
            return Err(GenotypeError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if let Some(&gene) = genes.iter().find(|g| !range.contains(g)) {
            return Err(GenotypeError::GeneOutOfRange {
                gene,
                start: range.start,
                end: range.end,
            });
        }
        Ok(Self { range, genes })
    }

    pub fn random(range: Range<u32>, length: usize, rng: &mut impl Rng) -> Result<Self, GenotypeError> {
        if range.is_empty() {
            return Err(GenotypeError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        let genes = (0..length).map(|_| rng.random_range(range.clone())).collect();
        Ok(Self { range, genes })
    }

    pub fn range(&self) -> &Range<u32> {
        &self.range
    }

    pub fn genes(&self) -> &[u32] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chromosome {
    Bit(BitChromosome),
    Integer(IntegerChromosome),
}

impl Chromosome {
    /// Raw gene values: 0/1 per bit, or the integer genes.
    pub fn values(&self) -> Vec<u32> {
        match self {
            Chromosome::Bit(c) => c.bits().iter().map(|&b| u32::from(b)).collect(),
            Chromosome::Integer(c) => c.genes().to_vec(),
        }
    }
}

/// The genetic material handed to a codec for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genotype {
    chromosomes: Vec<Chromosome>,
}

impl Genotype {
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        Self { chromosomes }
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn get(&self, index: usize) -> Option<&Chromosome> {
        self.chromosomes.get(index)
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
}

impl From<BitChromosome> for Genotype {
    fn from(chromosome: BitChromosome) -> Self {
        Self::new(vec![Chromosome::Bit(chromosome)])
    }
}

impl From<IntegerChromosome> for Genotype {
    fn from(chromosome: IntegerChromosome) -> Self {
        Self::new(vec![Chromosome::Integer(chromosome)])
    }
}

/// Shape of one chromosome of an encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromosomeShape {
    Bits { length: usize },
    Integers { range: Range<u32>, length: usize },
}

/// Describes the genotypes a codec understands and creates fresh ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    shapes: Vec<ChromosomeShape>,
}

impl Encoding {
    pub fn new(shapes: Vec<ChromosomeShape>) -> Self {
        Self { shapes }
    }

    pub fn chromosomes(&self) -> &[ChromosomeShape] {
        &self.shapes
    }

    /// Creates a random genotype of this shape.
    ///
    /// # Arguments
    /// * `rng` - The random source for the genes
    ///
    /// # Returns
    /// * `Result<Genotype, GenotypeError>` - Fails only if an integer shape has an empty range
    pub fn new_instance(&self, rng: &mut impl Rng) -> Result<Genotype, GenotypeError> {
        let chromosomes = self
            .shapes
            .iter()
            .map(|shape| match shape {
                ChromosomeShape::Bits { length } => {
                    Ok(Chromosome::Bit(BitChromosome::random(*length, rng)))
                }
                ChromosomeShape::Integers { range, length } => {
                    IntegerChromosome::random(range.clone(), *length, rng).map(Chromosome::Integer)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Genotype::new(chromosomes))
    }
}
