//! Sample export for persisting decoded genotypes alongside their grammar.
//!
//! An export carries the full grammar text and a hash of it, so a file can be
//! checked against the grammar it was generated from before the genotypes in
//! it are decoded again.

use crate::evolution::Genotype;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use thiserror::Error;

pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to access export file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode or decode export: {0}")]
    Json(#[from] serde_json::Error),
}

/// A batch of decoded samples with the grammar that produced them.
#[derive(Serialize, Deserialize, Debug)]
pub struct SampleExport {
    /// Schema version for forward/backward compatibility
    pub schema_version: String,
    /// Unix timestamp when export was generated
    pub generated_at: u64,
    /// Full content of the grammar file
    pub grammar_content: String,
    /// Hash of grammar content for verification
    pub grammar_hash: String,
    pub samples: Vec<SampleData>,
}

/// One genotype and what it decoded to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SampleData {
    pub index: usize,
    /// Gene values per chromosome
    pub genotype: Vec<Vec<u32>>,
    /// Rendered sentence or tree, empty when generation ran out of room
    pub output: String,
    /// Whether the generator hit its limit
    pub exhausted: bool,
}

impl SampleData {
    pub fn new(index: usize, genotype: &Genotype, output: String) -> Self {
        Self {
            index,
            genotype: genotype.chromosomes().iter().map(|c| c.values()).collect(),
            exhausted: output.is_empty(),
            output,
        }
    }
}

impl SampleExport {
    /// Creates a new export stamped with the current time.
    ///
    /// # Arguments
    /// * `grammar_content` - Content of the grammar file
    /// * `samples` - The decoded samples, in sampling order
    ///
    /// # Returns
    /// A new `SampleExport` instance ready for serialization.
    pub fn new(grammar_content: String, samples: Vec<SampleData>) -> Self {
        let grammar_hash = compute_grammar_hash(&grammar_content);
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0),
            grammar_content,
            grammar_hash,
            samples,
        }
    }

    /// Validates that grammar hash matches grammar content.
    pub fn validate_grammar_hash(&self) -> bool {
        compute_grammar_hash(&self.grammar_content) == self.grammar_hash
    }

    /// Number of samples whose generator hit its limit.
    pub fn exhausted_count(&self) -> usize {
        self.samples.iter().filter(|s| s.exhausted).count()
    }
}

/// Computes a hash of grammar content for reproducibility.
fn compute_grammar_hash(grammar_content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    grammar_content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Writes a sample export to a JSON file.
pub fn write_export_to_json(export: &SampleExport, output_path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(export)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// Reads a sample export from a JSON file.
pub fn read_export_from_json(input_path: &Path) -> Result<SampleExport, ExportError> {
    let content = std::fs::read_to_string(input_path)?;
    let export: SampleExport = serde_json::from_str(&content)?;
    Ok(export)
}
