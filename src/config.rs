use crate::generator::Expansion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// What each sample is decoded into.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Sentence,
    Tree,
    Ast,
}

/// How genotypes are laid out.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    Bit,
    Integer,
    PerRule,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub kind: GeneratorKind,
    #[serde(default = "default_expansion")]
    pub expansion: Expansion,
    pub limit: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub kind: CodecKind,
    /// Bits for the bit codec, codons for the integer codec.
    #[serde(default = "default_length")]
    pub length: usize,
    /// Exclusive upper bound of integer codons.
    #[serde(default = "default_max_value")]
    pub max_value: u32,
    /// Per-rule chromosome length is the rule's alternative count times this.
    #[serde(default = "default_codons_per_alternative")]
    pub codons_per_alternative: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub grammar_file: String,
    pub samples: usize,
    pub seed: Option<u64>,
    pub export_file: Option<String>,
    pub generator: GeneratorConfig,
    pub codec: CodecConfig,
}

fn default_expansion() -> Expansion {
    Expansion::Leftmost
}

fn default_length() -> usize {
    256
}

fn default_max_value() -> u32 {
    256
}

fn default_codons_per_alternative() -> usize {
    10
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Checks the values serde cannot: every size must be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grammar_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "grammar_file must not be empty".to_string(),
            ));
        }
        if self.samples == 0 {
            return Err(ConfigError::Validation(
                "samples must be at least 1".to_string(),
            ));
        }
        if self.generator.limit == 0 {
            return Err(ConfigError::Validation(
                "generator.limit must be at least 1".to_string(),
            ));
        }

        match self.codec.kind {
            CodecKind::Bit | CodecKind::Integer if self.codec.length == 0 => {
                Err(ConfigError::Validation(
                    "codec.length must be at least 1".to_string(),
                ))
            }
            CodecKind::Integer if self.codec.max_value < 1 => Err(ConfigError::Validation(
                "codec.max_value must be at least 1".to_string(),
            )),
            CodecKind::PerRule if self.codec.codons_per_alternative == 0 => {
                Err(ConfigError::Validation(
                    "codec.codons_per_alternative must be at least 1".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const FULL_CONFIG: &str = r#"
        grammar_file = "grammar.bnf"
        samples = 8
        seed = 42
        export_file = "samples.json"

        [generator]
        kind = "sentence"
        expansion = "left_to_right"
        limit = 500

        [codec]
        kind = "per_rule"
        length = 128
        max_value = 64
        codons_per_alternative = 5
    "#;

    fn get_test_config() -> Config {
        toml::from_str(FULL_CONFIG).unwrap()
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = File::create(&path).unwrap();
        write!(file, "{}", FULL_CONFIG).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config, get_test_config());
        assert_eq!(config.samples, 8);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.generator.kind, GeneratorKind::Sentence);
        assert_eq!(config.generator.expansion, Expansion::LeftToRight);
        assert_eq!(config.codec.kind, CodecKind::PerRule);
        assert_eq!(config.codec.codons_per_alternative, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str(
            r#"
            grammar_file = "g.bnf"
            samples = 1
            [generator]
            kind = "tree"
            limit = 10
            [codec]
            kind = "bit"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, None);
        assert_eq!(config.export_file, None);
        assert_eq!(config.generator.expansion, Expansion::Leftmost);
        assert_eq!(config.codec.length, 256);
        assert_eq!(config.codec.max_value, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zeros() {
        let mut config = get_test_config();
        config.samples = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = get_test_config();
        config.generator.limit = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = get_test_config();
        config.codec.codons_per_alternative = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = get_test_config();
        config.codec.kind = CodecKind::Integer;
        config.codec.max_value = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = get_test_config();
        config.codec.kind = CodecKind::Bit;
        config.codec.length = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.codec.length = 7;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read(_))
        ));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "samples = \"many\"").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
