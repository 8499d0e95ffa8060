use grammar_evo::config::{CodecKind, Config, GeneratorConfig, GeneratorKind};
use grammar_evo::evolution::codons::SymbolIndex;
use grammar_evo::evolution::mapper::{
    BitChromosomeMapper, Codec, IntegerChromosomeMapper, MappingError, RuleChromosomeMapper,
};
use grammar_evo::export::{write_export_to_json, SampleData, SampleExport};
use grammar_evo::generator::{AstGenerator, DerivationTreeGenerator, Generator, SentenceGenerator};
use grammar_evo::grammar::parser::parse;
use grammar_evo::grammar::Cfg;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::Path;
use std::process;

/// The configured generator, rendering whatever it produces as text.
enum RenderedGenerator<I> {
    Sentence(SentenceGenerator<I>),
    Tree(DerivationTreeGenerator<I>),
    Ast(AstGenerator<I>),
}

impl<I> RenderedGenerator<I> {
    fn new(settings: &GeneratorConfig, index: I) -> Self {
        match settings.kind {
            GeneratorKind::Sentence => {
                Self::Sentence(SentenceGenerator::new(index, settings.expansion, settings.limit))
            }
            GeneratorKind::Tree => Self::Tree(DerivationTreeGenerator::new(index, settings.limit)),
            GeneratorKind::Ast => Self::Ast(AstGenerator::new(index, settings.limit)),
        }
    }
}

impl<I: SymbolIndex<String>> Generator<String> for RenderedGenerator<I> {
    type Output = String;

    fn generate(&self, cfg: &Cfg<String>) -> String {
        match self {
            Self::Sentence(generator) => generator
                .generate(cfg)
                .iter()
                .map(|terminal| terminal.value().as_str())
                .collect::<Vec<_>>()
                .join(" "),
            Self::Tree(generator) => generator.generate(cfg).to_string(),
            Self::Ast(generator) => generator.generate(cfg).to_string(),
        }
    }
}

/// Samples `config.samples` genotypes from the codec's encoding and decodes
/// them in parallel.
///
/// # Arguments
/// * `codec` - The genotype mapping to sample and decode with
/// * `config` - Run configuration, for sample count and seed
///
/// # Returns
/// * `Result<Vec<SampleData>, MappingError>` - The decoded samples in sampling order
fn sample<C>(codec: &C, config: &Config) -> Result<Vec<SampleData>, MappingError>
where
    C: Codec<Output = String> + Sync,
{
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let genotypes = (0..config.samples)
        .map(|_| codec.encoding().new_instance(&mut rng))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Sampled {} genotypes, decoding...", genotypes.len());

    genotypes
        .par_iter()
        .enumerate()
        .map(|(index, genotype)| {
            codec
                .decode(genotype)
                .map(|output| SampleData::new(index, genotype, output))
        })
        .collect()
}

fn run(config: &Config, cfg: &Cfg<String>) -> Result<Vec<SampleData>, MappingError> {
    let settings = &config.generator;
    match config.codec.kind {
        CodecKind::Bit => {
            let codec = BitChromosomeMapper::new(cfg, config.codec.length, |codons| {
                RenderedGenerator::new(settings, codons)
            })?;
            sample(&codec, config)
        }
        CodecKind::Integer => {
            let codec = IntegerChromosomeMapper::new(
                cfg,
                0..config.codec.max_value,
                config.codec.length,
                |codons| RenderedGenerator::new(settings, codons),
            )?;
            sample(&codec, config)
        }
        CodecKind::PerRule => {
            let codec = RuleChromosomeMapper::new(
                cfg,
                |rule| rule.alternative_count().get() * config.codec.codons_per_alternative,
                |codons| RenderedGenerator::new(settings, codons),
            )?;
            sample(&codec, config)
        }
    }
}

/// Logs `context` with the error and ends the process with status 1.
fn or_exit<T, E: fmt::Display>(result: Result<T, E>, context: &str) -> T {
    result.unwrap_or_else(|e| {
        log::error!("{}: {}", context, e);
        process::exit(1)
    })
}

fn print_samples(samples: &[SampleData], limit: usize) {
    for sample in samples {
        if sample.exhausted {
            println!("[{}] <limit of {} reached>", sample.index, limit);
        } else {
            println!("[{}] {}", sample.index, sample.output);
        }
    }
}

fn main() {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = or_exit(Config::load(Path::new(&config_path)), "Cannot load config");
    or_exit(config.validate(), "Invalid config");

    let source = or_exit(
        fs::read_to_string(&config.grammar_file),
        &format!("Cannot read grammar '{}'", config.grammar_file),
    );
    let cfg = or_exit(parse(&source), "Cannot parse grammar");
    log::info!(
        "Sampling {} from '{}' ({} rules, {} terminals) with the {:?} codec",
        config.samples,
        config.grammar_file,
        cfg.rules().len(),
        cfg.terminals().len(),
        config.codec.kind
    );

    let samples = or_exit(run(&config, &cfg), "Decoding failed");
    print_samples(&samples, config.generator.limit);

    if let Some(export_file) = &config.export_file {
        let export = SampleExport::new(source, samples);
        or_exit(
            write_export_to_json(&export, Path::new(export_file)),
            "Cannot export samples",
        );
        log::info!(
            "Exported {} samples ({} exhausted) to '{}'",
            export.samples.len(),
            export.exhausted_count(),
            export_file
        );
    }
}
