//! plagscan command line front end
//!
//! Loads a directory of submissions, runs pairwise detection and writes the
//! ranked matches as JSON or CSV.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use plagscan::compare::{attach_text, corpus_stats, detect};
use plagscan::corpus::Corpus;
use plagscan::models::{ComparisonParams, Language, LengthNormalization, NormalizeOptions};
use plagscan::output::{
    print_matches, print_stats, print_summary, write_csv_file, write_json_file,
};

#[derive(Parser)]
#[command(name = "plagscan")]
#[command(about = "Pairwise plagiarism detection for document collections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output format for detection results
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Full run report
    Json,
    /// One row per match
    Csv,
}

/// Length normalization (CLI version, mirrors models::LengthNormalization)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliNormalization {
    /// Shorter document's token count
    Min,
    /// Longer document's token count
    Max,
    /// Mean of both documents' token counts
    Average,
    /// The fragment's own spans (default)
    Combined,
}

impl From<CliNormalization> for LengthNormalization {
    fn from(n: CliNormalization) -> Self {
        match n {
            CliNormalization::Min => LengthNormalization::Min,
            CliNormalization::Max => LengthNormalization::Max,
            CliNormalization::Average => LengthNormalization::Average,
            CliNormalization::Combined => LengthNormalization::Combined,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLanguage {
    English,
    German,
}

impl From<CliLanguage> for Language {
    fn from(language: CliLanguage) -> Self {
        match language {
            CliLanguage::English => Language::English,
            CliLanguage::German => Language::German,
        }
    }
}

/// Normalization flags shared by every subcommand.
#[derive(Args, Debug, Default)]
struct NormalizeArgs {
    /// Keep letter case
    #[arg(long)]
    keep_case: bool,

    /// Keep diacritics
    #[arg(long)]
    keep_diacritics: bool,

    /// Reduce words to their stems
    #[arg(long)]
    stem: bool,

    /// Drop stop words
    #[arg(long)]
    remove_stop_words: bool,

    /// Language for stemming and stop words [default: english]
    #[arg(long, value_enum)]
    language: Option<CliLanguage>,
}

impl NormalizeArgs {
    /// Overlay explicitly set flags onto `base`.
    fn apply(&self, base: NormalizeOptions) -> NormalizeOptions {
        NormalizeOptions {
            lowercase: base.lowercase && !self.keep_case,
            strip_diacritics: base.strip_diacritics && !self.keep_diacritics,
            stem: base.stem || self.stem,
            remove_stop_words: base.remove_stop_words || self.remove_stop_words,
            language: self.language.map(Language::from).unwrap_or(base.language),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect shared passages between every pair of documents in a directory
    ///
    /// Parameters default to ComparisonParams::default(), optionally replaced
    /// by a JSON config file. Flags override both.
    Detect {
        /// Directory of documents
        #[arg(long)]
        dir: PathBuf,

        /// Directory of common documents (templates) whose text is ignored
        #[arg(long)]
        common_dir: Option<PathBuf>,

        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// JSON file with comparison parameters
        #[arg(long)]
        config: Option<PathBuf>,

        /// Leave matched passages out of the output
        #[arg(long)]
        no_text: bool,

        /// Characters of context around each passage
        #[arg(long, default_value = "40")]
        context_chars: usize,

        // === Parameters that inherit from ComparisonParams ===
        /// Tokens per fingerprint window [default: 5]
        #[arg(long)]
        window_size: Option<usize>,

        /// Tokens of drift tolerated while extending [default: 3]
        #[arg(long)]
        gap_tolerance: Option<usize>,

        /// Minimum covered tokens per match [default: 8]
        #[arg(long)]
        min_fragment_length: Option<usize>,

        /// Minimum match score [default: 0.5]
        #[arg(long)]
        min_similarity: Option<f32>,

        /// Length normalization [default: combined]
        #[arg(long, value_enum)]
        normalization: Option<CliNormalization>,

        /// Compare window tokens to rule out hash collisions [default: true]
        #[arg(long)]
        verify_seeds: Option<bool>,

        /// Keep token texts after indexing [default: true]
        #[arg(long)]
        keep_token_text: Option<bool>,

        /// Compare every pair instead of pairs sharing a fingerprint
        #[arg(long)]
        brute_force: bool,

        #[command(flatten)]
        normalize: NormalizeArgs,

        /// Suppress progress output
        #[arg(long, short)]
        quiet: bool,

        /// Number of matches to print
        #[arg(long, default_value = "10")]
        show_matches: usize,
    },

    /// Print the normalized tokens of a file with their byte ranges
    Tokens {
        /// Input file
        #[arg(long)]
        file: PathBuf,

        #[command(flatten)]
        normalize: NormalizeArgs,
    },

    /// Show corpus and index statistics
    Stats {
        /// Directory of documents
        #[arg(long)]
        dir: PathBuf,

        /// Directory of common documents
        #[arg(long)]
        common_dir: Option<PathBuf>,

        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,

        /// Tokens per fingerprint window [default: 5]
        #[arg(long)]
        window_size: Option<usize>,

        #[command(flatten)]
        normalize: NormalizeArgs,
    },
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            dir,
            common_dir,
            recursive,
            output,
            format,
            config,
            no_text,
            context_chars,
            window_size,
            gap_tolerance,
            min_fragment_length,
            min_similarity,
            normalization,
            verify_seeds,
            keep_token_text,
            brute_force,
            normalize,
            quiet,
            show_matches,
        } => {
            init_tracing(quiet);

            // Start with the config file or library defaults
            let defaults = match config {
                Some(path) => ComparisonParams::from_json(&std::fs::read_to_string(path)?)?,
                None => ComparisonParams::default(),
            };

            // Overlay user-specified values
            let params = ComparisonParams {
                window_size: window_size.unwrap_or(defaults.window_size),
                gap_tolerance: gap_tolerance.unwrap_or(defaults.gap_tolerance),
                min_fragment_length: min_fragment_length.unwrap_or(defaults.min_fragment_length),
                min_similarity: min_similarity.unwrap_or(defaults.min_similarity),
                length_normalization: normalization
                    .map(LengthNormalization::from)
                    .unwrap_or(defaults.length_normalization),
                verify_seeds: verify_seeds.unwrap_or(defaults.verify_seeds),
                keep_token_text: keep_token_text.unwrap_or(defaults.keep_token_text),
                brute_force: brute_force || defaults.brute_force,
                normalize: normalize.apply(defaults.normalize),
            };
            params.validate()?;

            let mut corpus = Corpus::load_dir(&dir, recursive)?;
            if let Some(common_dir) = common_dir {
                corpus.load_common_dir(&common_dir, recursive)?;
            }

            let mut result = detect(&corpus, &params, !quiet)?;
            if !no_text {
                attach_text(&mut result, &corpus, context_chars);
            }

            if let Some(output) = output {
                match format {
                    OutputFormat::Json => write_json_file(&result, &output)?,
                    OutputFormat::Csv => write_csv_file(&result.matches, &output)?,
                }
                tracing::info!(path = %output.display(), "results written");
            }

            if !quiet {
                print_summary(&result);
                if show_matches > 0 && !result.matches.is_empty() {
                    println!("\n=== Top Matches ===");
                    print_matches(&result.matches, Some(show_matches));
                }
            }
        }

        Commands::Tokens { file, normalize } => {
            init_tracing(true);

            let text = std::fs::read_to_string(&file)?;
            let options = normalize.apply(NormalizeOptions::default());
            for (i, token) in plagscan::normalize::normalize(&text, &options).iter().enumerate() {
                println!(
                    "{}\t{}..{}\t{}\t{:?}",
                    i,
                    token.start,
                    token.end,
                    token.text,
                    &text[token.start..token.end]
                );
            }
        }

        Commands::Stats {
            dir,
            common_dir,
            recursive,
            window_size,
            normalize,
        } => {
            init_tracing(false);

            let defaults = ComparisonParams::default();
            let params = ComparisonParams {
                window_size: window_size.unwrap_or(defaults.window_size),
                normalize: normalize.apply(defaults.normalize.clone()),
                ..defaults
            };

            let mut corpus = Corpus::load_dir(&dir, recursive)?;
            if let Some(common_dir) = common_dir {
                corpus.load_common_dir(&common_dir, recursive)?;
            }
            print_stats(&corpus_stats(&corpus, &params)?);
        }
    }

    Ok(())
}
