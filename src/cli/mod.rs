//! CLI command definitions and handlers

mod classify;
mod export;
mod train;

use anyhow::Result;
use apkhd::config::{init_config, HdcConfig, CONFIG_FILE_NAME};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// apkhd - hyperdimensional malware classifier for Android packages
#[derive(Parser, Debug)]
#[command(name = "apkhd")]
#[command(
    version,
    about = "Classify Android packages as benign or malicious with hyperdimensional computing",
    long_about = "apkhd encodes the opcodes of every method in an APK into one bipolar \
hypervector, bundles labeled applications into a benign and a malicious class vector, \
and classifies new packages by cosine similarity.\n\n\
Accepted samples: .apk, .dex and .opcodes text dumps (`<method> <opcode>` per line).",
    after_help = "\
Examples:
  apkhd train --benign data/benign --malicious data/malware
  apkhd classify --benign data/benign --malicious data/malware --format json
  apkhd predict suspicious.apk
  apkhd export -o class_vectors.json
  apkhd vocab --benign data/benign --malicious data/malware -o vocab.json"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    /// Config file (default: ./apkhd.toml, then ~/.config/apkhd/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and save the benign and malicious class vectors
    #[command(after_help = "\
Examples:
  apkhd train --benign data/benign --malicious data/malware
  apkhd train --benign b --malicious m --max-apps 50 --out model/")]
    Train {
        /// Directory of benign samples
        #[arg(long)]
        benign: PathBuf,

        /// Directory of malicious samples
        #[arg(long)]
        malicious: PathBuf,

        /// Output directory for the class vectors (default: store.dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Paired applications per class (default: training.max_apps)
        #[arg(long)]
        max_apps: Option<usize>,

        /// Hypervector width (default: encoding.dimension)
        #[arg(long)]
        dimension: Option<usize>,

        /// Opcodes encoded per application (default: encoding.max_ops)
        #[arg(long)]
        max_ops: Option<usize>,
    },

    /// Evaluate saved class vectors on a held-out sample of each directory
    Classify {
        /// Directory of benign samples
        #[arg(long)]
        benign: PathBuf,

        /// Directory of malicious samples
        #[arg(long)]
        malicious: PathBuf,

        /// Directory holding the class vectors (default: store.dir)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Test files per class (default: evaluation.test_count)
        #[arg(long)]
        count: Option<usize>,

        /// Draw test files from the last N of each sorted listing, 0 = all
        #[arg(long)]
        tail: Option<usize>,

        /// Sampling seed (default: evaluation.seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Opcode vocabulary to preload (from `apkhd vocab`)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Opcodes encoded per application (default: encoding.max_ops)
        #[arg(long)]
        max_ops: Option<usize>,
    },

    /// Classify individual packages
    Predict {
        /// Sample files (.apk, .dex, .opcodes)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory holding the class vectors (default: store.dir)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Opcode vocabulary to preload (from `apkhd vocab`)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Opcodes encoded per application (default: encoding.max_ops)
        #[arg(long)]
        max_ops: Option<usize>,
    },

    /// Export saved class vectors as JSON
    Export {
        /// Directory holding the class vectors (default: store.dir)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output file
        #[arg(long, short = 'o', default_value = "class_vectors.json")]
        output: PathBuf,
    },

    /// Dump the opcode vocabulary of a sample set and its vectors as JSON
    Vocab {
        /// Directory of benign samples
        #[arg(long)]
        benign: PathBuf,

        /// Directory of malicious samples
        #[arg(long)]
        malicious: PathBuf,

        /// Samples read from each directory (default: training.max_apps)
        #[arg(long)]
        max_apps: Option<usize>,

        /// Hypervector width (default: encoding.dimension)
        #[arg(long)]
        dimension: Option<usize>,

        /// Include method vectors as well
        #[arg(long)]
        methods: bool,

        /// Output file
        #[arg(long, short = 'o', default_value = "opcode_vocabulary.json")]
        output: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example apkhd.toml
    Init,
    /// Show the effective configuration and where it came from
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Version => {
            println!("apkhd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }

        Commands::Config { action } => run_config_action(action, config_path),

        Commands::Train {
            benign,
            malicious,
            out,
            max_apps,
            dimension,
            max_ops,
        } => {
            let mut config = HdcConfig::load(config_path)?;
            if let Some(dimension) = dimension {
                config.encoding.dimension = dimension;
            }
            if let Some(max_ops) = max_ops {
                config.encoding.max_ops = max_ops;
            }
            if let Some(max_apps) = max_apps {
                config.training.max_apps = max_apps;
            }
            if let Some(out) = out {
                config.store.dir = out;
            }
            config.validate()?;
            train::run(&config, &benign, &malicious)
        }

        Commands::Classify {
            benign,
            malicious,
            model,
            count,
            tail,
            seed,
            format,
            vocab,
            max_ops,
        } => {
            let mut config = HdcConfig::load(config_path)?;
            if let Some(model) = model {
                config.store.dir = model;
            }
            if let Some(count) = count {
                config.evaluation.test_count = count;
            }
            if let Some(tail) = tail {
                config.evaluation.tail_length = tail;
            }
            if let Some(seed) = seed {
                config.evaluation.seed = seed;
            }
            if let Some(max_ops) = max_ops {
                config.encoding.max_ops = max_ops;
            }
            classify::run(&config, &benign, &malicious, &format, vocab.as_deref())
        }

        Commands::Predict {
            files,
            model,
            format,
            vocab,
            max_ops,
        } => {
            let mut config = HdcConfig::load(config_path)?;
            if let Some(model) = model {
                config.store.dir = model;
            }
            if let Some(max_ops) = max_ops {
                config.encoding.max_ops = max_ops;
            }
            classify::predict(&config, &files, &format, vocab.as_deref())
        }

        Commands::Export { model, output } => {
            let mut config = HdcConfig::load(config_path)?;
            if let Some(model) = model {
                config.store.dir = model;
            }
            export::run_export(&config, &output)
        }

        Commands::Vocab {
            benign,
            malicious,
            max_apps,
            dimension,
            methods,
            output,
        } => {
            let mut config = HdcConfig::load(config_path)?;
            if let Some(dimension) = dimension {
                config.encoding.dimension = dimension;
            }
            if let Some(max_apps) = max_apps {
                config.training.max_apps = max_apps;
            }
            config.validate()?;
            export::run_vocab(&config, &benign, &malicious, methods, &output)
        }
    }
}

fn run_config_action(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if init_config(&path)? {
                println!("{} Created {}", style("✓").green(), path.display());
            } else {
                println!(
                    "{} {} already exists, left unchanged",
                    style("!").yellow(),
                    path.display()
                );
            }
            Ok(())
        }
        ConfigAction::Show => show_config(config_path),
    }
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = HdcConfig::load(config_path)?;

    println!("Config paths:");
    let status = |p: &Path| {
        if p.is_file() {
            style("✓").green().to_string()
        } else {
            style("(not found)").dim().to_string()
        }
    };
    match config_path {
        Some(path) => println!("  Explicit: {} {}", path.display(), status(path)),
        None => {
            let project = Path::new(CONFIG_FILE_NAME);
            println!("  Project: ./{} {}", CONFIG_FILE_NAME, status(project));
            if let Some(user) = HdcConfig::user_config_path() {
                println!("  User:    {} {}", user.display(), status(&user));
            }
        }
    }
    println!();
    println!("{}", config.to_toml()?);
    Ok(())
}
