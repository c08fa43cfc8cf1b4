//! Run configuration
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. `apkhd.toml` (the `--config` path, else the current directory, else
//!    `~/.config/apkhd/config.toml`)
//! 3. `APKHD_*` environment variables
//! 4. Command-line flags (applied by the command handlers)

use crate::encoder::DEFAULT_MAX_OPS;
use crate::hdc::DEFAULT_DIMENSION;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "apkhd.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdcConfig {
    #[serde(default)]
    pub encoding: EncodingConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub samples: SamplesConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Hypervector width
    pub dimension: usize,
    /// Opcode budget per application
    pub max_ops: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            max_ops: DEFAULT_MAX_OPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Paired applications per class
    pub max_apps: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { max_apps: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Test files drawn per class
    pub test_count: usize,
    /// Size of the sorted-listing tail the test files come from (0 = all)
    pub tail_length: usize,
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_count: 200,
            tail_length: 300,
            seed: 43,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplesConfig {
    pub extensions: Vec<String>,
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["apk".into(), "dex".into(), "opcodes".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `<label>_class_vector.npy`
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl HdcConfig {
    /// Load the effective configuration.
    ///
    /// An explicit `path` must exist; the implicit locations are optional
    /// and a malformed implicit file falls back to defaults with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Self::discover(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn discover() -> Self {
        let candidates = [
            Some(PathBuf::from(CONFIG_FILE_NAME)),
            Self::user_config_path(),
        ];
        for candidate in candidates.into_iter().flatten() {
            if !candidate.is_file() {
                continue;
            }
            match Self::from_file(&candidate) {
                Ok(config) => {
                    debug!("Loaded config from {}", candidate.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load {}: {}", candidate.display(), e);
                }
            }
        }
        debug!("No config found, using defaults");
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// `~/.config/apkhd/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("apkhd").join("config.toml"))
    }

    /// Apply `APKHD_DIMENSION`, `APKHD_MAX_OPS` and `APKHD_MODEL_DIR`
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("APKHD_DIMENSION") {
            match value.parse() {
                Ok(dim) => self.encoding.dimension = dim,
                Err(_) => warn!("Ignoring APKHD_DIMENSION={value}: not a number"),
            }
        }
        if let Some(value) = var("APKHD_MAX_OPS") {
            match value.parse() {
                Ok(max_ops) => self.encoding.max_ops = max_ops,
                Err(_) => warn!("Ignoring APKHD_MAX_OPS={value}: not a number"),
            }
        }
        if let Some(dir) = var("APKHD_MODEL_DIR") {
            self.store.dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.encoding.dimension == 0 {
            bail!("encoding.dimension must be greater than zero");
        }
        if self.samples.extensions.is_empty() {
            bail!("samples.extensions must name at least one extension");
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub const EXAMPLE_CONFIG: &str = r#"# apkhd configuration

[encoding]
# Hypervector width. Training and inference must agree.
dimension = 2048
# Opcodes encoded per application
max_ops = 10000

[training]
# Paired benign/malicious applications per class
max_apps = 300

[evaluation]
test_count = 200
tail_length = 300
seed = 43

[samples]
extensions = ["apk", "dex", "opcodes"]

[store]
dir = "."
"#;

/// Write [`EXAMPLE_CONFIG`] to `path` unless a file is already there
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, EXAMPLE_CONFIG)?;
    Ok(true)
}
