use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    index::DEFAULT_OUTPUT_PATH,
    model_manager::DEFAULT_MODEL_ID,
    resolver::DEFAULT_URL_PREFIX,
    similarity::DEFAULT_TOP_K,
};

/// Default directory scanned for markdown documents.
pub const DEFAULT_SOURCE_DIR: &str = "./content/articles";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "docrelate.toml";

/// Settings for one related-index build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelateConfig {
    /// Root directory scanned for markdown documents.
    pub source_dir: PathBuf,
    /// Prepended to index keys and to every related URL.
    pub url_prefix: String,
    /// Destination of the related index.
    pub output_path: PathBuf,
    /// Related documents kept per source document.
    pub top_k: usize,
    /// HuggingFace model ID or local model directory.
    pub model: String,
}

impl Default for RelateConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            top_k: DEFAULT_TOP_K,
            model: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

/// Values that take precedence over the config file, typically from
/// command-line flags or their environment variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub url_prefix: Option<String>,
    pub output_path: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub model: Option<String>,
}

impl RelateConfig {
    /// Parse a TOML config. Missing keys keep their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Resolve the configuration from, in order of priority:
    /// 1. Explicit overrides (flags and environment)
    /// 2. The config file (`explicit` or `docrelate.toml` if it exists)
    /// 3. Built-in defaults
    pub fn resolve(explicit: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let base = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(self, overrides: Overrides) -> Self {
        Self {
            source_dir: overrides.source_dir.unwrap_or(self.source_dir),
            url_prefix: overrides.url_prefix.unwrap_or(self.url_prefix),
            output_path: overrides.output_path.unwrap_or(self.output_path),
            top_k: overrides.top_k.unwrap_or(self.top_k),
            model: overrides.model.unwrap_or(self.model),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".into()));
        }
        if self.url_prefix.is_empty() {
            return Err(Error::Config("url_prefix must not be empty".into()));
        }
        if self.model.is_empty() {
            return Err(Error::Config("model must not be empty".into()));
        }
        Ok(())
    }
}
