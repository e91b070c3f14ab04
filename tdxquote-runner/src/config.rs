//! Serializable batch job configuration.
//!
//! A job names a vendor root, the exchanges and granularity to read, an
//! optional list of security codes, the error policy, and where to export:
//!
//! ```toml
//! vendor_root = "C:/new_tdx/vipdoc"
//! exchanges = ["sh", "sz"]
//! granularity = "daily"
//! codes = ["600000", "000001"]
//! on_error = "skip_file"
//!
//! [output]
//! dir = "out"
//! format = "parquet"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use tdxquote_core::data::{Exchange, Granularity, PathError, SecurityFile, VendorRoot};

use crate::batch::ErrorPolicy;
use crate::export::ExportFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One batch decode/export job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    /// Directory containing `<exchange>/<granularity-dir>/` sub-directories.
    pub vendor_root: PathBuf,

    #[serde(default = "default_exchanges")]
    pub exchanges: Vec<Exchange>,

    #[serde(default = "default_granularity")]
    pub granularity: Granularity,

    /// Security codes to include. Empty means every file found.
    #[serde(default)]
    pub codes: Vec<String>,

    #[serde(default)]
    pub on_error: ErrorPolicy,

    #[serde(default = "default_parallel")]
    pub parallel: bool,

    pub output: OutputConfig,
}

/// Export destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,

    #[serde(default)]
    pub format: ExportFormat,
}

fn default_exchanges() -> Vec<Exchange> {
    vec![Exchange::Shanghai, Exchange::Shenzhen]
}

fn default_granularity() -> Granularity {
    Granularity::Daily
}

fn default_parallel() -> bool {
    true
}

impl BatchConfig {
    /// Load and validate a job from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a job from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchanges.is_empty() {
            return Err(ConfigError::Invalid("exchanges must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for code in &self.codes {
            if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ConfigError::Invalid(format!(
                    "security code '{code}' must be 6 ASCII digits"
                )));
            }
            if !seen.insert(code.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate security code '{code}'")));
            }
        }
        Ok(())
    }

    /// Locate the files this job covers, in exchange then code order.
    ///
    /// Requested codes with no file on disk are logged and left out.
    pub fn resolve_files(&self) -> Result<Vec<SecurityFile>, PathError> {
        let root = VendorRoot::new(&self.vendor_root);
        let wanted: HashSet<&str> = self.codes.iter().map(|c| c.as_str()).collect();

        let mut files = Vec::new();
        for &exchange in &self.exchanges {
            for file in root.scan(exchange, self.granularity)? {
                if wanted.is_empty() || wanted.contains(file.code.as_str()) {
                    files.push(file);
                }
            }
        }

        for code in &self.codes {
            if !files.iter().any(|f| &f.code == code) {
                warn!(code = %code, granularity = ?self.granularity, "no quote file found for code");
            }
        }
        Ok(files)
    }
}
