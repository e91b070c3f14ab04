//! Vendor directory convention.
//!
//! Layout: `{root}/{exchange}/{granularity_dir}/{exchange}{code}.{ext}`, e.g.
//! `vipdoc/sh/lday/sh600000.day` or `vipdoc/sz/fzline/sz000001.lc5`.
//!
//! The decoders never look at paths; this module only helps callers locate
//! files and guess their kind.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::domain::FileKind;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("unknown exchange prefix in file name '{0}'")]
    UnknownExchange(String),

    #[error("unrecognized quote file extension in '{0}'")]
    UnknownExtension(String),

    #[error("file name '{0}' does not follow <exchange><code>.<ext>")]
    MalformedName(String),

    #[error("failed to list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Exchange directory / file-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    #[serde(rename = "sh")]
    Shanghai,
    #[serde(rename = "sz")]
    Shenzhen,
    #[serde(rename = "bj")]
    Beijing,
}

impl Exchange {
    pub const ALL: [Exchange; 3] = [Exchange::Shanghai, Exchange::Shenzhen, Exchange::Beijing];

    pub fn prefix(self) -> &'static str {
        match self {
            Exchange::Shanghai => "sh",
            Exchange::Shenzhen => "sz",
            Exchange::Beijing => "bj",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "sh" => Some(Exchange::Shanghai),
            "sz" => Some(Exchange::Shenzhen),
            "bj" => Some(Exchange::Beijing),
            _ => None,
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

impl std::str::FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s).ok_or_else(|| format!("unknown exchange '{s}' (expected sh, sz or bj)"))
    }
}

/// Bar granularity, which fixes the sub-directory and file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    FiveMinute,
    OneMinute,
}

impl Granularity {
    pub fn dir_name(self) -> &'static str {
        match self {
            Granularity::Daily => "lday",
            Granularity::FiveMinute => "fzline",
            Granularity::OneMinute => "minline",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Granularity::Daily => "day",
            Granularity::FiveMinute => "lc5",
            Granularity::OneMinute => "lc1",
        }
    }

    /// Record kind stored at this granularity. Both intraday granularities
    /// share the minute layout.
    pub fn kind(self) -> FileKind {
        match self {
            Granularity::Daily => FileKind::Daily,
            Granularity::FiveMinute | Granularity::OneMinute => FileKind::Minute,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "day" => Some(Granularity::Daily),
            "lc5" => Some(Granularity::FiveMinute),
            "lc1" => Some(Granularity::OneMinute),
            _ => None,
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "daily" | "day" => Ok(Granularity::Daily),
            "five_minute" | "5m" | "lc5" => Ok(Granularity::FiveMinute),
            "one_minute" | "1m" | "lc1" => Ok(Granularity::OneMinute),
            other => Err(format!(
                "unknown granularity '{other}' (expected daily, five_minute or one_minute)"
            )),
        }
    }
}

/// One security's quote file, identified from its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityFile {
    pub exchange: Exchange,
    pub code: String,
    pub granularity: Granularity,
    pub path: PathBuf,
}

impl SecurityFile {
    /// Parse `<exchange><code>.<ext>` from the final path component.
    pub fn parse(path: &Path) -> Result<Self, PathError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PathError::MalformedName(path.display().to_string()))?;
        let (stem, ext) = name
            .rsplit_once('.')
            .ok_or_else(|| PathError::MalformedName(name.to_string()))?;
        let granularity = Granularity::from_extension(ext)
            .ok_or_else(|| PathError::UnknownExtension(name.to_string()))?;

        if stem.len() <= 2 || !stem.is_char_boundary(2) {
            return Err(PathError::MalformedName(name.to_string()));
        }
        let (prefix, code) = stem.split_at(2);
        let exchange =
            Exchange::from_prefix(prefix).ok_or_else(|| PathError::UnknownExchange(name.to_string()))?;
        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(PathError::MalformedName(name.to_string()));
        }

        Ok(Self {
            exchange,
            code: code.to_string(),
            granularity,
            path: path.to_path_buf(),
        })
    }

    pub fn kind(&self) -> FileKind {
        self.granularity.kind()
    }

    /// `sh600000` style symbol.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.exchange.prefix(), self.code)
    }
}

/// The vendor data root (usually `<install dir>/vipdoc`).
#[derive(Debug, Clone)]
pub struct VendorRoot {
    root: PathBuf,
}

impl VendorRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one exchange's files at one granularity.
    pub fn dir_for(&self, exchange: Exchange, granularity: Granularity) -> PathBuf {
        self.root
            .join(exchange.prefix())
            .join(granularity.dir_name())
    }

    /// Conventional path of one security's file.
    pub fn path_for(&self, exchange: Exchange, granularity: Granularity, code: &str) -> PathBuf {
        self.dir_for(exchange, granularity).join(format!(
            "{}{code}.{}",
            exchange.prefix(),
            granularity.extension()
        ))
    }

    /// List the quote files for one exchange and granularity, sorted by code.
    ///
    /// A missing directory yields an empty list. Files that do not follow the
    /// naming convention are skipped.
    pub fn scan(
        &self,
        exchange: Exchange,
        granularity: Granularity,
    ) -> Result<Vec<SecurityFile>, PathError> {
        let dir = self.dir_for(exchange, granularity);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "vendor directory not present");
                return Ok(Vec::new());
            }
            Err(source) => return Err(PathError::Io { path: dir, source }),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PathError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match SecurityFile::parse(&path) {
                Ok(file) if file.exchange == exchange && file.granularity == granularity => {
                    files.push(file)
                }
                Ok(_) => debug!(path = %path.display(), "skipping file from another directory"),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unrecognized file"),
            }
        }

        files.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(files)
    }
}
