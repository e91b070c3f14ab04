//! File kinds and their record layouts.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::layout::{RecordLayout, DAILY_LAYOUT, MINUTE_LAYOUT};

/// The kind of vendor quote file, which selects the record layout and
/// value transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Daily,
    Minute,
}

impl FileKind {
    pub fn layout(self) -> &'static RecordLayout {
        match self {
            FileKind::Daily => &DAILY_LAYOUT,
            FileKind::Minute => &MINUTE_LAYOUT,
        }
    }

    /// Infer the kind from a conventional extension (`.day`, `.lc5`, `.lc1`).
    ///
    /// The decoders never call this; it only serves callers that want to
    /// guess from the file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "day" => Some(FileKind::Daily),
            "lc5" | "lc1" => Some(FileKind::Minute),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Daily => "daily",
            FileKind::Minute => "minute",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(FileKind::Daily),
            "minute" | "min" => Ok(FileKind::Minute),
            other => Err(format!("unknown file kind '{other}' (expected daily or minute)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("sh600000.day")), Some(FileKind::Daily));
        assert_eq!(FileKind::from_path(Path::new("sz000001.LC5")), Some(FileKind::Minute));
        assert_eq!(FileKind::from_path(Path::new("sz000001.lc1")), Some(FileKind::Minute));
        assert_eq!(FileKind::from_path(Path::new("readme.txt")), None);
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn kind_selects_layout() {
        assert_eq!(FileKind::Daily.layout().name, "daily");
        assert_eq!(FileKind::Minute.layout().name, "minute");
    }

    #[test]
    fn kind_parses_from_str() {
        assert_eq!("Daily".parse::<FileKind>().unwrap(), FileKind::Daily);
        assert_eq!("minute".parse::<FileKind>().unwrap(), FileKind::Minute);
        assert!("weekly".parse::<FileKind>().is_err());
    }
}
