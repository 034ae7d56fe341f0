use serde::{Deserialize, Serialize};

/// How a local write is pushed to the remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Read-merge-write of one collection, guarded by its version.
    #[default]
    Conditional,
    /// Read-modify-write of the whole document, last writer wins.
    Overwrite,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Conditional => write!(f, "conditional"),
            WriteMode::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub write_mode: WriteMode,
    /// Extra attempts after a version conflict (conditional mode only).
    pub max_retries: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Conditional,
            max_retries: 3,
        }
    }
}
