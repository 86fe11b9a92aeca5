use anyhow::{bail, Result};
use std::{
    fmt, fs,
    path::{Component, Path, PathBuf},
};

use super::constants::MEMORY_DB_PATH;

/// Where the ledger lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    Memory,
    File(PathBuf),
}

impl DbLocation {
    /// Parse and validate a `DB_PATH` value.
    pub fn parse(db_path: &str) -> Result<Self> {
        if db_path == MEMORY_DB_PATH {
            return Ok(Self::Memory);
        }

        if db_path.is_empty() {
            bail!("Empty database path");
        }

        if db_path.contains('\0') || db_path.contains(['\n', '\r', '\t']) {
            bail!("Invalid control characters in database path");
        }

        let path = Path::new(db_path);

        if path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            bail!("Parent directory traversal is not allowed in database path");
        }

        // Require a terminal file name (avoid paths ending with a directory separator)
        if path.file_name().is_none() || db_path.ends_with(std::path::MAIN_SEPARATOR) {
            bail!("Database path must include a file name");
        }

        // If an entry already exists at the path, reject symlinks and directories
        if let Ok(meta) = fs::symlink_metadata(path) {
            if meta.file_type().is_symlink() {
                bail!("Symlink path is not allowed for database path");
            }
            if meta.is_dir() {
                bail!("Database path points to a directory");
            }
        }

        Ok(Self::File(path.to_path_buf()))
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Memory => None,
            Self::File(path) => Some(path),
        }
    }
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_DB_PATH),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
