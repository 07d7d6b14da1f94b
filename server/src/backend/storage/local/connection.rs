use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXPENSES_FILE: &str = "expenses.csv";
pub const GOAL_FILE: &str = "savings_goal.yaml";

/// LocalConnection resolves per-user file paths under the data directory
#[derive(Clone, Debug)]
pub struct LocalConnection {
    base_directory: PathBuf,
}

impl LocalConnection {
    /// Create a connection, creating the base directory if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory {}", base_path.display());
        }
        Ok(Self {
            base_directory: base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Directory holding one user's files
    pub fn user_directory(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.base_directory.join(Self::safe_directory_name(user_id)?))
    }

    pub fn expenses_file_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_directory(user_id)?.join(EXPENSES_FILE))
    }

    pub fn goal_file_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_directory(user_id)?.join(GOAL_FILE))
    }

    pub fn ensure_user_directory(&self, user_id: &str) -> Result<PathBuf> {
        let user_dir = self.user_directory(user_id)?;
        if !user_dir.exists() {
            fs::create_dir_all(&user_dir)?;
        }
        Ok(user_dir)
    }

    /// Map a user id onto a single path component.
    ///
    /// ASCII letters, digits, `-` and `_` are kept; every other byte is
    /// written as `%XX`, so distinct ids never share a directory and no id
    /// can escape the base directory.
    pub fn safe_directory_name(user_id: &str) -> Result<String> {
        if user_id.trim().is_empty() {
            bail!("User id must not be empty");
        }
        let mut name = String::with_capacity(user_id.len());
        for byte in user_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        Ok(name)
    }
}

/// Replace `path` with `contents` via a sibling temp file and rename
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!("{}.tmp", file_name));
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
