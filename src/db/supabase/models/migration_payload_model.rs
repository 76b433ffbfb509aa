use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use super::model::SupabaseModelError;

/// The full text of one migration file. Sent as a single opaque unit;
/// statements are never split or rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPayload {
    pub path: PathBuf,
    pub sql: String,
}

/// Body for `POST /rest/v1/`.
#[derive(Serialize)]
pub struct RawQueryBody<'a> {
    pub query: &'a str,
}

/// Body for `POST /rest/v1/rpc/<function>`.
#[derive(Serialize)]
pub struct RpcQueryBody<'a> {
    pub sql_query: &'a str,
}

impl MigrationPayload {
    pub fn read(path: &Path) -> Result<Self, SupabaseModelError> {
        let sql = fs::read_to_string(path).map_err(|source| SupabaseModelError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Read migration file {} ({} bytes)", path.display(), sql.len());

        Ok(Self {
            path: path.to_path_buf(),
            sql,
        })
    }

    /// File name for operator messages, falling back to the full path.
    pub fn file_name(&self) -> String {
        display_file_name(&self.path)
    }
}

pub fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
