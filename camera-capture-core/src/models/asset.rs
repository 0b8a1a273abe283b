use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A captured image persisted by the [`AssetStore`](crate::AssetStore).
///
/// The backing file exists from the moment the creation completion runs until
/// the matching deletion completion runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub path: PathBuf,
    pub file_name: String,
    pub byte_len: u64,
    /// SHA-256 hex digest of the file contents.
    pub checksum: String,
    pub created_at: DateTime<Local>,
}
