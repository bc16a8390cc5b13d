//! Attachment validation and the ordered set sent with a ticket

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::AttachmentsConfig;
use crate::types::AttachmentCandidate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    /// At least one file in the batch is over the ceiling; nothing was added
    #[error("Some files exceed the maximum allowed size ({})", format_limit(*limit_bytes))]
    TooLarge {
        names: Vec<String>,
        limit_bytes: u64,
    },

    #[error("Failed to read {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },
}

/// Human-readable ceiling, e.g. `10 MB`
pub fn format_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}

/// Ordered attachments for one submission.
///
/// Batches are validated all-or-nothing against a per-file size ceiling.
/// There is no limit on the number of files.
#[derive(Debug, Clone)]
pub struct AttachmentSet {
    items: Vec<AttachmentCandidate>,
    max_file_bytes: u64,
    suggested_extensions: Vec<String>,
}

impl AttachmentSet {
    pub fn new(max_file_bytes: u64, suggested_extensions: Vec<String>) -> Self {
        Self {
            items: Vec::new(),
            max_file_bytes,
            suggested_extensions,
        }
    }

    pub fn from_config(config: &AttachmentsConfig) -> Self {
        Self::new(config.max_file_bytes, config.suggested_extensions.clone())
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Append a batch. If any candidate is over the ceiling the whole batch is
    /// rejected and the set is left as it was.
    pub fn add(&mut self, candidates: Vec<AttachmentCandidate>) -> Result<usize, AttachmentError> {
        let oversized: Vec<String> = candidates
            .iter()
            .filter(|c| c.size_bytes > self.max_file_bytes)
            .map(|c| c.name.clone())
            .collect();

        if !oversized.is_empty() {
            tracing::debug!(files = ?oversized, "Rejected attachment batch");
            return Err(AttachmentError::TooLarge {
                names: oversized,
                limit_bytes: self.max_file_bytes,
            });
        }

        let added = candidates.len();
        self.items.extend(candidates);
        Ok(added)
    }

    /// Remove the entry at `index`, keeping the others in order
    pub fn remove(&mut self, index: usize) -> Option<AttachmentCandidate> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[AttachmentCandidate] {
        &self.items
    }

    pub fn total_bytes(&self) -> u64 {
        self.items.iter().map(|c| c.size_bytes).sum()
    }

    /// Whether `name` has one of the suggested extensions. Advisory only.
    pub fn is_suggested_kind(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.suggested_extensions
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }

    /// Hint line shown under the file input
    pub fn hint(&self) -> String {
        format!(
            "Max {} per file. Suggested: images, PDF, Word, Excel, text",
            format_limit(self.max_file_bytes)
        )
    }
}

/// Load files from disk as candidates.
///
/// Every file's size is checked from metadata before any content is read, so
/// an oversized file in the batch is never loaded into memory.
pub fn read_candidates(
    paths: &[PathBuf],
    max_file_bytes: u64,
) -> Result<Vec<AttachmentCandidate>, AttachmentError> {
    let mut oversized = Vec::new();
    for path in paths {
        let metadata = std::fs::metadata(path).map_err(|e| AttachmentError::Unreadable {
            path: path.clone(),
            message: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(AttachmentError::Unreadable {
                path: path.clone(),
                message: "not a regular file".to_string(),
            });
        }
        if metadata.len() > max_file_bytes {
            oversized.push(display_name(path));
        }
    }

    if !oversized.is_empty() {
        return Err(AttachmentError::TooLarge {
            names: oversized,
            limit_bytes: max_file_bytes,
        });
    }

    paths
        .iter()
        .map(|path| {
            let content = std::fs::read(path).map_err(|e| AttachmentError::Unreadable {
                path: path.clone(),
                message: e.to_string(),
            })?;
            Ok(AttachmentCandidate::new(display_name(path), content))
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
