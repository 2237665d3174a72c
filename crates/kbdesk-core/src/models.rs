//! Core data models for kbdesk.
//!
//! These types are shared across all kbdesk crates and represent the
//! document library as the client sees it.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::files::{file_type_from_name, format_bytes, size_label_mb};

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Opaque, stable identifier assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// One knowledge-base item as persisted by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Display name; folder uploads keep their relative path here.
    pub name: String,
    /// Size in bytes, when the store reported one.
    pub size_bytes: Option<u64>,
    /// Uppercase extension token, e.g. `PDF`.
    pub file_type: String,
    pub upload_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_folder_upload: bool,
    /// Processing status reported by the store (`uploaded`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Document {
    /// Human readable size, `0 B` when unknown.
    pub fn size_label(&self) -> String {
        format_bytes(self.size_bytes)
    }

    /// Filename suggested when saving a download of this document.
    ///
    /// Only the last path component is used so folder uploads save flat.
    pub fn suggested_filename(&self) -> String {
        let base = self
            .name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if base.is_empty() || base == "." || base == ".." {
            format!("document-{}", self.id)
        } else {
            base.to_string()
        }
    }
}

// =============================================================================
// UPLOAD TYPES
// =============================================================================

/// A file handed over by the picker, with its content already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    /// Path relative to the picked folder, for folder uploads.
    pub relative_path: Option<String>,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            relative_path: None,
            size_bytes: data.len() as u64,
            content_type: None,
            data,
        }
    }

    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, data))
    }

    /// Name the resulting document is listed under.
    pub fn display_name(&self) -> &str {
        self.relative_path.as_deref().unwrap_or(&self.name)
    }

    pub fn is_folder_upload(&self) -> bool {
        self.relative_path.is_some()
    }

    pub fn file_type(&self) -> String {
        file_type_from_name(&self.name)
    }

    pub fn preview(&self) -> FilePreview {
        FilePreview {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            size_label: size_label_mb(self.size_bytes),
            file_type: self.file_type(),
        }
    }
}

/// What the confirmation dialog shows for one staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePreview {
    pub name: String,
    pub size_bytes: u64,
    /// Size in megabytes with two decimals, e.g. `1.50 MB`.
    pub size_label: String,
    pub file_type: String,
}

/// A picked file that was refused before staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedFile {
    pub name: String,
    pub reason: String,
}

/// Lifecycle of one file inside a running batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed,
    Failed,
}

/// Transient state of one file during a batch upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadItem {
    /// Position within the batch.
    pub id: usize,
    pub file: FilePreview,
    /// 0–100, never decreasing.
    pub progress: f64,
    pub status: UploadStatus,
}

impl UploadItem {
    pub fn pending(id: usize, file: FilePreview) -> Self {
        Self {
            id,
            file,
            progress: 0.0,
            status: UploadStatus::Pending,
        }
    }

    /// Whole-number percentage for display.
    pub fn percent(&self) -> u8 {
        self.progress.clamp(0.0, 100.0).floor() as u8
    }
}

// =============================================================================
// DELETE TYPES
// =============================================================================

/// What a staged delete refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeleteTarget {
    Single(DocumentId),
    /// Whatever the selection holds at confirm time.
    Selection,
}

// =============================================================================
// API PAYLOADS
// =============================================================================

/// Server-side pagination request for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

/// Response of `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub total: Option<u64>,
}

/// Response of `delete_many`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteManyOutcome {
    /// Rows the store reports as removed, when it reports them.
    pub deleted_count: Option<u64>,
}

/// Raw download payload plus the filename to save it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub suggested_name: String,
    pub bytes: Bytes,
}

impl DownloadedFile {
    /// Write the payload into `dir` under the suggested name.
    pub async fn save_into(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.suggested_name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}
