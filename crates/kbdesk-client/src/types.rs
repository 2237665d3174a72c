//! Wire types for the document store HTTP API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use kbdesk_core::{file_type_from_name, DeleteManyOutcome, Document, DocumentId};

/// Identifier as sent by the store: integer primary keys or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl From<WireId> for DocumentId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => DocumentId::from(n),
            WireId::Text(s) => DocumentId::from(s),
        }
    }
}

/// One document row from `/list` or the upload envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub id: WireId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl DocumentRecord {
    /// Convert into the client model.
    ///
    /// The date comes from `upload_date`, else the date part of `created_at`;
    /// the type token falls back to the name's extension.
    pub fn into_document(self) -> Document {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or(self.original_name)
            .unwrap_or_default();
        let file_type = self
            .file_type
            .filter(|t| !t.is_empty())
            .map(|t| t.to_uppercase())
            .unwrap_or_else(|| file_type_from_name(&name));
        let upload_date = self
            .upload_date
            .as_deref()
            .and_then(parse_date)
            .or_else(|| self.created_at.as_deref().and_then(parse_date));

        Document {
            id: self.id.into(),
            is_folder_upload: name.contains('/'),
            name,
            size_bytes: self.file_size,
            file_type,
            upload_date,
            status: self.status,
        }
    }
}

/// Parse `YYYY-MM-DD`, ignoring any time component.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split('T').next()?.trim();
    if date_part.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// `GET /list` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `POST /upload` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub document: DocumentRecord,
    /// Set when the file was stored but post-processing failed.
    #[serde(default)]
    pub processing_error: Option<String>,
}

/// `DELETE /delete-multiple` request body.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteManyRequest<'a> {
    pub document_ids: &'a [DocumentId],
}

/// `DELETE /delete-multiple` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteManyResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub deleted_count: Option<u64>,
}

impl From<DeleteManyResponse> for DeleteManyOutcome {
    fn from(response: DeleteManyResponse) -> Self {
        DeleteManyOutcome {
            deleted_count: response.deleted_count,
        }
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
