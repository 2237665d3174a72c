//! Two-phase confirmation in front of uploads and deletes.
//!
//! One intent can be staged at a time. Staging another replaces it, which
//! matches a single confirmation dialog.

use tracing::debug;

use kbdesk_core::{
    validate_upload, DeleteTarget, DeskEvent, Error, EventBus, FilePreview, RejectedFile, Result,
    SourceFile,
};

use crate::config::DeskConfig;

/// Files picked for upload, validated and awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBatch {
    files: Vec<SourceFile>,
    previews: Vec<FilePreview>,
    rejected: Vec<RejectedFile>,
}

impl PendingBatch {
    /// Split picked files into accepted and rejected ones.
    ///
    /// Fails when no file was picked or none is acceptable.
    pub fn from_files(files: Vec<SourceFile>, config: &DeskConfig) -> Result<Self> {
        if files.is_empty() {
            return Err(Error::InvalidInput("No files selected".to_string()));
        }

        let mut accepted = Vec::with_capacity(files.len());
        let mut rejected = Vec::new();
        for file in files {
            let check = validate_upload(
                &file.name,
                file.size_bytes,
                &config.accepted_extensions,
                config.max_upload_bytes,
            );
            match check.block_reason {
                None if check.allowed => accepted.push(file),
                reason => rejected.push(RejectedFile {
                    name: file.display_name().to_string(),
                    reason: reason.unwrap_or_else(|| "Not allowed".to_string()),
                }),
            }
        }

        if accepted.is_empty() {
            let reasons: Vec<String> = rejected
                .iter()
                .map(|r| format!("{}: {}", r.name, r.reason))
                .collect();
            return Err(Error::InvalidInput(format!(
                "No files can be uploaded: {}",
                reasons.join(", ")
            )));
        }

        let previews = accepted.iter().map(SourceFile::preview).collect();
        Ok(Self {
            files: accepted,
            previews,
            rejected,
        })
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// What the confirmation dialog lists, in upload order.
    pub fn previews(&self) -> &[FilePreview] {
        &self.previews
    }

    /// Files left out of the batch, with the reason.
    pub fn rejected(&self) -> &[RejectedFile] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<SourceFile> {
        self.files
    }
}

/// A staged deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub target: DeleteTarget,
    /// Documents the dialog says will be deleted.
    pub count: usize,
}

/// Anything that can wait behind the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Upload(PendingBatch),
    Delete(PendingDelete),
}

impl Intent {
    /// Name used in events and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Upload(_) => "upload",
            Intent::Delete(_) => "delete",
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Intent::Upload(batch) => batch.len(),
            Intent::Delete(pending) => pending.count,
        }
    }
}

/// Holds at most one staged [`Intent`].
pub struct ConfirmationGate {
    staged: Option<Intent>,
    events: EventBus,
}

impl ConfirmationGate {
    pub fn new(events: EventBus) -> Self {
        Self {
            staged: None,
            events,
        }
    }

    /// Stage `intent`, returning the one it replaced.
    pub fn stage(&mut self, intent: Intent) -> Option<Intent> {
        debug!(
            subsystem = "gate",
            intent = intent.kind(),
            count = intent.count(),
            "Staging intent"
        );
        self.events.emit(DeskEvent::ConfirmationRequested {
            intent: intent.kind().to_string(),
            count: intent.count(),
        });
        self.staged.replace(intent)
    }

    /// Take the staged intent for execution.
    pub fn confirm(&mut self) -> Option<Intent> {
        let intent = self.staged.take();
        if let Some(ref intent) = intent {
            debug!(subsystem = "gate", intent = intent.kind(), "Intent confirmed");
        }
        intent
    }

    /// Discard the staged intent.
    pub fn cancel(&mut self) -> Option<Intent> {
        let intent = self.staged.take();
        if let Some(ref intent) = intent {
            debug!(subsystem = "gate", intent = intent.kind(), "Intent cancelled");
            self.events.emit(DeskEvent::ConfirmationCancelled {
                intent: intent.kind().to_string(),
            });
        }
        intent
    }

    pub fn staged(&self) -> Option<&Intent> {
        self.staged.as_ref()
    }

    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }
}
