//! Attachment ingestion.
//!
//! Converts uploaded files into base64 attachments available to the UI
//! immediately, and in parallel into durable blob records scoped to the
//! active project/session pair. Files ingest independently: a file that
//! cannot be read, or whose blob write fails, never blocks its siblings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use tracing::warn;

use casebook_core::error::CasebookError;
use casebook_core::types::Attachment;

use crate::manager::WorkspaceManager;

/// Per-batch ingestion outcome. Accepted attachments are already on the
/// pending list (and durably stored or queued); failures name the file and
/// the decode error that contained it.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub accepted: Vec<Attachment>,
    pub failures: Vec<(PathBuf, CasebookError)>,
}

/// Ingests uploads into the workspace.
pub struct AttachmentIngester {
    manager: Arc<WorkspaceManager>,
}

impl AttachmentIngester {
    pub fn new(manager: Arc<WorkspaceManager>) -> Self {
        Self { manager }
    }

    /// Ingest a batch of files. Each file is handled independently; the
    /// report carries both the accepted attachments and the per-file
    /// failures.
    pub fn ingest_files(&self, paths: &[PathBuf]) -> IngestReport {
        let mut report = IngestReport::default();
        for path in paths {
            match self.ingest_file(path) {
                Ok(attachment) => report.accepted.push(attachment),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Upload could not be decoded");
                    report.failures.push((path.clone(), e));
                }
            }
        }
        report
    }

    /// Ingest a single file: decode, append to the pending list, and store
    /// (or queue) the durable blob. A blob-write failure is logged and
    /// surfaced through the sync status but the in-memory attachment
    /// stands.
    pub fn ingest_file(&self, path: &Path) -> Result<Attachment, CasebookError> {
        let bytes = std::fs::read(path)
            .map_err(|e| CasebookError::Decode(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.ingest_bytes(&name, mime_for_path(path), &bytes)
    }

    /// Ingest an already-read payload under an explicit name and mime type.
    pub fn ingest_bytes(
        &self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<Attachment, CasebookError> {
        let attachment = Attachment {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            data: BASE64_STANDARD.encode(bytes),
            size_bytes: bytes.len() as u64,
        };

        // In-memory availability first; durability is a parallel concern.
        self.manager.push_pending(attachment.clone());

        if let Err(e) = self.manager.store_attachment_blob(&attachment) {
            warn!(name = %attachment.name, error = %e, "Blob write failed; upload kept in memory");
        }

        Ok(attachment)
    }
}

/// Mime type from the file extension, for uploads that do not declare one.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "csv" => "text/csv",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "dwg" => "image/vnd.dwg",
        "dxf" => "image/vnd.dxf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
