//! Resume file storage on local disk.
//!
//! Uploads are streamed chunk by chunk into `<upload_dir>/<millis>-<random>.pdf`.
//! The size limit is checked before each chunk is written, so an oversized
//! upload never lands on disk in full.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::models::application::ResumeRef;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const PDF_MIME: &str = "application/pdf";
const NAME_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("File size exceeds 5MB limit")]
    TooLarge,

    #[error("Unexpected field. Use field name \"resume\" for file upload")]
    UnexpectedField,

    #[error("{0}")]
    Malformed(String),

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

/// Accepts a file when either the declared MIME type is `application/pdf` or
/// the original file name ends in `.pdf`.
pub fn is_pdf(content_type: Option<&str>, original_name: Option<&str>) -> bool {
    let mime_is_pdf = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME))
        .unwrap_or(false);
    let name_is_pdf = original_name
        .map(|name| name.to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false);
    mime_is_pdf || name_is_pdf
}

/// `<unix millis>-<random below 1e9>.pdf`
pub fn generate_file_name() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}.pdf", Utc::now().timestamp_millis(), suffix)
}

/// Handle to the upload directory.
#[derive(Debug, Clone)]
pub struct ResumeStorage {
    dir: PathBuf,
}

impl ResumeStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Opens a fresh file for an incoming upload after checking its type.
    pub async fn begin(
        &self,
        content_type: Option<&str>,
        original_name: Option<&str>,
    ) -> Result<PendingResume, UploadError> {
        if !is_pdf(content_type, original_name) {
            return Err(UploadError::NotPdf);
        }

        let mut attempt = 0;
        loop {
            let file_name = generate_file_name();
            let path = self.dir.join(&file_name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    return Ok(PendingResume {
                        file,
                        path,
                        file_name,
                        written: 0,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt + 1 < NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Streams a multipart file field to disk. On any failure the partial
    /// file is removed before the error is returned.
    pub async fn receive(&self, mut field: Field<'_>) -> Result<ResumeRef, UploadError> {
        let mut pending = self.begin(field.content_type(), field.file_name()).await?;

        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    pending.discard().await;
                    return Err(e.into());
                }
            };
            if let Err(e) = pending.write_chunk(&chunk).await {
                pending.discard().await;
                return Err(e);
            }
        }

        pending.finish().await
    }

    /// Opens a stored resume for streaming, with its length in bytes.
    /// `Ok(None)` means the file is gone.
    pub async fn open(&self, path: &str) -> std::io::Result<Option<(File, u64)>> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let len = file.metadata().await?.len();
        Ok(Some((file, len)))
    }

    /// Best-effort delete. A file that is already gone is not an error.
    pub async fn remove(&self, path: &str) {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed resume file {path}"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove resume file {path}: {e}"),
        }
    }
}

/// An upload that is being written. Call [`PendingResume::finish`] to keep
/// it or [`PendingResume::discard`] to delete it.
#[derive(Debug)]
pub struct PendingResume {
    file: File,
    path: PathBuf,
    file_name: String,
    written: usize,
}

impl PendingResume {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.written + chunk.len() > MAX_RESUME_BYTES {
            return Err(UploadError::TooLarge);
        }
        self.file.write_all(chunk).await?;
        self.written += chunk.len();
        Ok(())
    }

    pub async fn finish(mut self) -> Result<ResumeRef, UploadError> {
        if let Err(e) = self.file.flush().await {
            self.discard().await;
            return Err(e.into());
        }
        Ok(ResumeRef {
            path: self.path.to_string_lossy().into_owned(),
            file_name: self.file_name,
        })
    }

    pub async fn discard(self) {
        let PendingResume { file, path, .. } = self;
        drop(file);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove partial upload {}: {e}", path.display());
            }
        }
    }
}
