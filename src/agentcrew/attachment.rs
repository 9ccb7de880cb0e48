//! Attachment ingestion.
//!
//! Uploaded bytes are staged in a temporary file the moment they are received and the
//! resulting [`MediaRef`] owns that file. Clones share it; the file is deleted when the last
//! clone is dropped, i.e. once every turn that referenced it has been sent and discarded.
//!
//! The orchestration core never inspects attachment bytes. Only the completion backend reads
//! them back (see [`MediaRef::read_bytes`]) when it encodes a request.
//!
//! ```rust
//! use agentcrew::attachment::AttachmentIngestor;
//!
//! let ingestor = AttachmentIngestor::new();
//! let media = ingestor.ingest("chat.png", &[0x89, b'P', b'N', b'G']).unwrap();
//! assert_eq!(media.mime_type(), "image/png");
//! assert!(media.path().exists());
//! ```

use crate::agentcrew::error::AttachmentError;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Default upper bound for a single upload.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

struct StagedMedia {
    id: Uuid,
    filename: String,
    mime_type: &'static str,
    size: usize,
    file: NamedTempFile,
}

/// Opaque handle to an ingested attachment.
#[derive(Clone)]
pub struct MediaRef {
    inner: Arc<StagedMedia>,
}

impl MediaRef {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Original upload name, as supplied by the presentation layer.
    pub fn filename(&self) -> &str {
        &self.inner.filename
    }

    pub fn mime_type(&self) -> &'static str {
        self.inner.mime_type
    }

    pub fn len(&self) -> usize {
        self.inner.size
    }

    pub fn is_empty(&self) -> bool {
        self.inner.size == 0
    }

    /// Location of the staged copy. Valid for as long as any clone of this handle is alive.
    pub fn path(&self) -> &Path {
        self.inner.file.path()
    }

    /// Read the staged bytes back.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }
}

impl PartialEq for MediaRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for MediaRef {}

impl fmt::Debug for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaRef")
            .field("id", &self.inner.id)
            .field("filename", &self.inner.filename)
            .field("mime_type", &self.inner.mime_type)
            .field("size", &self.inner.size)
            .finish()
    }
}

/// Turns raw uploads into [`MediaRef`]s.
///
/// Accepts the same image types the upload widget offered (`jpg`, `jpeg`, `png`).
#[derive(Debug, Clone)]
pub struct AttachmentIngestor {
    temp_dir: Option<PathBuf>,
    max_bytes: usize,
}

impl Default for AttachmentIngestor {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentIngestor {
    pub fn new() -> Self {
        Self {
            temp_dir: None,
            max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }

    /// Stage files under `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Stage one upload.
    pub fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<MediaRef, AttachmentError> {
        let mime_type = mime_type_for(filename).ok_or_else(|| {
            AttachmentError::new(filename, "unsupported file type (expected jpg, jpeg or png)")
        })?;
        if bytes.is_empty() {
            return Err(AttachmentError::new(filename, "upload is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(AttachmentError::new(
                filename,
                format!("{} bytes exceeds the {} byte limit", bytes.len(), self.max_bytes),
            ));
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix("agentcrew-").suffix(&extension);
        let staged = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = staged.map_err(|e| AttachmentError::new(filename, e.to_string()))?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| AttachmentError::new(filename, e.to_string()))?;

        let media = MediaRef {
            inner: Arc::new(StagedMedia {
                id: Uuid::new_v4(),
                filename: filename.to_string(),
                mime_type,
                size: bytes.len(),
                file,
            }),
        };
        log::debug!(
            "agentcrew::attachment: staged '{}' ({} bytes) at {}",
            filename,
            bytes.len(),
            media.path().display()
        );
        Ok(media)
    }

    /// Stage a batch of uploads, dropping (and logging) any that fail.
    pub fn ingest_all<I, N, B>(&self, uploads: I) -> Vec<MediaRef>
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: AsRef<[u8]>,
    {
        uploads
            .into_iter()
            .filter_map(|(name, bytes)| match self.ingest(name.as_ref(), bytes.as_ref()) {
                Ok(media) => Some(media),
                Err(err) => {
                    log::warn!("agentcrew::attachment: dropping upload: {}", err);
                    None
                }
            })
            .collect()
    }
}

fn mime_type_for(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_is_derived_from_extension() {
        assert_eq!(mime_type_for("a.PNG"), Some("image/png"));
        assert_eq!(mime_type_for("b.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_type_for("c.jpg"), Some("image/jpeg"));
        assert_eq!(mime_type_for("d.gif"), None);
        assert_eq!(mime_type_for("noext"), None);
    }
}
