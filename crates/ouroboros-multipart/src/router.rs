//! File stream routing
//!
//! [`FileStreamRouter`] writes body parts to disk under generated names
//! and keeps an ordered record of every part it routed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::buffer::{Destination, PartContent};
use crate::config::RouterConfig;
use crate::error::{MultipartError, MultipartResult};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::headers::BodyPartHeaders;

/// Prefix of every generated local file name
pub const LOCAL_FILE_PREFIX: &str = "BodyPart_";

/// A body part whose bytes were fully written by the host reader
#[derive(Debug, Clone)]
pub struct BodyPart {
    pub headers: BodyPartHeaders,
    pub content: PartContent,
}

impl BodyPart {
    pub fn new(headers: BodyPartHeaders, content: PartContent) -> Self {
        Self { headers, content }
    }
}

/// Chooses a destination for each body part.
///
/// The host reader calls [`get_destination_stream`](Self::get_destination_stream)
/// before writing each part and [`finalize_post_processing`](Self::finalize_post_processing)
/// once after every part has been written.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    async fn get_destination_stream(&self, headers: &BodyPartHeaders) -> MultipartResult<Destination>;

    async fn finalize_post_processing(&self, _parts: &[BodyPart]) -> MultipartResult<()> {
        Ok(())
    }
}

/// A file part that was routed to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Headers of the part as sent
    pub headers: BodyPartHeaders,
    /// Root path joined with the generated name
    pub local_file_name: PathBuf,
}

/// Routes body parts to files under a root directory
pub struct FileStreamRouter {
    config: RouterConfig,
    file_system: Arc<dyn FileSystem>,
    file_records: Mutex<Vec<FileRecord>>,
}

impl std::fmt::Debug for FileStreamRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStreamRouter")
            .field("config", &self.config)
            .field("file_records", &self.file_records.lock().len())
            .finish()
    }
}

impl FileStreamRouter {
    /// Create a router writing to the real file system
    pub fn new(config: RouterConfig) -> MultipartResult<Self> {
        Self::with_file_system(config, Arc::new(TokioFileSystem))
    }

    /// Create a router with an injected file system
    pub fn with_file_system(
        config: RouterConfig,
        file_system: Arc<dyn FileSystem>,
    ) -> MultipartResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            file_system,
            file_records: Mutex::new(Vec::new()),
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.config.root_path
    }

    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Snapshot of the parts routed to disk so far, in routing order
    pub fn file_records(&self) -> Vec<FileRecord> {
        self.file_records.lock().clone()
    }

    /// Name of the local file (no directory component) for a body part.
    ///
    /// Never derived from the sender's filename.
    pub fn local_file_name(&self, _headers: &BodyPartHeaders) -> String {
        format!("{}{}", LOCAL_FILE_PREFIX, Uuid::new_v4())
    }

    /// Open a file for the part and record it.
    ///
    /// The record is appended before the file is opened, so it exists
    /// even if opening or writing fails.
    pub async fn route_disk_part(&self, headers: &BodyPartHeaders) -> MultipartResult<Destination> {
        let path = self.config.root_path.join(self.local_file_name(headers));

        self.file_records.lock().push(FileRecord {
            headers: headers.clone(),
            local_file_name: path.clone(),
        });

        debug!(
            path = %path.display(),
            buffer_size = self.config.buffer_size,
            filename = ?headers.content_disposition_filename(),
            "Routing body part to disk"
        );

        let writer = self
            .file_system
            .create(&path, self.config.buffer_size, true)
            .await
            .map_err(|e| {
                error!(path = %path.display(), error = %e, "Failed to open destination file");
                MultipartError::Io(e)
            })?;

        Ok(Destination::Disk { path, writer })
    }
}

#[async_trait]
impl StreamProvider for FileStreamRouter {
    async fn get_destination_stream(&self, headers: &BodyPartHeaders) -> MultipartResult<Destination> {
        self.route_disk_part(headers).await
    }
}
