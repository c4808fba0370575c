//! Form data accumulation
//!
//! [`FormDataAccumulator`] looks at the Content-Disposition of each body
//! part: parts with a filename go to disk through a [`FileStreamRouter`],
//! everything else is buffered in memory. Once the host has written every
//! part, the buffered fields are decoded into a [`FormFieldMap`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::buffer::{Destination, MemoryBuffer, PartContent};
use crate::config::RouterConfig;
use crate::error::{MultipartError, MultipartResult};
use crate::form_fields::{unquote, FormFieldMap};
use crate::fs::FileSystem;
use crate::headers::BodyPartHeaders;
use crate::router::{BodyPart, FileRecord, FileStreamRouter, StreamProvider};

/// Routes file parts to disk and collects field parts as form data
#[derive(Debug)]
pub struct FormDataAccumulator {
    router: FileStreamRouter,
    form_fields: Arc<Mutex<FormFieldMap>>,
}

impl FormDataAccumulator {
    /// Create an accumulator writing files to the real file system
    pub fn new(config: RouterConfig) -> MultipartResult<Self> {
        Ok(Self::from_router(FileStreamRouter::new(config)?))
    }

    /// Create an accumulator with an injected file system
    pub fn with_file_system(
        config: RouterConfig,
        file_system: Arc<dyn FileSystem>,
    ) -> MultipartResult<Self> {
        Ok(Self::from_router(FileStreamRouter::with_file_system(
            config,
            file_system,
        )?))
    }

    pub fn from_router(router: FileStreamRouter) -> Self {
        Self {
            router,
            form_fields: Arc::new(Mutex::new(FormFieldMap::new())),
        }
    }

    pub fn router(&self) -> &FileStreamRouter {
        &self.router
    }

    pub fn root_path(&self) -> &Path {
        self.router.root_path()
    }

    pub fn buffer_size(&self) -> usize {
        self.router.buffer_size()
    }

    pub fn file_records(&self) -> Vec<FileRecord> {
        self.router.file_records()
    }

    /// Snapshot of the form fields; empty until post-processing completes
    pub fn form_fields(&self) -> FormFieldMap {
        self.form_fields.lock().clone()
    }

    /// Decode every buffered field part and add it to the form fields.
    ///
    /// One task is spawned per field part and all of them are awaited
    /// before returning. The first failure is returned; values inserted by
    /// sibling tasks stay in the map.
    pub async fn finalize_post_processing(&self, parts: &[BodyPart]) -> MultipartResult<()> {
        let mut tasks = JoinSet::new();

        for part in parts.iter().filter(|part| is_named_field_part(&part.headers)) {
            let raw_name = part.headers.content_disposition_name().unwrap_or_default();
            let name = unquote(raw_name).to_string();
            let content = part.content.clone();
            let content_type = part.headers.content_type().map(str::to_string);
            let form_fields = Arc::clone(&self.form_fields);

            tasks.spawn(async move {
                let value = decode_text(&name, content_type.as_deref(), &content)?;
                form_fields.lock().insert(name, value);
                Ok::<(), MultipartError>(())
            });
        }

        let spawned = tasks.len();
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(MultipartError::from).and_then(|result| result);
            if let Err(e) = outcome {
                warn!(error = %e, "Form field decode failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(fields = spawned, "Form data post-processing complete");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl StreamProvider for FormDataAccumulator {
    async fn get_destination_stream(&self, headers: &BodyPartHeaders) -> MultipartResult<Destination> {
        if headers.content_disposition().is_none() {
            return Err(MultipartError::InvalidOperation(
                "Subpart does not contain a Content-Disposition header".to_string(),
            ));
        }

        if headers.has_filename() {
            return self.router.route_disk_part(headers).await;
        }

        debug!(
            name = ?headers.content_disposition_name(),
            "Buffering form field in memory"
        );
        Ok(Destination::Memory(MemoryBuffer::new()))
    }

    async fn finalize_post_processing(&self, parts: &[BodyPart]) -> MultipartResult<()> {
        FormDataAccumulator::finalize_post_processing(self, parts).await
    }
}

/// Field part with a usable name: disposition present, no filename,
/// non-empty name
fn is_named_field_part(headers: &BodyPartHeaders) -> bool {
    headers.content_disposition().is_some()
        && !headers.has_filename()
        && headers
            .content_disposition_name()
            .map(|name| !name.is_empty())
            .unwrap_or(false)
}

/// Encoding named by the `charset` parameter of a part's Content-Type.
///
/// Missing, unparsable or unknown charsets fall back to UTF-8.
fn declared_encoding(content_type: Option<&str>) -> &'static Encoding {
    content_type
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .and_then(|parsed| {
            parsed
                .get_param(mime::CHARSET)
                .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
        })
        .unwrap_or(UTF_8)
}

/// Decode a buffered field as text.
///
/// A byte order mark overrides the declared charset and is dropped.
/// Malformed input fails instead of being replaced.
fn decode_text(name: &str, content_type: Option<&str>, content: &PartContent) -> MultipartResult<String> {
    let bytes: &Bytes = match content {
        PartContent::Memory(bytes) => bytes,
        PartContent::File(path) => {
            return Err(MultipartError::DecodeFailure {
                name: name.to_string(),
                reason: format!("content was written to {} instead of memory", path.display()),
            })
        }
    };

    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (declared_encoding(content_type), &bytes[..]),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| MultipartError::DecodeFailure {
            name: name.to_string(),
            reason: format!("malformed {} sequence", encoding.name()),
        })
}
