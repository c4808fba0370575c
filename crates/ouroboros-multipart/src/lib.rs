//! ouroboros-multipart: testable multipart/form-data stream routing
//!
//! Sits behind a multipart reader and decides, per body part, where its
//! bytes go:
//! - parts with a `filename` parameter are written to disk under a
//!   generated name, through an injectable [`FileSystem`]
//! - all other parts are buffered in memory and collected as form fields
//!   once the whole message has been read
//!
//! # Example
//! ```rust,ignore
//! use ouroboros_multipart::{read_multipart_stream, FormDataAccumulator, RouterConfig};
//!
//! let accumulator = FormDataAccumulator::new(RouterConfig::new("/var/uploads"))?;
//! read_multipart_stream(content_type, body, &accumulator).await?;
//!
//! for file in accumulator.file_records() {
//!     println!("{:?} -> {}", file.headers.content_disposition_filename(), file.local_file_name.display());
//! }
//! println!("{}", accumulator.form_fields().to_json());
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod form_data;
pub mod form_fields;
pub mod fs;
pub mod headers;
pub mod reader;
pub mod router;

// Re-exports
pub use buffer::{Destination, MemoryBuffer, PartContent};
pub use config::{RouterConfig, DEFAULT_BUFFER_SIZE};
pub use error::{MultipartError, MultipartResult};
pub use form_data::FormDataAccumulator;
pub use form_fields::{unquote, FormFieldMap};
pub use fs::{BoxedWriter, CreateCall, FileSystem, MemoryFileSystem, TokioFileSystem};
pub use headers::{BodyPartHeaders, ContentDisposition};
pub use reader::{read_multipart, read_multipart_stream};
pub use router::{BodyPart, FileRecord, FileStreamRouter, StreamProvider};
