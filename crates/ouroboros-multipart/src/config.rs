//! Router configuration
//!
//! # Example
//! ```rust,ignore
//! use ouroboros_multipart::RouterConfig;
//!
//! // From environment
//! let config = RouterConfig::from_env()?;
//!
//! // Or explicit configuration
//! let config = RouterConfig::new("/var/uploads").buffer_size(16 * 1024);
//! ```

use std::path::{Path, PathBuf};

use crate::error::{MultipartError, MultipartResult};

/// The default buffer size for file writes.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Environment variable naming the upload directory
pub const ENV_UPLOAD_DIR: &str = "OUROBOROS_UPLOAD_DIR";

/// Environment variable holding the file write buffer size
pub const ENV_UPLOAD_BUFFER_SIZE: &str = "OUROBOROS_UPLOAD_BUFFER_SIZE";

/// Where and how file parts are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Root path to which body parts with filename parameters are written
    pub root_path: PathBuf,
    /// Number of bytes buffered for writes to each file
    pub buffer_size: usize,
}

impl RouterConfig {
    /// Create a configuration rooted at `root_path` with the default buffer size
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Set the file write buffer size
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Get the root path
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Check the configuration before a router is built from it
    pub fn validate(&self) -> MultipartResult<()> {
        if self.root_path.as_os_str().is_empty() {
            return Err(MultipartError::InvalidArgument(
                "root path must not be empty".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(MultipartError::InvalidArgument(
                "buffer size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Create configuration from environment variables.
    ///
    /// - `OUROBOROS_UPLOAD_DIR` -> root path (defaults to the system temp dir)
    /// - `OUROBOROS_UPLOAD_BUFFER_SIZE` -> buffer size (defaults to 4096)
    pub fn from_env() -> MultipartResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> MultipartResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let root_path = lookup(ENV_UPLOAD_DIR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let buffer_size = match lookup(ENV_UPLOAD_BUFFER_SIZE) {
            Some(raw) => {
                let size = raw.trim().parse::<usize>().map_err(|e| {
                    MultipartError::Configuration(format!(
                        "{}='{}' is not a valid size: {}",
                        ENV_UPLOAD_BUFFER_SIZE, raw, e
                    ))
                })?;
                if size == 0 {
                    return Err(MultipartError::Configuration(format!(
                        "{} must be positive",
                        ENV_UPLOAD_BUFFER_SIZE
                    )));
                }
                size
            }
            None => DEFAULT_BUFFER_SIZE,
        };

        Ok(Self {
            root_path,
            buffer_size,
        })
    }
}
