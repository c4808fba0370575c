//! File-system capability
//!
//! The router never touches the disk directly. It asks a [`FileSystem`]
//! for a writable stream, which lets tests swap the real disk for
//! [`MemoryFileSystem`] and assert on every `create` call.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncWrite, BufWriter};

/// Writable stream handed out by a [`FileSystem`]
pub type BoxedWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Opens destination files for body parts
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Create (or truncate) the file at `path`.
    ///
    /// `buffer_size` is the write buffer hint and `async_hint` requests
    /// a stream suited for asynchronous writes.
    async fn create(
        &self,
        path: &Path,
        buffer_size: usize,
        async_hint: bool,
    ) -> io::Result<BoxedWriter>;
}

// ============================================================================
// Tokio File System
// ============================================================================

/// [`FileSystem`] backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn create(
        &self,
        path: &Path,
        buffer_size: usize,
        _async_hint: bool,
    ) -> io::Result<BoxedWriter> {
        // tokio files are always driven asynchronously
        let file = tokio::fs::File::create(path).await?;
        Ok(Box::pin(BufWriter::with_capacity(buffer_size, file)))
    }
}

// ============================================================================
// Memory File System
// ============================================================================

/// Arguments of one [`FileSystem::create`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub path: PathBuf,
    pub buffer_size: usize,
    pub async_hint: bool,
}

#[derive(Default)]
struct MemoryFsState {
    calls: Vec<CreateCall>,
    files: HashMap<PathBuf, Arc<Mutex<Vec<u8>>>>,
    failure: Option<io::ErrorKind>,
}

/// In-memory [`FileSystem`] that records calls and keeps written bytes.
///
/// Clones share state, so a test can keep one handle and give another to
/// the router.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<MemoryFsState>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create` fail with `kind`
    pub fn fail_with(&self, kind: io::ErrorKind) {
        self.state.lock().failure = Some(kind);
    }

    pub fn clear_failure(&self) {
        self.state.lock().failure = None;
    }

    /// All `create` calls seen so far, in call order
    pub fn calls(&self) -> Vec<CreateCall> {
        self.state.lock().calls.clone()
    }

    /// Bytes written to `path`, if it was created
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state.files.get(path.as_ref()).map(|data| data.lock().clone())
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().files.len()
    }
}

impl std::fmt::Debug for MemoryFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryFileSystem")
            .field("calls", &state.calls.len())
            .field("files", &state.files.len())
            .field("failure", &state.failure)
            .finish()
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn create(
        &self,
        path: &Path,
        buffer_size: usize,
        async_hint: bool,
    ) -> io::Result<BoxedWriter> {
        let mut state = self.state.lock();
        state.calls.push(CreateCall {
            path: path.to_path_buf(),
            buffer_size,
            async_hint,
        });

        if let Some(kind) = state.failure {
            return Err(io::Error::new(
                kind,
                format!("simulated failure creating {}", path.display()),
            ));
        }

        let data = Arc::new(Mutex::new(Vec::new()));
        state.files.insert(path.to_path_buf(), Arc::clone(&data));
        Ok(Box::pin(SharedWriter { data }))
    }
}

/// Writer appending into a buffer shared with the [`MemoryFileSystem`]
struct SharedWriter {
    data: Arc<Mutex<Vec<u8>>>,
}

impl AsyncWrite for SharedWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        self.data.lock().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}
