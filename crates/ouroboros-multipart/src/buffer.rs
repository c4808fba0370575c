//! Destination streams handed to the host reader

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::AsyncWrite;

use crate::fs::BoxedWriter;

// ============================================================================
// Memory Buffer Writer
// ============================================================================

/// In-memory buffer collecting the bytes of a field part
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    data: Vec<u8>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the collected data
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl AsyncWrite for MemoryBuffer {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, std::io::Error>> {
        self.data.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }
}

// ============================================================================
// Destination
// ============================================================================

/// Where a body part's bytes are written.
///
/// The host writes the part through the [`AsyncWrite`] impl, shuts it
/// down, and then turns it into [`PartContent`] with [`Destination::into_content`].
pub enum Destination {
    /// File opened through the file-system capability
    Disk { path: PathBuf, writer: BoxedWriter },
    /// Fresh in-memory buffer
    Memory(MemoryBuffer),
}

impl Destination {
    pub fn is_disk(&self) -> bool {
        matches!(self, Destination::Disk { .. })
    }

    /// Path of the file backing this destination
    pub fn path(&self) -> Option<&Path> {
        match self {
            Destination::Disk { path, .. } => Some(path),
            Destination::Memory(_) => None,
        }
    }

    /// Give up write access and keep a readable handle on what was written
    pub fn into_content(self) -> PartContent {
        match self {
            Destination::Disk { path, .. } => PartContent::File(path),
            Destination::Memory(buffer) => PartContent::Memory(buffer.into_bytes()),
        }
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Disk { path, .. } => f.debug_struct("Disk").field("path", path).finish(),
            Destination::Memory(buffer) => f
                .debug_tuple("Memory")
                .field(&buffer.as_bytes().len())
                .finish(),
        }
    }
}

impl AsyncWrite for Destination {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, std::io::Error>> {
        match self.get_mut() {
            Destination::Disk { writer, .. } => writer.as_mut().poll_write(cx, buf),
            Destination::Memory(buffer) => Pin::new(buffer).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), std::io::Error>> {
        match self.get_mut() {
            Destination::Disk { writer, .. } => writer.as_mut().poll_flush(cx),
            Destination::Memory(buffer) => Pin::new(buffer).poll_flush(cx),
        }
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        match self.get_mut() {
            Destination::Disk { writer, .. } => writer.as_mut().poll_shutdown(cx),
            Destination::Memory(buffer) => Pin::new(buffer).poll_shutdown(cx),
        }
    }
}

// ============================================================================
// Part Content
// ============================================================================

/// Readable content of a body part once all its bytes were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContent {
    /// Content stored in the file at this path
    File(PathBuf),
    /// Content buffered in memory
    Memory(Bytes),
}

impl PartContent {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PartContent::Memory(bytes) => Some(bytes),
            PartContent::File(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_memory_buffer() {
        let mut buffer = MemoryBuffer::new();
        buffer.write_all(b"hello ").await.unwrap();
        buffer.write_all(b"world").await.unwrap();

        assert_eq!(buffer.as_bytes(), b"hello world");
    }

    #[tokio::test]
    async fn test_memory_destination_content() {
        let mut dest = Destination::Memory(MemoryBuffer::new());
        assert!(!dest.is_disk());
        assert!(dest.path().is_none());

        dest.write_all(b"v1").await.unwrap();
        dest.shutdown().await.unwrap();

        let content = dest.into_content();
        assert_eq!(content.as_bytes(), Some(&b"v1"[..]));
    }

    #[tokio::test]
    async fn test_disk_destination_content() {
        let writer: BoxedWriter = Box::pin(MemoryBuffer::new());
        let mut dest = Destination::Disk {
            path: PathBuf::from("/tmp/up/BodyPart_x"),
            writer,
        };
        dest.write_all(b"payload").await.unwrap();

        assert!(dest.is_disk());
        assert_eq!(
            dest.into_content(),
            PartContent::File(PathBuf::from("/tmp/up/BodyPart_x"))
        );
    }
}
