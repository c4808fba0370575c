//! Host multipart reader
//!
//! Drives a [`multer::Multipart`] through a [`StreamProvider`]: every field
//! gets a destination before its bytes are written, and post-processing
//! runs once after the last field.

use bytes::Bytes;
use futures_util::Stream;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{MultipartError, MultipartResult};
use crate::headers::{BodyPartHeaders, ContentDisposition};
use crate::router::{BodyPart, StreamProvider};

/// Read every field of `multipart` into destinations chosen by `provider`.
///
/// Returns the written parts in message order after the provider's
/// post-processing succeeded.
pub async fn read_multipart<P>(
    mut multipart: multer::Multipart<'_>,
    provider: &P,
) -> MultipartResult<Vec<BodyPart>>
where
    P: StreamProvider + ?Sized,
{
    let mut parts = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        let headers = headers_from_field(&field);
        let mut destination = provider.get_destination_stream(&headers).await?;

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await? {
            destination.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        destination.shutdown().await?;

        debug!(
            index = parts.len(),
            name = ?headers.content_disposition_name(),
            to_disk = destination.is_disk(),
            size,
            "Body part written"
        );
        parts.push(BodyPart::new(headers, destination.into_content()));
    }

    provider.finalize_post_processing(&parts).await?;
    Ok(parts)
}

/// Parse the boundary out of a `multipart/form-data` Content-Type and read
/// the body stream through `provider`.
pub async fn read_multipart_stream<S, O, E, P>(
    content_type: &str,
    stream: S,
    provider: &P,
) -> MultipartResult<Vec<BodyPart>>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    P: StreamProvider + ?Sized,
{
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| MultipartError::Parse(format!("invalid Content-Type '{}': {}", content_type, e)))?;

    read_multipart(multer::Multipart::new(stream, boundary), provider).await
}

fn headers_from_field(field: &multer::Field<'_>) -> BodyPartHeaders {
    let content_disposition = field
        .headers()
        .contains_key("content-disposition")
        .then(|| ContentDisposition {
            name: field.name().map(String::from),
            filename: field.file_name().map(String::from),
        });

    let headers = BodyPartHeaders::new(content_disposition);
    match field.content_type() {
        Some(mime) => headers.with_content_type(mime.to_string()),
        None => headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PartContent;
    use crate::config::RouterConfig;
    use crate::form_data::FormDataAccumulator;
    use crate::fs::MemoryFileSystem;
    use futures_util::stream;
    use std::sync::Arc;

    const BOUNDARY: &str = "X-BOUNDARY";

    fn body_stream(
        body: &'static str,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        // split into small chunks so fields span several reads
        let chunks: Vec<Result<Bytes, std::io::Error>> = body
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks)
    }

    #[tokio::test]
    async fn test_reads_field_and_file() {
        let body = "--X-BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"field1\"\r\n\r\n\
            v1\r\n\
            --X-BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"field2\"; filename=\"b.bin\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            binary\r\n\
            --X-BOUNDARY--\r\n";

        let fs = MemoryFileSystem::new();
        let accumulator =
            FormDataAccumulator::with_file_system(RouterConfig::new("/tmp/up"), Arc::new(fs.clone()))
                .unwrap();

        let multipart = multer::Multipart::new(body_stream(body), BOUNDARY);
        let parts = read_multipart(multipart, &accumulator).await.unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].content, PartContent::Memory(Bytes::from_static(b"v1")));
        assert_eq!(
            parts[1].headers.content_type(),
            Some("application/octet-stream")
        );

        let records = accumulator.file_records();
        assert_eq!(records.len(), 1);
        assert_eq!(fs.contents(&records[0].local_file_name), Some(b"binary".to_vec()));
        assert_eq!(accumulator.form_fields().get("field1"), Some("v1"));
        assert!(!accumulator.form_fields().contains_key("field2"));
    }

    #[tokio::test]
    async fn test_rejects_bad_content_type() {
        let accumulator = FormDataAccumulator::with_file_system(
            RouterConfig::new("/tmp/up"),
            Arc::new(MemoryFileSystem::new()),
        )
        .unwrap();

        let err = read_multipart_stream("text/plain", body_stream(""), &accumulator)
            .await
            .unwrap_err();
        assert!(matches!(err, MultipartError::Parse(_)));
    }

    #[tokio::test]
    async fn test_truncated_body_is_parse_error() {
        let body = "--X-BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"field1\"\r\n\r\n\
            never ends";

        let accumulator = FormDataAccumulator::with_file_system(
            RouterConfig::new("/tmp/up"),
            Arc::new(MemoryFileSystem::new()),
        )
        .unwrap();

        let err = read_multipart_stream(
            "multipart/form-data; boundary=X-BOUNDARY",
            body_stream(body),
            &accumulator,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MultipartError::Parse(_)));
        assert!(accumulator.form_fields().is_empty());
    }
}
