//! Route a small form submission: fields are printed, files land in the
//! upload directory.
//!
//! ```bash
//! OUROBOROS_UPLOAD_DIR=/tmp/uploads RUST_LOG=debug cargo run --example save_upload
//! ```

use bytes::Bytes;
use futures_util::stream;
use ouroboros_multipart::{read_multipart_stream, FormDataAccumulator, RouterConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const BODY: &str = "--demo\r\n\
    Content-Disposition: form-data; name=\"title\"\r\n\r\n\
    Quarterly report\r\n\
    --demo\r\n\
    Content-Disposition: form-data; name=\"attachment\"; filename=\"report.csv\"\r\n\
    Content-Type: text/csv\r\n\r\n\
    quarter,revenue\nQ1,100\r\n\
    --demo--\r\n";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok();

    let config = RouterConfig::from_env()?;
    tokio::fs::create_dir_all(config.root_path()).await?;
    let accumulator = FormDataAccumulator::new(config)?;

    let body = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(BODY.as_bytes()))]);
    read_multipart_stream("multipart/form-data; boundary=demo", body, &accumulator).await?;

    for record in accumulator.file_records() {
        println!("file: {}", serde_json::to_string(&record)?);
    }
    println!("fields: {}", accumulator.form_fields().to_json());

    Ok(())
}
