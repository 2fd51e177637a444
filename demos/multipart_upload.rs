//! Multipart upload example for large files
//!
//! This example demonstrates:
//! - Streaming a file to the gateway part by part
//! - Tracking upload progress
//! - Driving the upload step by step and aborting it
//!
//! Run with: cargo run --example multipart_upload -- <file>

use rgw_client::{
    Config, GatewayClient, HeaderOverlay, MultipartUpload, PartOutcome, UploadError, UploadOptions,
    UploadProgress, UploadTarget,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "rgw_client=info".into()))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "Cargo.toml".to_string());

    let config = Config::new(std::env::var("RGW_ENDPOINT").unwrap_or_else(|_| "http://localhost:7480".to_string()))
        .with_credentials(
            std::env::var("RGW_ACCESS_KEY").unwrap_or_default(),
            std::env::var("RGW_SECRET_KEY").unwrap_or_default(),
        );
    let client = GatewayClient::new(config)?;
    let none = HeaderOverlay::new();

    println!("Creating bucket...");
    let created = client.create_bucket("large-files", &none).await?;
    println!("   {} {}", created.status, created.text());

    // ==================== Streamed Upload ====================

    println!("\nUploading {}...", path);
    let file = tokio::fs::File::open(&path).await?;
    let options = client
        .upload_options()
        .with_headers(HeaderOverlay::new().with("x-amz-meta-source", &path)?)
        .with_progress(Box::new(|progress: UploadProgress| {
            println!(
                "   Part {} stored, {:.1} MB so far",
                progress.current_part,
                progress.bytes_uploaded as f64 / (1024.0 * 1024.0)
            );
        }));

    match client
        .put_object_multipart(UploadTarget::new("large-files", "big-data.bin"), file, options)
        .await
    {
        Ok(completed) => println!(
            "   Done: {} parts, {} bytes, upload {}",
            completed.parts.len(),
            completed.bytes_uploaded,
            completed.upload_id
        ),
        Err(e) => {
            println!("   Failed at {:?}: {}", e.stage(), e);
            // Parts stored before the failure stay until the upload is aborted
            if let (UploadError::Part { .. } | UploadError::MissingToken { .. }, Some(upload_id)) = (&e, e.upload_id()) {
                client
                    .abort_multipart_upload(&UploadTarget::new("large-files", "big-data.bin"), upload_id, &none)
                    .await?;
                println!("   Aborted {}", upload_id);
            }
        }
    }

    // ==================== Step-wise Upload ====================

    println!("\nStep-wise upload, then abort...");
    let mut upload = MultipartUpload::initiate(
        client.transport(),
        UploadTarget::new("large-files", "chunked-file.bin"),
        HeaderOverlay::new(),
    )
    .await?;
    println!("   Upload ID: {}", upload.upload_id());

    let chunk = bytes_of(UploadOptions::default().part_size);
    match upload.upload_part(chunk).await? {
        PartOutcome::Stored(part) => println!("   Part {} ETag {}", part.part_number, part.etag),
        PartOutcome::MissingToken { part_number } => println!("   Part {} came back without an ETag", part_number),
    }

    upload.abort().await?;
    println!("   State: {:?}", upload.state());

    Ok(())
}

fn bytes_of(len: usize) -> bytes::Bytes {
    (0..len).map(|i| (i % 256) as u8).collect::<Vec<_>>().into()
}
