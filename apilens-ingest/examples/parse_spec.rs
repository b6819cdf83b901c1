//! Parse Spec - Detect and normalize API specifications and documents
//!
//! This example demonstrates:
//! 1. Format detection for a file path
//! 2. Parsing through the unified handler
//! 3. Inspecting the normalized records
//!
//! To run this example:
//! ```bash
//! cargo run -p apilens-ingest --example parse_spec -- path/to/openapi.yaml
//! RUST_LOG=apilens_ingest=debug cargo run -p apilens-ingest --example parse_spec -- specs/
//! ```

use anyhow::{Context, Result};
use apilens_ingest::prelude::*;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let target = std::env::args()
        .nth(1)
        .context("usage: parse_spec <file-or-directory>")?;
    let path = Path::new(&target);

    println!("🔎 apilens Parse Spec Example");
    println!("=============================");
    println!();

    let documents = if path.is_dir() {
        println!("📁 Loading directory: {}", path.display());
        let loader = SpecDirectoryLoader::new(path)?;
        let batch = loader.load_batch().await?;
        for error in &batch.errors {
            println!("  ❌ {}: {}", error.file_path, error.error);
        }
        for result in &batch.results {
            println!(
                "  ✅ {} → {} records",
                result.document_type,
                result.documents.len()
            );
        }
        batch
            .results
            .into_iter()
            .flat_map(|r| r.documents)
            .collect::<Vec<_>>()
    } else {
        let document_type = FormatDetector::detect_from_path(path).await?;
        println!("📄 {} detected as {}", path.display(), document_type);

        let result = UnifiedFormatHandler::new().parse_file(path).await?;
        result.documents
    };

    println!();
    println!("📊 {} records", documents.len());
    for (i, doc) in documents.iter().take(5).enumerate() {
        let preview: String = doc.content.chars().take(120).collect();
        println!(
            "  [{}] {} | {}",
            i,
            doc.discriminator().unwrap_or("-"),
            preview.replace('\n', " ⏎ ")
        );
    }
    if documents.len() > 5 {
        println!("  … and {} more", documents.len() - 5);
    }

    Ok(())
}
