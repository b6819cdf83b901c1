//! Single-file loader.

use apilens_core::{Loader, Result as CoreResult, VectorDocument};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::LoaderConfig;
use crate::error::{IngestError, Result};
use crate::handler::UnifiedFormatHandler;

/// Loads the records of one API specification or document file.
///
/// # Examples
///
/// ```rust,no_run
/// use apilens_core::Loader;
/// use apilens_ingest::loaders::SpecFileLoader;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let loader = SpecFileLoader::new("openapi.yaml")?;
///     for doc in loader.load().await? {
///         println!("{:?}: {} chars", doc.discriminator(), doc.content.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpecFileLoader {
    path: PathBuf,
    config: LoaderConfig,
    handler: Arc<UnifiedFormatHandler>,
}

impl SpecFileLoader {
    /// Create a loader for the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a file.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(IngestError::file_not_found(path.display().to_string()));
        }
        if !path.is_file() {
            return Err(IngestError::Core(apilens_core::ApiLensError::configuration(
                format!("Path is not a file: {}", path.display()),
            )));
        }

        Ok(Self {
            path,
            config: LoaderConfig::default(),
            handler: Arc::new(UnifiedFormatHandler::new()),
        })
    }

    /// Create a loader with custom configuration.
    pub fn with_config<P: AsRef<Path>>(path: P, config: LoaderConfig) -> Result<Self> {
        let mut loader = Self::new(path)?;
        loader.config = config;
        Ok(loader)
    }

    /// Use a shared handler, e.g. one built from an `IngestConfig`.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<UnifiedFormatHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    async fn check_size(&self) -> Result<()> {
        let Some(limit) = self.config.max_file_size else {
            return Ok(());
        };
        let size = tokio::fs::metadata(&self.path)
            .await
            .map_err(|_| IngestError::file_not_found(self.path.display().to_string()))?
            .len();
        if size > limit {
            return Err(IngestError::document_parsing(format!(
                "File too large: {size} bytes (max: {limit} bytes)"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Loader for SpecFileLoader {
    async fn load(&self) -> CoreResult<Vec<VectorDocument>> {
        info!("Loading file: {}", self.path.display());

        if !self.config.admits(&self.path) {
            debug!("File filtered out by configuration: {}", self.path.display());
            return Ok(Vec::new());
        }
        self.check_size().await?;

        let result = self.handler.parse_file(&self.path).await?;
        info!(
            "Loaded {} records from {} ({})",
            result.documents.len(),
            self.path.display(),
            result.document_type
        );
        Ok(result.documents)
    }

    fn name(&self) -> &'static str {
        "SpecFileLoader"
    }

    async fn health_check(&self) -> CoreResult<()> {
        if !self.path.is_file() {
            return Err(IngestError::file_not_found(self.path.display().to_string()).into());
        }
        tokio::fs::metadata(&self.path)
            .await
            .map_err(IngestError::Io)?;
        Ok(())
    }

    async fn metadata(&self) -> CoreResult<Map<String, Value>> {
        let mut metadata = Map::new();
        metadata.insert("loader_type".to_string(), Value::from("file"));
        metadata.insert(
            "file_path".to_string(),
            Value::from(self.path.display().to_string()),
        );
        if let Ok(meta) = tokio::fs::metadata(&self.path).await {
            metadata.insert("file_size".to_string(), Value::from(meta.len()));
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_graphql_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.graphql");
        std::fs::write(&path, "type Query { ping: String }").unwrap();

        let loader = SpecFileLoader::new(&path).unwrap();
        loader.health_check().await.unwrap();

        let docs = loader.load().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_metadata_str("type"), Some("query"));

        let metadata = loader.metadata().await.unwrap();
        assert_eq!(metadata["loader_type"], "file");
    }

    #[tokio::test]
    async fn test_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "x".repeat(64)).unwrap();

        let loader =
            SpecFileLoader::with_config(&path, LoaderConfig::new().with_max_file_size(16)).unwrap();
        assert!(loader.load().await.is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = SpecFileLoader::new("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }
}
