//! Directory loader.

use apilens_core::{Loader, Result as CoreResult, VectorDocument};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, warn};

use super::LoaderConfig;
use crate::error::{IngestError, Result};
use crate::handler::{BatchError, BatchParseResult, UnifiedFormatHandler};

/// Loads every specification and document under a directory.
///
/// Files are discovered recursively in sorted order and parsed one at a
/// time. With `continue_on_error` (the default) a failing file is logged and
/// skipped; otherwise the first failure aborts the load.
///
/// # Examples
///
/// ```rust,no_run
/// use apilens_core::Loader;
/// use apilens_ingest::loaders::{LoaderConfig, SpecDirectoryLoader};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = LoaderConfig::new().with_include_extensions(["yaml", "json", "graphql"]);
///     let loader = SpecDirectoryLoader::with_config("./specs", config)?;
///     let documents = loader.load().await?;
///     println!("Loaded {} records", documents.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpecDirectoryLoader {
    path: PathBuf,
    config: LoaderConfig,
    handler: Arc<UnifiedFormatHandler>,
}

impl SpecDirectoryLoader {
    /// Create a loader for the specified directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(IngestError::file_not_found(path.display().to_string()));
        }
        if !path.is_dir() {
            return Err(IngestError::Core(apilens_core::ApiLensError::configuration(
                format!("Path is not a directory: {}", path.display()),
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

    /// Use a shared handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<UnifiedFormatHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Get the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// All admitted files, sorted.
    pub async fn find_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.find_files_recursive(&self.path, 0, &mut files).await?;
        files.sort();
        Ok(files)
    }

    fn find_files_recursive<'a>(
        &'a self,
        dir: &'a Path,
        current_depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(max_depth) = self.config.max_depth {
                if current_depth >= max_depth {
                    debug!("Reached maximum depth {} at {}", max_depth, dir.display());
                    return Ok(());
                }
            }

            let mut entries = fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let metadata = if self.config.follow_symlinks {
                    fs::metadata(&path).await
                } else {
                    fs::symlink_metadata(&path).await
                };

                let metadata = match metadata {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!("Failed to read metadata for {}: {}", path.display(), e);
                        if !self.config.continue_on_error {
                            return Err(IngestError::Io(e));
                        }
                        continue;
                    }
                };

                if metadata.is_file() {
                    let too_large = self
                        .config
                        .max_file_size
                        .is_some_and(|limit| metadata.len() > limit);
                    if too_large {
                        warn!("Skipping oversized file: {}", path.display());
                    } else if self.config.admits(&path) {
                        files.push(path);
                    }
                } else if metadata.is_dir() {
                    self.find_files_recursive(&path, current_depth + 1, files)
                        .await?;
                }
            }
            Ok(())
        })
    }

    /// Parse every admitted file, keeping per-file failures.
    pub async fn load_batch(&self) -> Result<BatchParseResult> {
        let files = self.find_files().await?;
        info!(
            "Parsing {} files from directory: {}",
            files.len(),
            self.path.display()
        );

        let mut batch = BatchParseResult::default();
        for path in files {
            match self.handler.parse_file(&path).await {
                Ok(result) => batch.results.push(result),
                Err(e) => {
                    error!("Failed to parse {}: {}", path.display(), e);
                    if !self.config.continue_on_error {
                        return Err(e);
                    }
                    batch.errors.push(BatchError {
                        file_path: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(batch)
    }
}

#[async_trait]
impl Loader for SpecDirectoryLoader {
    async fn load(&self) -> CoreResult<Vec<VectorDocument>> {
        let batch = self.load_batch().await?;
        if batch.results.is_empty() && batch.errors.is_empty() {
            warn!("No files found in directory: {}", self.path.display());
        }

        let documents: Vec<VectorDocument> = batch
            .results
            .into_iter()
            .flat_map(|result| result.documents)
            .collect();
        info!(
            "Loaded {} records from directory ({} files failed)",
            documents.len(),
            batch.errors.len()
        );
        Ok(documents)
    }

    fn name(&self) -> &'static str {
        "SpecDirectoryLoader"
    }

    async fn health_check(&self) -> CoreResult<()> {
        if !self.path.is_dir() {
            return Err(IngestError::file_not_found(self.path.display().to_string()).into());
        }
        let _ = fs::read_dir(&self.path).await.map_err(IngestError::Io)?;
        Ok(())
    }

    async fn metadata(&self) -> CoreResult<Map<String, Value>> {
        let mut metadata = Map::new();
        metadata.insert("loader_type".to_string(), Value::from("directory"));
        metadata.insert(
            "directory_path".to_string(),
            Value::from(self.path.display().to_string()),
        );
        if let Ok(files) = self.find_files().await {
            metadata.insert("file_count".to_string(), Value::from(files.len()));
        }
        Ok(metadata)
    }
}
