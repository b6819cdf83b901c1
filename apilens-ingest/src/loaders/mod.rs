//! File system loaders.
//!
//! Both loaders implement [`apilens_core::Loader`] on top of
//! [`UnifiedFormatHandler`](crate::UnifiedFormatHandler): every file is
//! detected, parsed and projected into records. Files are processed one at a
//! time.

pub mod directory;
pub mod file;

pub use directory::SpecDirectoryLoader;
pub use file::SpecFileLoader;

use std::path::Path;
use tracing::debug;

/// Configuration for loader behavior.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum file size to process (in bytes).
    pub max_file_size: Option<u64>,

    /// File extensions to include (if None, every extension is included).
    pub include_extensions: Option<Vec<String>>,

    /// File extensions to exclude.
    pub exclude_extensions: Vec<String>,

    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,

    /// Maximum depth for recursive directory traversal.
    pub max_depth: Option<usize>,

    /// Whether to continue processing if some files fail.
    pub continue_on_error: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: Some(50 * 1024 * 1024),
            include_extensions: None,
            exclude_extensions: ["exe", "bin", "dll", "so", "dylib", "zip", "png", "jpg"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            follow_symlinks: false,
            max_depth: Some(10),
            continue_on_error: true,
        }
    }
}

impl LoaderConfig {
    /// Create a new loader configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = Some(size);
        self
    }

    /// Set included file extensions.
    #[must_use]
    pub fn with_include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Set excluded file extensions.
    #[must_use]
    pub fn with_exclude_extensions(mut self, extensions: Vec<String>) -> Self {
        self.exclude_extensions = extensions;
        self
    }

    /// Set whether to follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set maximum directory traversal depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set whether to continue on errors.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Whether the extension lists admit this path.
    pub fn admits(&self, path: &Path) -> bool {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match (extension, &self.include_extensions) {
            (Some(ext), _) if self.exclude_extensions.contains(&ext) => {
                debug!("Excluding file due to extension: {}", path.display());
                false
            }
            (Some(ext), Some(include)) => include.iter().any(|i| i.eq_ignore_ascii_case(&ext)),
            (None, Some(_)) => false,
            (_, None) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filtering() {
        let config = LoaderConfig::new();
        assert!(config.admits(Path::new("api.yaml")));
        assert!(config.admits(Path::new("README")));
        assert!(!config.admits(Path::new("tool.EXE")));

        let config = LoaderConfig::new().with_include_extensions(["graphql", "json"]);
        assert!(config.admits(Path::new("schema.GraphQL")));
        assert!(!config.admits(Path::new("notes.md")));
        assert!(!config.admits(Path::new("Makefile")));
    }
}
