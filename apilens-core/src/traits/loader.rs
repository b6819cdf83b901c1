//! Document loading traits.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{Result, types::VectorDocument};

/// Loads normalized records from a data source.
///
/// # Examples
///
/// ```rust,no_run
/// use apilens_core::traits::Loader;
/// use apilens_core::types::VectorDocument;
/// use apilens_core::Result;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct StaticLoader;
///
/// #[async_trait]
/// impl Loader for StaticLoader {
///     async fn load(&self) -> Result<Vec<VectorDocument>> {
///         Ok(vec![VectorDocument::new("hello").with_metadata("document_type", "text")])
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync + std::fmt::Debug {
    /// Load every record from the source.
    async fn load(&self) -> Result<Vec<VectorDocument>>;

    /// Get a human-readable name for this loader.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Check if the loader can access its data source.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    /// Get metadata about the data source.
    async fn metadata(&self) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }
}
