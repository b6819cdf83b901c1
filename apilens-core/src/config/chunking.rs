//! Chunk-size bands for the general-document chunkers.

use serde::{Deserialize, Serialize};

use crate::{ApiLensError, Result};

/// Text and Markdown chunking limits, in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TextChunkConfig {
    /// Target chunk size for packed paragraphs and fixed windows.
    pub chunk_size: usize,

    /// Overlap carried between consecutive fixed windows.
    pub chunk_overlap: usize,

    /// Markdown sections above this size are split into windows.
    pub section_max_chars: usize,
}

impl Default for TextChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            section_max_chars: 1500,
        }
    }
}

impl TextChunkConfig {
    /// Set the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the chunk overlap.
    #[must_use]
    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Set the Markdown section limit.
    #[must_use]
    pub fn with_section_max_chars(mut self, section_max_chars: usize) -> Self {
        self.section_max_chars = section_max_chars;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ApiLensError::configuration(
                "Chunk size must be greater than 0",
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ApiLensError::configuration(
                "Chunk overlap must be less than chunk size",
            ));
        }

        if self.section_max_chars < self.chunk_size {
            return Err(ApiLensError::configuration(
                "Section limit must not be smaller than chunk size",
            ));
        }

        Ok(())
    }
}

/// Generic JSON chunking limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JsonChunkConfig {
    /// A serialized `key: value` entry above this size is chunked recursively.
    pub max_entry_chars: usize,

    /// Serialized size limit of one group of array elements.
    pub max_group_chars: usize,

    /// Maximum number of array elements per group.
    pub max_group_items: usize,
}

impl Default for JsonChunkConfig {
    fn default() -> Self {
        Self {
            max_entry_chars: 2000,
            max_group_chars: 1000,
            max_group_items: 10,
        }
    }
}

impl JsonChunkConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_entry_chars == 0 || self.max_group_chars == 0 {
            return Err(ApiLensError::configuration(
                "JSON chunk limits must be greater than 0",
            ));
        }

        if self.max_group_items == 0 {
            return Err(ApiLensError::configuration(
                "JSON array groups must hold at least one element",
            ));
        }

        Ok(())
    }
}

/// PDF chunking limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PdfChunkConfig {
    /// Pages up to this size become a single chunk.
    pub max_page_chars: usize,

    /// Paragraph packing limit for oversized pages.
    pub max_chunk_chars: usize,
}

impl Default for PdfChunkConfig {
    fn default() -> Self {
        Self {
            max_page_chars: 2000,
            max_chunk_chars: 1500,
        }
    }
}

impl PdfChunkConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_page_chars == 0 || self.max_chunk_chars == 0 {
            return Err(ApiLensError::configuration(
                "PDF chunk limits must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// CSV chunking limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CsvChunkConfig {
    /// Rows are packed into chunks up to this size.
    pub max_chunk_chars: usize,
}

impl Default for CsvChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 1000,
        }
    }
}

/// All chunker settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Text and Markdown.
    pub text: TextChunkConfig,
    /// Generic JSON.
    pub json: JsonChunkConfig,
    /// PDF.
    pub pdf: PdfChunkConfig,
    /// CSV.
    pub csv: CsvChunkConfig,
}

impl ChunkingConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.text.validate()?;
        self.json.validate()?;
        self.pdf.validate()?;
        if self.csv.max_chunk_chars == 0 {
            return Err(ApiLensError::configuration(
                "CSV chunk size must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        ChunkingConfig::default().validate().unwrap();
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let config = TextChunkConfig::default()
            .with_chunk_size(100)
            .with_chunk_overlap(100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_group_items_rejected() {
        let config = JsonChunkConfig {
            max_group_items: 0,
            ..JsonChunkConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
