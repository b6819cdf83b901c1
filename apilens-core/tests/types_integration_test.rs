//! Integration tests for the shared record types.

use apilens_core::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_generic_document_projection() {
    let mut doc = ParsedGenericDocument::new("Guide", "intro\n\nbody", DocumentType::Markdown)
        .with_source_file(Some("docs/guide.md"));
    doc.extend_chunks([
        DocumentChunk::new("intro").with_section(Some("Intro")),
        DocumentChunk::new("   "),
        DocumentChunk::new("body").with_span(7, 11),
    ]);

    assert_eq!(doc.chunk_count(), 2);
    assert_eq!(doc.chunks[1].chunk_index, 1);

    let records = doc.to_documents();
    assert_eq!(records.len(), 2);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.discriminator(), Some("markdown"));
        assert_eq!(record.get_metadata_str("source_file"), Some("docs/guide.md"));
        assert_eq!(record.metadata["chunk_index"], i);
        assert_eq!(record.metadata["total_chunks"], 2);
    }
    assert_eq!(records[0].get_metadata_str("section_title"), Some("Intro"));
    assert_eq!(records[1].metadata["start_char"], 7);
    assert!(!records[1].metadata.contains_key("section_title"));
}

#[test]
fn test_api_formats_map_onto_document_types() {
    for format in ApiFormat::SUPPORTED {
        let document_type = format.document_type();
        assert!(document_type.is_api_spec());
        assert_eq!(document_type.api_format(), Some(format));
    }

    let generic: Vec<DocumentType> = DocumentType::ALL
        .into_iter()
        .filter(|t| !t.is_api_spec())
        .collect();
    assert!(generic.iter().all(|t| t.api_format().is_none()));
    assert_eq!(ApiFormat::Unknown.document_type(), DocumentType::Unknown);
}

#[test]
fn test_config_round_trip_through_toml() {
    let config = IngestConfig::new().with_resolve_refs(false);
    let text = toml::to_string(&config).unwrap();
    let parsed = IngestConfig::from_str_with_extension(&text, "toml").unwrap();
    assert_eq!(parsed, config);
}
