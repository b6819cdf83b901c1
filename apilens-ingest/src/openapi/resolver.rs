//! `$ref` resolution.
//!
//! Resolves local JSON pointers (`#/components/schemas/User`) and relative
//! file references (`common.yaml#/Pet`), reading referenced files from the
//! directory of the file that contains the reference. Remote URLs are left
//! untouched. A reference that points back into its own expansion is left
//! as a literal `$ref` object. Each target is expanded once per call; later
//! references to it reuse the cached expansion unless a cycle was cut while
//! building it.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::load_structured;
use crate::error::{IngestError, Result};

/// Expands `$ref` pointers in a JSON or YAML document.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefResolver;

impl RefResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Load the file at `path` and expand every reference in it.
    pub fn resolve_file(&self, path: &Path) -> Result<Value> {
        let mut session = Session::default();
        let root_path = session.load(path)?;
        let root = session.document(&root_path)?.clone();

        let mut active = Vec::new();
        let resolved = session.expand(&root, &root_path, &mut active)?;
        debug!(
            "Resolved {} with {} external documents, {} cached expansions reused",
            path.display(),
            session.documents.len() - 1,
            session.cache_hits
        );
        Ok(resolved)
    }
}

/// Per-call state: loaded documents keyed by canonical path and expanded
/// targets keyed by `path#pointer`.
#[derive(Default)]
struct Session {
    documents: HashMap<PathBuf, Value>,
    expanded: HashMap<String, Value>,
    cycles_cut: usize,
    cache_hits: usize,
}

impl Session {
    fn load(&mut self, path: &Path) -> Result<PathBuf> {
        let canonical = path
            .canonicalize()
            .map_err(|_| IngestError::file_not_found(path.display().to_string()))?;
        if !self.documents.contains_key(&canonical) {
            let content = std::fs::read_to_string(&canonical)?;
            let value = load_structured(&content)?;
            self.documents.insert(canonical.clone(), value);
        }
        Ok(canonical)
    }

    fn document(&self, path: &Path) -> Result<&Value> {
        self.documents
            .get(path)
            .ok_or_else(|| IngestError::ref_resolution(format!("{} not loaded", path.display())))
    }

    fn expand(&mut self, node: &Value, doc: &Path, active: &mut Vec<String>) -> Result<Value> {
        match node {
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                    return self.follow(node, reference, doc, active);
                }
                let mut expanded = Map::with_capacity(map.len());
                for (key, value) in map {
                    expanded.insert(key.clone(), self.expand(value, doc, active)?);
                }
                Ok(Value::Object(expanded))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.expand(item, doc, active))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn follow(
        &mut self,
        node: &Value,
        reference: &str,
        doc: &Path,
        active: &mut Vec<String>,
    ) -> Result<Value> {
        let (file_part, fragment) = reference.split_once('#').unwrap_or((reference, ""));

        if file_part.contains("://") {
            debug!("Leaving remote reference {reference}");
            return Ok(node.clone());
        }

        let target_doc = if file_part.is_empty() {
            doc.to_path_buf()
        } else {
            let base = doc.parent().unwrap_or_else(|| Path::new("."));
            self.load(&base.join(file_part)).map_err(|e| {
                IngestError::ref_resolution(format!("cannot load '{file_part}': {e}"))
            })?
        };

        let key = format!("{}#{fragment}", target_doc.display());
        if active.contains(&key) {
            debug!("Circular reference {reference} left in place");
            self.cycles_cut += 1;
            return Ok(node.clone());
        }
        if let Some(cached) = self.expanded.get(&key) {
            self.cache_hits += 1;
            return Ok(cached.clone());
        }

        let target = self
            .document(&target_doc)?
            .pointer(fragment)
            .cloned()
            .ok_or_else(|| IngestError::ref_resolution(format!("unresolvable $ref '{reference}'")))?;

        let cuts_before = self.cycles_cut;
        active.push(key.clone());
        let expanded = self.expand(&target, &target_doc, active);
        active.pop();

        let expanded = expanded?;
        // An expansion with a cut cycle depends on the entry point.
        if self.cycles_cut == cuts_before {
            self.expanded.insert(key, expanded.clone());
        }
        Ok(expanded)
    }
}
