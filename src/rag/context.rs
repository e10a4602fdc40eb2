//! Candidate block assembly from retrieved catalog documents

use crate::models::CatalogDocument;

/// Marker placed in the prompt when retrieval found nothing
pub const NO_CANDIDATES_MARKER: &str =
    "NO RELEVANT CATALOG ITEMS FOUND (the catalog search returned no products)";

/// Marker placed in the prompt when every retrieved document exceeded the bound
pub const OVERSIZED_CANDIDATES_MARKER: &str =
    "NO CATALOG ITEMS FIT THE CONTEXT (the matching products were too large to include)";

/// Delimiter between serialized documents
pub const DOCUMENT_DELIMITER: &str = ", ";

/// Assembler for the bounded candidate list of the generation prompt
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Serialize document contents in retrieval order, reporting which product ids made it in.
    ///
    /// Documents that would push the block past the bound are dropped whole.
    /// The block is never empty: a marker stands in when nothing was included.
    #[must_use]
    pub fn assemble_with_ids<'a>(&self, docs: &'a [CatalogDocument]) -> (String, Vec<&'a str>) {
        let mut context = String::new();
        let mut ids = Vec::new();

        for doc in docs {
            let entry = doc.content.trim();
            if entry.is_empty() {
                continue;
            }

            let extra = if context.is_empty() {
                entry.len()
            } else {
                DOCUMENT_DELIMITER.len() + entry.len()
            };
            if context.len() + extra > self.max_context_length {
                break;
            }

            if !context.is_empty() {
                context.push_str(DOCUMENT_DELIMITER);
            }
            context.push_str(entry);
            ids.push(doc.id.as_str());
        }

        if ids.is_empty() {
            let retrieved_any = docs.iter().any(|doc| !doc.content.trim().is_empty());
            let marker = if retrieved_any {
                OVERSIZED_CANDIDATES_MARKER
            } else {
                NO_CANDIDATES_MARKER
            };
            return (marker.to_string(), ids);
        }

        (context, ids)
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(8000)
    }
}
