//! Builds the retrieval context a trial exposes to the model.

use crate::model::{ContextCondition, DatasetItem, Document};
use rand::seq::SliceRandom;
use rand::Rng;

pub const DOCUMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltContext {
    /// Document texts joined by a blank line, in `documents` order.
    pub text: String,
    pub documents: Vec<Document>,
}

/// Selects the documents for `condition` and joins them into one context string.
///
/// Relevant documents come before irrelevant ones; under
/// [`ContextCondition::Mixed`] the combined list is then permuted with `rng`.
/// Repeated documents are kept as-is.
pub fn build_context<R: Rng + ?Sized>(
    item: &DatasetItem,
    condition: ContextCondition,
    rng: &mut R,
) -> BuiltContext {
    let mut documents = Vec::new();

    if condition.includes_relevant() {
        documents.extend(item.relevant_docs.iter().map(Document::relevant));
    }
    if condition.includes_irrelevant() {
        documents.extend(item.irrelevant_docs.iter().map(Document::irrelevant));
    }

    if condition.shuffles() {
        documents.shuffle(rng);
    }

    let text = join_documents(&documents);
    BuiltContext { text, documents }
}

pub fn join_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}
