//! Prompt templates for answer generation

use vectorrag_common::Record;

/// System instruction sent ahead of every question
pub const SYSTEM_INSTRUCTION: &str = "Answer the user question using the provided context. \
If the context does not contain the answer, say that no relevant information was found.";

/// Context placeholder when retrieval returned nothing
pub const EMPTY_CONTEXT: &str = "(no records were retrieved)";

/// Render retrieved records as numbered `name: value` blocks
pub fn format_context(records: &[Record]) -> String {
    if records.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut block = format!("[{}]", i + 1);
            for (name, value) in &record.properties {
                block.push('\n');
                block.push_str(name);
                block.push_str(": ");
                block.push_str(value);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User message combining the context and the question
pub fn rag_prompt(query: &str, context: &[Record]) -> String {
    format!(
        "Context:\n{}\n\nQuestion:\n{}\n\nAnswer:",
        format_context(context),
        query
    )
}
