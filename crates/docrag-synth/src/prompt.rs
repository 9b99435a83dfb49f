//! Prompt templates for single-shot ("stuff") and map-reduce synthesis.

/// Marker the map step is told to emit when a passage has nothing relevant.
pub const NONE_MARKER: &str = "NONE";

pub fn stuff_prompt(question: &str, passages: &[String]) -> String {
    let context =
        if passages.is_empty() { "(no documents)".to_string() } else { passages.join("\n\n") };
    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, say that you don't know.\n\n{context}\n\n\
         Question: {question}\nHelpful Answer:"
    )
}

pub fn map_prompt(question: &str, passage: &str) -> String {
    format!(
        "Use the following portion of a long document to see if any of the text is relevant \
         to answer the question. \
         Return any relevant text verbatim, or {NONE_MARKER} if nothing is relevant.\n\
         {passage}\nQuestion: {question}\nRelevant text, if any:"
    )
}

pub fn reduce_prompt(question: &str, extracts: &[String]) -> String {
    format!(
        "Given the following extracted parts of a long document and a question, \
         create a final answer. \
         If you don't know the answer, just say that you don't know.\n\n\
         QUESTION: {question}\n=========\n{}\n=========\nFINAL ANSWER:",
        extracts.join("\n\n")
    )
}

/// True for map outputs that carry no content.
pub fn is_empty_extract(extract: &str) -> bool {
    let trimmed = extract.trim().trim_end_matches('.');
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NONE_MARKER)
}
