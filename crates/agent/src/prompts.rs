use codegraph_graph::NodeContext;
use codegraph_protocol::Citation;

pub(crate) const SYSTEM_PROMPT: &str = "You are a code understanding assistant. Your job is to navigate a code graph and answer questions about the codebase.

When analyzing code:
1. Pay attention to function signatures, return types, and docstrings
2. Trace call chains when understanding how functions work together
3. Note imports and dependencies between modules
4. Look for patterns and design decisions

Always base your answers on the actual code provided. Cite specific files and line numbers when relevant.";

/// How many callers/callees are shown to the oracle per direction.
const MAX_RELATED: usize = 5;

pub(crate) fn navigation_prompt(question: &str, context: &NodeContext) -> String {
    let mut related: Vec<String> = Vec::new();
    for pred in context.predecessors.iter().take(MAX_RELATED) {
        related.push(format!("- Called by: {}", pred.node.name));
    }
    for succ in context.successors.iter().take(MAX_RELATED) {
        related.push(format!("- Calls: {}", succ.node.name));
    }
    let related_text = if related.is_empty() {
        "No direct relationships.".to_string()
    } else {
        related.join("\n")
    };

    let node = &context.node;
    format!(
        "Question: {question}\n\n\
         Current node: {} ({})\n\
         File: {}\n\
         Signature: {}\n\n\
         Related nodes:\n{related_text}\n\n\
         Based on this context, decide:\n\
         1. If you can answer the question now, respond with: ANSWER: [your answer]\n\
         2. If you need to explore a related node, respond with: NAVIGATE: [node_name]\n\
         3. If you've gathered enough context, respond with: DONE\n\n\
         What is your decision?",
        node.name,
        node.kind.as_str(),
        node.file_path,
        node.signature.as_deref().unwrap_or("N/A"),
    )
}

pub(crate) fn synthesis_prompt(question: &str, citations: &[Citation]) -> String {
    let context_text = citations
        .iter()
        .map(|c| {
            format!(
                "## {} ({}:{}-{})\n```\n{}\n```",
                c.node_name.as_deref().unwrap_or("Code"),
                c.file_path,
                c.start_line,
                c.end_line,
                c.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following code context, answer the user's question.\n\n\
         Question: {question}\n\n\
         Code Context:\n{context_text}\n\n\
         Provide a clear, detailed answer that references the specific code shown. \
         If you cannot answer from the given context, say so."
    )
}
