// SPDX-License-Identifier: MIT

//! Prompt text for the research step

/// Sections the report is asked to contain, in order
pub const REPORT_SECTIONS: [&str; 3] = [
    "Summary of findings",
    "Key papers",
    "Implications and future work",
];

/// Query sent to the search provider for a research topic
pub fn arxiv_search_query(topic: &str) -> String {
    format!(
        "arXiv research papers {} latest developments academic research",
        topic
    )
}

/// Query used by the memory step to recall earlier reports
pub fn memory_lookup_query(topic: &str) -> String {
    format!("Find past research about {}", topic)
}

/// Assemble the report prompt from the user query and both digests
pub fn build_report_prompt(query: &str, memory_digest: &str, search_digest: &str) -> String {
    let sections: String = REPORT_SECTIONS
        .iter()
        .map(|s| format!("\n- {}", s))
        .collect();

    format!(
        "You are Professor X-1000, an AI research assistant with persistent memory.\n\n\
         The user asked: {query}\n\n\
         You previously found:\n{memory_digest}\n\n\
         New research papers from arXiv:\n{search_digest}\n\n\
         Based on both, generate a structured academic report:{sections}"
    )
}
