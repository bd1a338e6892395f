// Shared prompt fragments.
// Each stage that calls the LLM keeps its own prompts.rs alongside it;
// this file only holds the cross-cutting pieces.

/// Appended to every prompt whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Ensure the output is ONLY a valid JSON object. \
    Do not include any text before or after the JSON.";

/// Title given to the resume when it is embedded.
pub const RESUME_EMBEDDING_TITLE: &str = "Candidate Resume";
