//! Prompt assembly for every generation operation.
//!
//! Pure string builders; the session layer decides when to call them and the
//! client decides how. Image prompts need no assembly and pass through as-is.

use crate::github::RepoInfo;
use std::fmt::Write;

/// README generation from repository metadata.
pub fn readme(info: &RepoInfo) -> String {
    format!(
        "You are an expert technical writer. Create a high-quality README.md for a GitHub \
         repository. Data: Name: {}, Description: {}, Language: {}. Include Description, \
         Features, Installation, and Usage sections.",
        info.name,
        info.description,
        info.primary_language.as_deref().unwrap_or("Unknown"),
    )
}

/// README refinement from the current markdown and a user instruction.
pub fn improve_readme(current: &str, instruction: &str) -> String {
    format!(
        "Improve this README.md based on the instruction. Generate a new, complete README. \
         Original:\n---\n{}\n---\nInstruction: \"{}\". Generate ONLY the full, updated Markdown.",
        current, instruction,
    )
}

/// Conventional Commit suggestions derived from a README.
pub fn commit_suggestions(readme: &str) -> String {
    format!(
        "Based on this README.md, generate 3-5 Conventional Commit messages. Provide ONLY the \
         messages, each on a new line. README:\n---\n{}\n---",
        readme,
    )
}

/// Explanation of one source file.
pub fn explain_code(path: &str, code: &str) -> String {
    format!(
        "Explain this code from \"{}\". Summarize first, then break it down. Format in \
         Markdown.\n\n```\n{}\n```",
        path, code,
    )
}

/// Refactoring of one source file under a user instruction.
pub fn refactor(path: &str, code: &str, instruction: &str) -> String {
    format!(
        "Refactor this code from \"{}\" based on this instruction: \"{}\". Provide ONLY the \
         refactored code, no explanations or markdown formatting.\n\n```\n{}\n```",
        path, instruction, code,
    )
}

/// Free-form code generation from a description, with optional target
/// language and a flag for callers that feed the result an `uploadedData`
/// table.
pub fn generate_code(description: &str, language: Option<&str>, uses_uploaded_data: bool) -> String {
    let mut prompt = format!(
        "Generate code for this description: \"{}\". Provide ONLY the code, no explanations or \
         markdown formatting.",
        description,
    );
    if let Some(language) = language {
        // Infallible on String; ignore the fmt plumbing result.
        let _ = write!(prompt, " The language should be {}.", language);
    }
    if uses_uploaded_data {
        prompt.push_str(" The code should process data from a variable named 'uploadedData'.");
    }
    prompt
}
