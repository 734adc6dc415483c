//! Prompt templates for the external query tool
//!
//! PRIVATE MODULE - Not exported from crate

pub const FILE_CITATION: &str = include_str!("../assets/prompts/file_citation.txt");

pub fn format_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// The per-question prompt asking for `FILE:` lines
pub fn file_citation_prompt(question: &str, max_files: usize, excluded: &[String]) -> String {
    let excluded = if excluded.is_empty() {
        "(none)".to_string()
    } else {
        excluded.join(", ")
    };
    format_prompt(
        FILE_CITATION,
        &[
            ("max_files", &max_files.to_string()),
            ("excluded", &excluded),
            ("question", question),
        ],
    )
}
