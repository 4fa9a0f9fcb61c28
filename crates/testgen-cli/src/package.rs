//! File naming for generated outputs.

use testgen_core::generate::{GeneratedOutput, OutputBlock, ENVIRONMENT_NAME};

/// Name of the file an output is written to
pub fn file_name(output: &GeneratedOutput) -> String {
    match &output.block {
        OutputBlock::Path(_) => sanitize_filename(&format!("{}-test.js", output.name)),
        OutputBlock::Sequence(_) => sanitize_filename(&format!("{}-sequence-test.js", output.name)),
        OutputBlock::Environment(_) => ENVIRONMENT_NAME.to_string(),
    }
}

/// Make a string safe to use as a file name on every platform.
///
/// Path separators, reserved punctuation and control characters are dropped; dashes,
/// dots and braces survive. A name left empty or made of dots only becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| {
            !c.is_control()
                && !matches!(c, '/' | '\\' | '?' | '<' | '>' | ':' | '*' | '|' | '"')
        })
        .collect();
    let cleaned = cleaned.trim_end_matches([' ', '.']);

    if cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}
