//! YAML fragments for embedding in generated templates

use serde::Serialize;

/// Indent every non-empty line by `spaces`
pub fn indent(content: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    let mut result = String::with_capacity(content.len() + spaces * content.lines().count());
    let mut first = true;

    for line in content.lines() {
        if !first {
            result.push('\n');
        }
        first = false;

        if !line.is_empty() {
            result.push_str(&pad);
        }
        result.push_str(line);
    }

    result
}

/// Serialize `value` as a YAML block indented by `spaces`
///
/// Trailing newlines and spaces are stripped so the fragment can sit
/// directly above the next template line.
pub fn to_fragment<T: Serialize + ?Sized>(
    value: &T,
    spaces: usize,
) -> std::result::Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(value)?;
    let indented = indent(&yaml, spaces);
    Ok(indented.trim_end_matches(['\n', ' ']).to_string())
}
