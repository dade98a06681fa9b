use tfim_core::{ErrorInfo, TfimError};

/// Parses a comma separated list such as `"50, 100,150"`.
///
/// Entries are trimmed. Empty entries, signs, and anything that does not fit
/// in `u32` are rejected.
pub fn parse_values(text: &str) -> Result<Vec<u32>, TfimError> {
    let malformed = |entry: &str, position: usize| {
        TfimError::Validation(
            ErrorInfo::new("params.malformed_list", "malformed parameter list")
                .with_context("input", text)
                .with_context("entry", entry)
                .with_context("position", position.to_string())
                .with_hint("use comma separated positive integers, e.g. \"50,100,150\""),
        )
    };
    text.split(',')
        .enumerate()
        .map(|(position, raw)| {
            let entry = raw.trim();
            if entry.is_empty() || !entry.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(entry, position));
            }
            entry.parse::<u32>().map_err(|_| malformed(entry, position))
        })
        .collect()
}

/// Parses `text` when present, otherwise returns `fallback()`.
pub fn values_or(
    text: Option<&str>,
    fallback: impl FnOnce() -> Vec<u32>,
) -> Result<Vec<u32>, TfimError> {
    match text {
        Some(text) => parse_values(text),
        None => Ok(fallback()),
    }
}
