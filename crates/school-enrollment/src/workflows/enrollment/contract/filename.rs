/// Filesystem-safe form of a free-text identifier: every character outside `[A-Za-z0-9]`
/// becomes `_` and the result is lower-cased. Applying it twice changes nothing.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Stem for a student's contract artifact; the renderer picks the extension.
pub fn contract_file_stem(student_name: &str) -> String {
    format!("contract_{}", sanitize(student_name))
}
