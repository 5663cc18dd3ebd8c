//! Raw-text normalization.

/// Canonicalize punctuation and whitespace in a raw message.
///
/// Unifies curly/backtick quote variants to their ASCII forms, collapses
/// whitespace runs to single spaces, and trims the ends. Emojis, hashtags,
/// and mentions pass through untouched.
pub fn normalize(text: &str) -> String {
    let unified: String = text
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '`' | '\u{00B4}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect();

    unified.split_whitespace().collect::<Vec<_>>().join(" ")
}
