// Utility functions

/// Collapses every whitespace run into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenates every ASCII digit in the string, in order.
pub fn concat_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses one word as a numeric token such as `3`, `15,000` or `$1.500,00`.
/// Leading/trailing punctuation is ignored; grouping separators inside are dropped.
pub fn parse_numeric_token(word: &str) -> Option<u64> {
    let core = word.trim_matches(|c: char| !c.is_ascii_digit());
    if core.is_empty() {
        return None;
    }
    if !core.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return None;
    }
    concat_digits(core).parse().ok()
}

/// First numeric token of the string, scanning whitespace-separated words.
pub fn first_numeric_token(text: &str) -> Option<u64> {
    text.split_whitespace().find_map(parse_numeric_token)
}

/// Strips surrounding punctuation from a word so `marzo,` compares equal to `marzo`.
pub fn bare_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}
