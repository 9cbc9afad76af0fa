use std::collections::HashSet;

/// Number of consecutive words in one shingle
pub const SHINGLE_SIZE: usize = 5;

/// Collapses all whitespace runs to single spaces and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the set of contiguous `SHINGLE_SIZE`-word windows of `text`
///
/// Text with fewer than `SHINGLE_SIZE` words has no shingles.
pub fn shingles(text: &str) -> HashSet<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .windows(SHINGLE_SIZE)
        .map(|window| window.join(" "))
        .collect()
}

/// Jaccard similarity of two shingle sets
///
/// Defined as 0 when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|s| large.contains(*s)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
