//! Text normalization shared by name identity, scoring and column detection.

/// Surface form of a raw cell: surrounding whitespace and any byte-order mark removed.
pub fn display_form(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// Identity key for a team name: lowercase, whitespace runs collapsed to one space.
pub fn identity_key(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Characters compared by the similarity scorer.
pub fn comparison_chars(s: &str) -> Vec<char> {
    s.to_lowercase().chars().collect()
}

/// Normalize a CSV header for column detection.
pub fn normalize_header(header: &str) -> String {
    display_form(header).to_lowercase()
}

/// Render a score the way every report does (two decimals).
pub fn format_confidence(score: f64) -> String {
    format!("{:.2}", score)
}
