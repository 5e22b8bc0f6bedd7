//! Document sequence identifiers: `{SLUG}/{YEAR}/{NNNN}`.
//!
//! The suffix comes from a per-(company, year) counter that only ever moves
//! forward, so a deleted document never frees its number.

/// Builds the stored identifier for a freshly allocated sequence value.
/// Values above 9999 keep all their digits.
pub fn format_sequence_identifier(slug: &str, year: i32, sequence: u32) -> String {
    format!("{}/{}/{:04}", slug.to_uppercase(), year, sequence)
}

/// Numeric part after the last `/`, if there is one and it parses
pub fn parse_sequence_suffix(identifier: &str) -> Option<u32> {
    let (_, suffix) = identifier.rsplit_once('/')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// True when a document still has to be numbered. An identifier that is
/// already present is never replaced.
pub fn needs_identifier(existing: Option<&str>) -> bool {
    existing.map_or(true, |identifier| identifier.trim().is_empty())
}
