//! Presentation of stored identifiers.
//!
//! Customers see sequence numbers shifted by a fixed offset (external
//! numbering starts at 100). Nothing here touches the stored value.

use super::numbering::parse_sequence_suffix;

/// Stored suffix plus `offset`, zero-padded to four digits.
///
/// Returns `None` when the identifier carries no numeric suffix.
pub fn display_sequence(identifier: &str, offset: u32) -> Option<String> {
    let suffix = parse_sequence_suffix(identifier)?;
    Some(format!("{:04}", suffix.saturating_add(offset)))
}

/// Display form for a document, falling back to the stored identifier
pub fn display_number(identifier: &str, offset: u32) -> String {
    display_sequence(identifier, offset).unwrap_or_else(|| identifier.to_string())
}

/// Download name for an exported document
pub fn pdf_filename(paper_type: &str, slug: &str, display: &str) -> String {
    format!("{}_{}_{}.pdf", paper_type, slug.to_uppercase(), display)
}
