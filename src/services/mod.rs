//! Business services. Each owns a handle to the pool and returns
//! `ServiceError`; handlers stay thin.

pub mod clients;
pub mod companies;
pub mod papers;
pub mod projections;
pub mod tenders;

/// Trims optional free text; blank becomes `None`
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
