//! Pure business rules: no I/O, no database handles.
//!
//! Services fetch rows, hand plain values to these functions and persist the
//! results; handlers only ever see the outcome.

pub mod aggregation;
pub mod display;
pub mod money;
pub mod numbering;
pub mod tender;
pub mod totals;
pub mod words;
