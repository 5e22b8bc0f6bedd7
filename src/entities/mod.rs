pub mod client;
pub mod company;
pub mod expense;
pub mod paper_entry;
pub mod paper_item;
pub mod paper_sequence;
pub mod payment;
pub mod project_record;
pub mod tender;
