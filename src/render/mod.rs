//! Document output: HTML through tera templates, PDF through an external
//! converter.

pub mod pdf;
pub mod templates;

pub use pdf::{CommandPdfEngine, PdfEngine};
pub use templates::{DocumentRender, PaperType, TemplateRenderer};
