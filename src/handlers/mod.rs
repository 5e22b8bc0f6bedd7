pub mod clients;
pub mod common;
pub mod companies;
pub mod expenses;
pub mod health;
pub mod papers;
pub mod payments;
pub mod projections;
pub mod tenders;

use crate::{
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    render::{CommandPdfEngine, PdfEngine, TemplateRenderer},
    services::{
        clients::ClientService, companies::CompanyService, papers::PaperService,
        projections::ProjectionService, tenders::TenderService,
    },
};
use std::sync::Arc;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppServices {
    pub companies: Arc<CompanyService>,
    pub clients: Arc<ClientService>,
    pub papers: Arc<PaperService>,
    pub projections: Arc<ProjectionService>,
    pub tenders: Arc<TenderService>,
}

impl AppServices {
    /// Loads the templates from `template_dir` and renders PDFs with the
    /// configured converter command.
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Result<Self, ServiceError> {
        let renderer = TemplateRenderer::from_dir(
            &config.template_dir,
            &config.currency_major,
            &config.currency_minor,
        )?;
        let pdf_engine = CommandPdfEngine::new(config.pdf_command.clone(), config.pdf_args.clone());
        Ok(Self::with_rendering(
            db_pool,
            config,
            Arc::new(renderer),
            Arc::new(pdf_engine),
        ))
    }

    /// Same as `new` with the rendering collaborators supplied by the caller
    pub fn with_rendering(
        db_pool: Arc<DbPool>,
        config: &AppConfig,
        renderer: Arc<TemplateRenderer>,
        pdf_engine: Arc<dyn PdfEngine>,
    ) -> Self {
        Self {
            companies: Arc::new(CompanyService::new(db_pool.clone())),
            clients: Arc::new(ClientService::new(db_pool.clone())),
            papers: Arc::new(PaperService::new(
                db_pool.clone(),
                renderer,
                pdf_engine,
                config.display_offset,
                config.numbering_max_attempts,
            )),
            projections: Arc::new(ProjectionService::new(db_pool.clone())),
            tenders: Arc::new(TenderService::new(
                db_pool,
                config.expense_page_size,
                config.expense_feed_limit,
            )),
        }
    }
}
