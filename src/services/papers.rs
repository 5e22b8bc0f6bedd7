use super::clients::{insert_client, CreateClientRequest};
use crate::{
    db::DbPool,
    domain::{
        display::{display_number, pdf_filename},
        money::{non_negative_amount, RawAmount},
        totals::DocumentTotals,
    },
    entities::{
        client::{self, Entity as ClientEntity},
        company::{self, Entity as CompanyEntity},
        paper_entry::{self, Entity as PaperEntryEntity},
        paper_item::{self, Entity as PaperItemEntity},
    },
    errors::ServiceError,
    middleware_helpers::{with_retry, ConflictRetryPolicy, RetryConfig},
    render::{DocumentRender, PaperType, PdfEngine, TemplateRenderer},
};
use chrono::{NaiveDate, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc, time::Instant};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaperItemInput {
    #[validate(length(min = 1, message = "Item description is required"))]
    pub description: String,
    #[schema(value_type = f64, example = 2)]
    pub quantity: RawAmount,
    #[schema(value_type = f64, example = 1500.0)]
    pub unit_price: RawAmount,
}

/// New document. The client is either an existing one (`client_id`) or
/// created on the fly from `client`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePaperRequest {
    pub company_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client: Option<CreateClientRequest>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<f64>, example = 16)]
    pub tax_percentage: Option<RawAmount>,
    #[validate(length(max = 255))]
    pub prepared_by: Option<String>,
    #[validate(length(max = 255))]
    pub delivered_by: Option<String>,
    #[validate(length(max = 255))]
    pub received_by: Option<String>,
    pub items: Vec<PaperItemInput>,
}

/// Header changes; the number and the company never change
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePaperRequest {
    pub client_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<f64>)]
    pub tax_percentage: Option<RawAmount>,
    #[validate(length(max = 255))]
    pub prepared_by: Option<String>,
    #[validate(length(max = 255))]
    pub delivered_by: Option<String>,
    #[validate(length(max = 255))]
    pub received_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReplaceItemsRequest {
    pub items: Vec<PaperItemInput>,
}

#[derive(Debug, Clone, Default)]
pub struct PaperListFilter {
    pub company_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub q: Option<String>,
    pub page: u64,
    pub per_page: u64,
}

/// A document with everything needed to show it
#[derive(Debug, Clone)]
pub struct PaperDetail {
    pub entry: paper_entry::Model,
    pub company: company::Model,
    pub client: client::Model,
    pub items: Vec<paper_item::Model>,
    pub display_number: String,
}

#[derive(Debug, Clone)]
pub struct PaperRow {
    pub entry: paper_entry::Model,
    pub company_name: String,
    pub client_name: String,
    pub display_number: String,
}

#[derive(Debug, Clone)]
pub struct PaperPage {
    pub rows: Vec<PaperRow>,
    pub total: u64,
}

/// A rendered PDF and its download name
#[derive(Debug, Clone)]
pub struct PaperPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ItemDraft {
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
}

#[derive(Debug, Clone)]
enum ClientChoice {
    Existing(Uuid),
    New(CreateClientRequest),
}

/// A create request after validation, replayable on conflict
#[derive(Debug, Clone)]
struct PaperDraft {
    company_id: Uuid,
    client: ClientChoice,
    date: NaiveDate,
    tax_percentage: Decimal,
    prepared_by: Option<String>,
    delivered_by: Option<String>,
    received_by: Option<String>,
    items: Vec<ItemDraft>,
}

fn parse_tax(raw: Option<&RawAmount>) -> Result<Decimal, ServiceError> {
    let tax = match raw {
        Some(raw) => non_negative_amount(raw, "tax_percentage")?,
        None => Decimal::ZERO,
    };
    if tax > Decimal::ONE_HUNDRED {
        return Err(ServiceError::ValidationError(
            "tax_percentage must be between 0 and 100".into(),
        ));
    }
    Ok(tax)
}

fn prepare_items(items: &[PaperItemInput]) -> Result<Vec<ItemDraft>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "A document needs at least one item".into(),
        ));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<ItemDraft, ServiceError> {
            item.validate()?;
            Ok(ItemDraft {
                description: item.description.trim().to_string(),
                quantity: non_negative_amount(&item.quantity, &format!("items[{index}].quantity"))?,
                unit_price: non_negative_amount(
                    &item.unit_price,
                    &format!("items[{index}].unit_price"),
                )?,
            })
        })
        .collect()
}

/// Lower-cased `%q%` with the LIKE wildcards escaped by a backslash
fn search_pattern(q: &str) -> String {
    let escaped = q
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn contains_ignore_case(column: Expr, q: &str) -> SimpleExpr {
    Expr::expr(Func::lower(column)).like(LikeExpr::new(search_pattern(q)).escape('\\'))
}

async fn insert_items(
    txn: &DatabaseTransaction,
    entry_id: Uuid,
    items: &[ItemDraft],
) -> Result<Vec<paper_item::Model>, ServiceError> {
    let mut stored = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let model = paper_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            entry_id: Set(entry_id),
            position: Set(position as i32),
            description: Set(item.description.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            // derived on save
            amount: Set(Decimal::ZERO),
        };
        stored.push(model.insert(txn).await?);
    }
    Ok(stored)
}

/// Recomputes the totals from `items` and writes them onto the entry
async fn store_totals<C>(
    db: &C,
    entry: paper_entry::Model,
    items: &[paper_item::Model],
) -> Result<paper_entry::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let totals = DocumentTotals::compute(items.iter().map(|i| i.amount), entry.tax_percentage);
    let mut model = entry.into_active_model();
    model.subtotal = Set(totals.subtotal);
    model.tax_amount = Set(totals.tax_amount);
    model.total = Set(totals.total);
    Ok(model.update(db).await?)
}

/// Quotations, invoices and delivery notes
#[derive(Clone)]
pub struct PaperService {
    db_pool: Arc<DbPool>,
    renderer: Arc<TemplateRenderer>,
    pdf_engine: Arc<dyn PdfEngine>,
    display_offset: u32,
    numbering_retry: RetryConfig,
}

impl PaperService {
    pub fn new(
        db_pool: Arc<DbPool>,
        renderer: Arc<TemplateRenderer>,
        pdf_engine: Arc<dyn PdfEngine>,
        display_offset: u32,
        numbering_max_attempts: u32,
    ) -> Self {
        Self {
            db_pool,
            renderer,
            pdf_engine,
            display_offset,
            numbering_retry: RetryConfig::for_write_conflicts(numbering_max_attempts),
        }
    }

    pub fn display_number(&self, entry: &paper_entry::Model) -> String {
        display_number(&entry.paper_number, self.display_offset)
    }

    /// Creates a document with its items. The number is allocated inside the
    /// same transaction; if another writer wins the counter, the whole
    /// transaction is replayed.
    #[instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create(&self, request: CreatePaperRequest) -> Result<PaperDetail, ServiceError> {
        request.validate()?;

        let client = match (request.client_id, request.client) {
            (Some(client_id), _) => ClientChoice::Existing(client_id),
            (None, Some(new_client)) => {
                new_client.validate()?;
                ClientChoice::New(new_client)
            }
            (None, None) => {
                return Err(ServiceError::BadRequest(
                    "Either client_id or client is required".into(),
                ))
            }
        };

        let draft = PaperDraft {
            company_id: request.company_id,
            client,
            date: request.date.unwrap_or_else(|| Utc::now().date_naive()),
            tax_percentage: parse_tax(request.tax_percentage.as_ref())?,
            prepared_by: super::blank_to_none(request.prepared_by),
            delivered_by: super::blank_to_none(request.delivered_by),
            received_by: super::blank_to_none(request.received_by),
            items: prepare_items(&request.items)?,
        };

        let draft = &draft;
        let detail = with_retry(&self.numbering_retry, ConflictRetryPolicy, move || {
            self.create_once(draft)
        })
        .await
        .map_err(|e| {
            if e.is_retryable() {
                counter!("bizdesk.papers.numbering_conflicts", 1);
            }
            e
        })?;

        counter!("bizdesk.papers.created", 1);
        info!(
            paper_id = %detail.entry.id,
            paper_number = %detail.entry.paper_number,
            "Document created"
        );
        Ok(detail)
    }

    /// One attempt at the creating transaction. Any database failure inside
    /// it, not only the numbering insert, may be a lost write race (SQLite
    /// reports a busy lock on whichever statement first needs to write), so
    /// all of them go through the conflict classification.
    async fn create_once(&self, draft: &PaperDraft) -> Result<PaperDetail, ServiceError> {
        self.create_in_transaction(draft)
            .await
            .map_err(|e| match e {
                ServiceError::DatabaseError(db_err) => {
                    warn!(error = %db_err, "Document creation lost a write race");
                    ServiceError::from_write_conflict(db_err, "creating document")
                }
                other => other,
            })
    }

    async fn create_in_transaction(&self, draft: &PaperDraft) -> Result<PaperDetail, ServiceError> {
        let db = &*self.db_pool;
        let start = Instant::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for document creation");
            ServiceError::from_write_conflict(e, "starting document transaction")
        })?;

        let company = CompanyEntity::find_by_id(draft.company_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Company not found".into()))?;

        let client = match &draft.client {
            ClientChoice::Existing(client_id) => ClientEntity::find_by_id(*client_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::BadRequest("Client not found".into()))?,
            ClientChoice::New(request) => insert_client(&txn, request.clone()).await?,
        };

        let entry = paper_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company.id),
            client_id: Set(client.id),
            date: Set(draft.date),
            tax_percentage: Set(draft.tax_percentage),
            subtotal: Set(Decimal::ZERO),
            tax_amount: Set(Decimal::ZERO),
            total: Set(Decimal::ZERO),
            prepared_by: Set(draft.prepared_by.clone()),
            delivered_by: Set(draft.delivered_by.clone()),
            received_by: Set(draft.received_by.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            warn!(error = %e, company_id = %company.id, "Document number allocation failed");
            ServiceError::from_write_conflict(e, "allocating document number")
        })?;

        let items = insert_items(&txn, entry.id, &draft.items).await?;
        let entry = store_totals(&txn, entry, &items).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, paper_id = %entry.id, "Failed to commit document creation");
            ServiceError::from_write_conflict(e, "committing document")
        })?;

        histogram!("bizdesk.papers.create_duration", start.elapsed());
        Ok(PaperDetail {
            display_number: self.display_number(&entry),
            entry,
            company,
            client,
            items,
        })
    }

    /// Newest first, optionally narrowed by company, client and free text
    /// over the number, the client name and the company name.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: PaperListFilter) -> Result<PaperPage, ServiceError> {
        let db = &*self.db_pool;

        let mut query = PaperEntryEntity::find()
            .join(JoinType::InnerJoin, paper_entry::Relation::Company.def())
            .join(JoinType::InnerJoin, paper_entry::Relation::Client.def());

        if let Some(company_id) = filter.company_id {
            query = query.filter(paper_entry::Column::CompanyId.eq(company_id));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(paper_entry::Column::ClientId.eq(client_id));
        }
        if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ignore_case(
                        Expr::col((PaperEntryEntity, paper_entry::Column::PaperNumber)),
                        q,
                    ))
                    .add(contains_ignore_case(
                        Expr::col((ClientEntity, client::Column::Name)),
                        q,
                    ))
                    .add(contains_ignore_case(
                        Expr::col((CompanyEntity, company::Column::Name)),
                        q,
                    )),
            );
        }

        let per_page = filter.per_page.max(1);
        let paginator = query
            .order_by_desc(paper_entry::Column::CreatedAt)
            .order_by_desc(paper_entry::Column::PaperNumber)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let entries = paginator.fetch_page(filter.page.saturating_sub(1)).await?;

        let company_ids: Vec<Uuid> = entries.iter().map(|e| e.company_id).collect();
        let client_ids: Vec<Uuid> = entries.iter().map(|e| e.client_id).collect();
        let companies: HashMap<Uuid, String> = CompanyEntity::find()
            .filter(company::Column::Id.is_in(company_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let clients: HashMap<Uuid, String> = ClientEntity::find()
            .filter(client::Column::Id.is_in(client_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let rows = entries
            .into_iter()
            .map(|entry| PaperRow {
                company_name: companies.get(&entry.company_id).cloned().unwrap_or_default(),
                client_name: clients.get(&entry.client_id).cloned().unwrap_or_default(),
                display_number: self.display_number(&entry),
                entry,
            })
            .collect();

        Ok(PaperPage { rows, total })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, paper_id: Uuid) -> Result<PaperDetail, ServiceError> {
        self.load(&*self.db_pool, paper_id).await
    }

    async fn load<C>(&self, db: &C, paper_id: Uuid) -> Result<PaperDetail, ServiceError>
    where
        C: ConnectionTrait,
    {
        let entry = PaperEntryEntity::find_by_id(paper_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Paper {} not found", paper_id)))?;
        let company = CompanyEntity::find_by_id(entry.company_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", entry.company_id)))?;
        let client = ClientEntity::find_by_id(entry.client_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Client {} not found", entry.client_id)))?;
        let items = PaperItemEntity::find()
            .filter(paper_item::Column::EntryId.eq(entry.id))
            .order_by_asc(paper_item::Column::Position)
            .all(db)
            .await?;

        Ok(PaperDetail {
            display_number: self.display_number(&entry),
            entry,
            company,
            client,
            items,
        })
    }

    /// Updates header fields; a tax change re-derives the totals in the same
    /// transaction.
    #[instrument(skip(self, request), fields(paper_id = %paper_id))]
    pub async fn update(
        &self,
        paper_id: Uuid,
        request: UpdatePaperRequest,
    ) -> Result<PaperDetail, ServiceError> {
        request.validate()?;
        let tax = match request.tax_percentage.as_ref() {
            Some(raw) => Some(parse_tax(Some(raw))?),
            None => None,
        };

        let txn = self.db_pool.begin().await?;
        let entry = PaperEntryEntity::find_by_id(paper_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Paper {} not found", paper_id)))?;

        if let Some(client_id) = request.client_id {
            if ClientEntity::find_by_id(client_id).one(&txn).await?.is_none() {
                return Err(ServiceError::BadRequest("Client not found".into()));
            }
        }

        let tax_percentage = tax.unwrap_or(entry.tax_percentage);
        let mut model = entry.into_active_model();
        model.tax_percentage = Set(tax_percentage);
        if let Some(client_id) = request.client_id {
            model.client_id = Set(client_id);
        }
        if let Some(date) = request.date {
            model.date = Set(date);
        }
        if request.prepared_by.is_some() {
            model.prepared_by = Set(super::blank_to_none(request.prepared_by));
        }
        if request.delivered_by.is_some() {
            model.delivered_by = Set(super::blank_to_none(request.delivered_by));
        }
        if request.received_by.is_some() {
            model.received_by = Set(super::blank_to_none(request.received_by));
        }
        let entry = model.update(&txn).await?;

        let items = PaperItemEntity::find()
            .filter(paper_item::Column::EntryId.eq(entry.id))
            .all(&txn)
            .await?;
        store_totals(&txn, entry, &items).await?;

        let detail = self.load(&txn, paper_id).await?;
        txn.commit().await?;
        info!(paper_id = %paper_id, "Document updated");
        Ok(detail)
    }

    /// Swaps the whole item set and re-derives the totals atomically
    #[instrument(skip(self, request), fields(paper_id = %paper_id, items = request.items.len()))]
    pub async fn replace_items(
        &self,
        paper_id: Uuid,
        request: ReplaceItemsRequest,
    ) -> Result<PaperDetail, ServiceError> {
        let drafts = prepare_items(&request.items)?;

        let txn = self.db_pool.begin().await?;
        let entry = PaperEntryEntity::find_by_id(paper_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Paper {} not found", paper_id)))?;

        PaperItemEntity::delete_many()
            .filter(paper_item::Column::EntryId.eq(entry.id))
            .exec(&txn)
            .await?;
        let items = insert_items(&txn, entry.id, &drafts).await?;
        store_totals(&txn, entry, &items).await?;

        let detail = self.load(&txn, paper_id).await?;
        txn.commit().await?;
        info!(paper_id = %paper_id, "Document items replaced");
        Ok(detail)
    }

    /// Deletes the document; its items go with it
    #[instrument(skip(self))]
    pub async fn delete(&self, paper_id: Uuid) -> Result<(), ServiceError> {
        let result = PaperEntryEntity::delete_by_id(paper_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Paper {} not found", paper_id)));
        }
        info!(paper_id = %paper_id, "Document deleted");
        Ok(())
    }

    /// HTML preview showing the display number
    #[instrument(skip(self))]
    pub async fn preview(&self, paper_id: Uuid, paper_type: &str) -> Result<String, ServiceError> {
        let paper_type = PaperType::parse(paper_type)?;
        let detail = self.get(paper_id).await?;
        self.render_html(&detail, paper_type, false)
    }

    /// PDF export named `{paper_type}_{SLUG}_{display}.pdf`
    #[instrument(skip(self))]
    pub async fn pdf(&self, paper_id: Uuid, paper_type: &str) -> Result<PaperPdf, ServiceError> {
        let paper_type = PaperType::parse(paper_type)?;
        let detail = self.get(paper_id).await?;
        let html = self.render_html(&detail, paper_type, true)?;
        let bytes = self.pdf_engine.html_to_pdf(&html).await?;

        Ok(PaperPdf {
            filename: pdf_filename(
                paper_type.as_ref(),
                &detail.company.slug,
                &detail.display_number,
            ),
            bytes,
        })
    }

    fn render_html(
        &self,
        detail: &PaperDetail,
        paper_type: PaperType,
        is_pdf: bool,
    ) -> Result<String, ServiceError> {
        self.renderer.render_document(&DocumentRender {
            company: &detail.company,
            client: &detail.client,
            entry: &detail.entry,
            items: &detail.items,
            display_number: &detail.display_number,
            paper_type,
            is_pdf,
        })
    }
}
