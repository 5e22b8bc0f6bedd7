use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BizDesk API",
        version = "1.0.0",
        description = r#"
# BizDesk API

Back office for a small trading business.

- **Papers**: numbered quotations, invoices and delivery notes with line items,
  computed totals, HTML preview and PDF export
- **Projections**: won, lost and pending deals with dashboard totals
- **Tenders**: contracts with expenses and payments, profit and collection tracking

## Money

Amounts are exact decimals internally. Responses carry them as JSON numbers;
requests accept a JSON number or a numeric string with at most two decimals.

## Numbering

Documents are numbered `{SLUG}/{YEAR}/{NNNN}` per company and year, once, at
creation. The `display_number` shown on rendered documents is the stored
sequence plus the configured offset.

## Errors

```json
{
  "error": "Bad Request",
  "message": "Invalid amount for field 'amount'",
  "request_id": "5f1c...",
  "timestamp": "2025-01-01T00:00:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    tags(
        (name = "companies", description = "Issuing companies"),
        (name = "clients", description = "Document recipients"),
        (name = "papers", description = "Quotations, invoices and delivery notes"),
        (name = "projections", description = "Sales projections"),
        (name = "tenders", description = "Tender contracts and reports"),
        (name = "expenses", description = "Tender expenses"),
        (name = "payments", description = "Tender payments"),
        (name = "health", description = "Health check")
    ),
    paths(
        crate::handlers::health::health_check,

        crate::handlers::companies::list_companies,
        crate::handlers::companies::create_company,
        crate::handlers::companies::get_company,
        crate::handlers::companies::update_company,
        crate::handlers::companies::delete_company,

        crate::handlers::clients::list_clients,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_client,

        crate::handlers::papers::list_papers,
        crate::handlers::papers::create_paper,
        crate::handlers::papers::get_paper,
        crate::handlers::papers::update_paper,
        crate::handlers::papers::replace_paper_items,
        crate::handlers::papers::delete_paper,
        crate::handlers::papers::preview_paper,
        crate::handlers::papers::export_paper_pdf,

        crate::handlers::projections::list_projections,
        crate::handlers::projections::projection_dashboard,
        crate::handlers::projections::create_projection,
        crate::handlers::projections::get_projection,
        crate::handlers::projections::update_projection,
        crate::handlers::projections::archive_projection,

        crate::handlers::tenders::list_tenders,
        crate::handlers::tenders::create_tender,
        crate::handlers::tenders::tender_summary,
        crate::handlers::tenders::tenders_by_company,
        crate::handlers::tenders::get_tender,
        crate::handlers::tenders::update_tender,
        crate::handlers::tenders::delete_tender,
        crate::handlers::tenders::list_tender_payments,

        crate::handlers::expenses::list_expenses,
        crate::handlers::expenses::expense_feed,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,

        crate::handlers::payments::create_payment,
        crate::handlers::payments::update_payment,
        crate::handlers::payments::delete_payment,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::domain::tender::PaymentStatus,
            crate::services::projections::ProjectStatus,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_area() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("BizDesk API"));
        assert!(json.contains("/api/v1/papers/{id}/pdf/{paper_type}"));
        assert!(json.contains("/api/v1/tenders/by-company"));
        assert!(json.contains("/api/v1/projections/{id}/archive"));
    }
}
