use crate::{
    domain::{totals::DocumentTotals, words::amount_in_words},
    entities::{client, company, paper_entry, paper_item},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::{collections::HashMap, str::FromStr};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tera::{Context, Tera, Value};
use tracing::{debug, info};

/// Kinds of printable document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PaperType {
    Quotation,
    Invoice,
    DeliveryNote,
}

impl PaperType {
    /// Unknown kinds read as a missing page
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        PaperType::from_str(raw)
            .map_err(|_| ServiceError::NotFound(format!("Paper type '{}' not found", raw)))
    }

    pub fn title(&self) -> &'static str {
        match self {
            PaperType::Quotation => "Quotation",
            PaperType::Invoice => "Invoice",
            PaperType::DeliveryNote => "Delivery Note",
        }
    }
}

/// Everything a document template can show
pub struct DocumentRender<'a> {
    pub company: &'a company::Model,
    pub client: &'a client::Model,
    pub entry: &'a paper_entry::Model,
    pub items: &'a [paper_item::Model],
    /// Offset sequence shown in place of the stored identifier
    pub display_number: &'a str,
    pub paper_type: PaperType,
    pub is_pdf: bool,
}

#[derive(Serialize)]
struct TotalsView {
    subtotal: Decimal,
    tax_amount: Decimal,
    total: Decimal,
}

impl From<DocumentTotals> for TotalsView {
    fn from(t: DocumentTotals) -> Self {
        Self {
            subtotal: t.subtotal,
            tax_amount: t.tax_amount,
            total: t.total,
        }
    }
}

/// Renders documents from `{template_dir}/papers/{slug}/{paper_type}.html`,
/// falling back to `papers/default/{paper_type}.html`.
pub struct TemplateRenderer {
    tera: Tera,
    currency_major: String,
    currency_minor: String,
}

impl TemplateRenderer {
    pub fn from_dir(
        template_dir: &str,
        currency_major: &str,
        currency_minor: &str,
    ) -> Result<Self, ServiceError> {
        let pattern = format!("{}/**/*.html", template_dir.trim_end_matches('/'));
        let tera = Tera::new(&pattern)?;
        info!(
            template_dir,
            templates = tera.get_template_names().count(),
            "Document templates loaded"
        );
        Ok(Self::with_tera(tera, currency_major, currency_minor))
    }

    /// Wraps an already populated tera instance and registers the filters
    pub fn with_tera(mut tera: Tera, currency_major: &str, currency_minor: &str) -> Self {
        let major = currency_major.to_string();
        let minor = currency_minor.to_string();
        tera.register_filter(
            "amount_in_words",
            move |value: &Value, _args: &HashMap<String, Value>| -> tera::Result<Value> {
                let amount = decimal_from_value(value)?;
                Ok(Value::String(amount_in_words(amount, &major, &minor)))
            },
        );
        tera.register_filter("money", money_filter);

        Self {
            tera,
            currency_major: currency_major.to_string(),
            currency_minor: currency_minor.to_string(),
        }
    }

    /// Template name used for a company and paper type
    pub fn resolve(&self, slug: &str, paper_type: PaperType) -> Result<String, ServiceError> {
        let own = format!("papers/{}/{}.html", slug, paper_type);
        let fallback = format!("papers/default/{}.html", paper_type);

        let known: Vec<&str> = self.tera.get_template_names().collect();
        if known.contains(&own.as_str()) {
            Ok(own)
        } else if known.contains(&fallback.as_str()) {
            debug!(slug, %paper_type, "Using default template");
            Ok(fallback)
        } else {
            Err(ServiceError::NotFound(format!(
                "No template for paper type '{}'",
                paper_type
            )))
        }
    }

    pub fn render_document(&self, doc: &DocumentRender<'_>) -> Result<String, ServiceError> {
        let template = self.resolve(&doc.company.slug, doc.paper_type)?;

        let totals = DocumentTotals::compute(
            doc.items.iter().map(|i| i.amount),
            doc.entry.tax_percentage,
        );

        let mut context = Context::new();
        context.insert("company", doc.company);
        context.insert("client", doc.client);
        context.insert("entry", doc.entry);
        context.insert("items", doc.items);
        context.insert("totals", &TotalsView::from(totals));
        context.insert("display_number", doc.display_number);
        context.insert("paper_type", doc.paper_type.as_ref());
        context.insert("paper_title", doc.paper_type.title());
        context.insert(
            "amount_words",
            &amount_in_words(totals.total, &self.currency_major, &self.currency_minor),
        );
        context.insert("is_pdf", &doc.is_pdf);

        Ok(self.tera.render(&template, &context)?)
    }
}

fn decimal_from_value(value: &Value) -> tera::Result<Decimal> {
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    parsed.ok_or_else(|| tera::Error::msg(format!("not an amount: {}", value)))
}

/// `1234567.5` -> `1,234,567.50`
fn money_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = decimal_from_value(value)?.round_dp(2);
    let text = format!("{:.2}", amount.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    Ok(Value::String(format!("{}{}.{}", sign, grouped, cents)))
}
