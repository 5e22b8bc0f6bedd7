//! Dashboard and report figures computed over rows already fetched and
//! filtered by the database. Empty inputs always give zeros.

use super::tender::{expense_overrun, PaymentStatus};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Case-insensitive substring match of `query` against any of `fields`.
/// A blank query matches everything.
pub fn text_matches(query: &str, fields: &[&str]) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Sum of amounts per status key
pub fn sum_by_status<'a, I>(rows: I) -> BTreeMap<String, Decimal>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    let mut totals = BTreeMap::new();
    for (status, amount) in rows {
        *totals.entry(status.to_string()).or_insert(Decimal::ZERO) += amount;
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyTotal {
    pub company: String,
    pub total: Decimal,
}

/// Per-company sums of the rows whose status is `WON`, largest first
pub fn won_totals_by_company<'a, I>(rows: I) -> Vec<CompanyTotal>
where
    I: IntoIterator<Item = (&'a str, &'a str, Decimal)>,
{
    let mut by_company: BTreeMap<&str, Decimal> = BTreeMap::new();
    for (company, status, amount) in rows {
        if status == "WON" {
            *by_company.entry(company).or_insert(Decimal::ZERO) += amount;
        }
    }

    let mut totals: Vec<CompanyTotal> = by_company
        .into_iter()
        .map(|(company, total)| CompanyTotal {
            company: company.to_string(),
            total,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.company.cmp(&b.company)));
    totals
}

/// Sorted, de-duplicated company names
pub fn distinct_companies<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(Into::into)
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// De-duplicated years, newest first
pub fn distinct_years<I>(years: I) -> Vec<i32>
where
    I: IntoIterator<Item = i32>,
{
    years
        .into_iter()
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .rev()
        .collect()
}

/// Money figures of one tender, as needed by the company reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderFigures {
    pub company_id: Uuid,
    pub total_value: Decimal,
    pub total_expenses: Decimal,
    pub total_paid: Decimal,
    /// The status persisted on the row, if it is a known value
    pub stored_status: Option<PaymentStatus>,
}

/// Parallel arrays for charting, one slot per company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyDashboard {
    pub labels: Vec<String>,
    pub values: Vec<Decimal>,
    pub paids: Vec<Decimal>,
    pub expenses: Vec<Decimal>,
    pub profits: Vec<Decimal>,
    pub overruns: Vec<Decimal>,
}

/// Builds the by-company dashboard. Companies are ordered by name and
/// companies without tenders still get a slot of zeros. The overrun of a
/// company is the sum of its tenders' overruns, not the overrun of its sums.
pub fn company_dashboard(companies: &[(Uuid, String)], tenders: &[TenderFigures]) -> CompanyDashboard {
    let mut ordered: Vec<&(Uuid, String)> = companies.iter().collect();
    ordered.sort_by(|a, b| a.1.cmp(&b.1));

    let mut dashboard = CompanyDashboard::default();
    for (company_id, name) in ordered {
        let mut value = Decimal::ZERO;
        let mut paid = Decimal::ZERO;
        let mut spent = Decimal::ZERO;
        let mut overrun = Decimal::ZERO;

        for tender in tenders.iter().filter(|t| t.company_id == *company_id) {
            value += tender.total_value;
            paid += tender.total_paid;
            spent += tender.total_expenses;
            overrun += expense_overrun(tender.total_value, tender.total_expenses);
        }

        dashboard.labels.push(name.clone());
        dashboard.values.push(value);
        dashboard.paids.push(paid);
        dashboard.expenses.push(spent);
        dashboard.profits.push(value - spent);
        dashboard.overruns.push(overrun);
    }
    dashboard
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub partially_paid: u64,
    pub paid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenderSummary {
    pub total_tenders: u64,
    pub total_companies: u64,
    pub total_expenses: Decimal,
    pub total_tender_value: Decimal,
    pub total_paid: Decimal,
    pub total_profit: Decimal,
    pub status_counts: StatusCounts,
}

/// Portfolio totals. Status counts use the persisted status of each tender.
pub fn tender_summary(total_companies: u64, tenders: &[TenderFigures]) -> TenderSummary {
    let mut summary = TenderSummary {
        total_tenders: tenders.len() as u64,
        total_companies,
        ..Default::default()
    };

    for tender in tenders {
        summary.total_tender_value += tender.total_value;
        summary.total_expenses += tender.total_expenses;
        summary.total_paid += tender.total_paid;
        match tender.stored_status {
            Some(PaymentStatus::Pending) => summary.status_counts.pending += 1,
            Some(PaymentStatus::PartiallyPaid) => summary.status_counts.partially_paid += 1,
            Some(PaymentStatus::Paid) => summary.status_counts.paid += 1,
            None => {}
        }
    }
    summary.total_profit = summary.total_tender_value - summary.total_expenses;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn text_search_is_case_insensitive_or() {
        assert!(text_matches("acme", &["T-001", "Ministry", "ACME Ltd"]));
        assert!(text_matches("t-00", &["T-001", "x", "y"]));
        assert!(!text_matches("zzz", &["T-001", "Ministry", "ACME Ltd"]));
        assert!(text_matches("   ", &["anything"]));
    }

    #[test]
    fn status_sums_default_to_missing_keys_not_nulls() {
        let totals = sum_by_status(vec![("WON", dec!(100)), ("LOST", dec!(40)), ("WON", dec!(5))]);
        assert_eq!(totals.get("WON"), Some(&dec!(105)));
        assert_eq!(totals.get("LOST"), Some(&dec!(40)));
        assert_eq!(totals.get("PENDING").copied().unwrap_or_default(), Decimal::ZERO);
    }

    #[test]
    fn won_totals_are_sorted_by_amount_then_name() {
        let rows = vec![
            ("Beta", "WON", dec!(300)),
            ("Alpha", "WON", dec!(300)),
            ("Gamma", "WON", dec!(900)),
            ("Gamma", "LOST", dec!(5000)),
            ("Delta", "PENDING", dec!(10)),
        ];
        let totals = won_totals_by_company(rows);
        let names: Vec<&str> = totals.iter().map(|t| t.company.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);
        assert_eq!(totals[0].total, dec!(900));
    }

    #[test]
    fn distinct_lists() {
        assert_eq!(
            distinct_companies(vec!["b", "a", "b"]),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(distinct_years(vec![2023, 2025, 2023, 2024]), vec![2025, 2024, 2023]);
    }

    #[test]
    fn dashboard_arrays_line_up_and_include_idle_companies() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let companies = vec![(b, "Zulu".to_string()), (a, "Alpha".to_string())];
        let tenders = vec![
            TenderFigures {
                company_id: a,
                total_value: dec!(1000),
                total_expenses: dec!(1500),
                total_paid: dec!(200),
                stored_status: Some(PaymentStatus::PartiallyPaid),
            },
            TenderFigures {
                company_id: a,
                total_value: dec!(2000),
                total_expenses: dec!(100),
                total_paid: dec!(0),
                stored_status: Some(PaymentStatus::Pending),
            },
        ];

        let d = company_dashboard(&companies, &tenders);
        assert_eq!(d.labels, vec!["Alpha", "Zulu"]);
        assert_eq!(d.values, vec![dec!(3000), dec!(0)]);
        assert_eq!(d.paids, vec![dec!(200), dec!(0)]);
        assert_eq!(d.expenses, vec![dec!(1600), dec!(0)]);
        assert_eq!(d.profits, vec![dec!(1400), dec!(0)]);
        // only the first tender overran; the company as a whole did not
        assert_eq!(d.overruns, vec![dec!(500), dec!(0)]);
    }

    #[test]
    fn summary_over_nothing_is_all_zero() {
        let s = tender_summary(0, &[]);
        assert_eq!(s, TenderSummary::default());
    }

    #[test]
    fn summary_counts_stored_statuses() {
        let c = Uuid::new_v4();
        let figures = |value, spent, paid, status| TenderFigures {
            company_id: c,
            total_value: value,
            total_expenses: spent,
            total_paid: paid,
            stored_status: status,
        };
        let s = tender_summary(
            1,
            &[
                figures(dec!(100), dec!(10), dec!(100), Some(PaymentStatus::Paid)),
                figures(dec!(50), dec!(60), dec!(0), Some(PaymentStatus::Pending)),
                figures(dec!(10), dec!(0), dec!(0), None),
            ],
        );
        assert_eq!(s.total_tenders, 3);
        assert_eq!(s.total_tender_value, dec!(160));
        assert_eq!(s.total_expenses, dec!(70));
        assert_eq!(s.total_paid, dec!(100));
        assert_eq!(s.total_profit, dec!(90));
        assert_eq!(
            s.status_counts,
            StatusCounts { pending: 1, partially_paid: 0, paid: 1 }
        );
    }
}
