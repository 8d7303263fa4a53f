//! Single-pass monthly aggregation into the flat and hierarchical views.
//!
//! Both views are updated from the same extracted record, so they can only
//! drift if a caller mutates one afterwards; the reconciler exists to catch
//! exactly that.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::columns::ColumnRoleMap;
use crate::dates::{month_key_from_text, MonthKey};
use crate::projection::ProjectionRecord;
use crate::schema::RowBatch;
use crate::utils::normalize_text;
use crate::value::parse_amount;

/// Category assigned when the cell is empty or the column is missing.
pub const FALLBACK_CATEGORY: &str = "Outros";

/// Maps free-form category text onto the canonical labels. Unknown text
/// passes through untouched.
fn canonical_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FALLBACK_CATEGORY.to_string();
    }
    match normalize_text(trimmed).as_str() {
        "setup" | "set up" | "set-up" | "configuracao" | "config" => "Setup".to_string(),
        "mensalidade" | "mensal" | "monthly" => "Mensalidade".to_string(),
        _ => trimmed.to_string(),
    }
}

/// One row's extracted fields, kept at the hierarchy leaves and inside the
/// flat buckets. The raw date cell and source row index travel along for
/// display and auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub counterparty: String,
    pub category: String,
    pub month: MonthKey,
    pub raw_date: String,
    pub proposal_value: f64,
    pub invoice_value: f64,
    pub difference: f64,
    pub difference_percent: f64,
    pub row_index: usize,
}

/// Flat per-month totals. Real buckets carry `entries`; projected buckets
/// carry `projections` and nothing else — a bucket is never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub proposal_total: f64,
    pub invoice_total: f64,
    pub difference_total: f64,
    pub difference_percent_avg: f64,
    pub record_count: usize,
    pub is_projection: bool,
    pub entries: Vec<ProposalRecord>,
    pub projections: Vec<ProjectionRecord>,
}

/// The flat view plus grand totals across all months.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub months: BTreeMap<MonthKey, MonthlyBucket>,
    pub grand_proposal_total: f64,
    pub grand_invoice_total: f64,
    pub grand_difference_total: f64,
    pub months_processed: usize,
}

impl MonthlySummary {
    /// Re-derives the grand totals from the month buckets. Called after
    /// aggregation and again whenever buckets are merged or patched.
    pub fn recompute_totals(&mut self) {
        self.grand_proposal_total = self.months.values().map(|b| b.proposal_total).sum();
        self.grand_invoice_total = self.months.values().map(|b| b.invoice_total).sum();
        self.grand_difference_total = self.months.values().map(|b| b.difference_total).sum();
        self.months_processed = self.months.len();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyBucket {
    pub proposal_total: f64,
    pub invoice_total: f64,
    pub difference_total: f64,
    pub record_count: usize,
    pub records: Vec<ProposalRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub proposal_total: f64,
    pub invoice_total: f64,
    pub difference_total: f64,
    pub record_count: usize,
    pub counterparties: BTreeMap<String, CounterpartyBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub proposal_total: f64,
    pub invoice_total: f64,
    pub difference_total: f64,
    pub record_count: usize,
    pub categories: BTreeMap<String, CategoryBucket>,
}

/// The month → category → counterparty → record drill-down view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalReport {
    pub months: BTreeMap<MonthKey, MonthBucket>,
}

/// Counterparty names stay empty in the data when the sheet left them
/// blank; presentation layers label them with this helper.
pub fn display_counterparty(name: &str) -> &str {
    if name.is_empty() {
        "not informed"
    } else {
        name
    }
}

impl MonthBucket {
    /// Pushes one record through all three nesting levels, keeping every
    /// level's totals equal to the sum of its children.
    fn absorb(&mut self, record: ProposalRecord) {
        self.proposal_total += record.proposal_value;
        self.invoice_total += record.invoice_value;
        self.difference_total += record.difference;
        self.record_count += 1;

        let category = self.categories.entry(record.category.clone()).or_default();
        category.proposal_total += record.proposal_value;
        category.invoice_total += record.invoice_value;
        category.difference_total += record.difference;
        category.record_count += 1;

        let counterparty = category
            .counterparties
            .entry(record.counterparty.clone())
            .or_default();
        counterparty.proposal_total += record.proposal_value;
        counterparty.invoice_total += record.invoice_value;
        counterparty.difference_total += record.difference;
        counterparty.record_count += 1;
        counterparty.records.push(record);
    }
}

/// Consumes the batch once and builds both views. Rows without a readable
/// date are excluded; absent value cells read as 0.0 and never exclude a
/// row.
pub fn aggregate_rows(
    batch: &RowBatch,
    roles: &ColumnRoleMap,
) -> (MonthlySummary, HierarchicalReport) {
    let mut summary = MonthlySummary::default();
    let mut breakdown = HierarchicalReport::default();

    for row in 0..batch.len() {
        let raw_date = batch.cell(row, &roles.date);
        let Some(month) = month_key_from_text(raw_date) else {
            debug!("row {} excluded: unreadable date cell {:?}", row, raw_date);
            continue;
        };

        let proposal_value = parse_amount(batch.cell(row, &roles.proposal_value));
        let invoice_value = parse_amount(batch.cell(row, &roles.invoice_value));
        let difference = invoice_value - proposal_value;
        let difference_percent = if proposal_value != 0.0 {
            difference / proposal_value * 100.0
        } else {
            0.0
        };

        let category = canonical_category(
            roles
                .category
                .as_deref()
                .map(|header| batch.cell(row, header))
                .unwrap_or(""),
        );
        let counterparty = roles
            .counterparty
            .as_deref()
            .map(|header| batch.cell(row, header))
            .unwrap_or("")
            .trim()
            .to_string();

        let record = ProposalRecord {
            counterparty,
            category,
            month: month.clone(),
            raw_date: raw_date.to_string(),
            proposal_value,
            invoice_value,
            difference,
            difference_percent,
            row_index: row,
        };

        let bucket = summary.months.entry(month.clone()).or_default();
        bucket.proposal_total += proposal_value;
        bucket.invoice_total += invoice_value;
        bucket.difference_total += difference;
        bucket.record_count += 1;
        bucket.entries.push(record.clone());

        breakdown.months.entry(month).or_default().absorb(record);
    }

    for bucket in summary.months.values_mut() {
        bucket.difference_percent_avg = if bucket.proposal_total != 0.0 {
            bucket.difference_total / bucket.proposal_total * 100.0
        } else {
            0.0
        };
    }
    summary.recompute_totals();

    (summary, breakdown)
}

/// Resets the named months to zero totals, dropping their entries and their
/// hierarchical drill-down. Sheet-specific data patching driven by
/// `ReportOptions::zeroed_months`; a zeroed month renders as zero and
/// becomes eligible for contract projection.
pub fn zero_out_months(
    summary: &mut MonthlySummary,
    breakdown: &mut HierarchicalReport,
    months: &[MonthKey],
) {
    for month in months {
        if let Some(bucket) = summary.months.get_mut(month) {
            debug!("zero-patching month {}", month);
            *bucket = MonthlyBucket::default();
        }
        breakdown.months.remove(month);
    }
    summary.recompute_totals();
}
