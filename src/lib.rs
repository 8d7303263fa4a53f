//! # Monthly Report Builder
//!
//! A library for turning heterogeneous spreadsheet rows into a reconciled
//! monthly report comparing proposal and invoice values per month, per
//! category, and per counterparty, with contract-based projections filling
//! the months that have no real data yet.
//!
//! ## Core Concepts
//!
//! - **Column inference**: sheets arrive without a schema; roles (date,
//!   proposal value, invoice value, category, counterparty) are resolved
//!   from header text and cell content, with manual overrides on top
//! - **Locale-aware parsing**: pt-BR and en numeric formats and month names
//!   in the same batch; unreadable amounts recover to 0.0, unreadable dates
//!   exclude the row
//! - **Two reconciled views**: a flat month summary and a
//!   month → category → counterparty → record drill-down, built in one pass
//! - **Projection**: months with no real totals are backfilled from active
//!   contract terms and flagged `is_projection`
//!
//! ## Example
//!
//! ```rust,ignore
//! use monthly_report_builder::*;
//!
//! let mut batch = RowBatch::new(vec![
//!     "Empresa".into(), "Tipo".into(), "Data".into(),
//!     "Valor Proposta".into(), "Valor do Boleto (R$)".into(),
//! ]);
//! batch.push_row(vec![
//!     "Acme".into(), "Setup".into(), "10/06/2025".into(),
//!     "1.000,00".into(), "900,00".into(),
//! ]);
//!
//! let report = build_monthly_report(&batch, &[], &ReportOptions::default())?;
//! let june = MonthKey::parse("2025-06").unwrap();
//! println!("{:?}", report.summary.months.get(&june));
//! println!("{}", report.audit_month(&june).is_clean(0.01));
//! ```

pub mod aggregate;
pub mod columns;
pub mod dates;
pub mod error;
pub mod projection;
pub mod reconcile;
pub mod schema;
pub mod source;
pub mod utils;
pub mod value;

pub use aggregate::{
    aggregate_rows, display_counterparty, zero_out_months, CategoryBucket, CounterpartyBucket,
    HierarchicalReport, MonthBucket, MonthlyBucket, MonthlySummary, ProposalRecord,
};
pub use columns::{resolve_columns, ColumnRole, ColumnRoleMap};
pub use dates::{month_key_from_text, parse_contract_date, upcoming_months, MonthKey};
pub use error::{ReportError, Result};
pub use projection::{apply_projections, month_eligible, ProjectionRecord};
pub use reconcile::{audit_month, FindingKind, MonthAudit, RecordFinding};
pub use schema::{ColumnOverrides, Contract, ReportOptions, RowBatch};
pub use source::{ContractSource, RowSource, StaticSource};
pub use value::parse_amount;

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything one build produces: both views plus the column choices that
/// drove the extraction, kept so the caller can display or override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub summary: MonthlySummary,
    pub breakdown: HierarchicalReport,
    pub roles: ColumnRoleMap,
}

impl MonthlyReport {
    /// Audits one month's flat totals against the hierarchy leaves.
    pub fn audit_month(&self, month: &MonthKey) -> MonthAudit {
        audit_month(&self.summary, &self.breakdown, month)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct ReportBuilder;

impl ReportBuilder {
    /// Runs the full pipeline: resolve roles once, aggregate every row into
    /// both views, apply configured zero-patches, then backfill projection
    /// targets from contracts. Pure function of its inputs — identical
    /// inputs produce identical reports.
    pub fn build(
        batch: &RowBatch,
        contracts: &[Contract],
        options: &ReportOptions,
    ) -> Result<MonthlyReport> {
        if batch.is_empty() {
            return Err(ReportError::NoData);
        }

        info!("Building monthly report from {} rows", batch.len());

        let roles = resolve_columns(batch, &options.overrides)?;
        let (mut summary, mut breakdown) = aggregate_rows(batch, &roles);
        debug!(
            "aggregated {} months, {} records",
            summary.months_processed,
            summary.months.values().map(|b| b.record_count).sum::<usize>()
        );

        zero_out_months(&mut summary, &mut breakdown, &options.zeroed_months);
        apply_projections(&mut summary, contracts, &options.projection_months);

        Ok(MonthlyReport {
            summary,
            breakdown,
            roles,
        })
    }
}

pub fn build_monthly_report(
    batch: &RowBatch,
    contracts: &[Contract],
    options: &ReportOptions,
) -> Result<MonthlyReport> {
    ReportBuilder::build(batch, contracts, options)
}
