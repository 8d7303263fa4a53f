//! Read-only cross-validation of the flat and hierarchical views.
//!
//! The two views are built from the same pass, so their totals must agree;
//! a nonzero delta means something mutated an aggregate after the fact. The
//! audit also surfaces individual records worth a human look.

use serde::{Deserialize, Serialize};

use crate::aggregate::{HierarchicalReport, MonthlySummary, ProposalRecord};
use crate::dates::{month_key_from_text, MonthKey};

/// One suspicious record, identified by its source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFinding {
    pub row_index: usize,
    pub counterparty: String,
    pub kind: FindingKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FindingKind {
    /// An invoice was issued with no proposal value behind it.
    InvoiceWithoutProposal { invoice_value: f64 },
    /// The invoice exceeds the proposal by this amount.
    InvoiceExceedsProposal { delta: f64 },
    /// The record's raw date re-normalizes to a different month than the
    /// one it was grouped under, which points at an upstream grouping bug.
    MonthMismatch { actual: Option<MonthKey> },
}

/// The audit result for one month. Deltas are flat minus hierarchical, so a
/// positive delta means the flat view carries more than the drill-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAudit {
    pub month: MonthKey,
    pub flat_proposal_total: f64,
    pub flat_invoice_total: f64,
    pub leaf_proposal_total: f64,
    pub leaf_invoice_total: f64,
    pub proposal_delta: f64,
    pub invoice_delta: f64,
    pub findings: Vec<RecordFinding>,
}

impl MonthAudit {
    /// True when both views agree within the floating-point accumulation
    /// tolerance and no record was flagged.
    pub fn is_clean(&self, tolerance: f64) -> bool {
        self.proposal_delta.abs() <= tolerance
            && self.invoice_delta.abs() <= tolerance
            && self.findings.is_empty()
    }
}

/// Recomputes one month's totals from the hierarchy leaves and compares
/// them to the flat bucket. Performs no mutation; both views are read as
/// they are.
pub fn audit_month(
    summary: &MonthlySummary,
    breakdown: &HierarchicalReport,
    month: &MonthKey,
) -> MonthAudit {
    let leaves: Vec<&ProposalRecord> = breakdown
        .months
        .get(month)
        .map(|bucket| {
            bucket
                .categories
                .values()
                .flat_map(|category| category.counterparties.values())
                .flat_map(|counterparty| counterparty.records.iter())
                .collect()
        })
        .unwrap_or_default();

    let leaf_proposal_total: f64 = leaves.iter().map(|r| r.proposal_value).sum();
    let leaf_invoice_total: f64 = leaves.iter().map(|r| r.invoice_value).sum();

    let (flat_proposal_total, flat_invoice_total) = summary
        .months
        .get(month)
        .map(|bucket| (bucket.proposal_total, bucket.invoice_total))
        .unwrap_or((0.0, 0.0));

    let mut findings = Vec::new();
    for record in &leaves {
        if record.invoice_value > 0.0 && record.proposal_value == 0.0 {
            findings.push(RecordFinding {
                row_index: record.row_index,
                counterparty: record.counterparty.clone(),
                kind: FindingKind::InvoiceWithoutProposal {
                    invoice_value: record.invoice_value,
                },
            });
        }
        if record.invoice_value > record.proposal_value {
            findings.push(RecordFinding {
                row_index: record.row_index,
                counterparty: record.counterparty.clone(),
                kind: FindingKind::InvoiceExceedsProposal {
                    delta: record.invoice_value - record.proposal_value,
                },
            });
        }
        let actual = month_key_from_text(&record.raw_date);
        if actual.as_ref() != Some(month) {
            findings.push(RecordFinding {
                row_index: record.row_index,
                counterparty: record.counterparty.clone(),
                kind: FindingKind::MonthMismatch { actual },
            });
        }
    }

    MonthAudit {
        month: month.clone(),
        flat_proposal_total,
        flat_invoice_total,
        leaf_proposal_total,
        leaf_invoice_total,
        proposal_delta: flat_proposal_total - leaf_proposal_total,
        invoice_delta: flat_invoice_total - leaf_invoice_total,
        findings,
    }
}
