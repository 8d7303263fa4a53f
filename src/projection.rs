//! Contract-based projection of months that have no real data.
//!
//! A contract contributes its installment value to every month between its
//! first and last due dates. Projection never overwrites real figures: a
//! month with any nonzero total is skipped, and skipped contracts are
//! decisions, not errors.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::aggregate::{MonthlyBucket, MonthlySummary};
use crate::dates::{parse_contract_date, MonthKey};
use crate::schema::Contract;
use crate::value::parse_amount;

/// Contract types are labeled differently on the contracts sheet than in
/// the expense categories; unknown types pass through unchanged.
const CONTRACT_TYPE_ALIASES: &[(&str, &str)] = &[
    ("Implantação", "Setup"),
    ("Mensalidade", "Mensalidade"),
];

fn map_contract_type(raw: &str) -> String {
    CONTRACT_TYPE_ALIASES
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// One contract's contribution to one target month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub proposal_id: String,
    pub value: f64,
    pub contract_type: String,
    pub is_projection: bool,
}

/// A month may be projected only when the flat view has nothing real for
/// it: absent entirely, or present with both totals exactly zero.
pub fn month_eligible(summary: &MonthlySummary, month: &MonthKey) -> bool {
    match summary.months.get(month) {
        None => true,
        Some(bucket) => bucket.proposal_total == 0.0 && bucket.invoice_total == 0.0,
    }
}

/// Evaluates one contract for one month. All five fields must be present
/// and parseable, and the month's first day must fall inside the contract
/// range (inclusive); anything else silently excludes the contract.
fn project_contract(contract: &Contract, month: &MonthKey) -> Option<ProjectionRecord> {
    let proposal_id = contract.proposal_id.trim();
    let contract_type = contract.contract_type.trim();
    if proposal_id.is_empty()
        || contract_type.is_empty()
        || contract.installment_value.trim().is_empty()
        || contract.start_date.trim().is_empty()
        || contract.end_date.trim().is_empty()
    {
        debug!("contract {:?} skipped: missing required fields", proposal_id);
        return None;
    }

    let value = parse_amount(&contract.installment_value);
    if value == 0.0 {
        debug!(
            "contract {} skipped: unreadable installment value {:?}",
            proposal_id, contract.installment_value
        );
        return None;
    }

    let (Some(start), Some(end)) = (
        parse_contract_date(&contract.start_date),
        parse_contract_date(&contract.end_date),
    ) else {
        debug!("contract {} skipped: unreadable date range", proposal_id);
        return None;
    };

    let first_day = month.first_day();
    if first_day < start || first_day > end {
        return None;
    }

    Some(ProjectionRecord {
        proposal_id: proposal_id.to_string(),
        value,
        contract_type: map_contract_type(contract_type),
        is_projection: true,
    })
}

/// Backfills every eligible target month from the contract list and merges
/// the projected buckets into the flat view, recomputing grand totals.
/// Projected buckets assume the invoice matches the proposal, so their
/// difference is always zero. Months yielding no projection stay absent.
pub fn apply_projections(
    summary: &mut MonthlySummary,
    contracts: &[Contract],
    target_months: &[MonthKey],
) {
    for month in target_months {
        if !month_eligible(summary, month) {
            debug!("month {} has real data, not projecting", month);
            continue;
        }

        let projections: Vec<ProjectionRecord> = contracts
            .iter()
            .filter_map(|contract| project_contract(contract, month))
            .collect();
        if projections.is_empty() {
            continue;
        }

        let total: f64 = projections.iter().map(|p| p.value).sum();
        debug!(
            "projecting month {} from {} contracts, total {:.2}",
            month,
            projections.len(),
            total
        );

        let bucket = MonthlyBucket {
            proposal_total: total,
            invoice_total: total,
            difference_total: 0.0,
            difference_percent_avg: 0.0,
            record_count: projections.len(),
            is_projection: true,
            entries: Vec::new(),
            projections,
        };
        summary.months.insert(month.clone(), bucket);
    }

    summary.recompute_totals();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(id: &str, value: &str, start: &str, end: &str, kind: &str) -> Contract {
        Contract {
            proposal_id: id.to_string(),
            installment_value: value.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            contract_type: kind.to_string(),
        }
    }

    fn month(key: &str) -> MonthKey {
        MonthKey::parse(key).unwrap()
    }

    #[test]
    fn test_projects_empty_month_from_contracts() {
        let mut summary = MonthlySummary::default();
        let contracts = vec![
            contract("P-1", "1.000,00", "01/01/2025", "31/12/2025", "Mensalidade"),
            contract("P-2", "500,00", "01/01/2025", "31/12/2025", "Implantação"),
        ];

        apply_projections(&mut summary, &contracts, &[month("2025-08")]);

        let bucket = summary.months.get(&month("2025-08")).unwrap();
        assert!(bucket.is_projection);
        assert!((bucket.proposal_total - 1500.0).abs() < 1e-9);
        assert!((bucket.invoice_total - 1500.0).abs() < 1e-9);
        assert_eq!(bucket.difference_total, 0.0);
        assert_eq!(bucket.record_count, 2);
        assert_eq!(bucket.projections[1].contract_type, "Setup");
        assert!((summary.grand_proposal_total - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_month_with_real_data_is_never_projected() {
        let mut summary = MonthlySummary::default();
        summary.months.insert(
            month("2025-08"),
            MonthlyBucket {
                proposal_total: 150.0,
                ..Default::default()
            },
        );
        summary.recompute_totals();

        let contracts = vec![contract(
            "P-1",
            "1.000,00",
            "01/01/2025",
            "31/12/2025",
            "Mensalidade",
        )];
        apply_projections(&mut summary, &contracts, &[month("2025-08")]);

        let bucket = summary.months.get(&month("2025-08")).unwrap();
        assert!(!bucket.is_projection);
        assert!((bucket.proposal_total - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_zeroed_month_is_eligible() {
        let mut summary = MonthlySummary::default();
        summary
            .months
            .insert(month("2025-08"), MonthlyBucket::default());

        assert!(month_eligible(&summary, &month("2025-08")));
        assert!(month_eligible(&summary, &month("2025-09")));
    }

    #[test]
    fn test_contract_range_is_inclusive() {
        let c = contract("P-1", "100,00", "01/06/2025", "01/08/2025", "Mensalidade");

        assert!(project_contract(&c, &month("2025-06")).is_some());
        assert!(project_contract(&c, &month("2025-08")).is_some());
        assert!(project_contract(&c, &month("2025-05")).is_none());
        assert!(project_contract(&c, &month("2025-09")).is_none());
    }

    #[test]
    fn test_incomplete_contract_is_skipped() {
        let missing_value = contract("P-1", "", "01/06/2025", "01/08/2025", "Mensalidade");
        let bad_dates = contract("P-2", "100,00", "junho", "01/08/2025", "Mensalidade");
        let unreadable_value = contract("P-3", "a combinar", "01/06/2025", "01/08/2025", "Setup");

        assert!(project_contract(&missing_value, &month("2025-07")).is_none());
        assert!(project_contract(&bad_dates, &month("2025-07")).is_none());
        assert!(project_contract(&unreadable_value, &month("2025-07")).is_none());
    }

    #[test]
    fn test_month_without_matching_contracts_stays_absent() {
        let mut summary = MonthlySummary::default();
        let contracts = vec![contract(
            "P-1",
            "100,00",
            "01/06/2025",
            "01/08/2025",
            "Mensalidade",
        )];
        apply_projections(&mut summary, &contracts, &[month("2026-01")]);
        assert!(summary.months.is_empty());
    }
}
