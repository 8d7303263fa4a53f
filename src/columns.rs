//! Column role resolution over raw sheet headers.
//!
//! Sheets arrive with no typed schema, only header text. Each semantic role
//! is resolved through an ordered rule table: manual override, then exact
//! alias candidates, then generic keywords, then content sampling. The rules
//! run once per batch and the result drives every row extraction.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dates::month_key_from_text;
use crate::error::{ReportError, Result};
use crate::schema::{ColumnOverrides, RowBatch};
use crate::utils::normalize_text;
use crate::value::parse_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Date,
    ProposalValue,
    InvoiceValue,
    Category,
    Counterparty,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Date => "date",
            ColumnRole::ProposalValue => "proposal value",
            ColumnRole::InvoiceValue => "invoice value",
            ColumnRole::Category => "category",
            ColumnRole::Counterparty => "counterparty",
        };
        f.write_str(name)
    }
}

/// The headers chosen for each role. Date and both value roles are
/// mandatory; category and counterparty fall back to empty placeholders
/// during aggregation when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRoleMap {
    pub date: String,
    pub proposal_value: String,
    pub invoice_value: String,
    pub category: Option<String>,
    pub counterparty: Option<String>,
}

// Exact header variants observed on production sheets, in priority order.
// Earlier candidates win even when a later one also matches.
const DATE_ALIASES: &[&str] = &[
    "Data Emissão Boleto",
    "Data de Emissão Boleto",
    "Data de Envio do Boleto",
    "Data de Vencimento Boleto",
    "Data Vencimento do Boleto",
    "Data Pagamento",
    "Data do Pagamento",
    "Data",
    "DT",
    "Date",
];

const PROPOSAL_ALIASES: &[&str] = &[
    "Valor Proposta",
    "Valor da Proposta",
    "Proposta",
    "Valor da proposta +15,75%",
];

const INVOICE_ALIASES: &[&str] = &[
    "Valor do Boleto (R$)",
    "Valor do Boleto",
    "Boleto",
    "Valor da Nota (R$)",
];

// Broader keyword fallbacks, one set per role.
const DATE_KEYWORDS: &[&str] = &["data", "dt", "date", "emissao", "lancamento", "competencia"];
const PROPOSAL_KEYWORDS: &[&str] = &["proposta", "orcamento", "pedido"];
const INVOICE_KEYWORDS: &[&str] = &["boleto", "fatura", "duplicata", "nf", "nota", "titulo"];
const CATEGORY_KEYWORDS: &[&str] = &["tipo", "categoria", "category", "type"];
const COUNTERPARTY_KEYWORDS: &[&str] = &["empresa", "company", "cliente"];

// A header containing any of these is never accepted as a value column,
// whatever matched it; "Data de Vencimento Boleto" must not win the invoice
// role on the "boleto" keyword.
const DATE_WORDS: &[&str] = &[
    "data",
    "emissao",
    "envio",
    "vencimento",
    "prazo",
    "dia",
    "mes",
    "ano",
];

/// Rows inspected by the content-sampling fallbacks.
const NUMERIC_SAMPLE_ROWS: usize = 50;
const DATE_SAMPLE_ROWS: usize = 10;

/// Resolves every role for the batch, honoring overrides first.
pub fn resolve_columns(batch: &RowBatch, overrides: &ColumnOverrides) -> Result<ColumnRoleMap> {
    if batch.is_empty() {
        return Err(ReportError::NoData);
    }

    let date = resolve_date(batch, overrides.date.as_deref())
        .ok_or(ReportError::MissingColumnRole(ColumnRole::Date))?;

    let proposal_value = resolve_value(
        batch,
        overrides.proposal.as_deref(),
        PROPOSAL_ALIASES,
        PROPOSAL_KEYWORDS,
        &[&date],
    )
    .ok_or(ReportError::MissingColumnRole(ColumnRole::ProposalValue))?;

    // Prefer a column distinct from the proposal one; a sheet carrying a
    // single numeric column still resolves, with both roles sharing it.
    let invoice_value = resolve_value(
        batch,
        overrides.invoice.as_deref(),
        INVOICE_ALIASES,
        INVOICE_KEYWORDS,
        &[&date, &proposal_value],
    )
    .or_else(|| best_numeric_column(batch, &[&date]))
    .ok_or(ReportError::MissingColumnRole(ColumnRole::InvoiceValue))?;

    let category = find_by_keywords(batch.headers(), CATEGORY_KEYWORDS);
    let counterparty = find_by_keywords(batch.headers(), COUNTERPARTY_KEYWORDS);

    debug!(
        "resolved columns: date='{}', proposal='{}', invoice='{}', category={:?}, counterparty={:?}",
        date, proposal_value, invoice_value, category, counterparty
    );

    Ok(ColumnRoleMap {
        date,
        proposal_value,
        invoice_value,
        category,
        counterparty,
    })
}

fn resolve_date(batch: &RowBatch, override_header: Option<&str>) -> Option<String> {
    if let Some(header) = validated_override(batch, override_header) {
        return Some(header);
    }
    if let Some(header) = find_by_aliases(batch.headers(), DATE_ALIASES)
        .or_else(|| find_by_keywords(batch.headers(), DATE_KEYWORDS))
    {
        return Some(header);
    }

    // No header looks like a date; probe the first rows of every column for
    // cells that normalize to a month key.
    for header in batch.headers() {
        let hit = (0..batch.len().min(DATE_SAMPLE_ROWS))
            .any(|row| month_key_from_text(batch.cell(row, header)).is_some());
        if hit {
            debug!("date role resolved by content sampling: '{}'", header);
            return Some(header.clone());
        }
    }
    None
}

fn resolve_value(
    batch: &RowBatch,
    override_header: Option<&str>,
    aliases: &[&str],
    keywords: &[&str],
    taken: &[&str],
) -> Option<String> {
    if let Some(header) = validated_override(batch, override_header) {
        return Some(header);
    }

    let candidate = find_by_aliases(batch.headers(), aliases)
        .or_else(|| find_by_keywords(batch.headers(), keywords));
    match candidate {
        Some(header) if !has_date_word(&header) => return Some(header),
        Some(header) => {
            debug!("discarding '{}' as a value column: header names a date", header)
        }
        None => {}
    }

    best_numeric_column(batch, taken)
}

/// Override headers are trusted only when they exist in the batch.
fn validated_override(batch: &RowBatch, header: Option<&str>) -> Option<String> {
    let header = header?.trim();
    if !header.is_empty() && batch.has_header(header) {
        Some(header.to_string())
    } else {
        None
    }
}

/// Candidate-major scan: every header is tried against the first alias
/// before the second alias is considered.
fn find_by_aliases(headers: &[String], aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        let alias = normalize_text(alias);
        for header in headers {
            if normalize_text(header).contains(&alias) {
                return Some(header.clone());
            }
        }
    }
    None
}

fn find_by_keywords(headers: &[String], keywords: &[&str]) -> Option<String> {
    headers
        .iter()
        .find(|header| {
            let normalized = normalize_text(header);
            keywords.iter().any(|keyword| normalized.contains(keyword))
        })
        .cloned()
}

fn has_date_word(header: &str) -> bool {
    let normalized = normalize_text(header);
    DATE_WORDS.iter().any(|word| normalized.contains(word))
}

/// Samples the first rows of every remaining column and picks the one with
/// the most cells that parse to a nonzero amount. Requires at least one hit;
/// ties break toward the leftmost column so the choice is deterministic.
fn best_numeric_column(batch: &RowBatch, taken: &[&str]) -> Option<String> {
    let sample = batch.len().min(NUMERIC_SAMPLE_ROWS);
    let mut best: Option<(usize, &String)> = None;

    for header in batch.headers() {
        if taken.contains(&header.as_str()) || has_date_word(header) {
            continue;
        }
        let count = (0..sample)
            .filter(|row| parse_amount(batch.cell(*row, header)) != 0.0)
            .count();
        if count > 0 && best.map_or(true, |(top, _)| count > top) {
            best = Some((count, header));
        }
    }

    best.map(|(count, header)| {
        debug!(
            "value role resolved by numeric sampling: '{}' ({} hits)",
            header, count
        );
        header.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_with(headers: &[&str], rows: &[&[&str]]) -> RowBatch {
        let mut batch = RowBatch::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            batch.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        batch
    }

    #[test]
    fn test_alias_resolution_with_diacritics() {
        let batch = batch_with(
            &["Empresa", "Tipo", "Data Emissão Boleto", "Valor Proposta", "Valor do Boleto (R$)"],
            &[&["Acme", "Setup", "10/06/2025", "1.000,00", "900,00"]],
        );
        let roles = resolve_columns(&batch, &ColumnOverrides::default()).unwrap();
        assert_eq!(roles.date, "Data Emissão Boleto");
        assert_eq!(roles.proposal_value, "Valor Proposta");
        assert_eq!(roles.invoice_value, "Valor do Boleto (R$)");
        assert_eq!(roles.category.as_deref(), Some("Tipo"));
        assert_eq!(roles.counterparty.as_deref(), Some("Empresa"));
    }

    #[test]
    fn test_alias_priority_is_candidate_major() {
        // "Proposta" appears in both headers; the earlier alias must win.
        let batch = batch_with(
            &["Proposta", "Valor da Proposta", "Data", "Boleto"],
            &[&["P-1", "100,00", "10/06/2025", "90,00"]],
        );
        let roles = resolve_columns(&batch, &ColumnOverrides::default()).unwrap();
        assert_eq!(roles.proposal_value, "Valor da Proposta");
    }

    #[test]
    fn test_override_takes_priority() {
        let batch = batch_with(
            &["Data", "Valor Proposta", "Coluna X", "Boleto"],
            &[&["10/06/2025", "100,00", "123,45", "90,00"]],
        );
        let overrides = ColumnOverrides {
            proposal: Some("Coluna X".to_string()),
            ..Default::default()
        };
        let roles = resolve_columns(&batch, &overrides).unwrap();
        assert_eq!(roles.proposal_value, "Coluna X");
    }

    #[test]
    fn test_unknown_override_is_ignored() {
        let batch = batch_with(
            &["Data", "Valor Proposta", "Boleto"],
            &[&["10/06/2025", "100,00", "90,00"]],
        );
        let overrides = ColumnOverrides {
            proposal: Some("Nope".to_string()),
            ..Default::default()
        };
        let roles = resolve_columns(&batch, &overrides).unwrap();
        assert_eq!(roles.proposal_value, "Valor Proposta");
    }

    #[test]
    fn test_date_worded_header_never_wins_a_value_role() {
        // "Data de Vencimento Boleto" matches the invoice aliases but names
        // a date; the numeric column must win instead.
        let batch = batch_with(
            &["Data de Vencimento Boleto", "Cobrança"],
            &[
                &["10/06/2025", "1.500,00"],
                &["12/06/2025", "200,00"],
            ],
        );
        let roles = resolve_columns(&batch, &ColumnOverrides::default()).unwrap();
        assert_eq!(roles.invoice_value, "Cobrança");
        assert_eq!(roles.proposal_value, "Cobrança");
    }

    #[test]
    fn test_numeric_sampling_prefers_denser_column() {
        let batch = batch_with(
            &["Data", "Notas", "Montante"],
            &[
                &["10/06/2025", "texto", "1.000,00"],
                &["11/06/2025", "", "2.000,00"],
                &["12/06/2025", "5,00", "3.000,00"],
            ],
        );
        let roles = resolve_columns(&batch, &ColumnOverrides::default()).unwrap();
        assert_eq!(roles.proposal_value, "Montante");
    }

    #[test]
    fn test_date_resolved_by_content_when_headers_say_nothing() {
        let batch = batch_with(
            &["A", "B", "C"],
            &[&["Acme", "15/07/2025", "1.000,00"]],
        );
        let roles = resolve_columns(&batch, &ColumnOverrides::default()).unwrap();
        assert_eq!(roles.date, "B");
    }

    #[test]
    fn test_missing_value_columns_is_an_error() {
        let batch = batch_with(&["Data", "Observação"], &[&["10/06/2025", "texto livre"]]);
        let err = resolve_columns(&batch, &ColumnOverrides::default()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingColumnRole(ColumnRole::ProposalValue)
        ));
    }

    #[test]
    fn test_empty_batch_is_no_data() {
        let batch = RowBatch::new(vec!["Data".to_string()]);
        let err = resolve_columns(&batch, &ColumnOverrides::default()).unwrap_err();
        assert!(matches!(err, ReportError::NoData));
    }
}
