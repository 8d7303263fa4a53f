use serde::{Deserialize, Serialize};

use crate::dates::MonthKey;

/// A batch of spreadsheet rows sharing the header set of the first row.
///
/// Headers keep their sheet order so column inference is deterministic.
/// Cells are trimmed on ingestion and rows with no content at all are
/// dropped, matching what the export endpoints deliver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowBatch {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RowBatch {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends one row of cell values, positionally matched to the headers.
    /// Short rows are padded with empty cells, long rows truncated. Rows
    /// whose cells are all empty are skipped entirely.
    pub fn push_row(&mut self, values: Vec<String>) {
        let mut cells: Vec<String> = values.into_iter().map(|v| v.trim().to_string()).collect();
        cells.resize(self.headers.len(), String::new());
        if cells.iter().any(|c| !c.is_empty()) {
            self.rows.push(cells);
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The cell at (row, header), or an empty string when the header is
    /// unknown or the row index is out of range.
    pub fn cell(&self, row: usize, header: &str) -> &str {
        match (self.column_index(header), self.rows.get(row)) {
            (Some(col), Some(cells)) => &cells[col],
            _ => "",
        }
    }

    pub fn has_header(&self, header: &str) -> bool {
        self.column_index(header).is_some()
    }

    fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Manual column overrides supplied by the caller. An override is only
/// honored when it names a header that actually exists in the batch;
/// anything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnOverrides {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub proposal: Option<String>,
    #[serde(default)]
    pub invoice: Option<String>,
}

/// Caller-owned knobs for one report build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportOptions {
    #[serde(default)]
    pub overrides: ColumnOverrides,

    /// Months whose real totals are forcibly reset to zero before
    /// projection. Sheet-specific data patching; empty unless the caller
    /// knows a month's source rows are bad.
    #[serde(default)]
    pub zeroed_months: Vec<MonthKey>,

    /// Months the projection engine may backfill from contracts.
    #[serde(default)]
    pub projection_months: Vec<MonthKey>,
}

/// One contract row as fetched from the contracts sheet. All fields are the
/// raw cell strings; parsing happens at projection time so a malformed
/// contract is skipped rather than failing the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub proposal_id: String,
    pub installment_value: String,
    pub start_date: String,
    pub end_date: String,
    pub contract_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> RowBatch {
        let mut batch = RowBatch::new(vec!["Data".to_string(), "Valor Proposta".to_string()]);
        batch.push_row(vec!["10/06/2025".to_string(), " 1.000,00 ".to_string()]);
        batch.push_row(vec!["".to_string(), "".to_string()]);
        batch.push_row(vec!["20/06/2025".to_string()]);
        batch
    }

    #[test]
    fn test_push_row_pads_and_drops_empty() {
        let batch = batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.cell(0, "Valor Proposta"), "1.000,00");
        assert_eq!(batch.cell(1, "Valor Proposta"), "");
    }

    #[test]
    fn test_cell_unknown_header_is_empty() {
        let batch = batch();
        assert_eq!(batch.cell(0, "Boleto"), "");
        assert_eq!(batch.cell(99, "Data"), "");
    }

    #[test]
    fn test_options_roundtrip() {
        let options = ReportOptions {
            overrides: ColumnOverrides {
                date: Some("Data".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: ReportOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.overrides.date.as_deref(), Some("Data"));
        assert!(back.zeroed_months.is_empty());
    }
}
