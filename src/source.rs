//! Seams to the external row and contract fetch services.
//!
//! Transport and auth live outside this crate. Whatever the fetch strategy
//! (public bulk export first, authenticated API as fallback), the core sees
//! exactly one blocking call per refresh; a failure maps to
//! [`ReportError::SourceUnavailable`] with the transport's own message and
//! is terminal for that refresh cycle — this crate never retries.

use crate::error::Result;
use crate::schema::{Contract, RowBatch};

/// Supplies the raw row batch for one refresh.
pub trait RowSource {
    fn fetch_rows(&self) -> Result<RowBatch>;
}

/// Supplies the contract list used for projections.
pub trait ContractSource {
    fn fetch_contracts(&self) -> Result<Vec<Contract>>;
}

/// In-memory source backing tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub rows: RowBatch,
    pub contracts: Vec<Contract>,
}

impl RowSource for StaticSource {
    fn fetch_rows(&self) -> Result<RowBatch> {
        Ok(self.rows.clone())
    }
}

impl ContractSource for StaticSource {
    fn fetch_contracts(&self) -> Result<Vec<Contract>> {
        Ok(self.contracts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    struct FailingSource;

    impl RowSource for FailingSource {
        fn fetch_rows(&self) -> Result<RowBatch> {
            Err(ReportError::SourceUnavailable(
                "export returned status 403".to_string(),
            ))
        }
    }

    #[test]
    fn test_static_source_round_trips() {
        let mut rows = RowBatch::new(vec!["Data".to_string()]);
        rows.push_row(vec!["10/06/2025".to_string()]);
        let source = StaticSource {
            rows: rows.clone(),
            contracts: Vec::new(),
        };
        assert_eq!(source.fetch_rows().unwrap(), rows);
    }

    #[test]
    fn test_fetch_failure_carries_transport_message() {
        let err = FailingSource.fetch_rows().unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
