use async_trait::async_trait;

use crate::{FinancialStatement, StatementError};

/// Anything that can hand back the full, unfiltered list of income statements.
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn fetch_statements(&self) -> Result<Vec<FinancialStatement>, StatementError>;
}
