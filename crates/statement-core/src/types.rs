use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::StatementError;

/// One annual income statement, reduced to the fields the API exposes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStatement {
    pub date: String,
    pub revenue: f64,
    pub net_income: f64,
    pub gross_profit: f64,
    pub eps: f64,
    pub operating_income: f64,
}

impl FinancialStatement {
    /// Fiscal year taken from the text before the first `-` of `date`.
    pub fn year(&self) -> Option<i32> {
        self.date.split('-').next()?.trim().parse().ok()
    }

    /// Compare two statements on a single field. `date` compares as text, the rest numerically.
    pub fn compare_by(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Date => self.date.cmp(&other.date),
            SortKey::Revenue => self.revenue.total_cmp(&other.revenue),
            SortKey::NetIncome => self.net_income.total_cmp(&other.net_income),
            SortKey::GrossProfit => self.gross_profit.total_cmp(&other.gross_profit),
            SortKey::Eps => self.eps.total_cmp(&other.eps),
            SortKey::OperatingIncome => self.operating_income.total_cmp(&other.operating_income),
        }
    }
}

/// Field a result set can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Revenue,
    NetIncome,
    GrossProfit,
    Eps,
    OperatingIncome,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Date,
        SortKey::Revenue,
        SortKey::NetIncome,
        SortKey::GrossProfit,
        SortKey::Eps,
        SortKey::OperatingIncome,
    ];

    /// Field name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Revenue => "revenue",
            SortKey::NetIncome => "netIncome",
            SortKey::GrossProfit => "grossProfit",
            SortKey::Eps => "eps",
            SortKey::OperatingIncome => "operatingIncome",
        }
    }
}

impl FromStr for SortKey {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| StatementError::InvalidSortKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only the literal `desc` selects descending order; anything else sorts ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}
