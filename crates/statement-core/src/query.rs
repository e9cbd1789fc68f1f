//! Filter and sort pipeline applied to the projected statements.
//!
//! Filters are conjunctive and inclusive, each one switched on by the presence of its
//! parameter. Sorting is stable in both directions: a descending sort flips the comparator,
//! it does not reverse the sequence, so records with equal keys keep their input order.

use serde::Deserialize;
use std::str::FromStr;

use crate::{FinancialStatement, SortKey, SortOrder, StatementError};

/// Query string as received, before any validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub start_year: Option<String>,
    pub end_year: Option<String>,
    pub revenue_min: Option<String>,
    pub revenue_max: Option<String>,
    pub net_income_min: Option<String>,
    pub net_income_max: Option<String>,
    pub sort_key: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementQuery {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub revenue_min: Option<f64>,
    pub revenue_max: Option<f64>,
    pub net_income_min: Option<f64>,
    pub net_income_max: Option<f64>,
    pub sort: Option<(SortKey, SortOrder)>,
}

fn parse_param<T: FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>, StatementError> {
    value
        .as_deref()
        .map(|raw| {
            // a present but blank value fails like any other non-number
            raw.trim().parse::<T>().map_err(|_| StatementError::InvalidParameter {
                name: name.to_string(),
                value: raw.to_string(),
            })
        })
        .transpose()
}

/// Rejects NaN and infinities, which would make every bound comparison meaningless.
fn parse_bound(name: &str, value: &Option<String>) -> Result<Option<f64>, StatementError> {
    match parse_param::<f64>(name, value)? {
        Some(bound) if !bound.is_finite() => Err(StatementError::InvalidParameter {
            name: name.to_string(),
            value: value.clone().unwrap_or_default(),
        }),
        bound => Ok(bound),
    }
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

impl StatementQuery {
    /// Validate raw query parameters. A parameter is switched on by its presence,
    /// so an empty value is validated like any other.
    pub fn from_params(params: &QueryParams) -> Result<Self, StatementError> {
        let sort = params
            .sort_key
            .as_deref()
            .map(|key| -> Result<_, StatementError> {
                let key = key.parse::<SortKey>()?;
                Ok((key, SortOrder::from_param(params.sort_order.as_deref())))
            })
            .transpose()?;

        Ok(Self {
            start_year: parse_param("start_year", &params.start_year)?,
            end_year: parse_param("end_year", &params.end_year)?,
            revenue_min: parse_bound("revenue_min", &params.revenue_min)?,
            revenue_max: parse_bound("revenue_max", &params.revenue_max)?,
            net_income_min: parse_bound("net_income_min", &params.net_income_min)?,
            net_income_max: parse_bound("net_income_max", &params.net_income_max)?,
            sort,
        })
    }

    fn filters_by_year(&self) -> bool {
        self.start_year.is_some() || self.end_year.is_some()
    }

    fn keep(&self, index: usize, statement: &FinancialStatement) -> Result<bool, StatementError> {
        if self.filters_by_year() {
            let year = statement.year().ok_or_else(|| StatementError::MalformedRecord {
                index,
                reason: format!("date {:?} has no numeric year prefix", statement.date),
            })?;
            if !within(year, self.start_year, self.end_year) {
                return Ok(false);
            }
        }

        Ok(within(statement.revenue, self.revenue_min, self.revenue_max)
            && within(statement.net_income, self.net_income_min, self.net_income_max))
    }

    /// Filter then sort. Either the whole sequence comes back or an error does.
    pub fn apply(
        &self,
        statements: Vec<FinancialStatement>,
    ) -> Result<Vec<FinancialStatement>, StatementError> {
        let mut kept = Vec::with_capacity(statements.len());
        for (index, statement) in statements.into_iter().enumerate() {
            if self.keep(index, &statement)? {
                kept.push(statement);
            }
        }

        if let Some((key, order)) = self.sort {
            // slice::sort_by is stable
            match order {
                SortOrder::Asc => kept.sort_by(|a, b| a.compare_by(b, key)),
                SortOrder::Desc => kept.sort_by(|a, b| b.compare_by(a, key)),
            }
        }

        Ok(kept)
    }
}
