//! Client for the Financial Modeling Prep income-statement endpoint.
//!
//! One request per call, no retries: a failed upstream call surfaces as
//! [`StatementError::Upstream`] and the caller decides what to do with it.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use statement_core::{FinancialStatement, StatementError, StatementSource};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com";
pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_PERIOD: &str = "annual";

/// Longest slice of an upstream error body quoted back in our own error.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Clone)]
pub struct FmpConfig {
    pub api_key: String,
    pub base_url: String,
    pub symbol: String,
    pub period: String,
    pub timeout: Duration,
}

impl FmpConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            period: DEFAULT_PERIOD.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for FmpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FmpConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("symbol", &self.symbol)
            .field("period", &self.period)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct FmpClient {
    config: FmpConfig,
    client: Client,
}

impl FmpClient {
    pub fn new(config: FmpConfig) -> Result<Self, StatementError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StatementError::Upstream(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn income_statement_url(&self) -> String {
        format!(
            "{}/api/v3/income-statement/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.symbol
        )
    }

    /// Fetch the statements for the configured ticker and project them.
    pub async fn get_income_statements(&self) -> Result<Vec<FinancialStatement>, StatementError> {
        let url = self.income_statement_url();
        tracing::debug!(
            "Fetching {} income statements for {} (key {})",
            self.config.period,
            self.config.symbol,
            mask_api_key(&self.config.api_key)
        );

        // without_url() keeps the apikey query parameter out of error messages
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period", self.config.period.as_str()),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StatementError::Upstream(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatementError::Upstream(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, MAX_ERROR_BODY_CHARS)
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| StatementError::Upstream(format!("Invalid JSON: {}", e.without_url())))?;

        let statements = project_statements(payload)?;
        tracing::debug!("Received {} statements for {}", statements.len(), self.config.symbol);
        Ok(statements)
    }
}

#[async_trait]
impl StatementSource for FmpClient {
    async fn fetch_statements(&self) -> Result<Vec<FinancialStatement>, StatementError> {
        self.get_income_statements().await
    }
}

/// Project an upstream payload onto [`FinancialStatement`]s.
///
/// Strict: the payload must be a JSON array and every item must carry all six fields,
/// otherwise the whole payload is rejected.
pub fn project_statements(payload: Value) -> Result<Vec<FinancialStatement>, StatementError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => {
            // FMP reports bad keys and exhausted plans as {"Error Message": "..."} with a 200
            if let Some(message) = map.get("Error Message").and_then(Value::as_str) {
                return Err(StatementError::Upstream(format!("Provider error: {}", message)));
            }
            return Err(StatementError::Upstream(
                "Expected a list of statements, got an object".to_string(),
            ));
        }
        other => {
            return Err(StatementError::Upstream(format!(
                "Expected a list of statements, got {}",
                json_type(&other)
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| project_item(index, item))
        .collect()
}

fn project_item(index: usize, item: &Value) -> Result<FinancialStatement, StatementError> {
    let fields = item.as_object().ok_or_else(|| StatementError::MalformedRecord {
        index,
        reason: format!("expected an object, got {}", json_type(item)),
    })?;

    Ok(FinancialStatement {
        date: string_field(index, fields, "date")?,
        revenue: number_field(index, fields, "revenue")?,
        net_income: number_field(index, fields, "netIncome")?,
        gross_profit: number_field(index, fields, "grossProfit")?,
        eps: number_field(index, fields, "eps")?,
        operating_income: number_field(index, fields, "operatingIncome")?,
    })
}

fn field<'a>(index: usize, fields: &'a Map<String, Value>, name: &str) -> Result<&'a Value, StatementError> {
    fields.get(name).ok_or_else(|| StatementError::MalformedRecord {
        index,
        reason: format!("missing field '{}'", name),
    })
}

fn string_field(index: usize, fields: &Map<String, Value>, name: &str) -> Result<String, StatementError> {
    let value = field(index, fields, name)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StatementError::MalformedRecord {
            index,
            reason: format!("field '{}' should be a string, got {}", name, json_type(value)),
        })
}

fn number_field(index: usize, fields: &Map<String, Value>, name: &str) -> Result<f64, StatementError> {
    let value = field(index, fields, name)?;
    value.as_f64().ok_or_else(|| StatementError::MalformedRecord {
        index,
        reason: format!("field '{}' should be a number, got {}", name, json_type(value)),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Mask an API key for logging: first and last four characters only.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
