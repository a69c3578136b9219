//! Remote exchange rate sources.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::RateError;

/// A service quoting BGN per unit of a currency on a date.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rate(&self, date: NaiveDate, currency: &str) -> Result<Decimal, RateError>;
}

/// Client for exchangerate.host style historical endpoints.
pub struct ExchangeRateHost {
    client: reqwest::Client,
    base_url: String,
}

impl ExchangeRateHost {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, date: NaiveDate, currency: &str) -> String {
        format!(
            "{}/{}?base={}&symbols=BGN",
            self.base_url,
            date.format("%Y-%m-%d"),
            currency
        )
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, serde_json::Value>,
}

/// BGN rate from a response body.
pub(crate) fn parse_rate_body(body: &str) -> Result<Option<Decimal>, RateError> {
    let response: RatesResponse =
        serde_json::from_str(body).map_err(|e| RateError::Parse(e.to_string()))?;

    let Some(value) = response.rates.get("BGN") else {
        return Ok(None);
    };

    let raw = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => return Ok(None),
        other => return Err(RateError::Parse(format!("unexpected rate value: {}", other))),
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map(Some)
        .map_err(|e| RateError::Parse(format!("{}: {}", raw, e)))
}

#[async_trait]
impl RateSource for ExchangeRateHost {
    async fn fetch_rate(&self, date: NaiveDate, currency: &str) -> Result<Decimal, RateError> {
        let url = self.url(date, currency);
        debug!("Fetching exchange rate: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RateError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(RateError::Network(format!("HTTP {status}")));
        }

        match parse_rate_body(&body)? {
            Some(rate) if rate > Decimal::ZERO => Ok(rate),
            _ => Err(RateError::Unpublished {
                currency: currency.to_string(),
                date: date.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url() {
        let host = ExchangeRateHost::new("https://api.exchangerate.host/", Duration::from_secs(5)).unwrap();
        let date = NaiveDate::from_ymd_opt(2021, 8, 18).unwrap();
        assert_eq!(
            host.url(date, "USD"),
            "https://api.exchangerate.host/2021-08-18?base=USD&symbols=BGN"
        );
    }

    #[test]
    fn test_parse_rate_body() {
        assert_eq!(
            parse_rate_body(r#"{"success":true,"rates":{"BGN":1.6588}}"#).unwrap(),
            Some(Decimal::new(16588, 4))
        );
        assert_eq!(parse_rate_body(r#"{"rates":{"BGN":"2.3"}}"#).unwrap(), Some(Decimal::new(23, 1)));
        assert_eq!(parse_rate_body(r#"{"success":false}"#).unwrap(), None);
        assert!(matches!(parse_rate_body("<html>"), Err(RateError::Parse(_))));
    }
}
