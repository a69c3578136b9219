//! Conversion rates from document currencies to BGN.

mod remote;

pub use remote::{ExchangeRateHost, RateSource};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::RateError;
use crate::models::config::CurrencyConfig;

/// BGN per EUR under the currency board.
pub const EUR_BGN_PEG: Decimal = Decimal::from_parts(195583, 0, 0, false, 5);

/// How a rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSourceKind {
    /// BGN itself or the EUR peg.
    Fixed,
    /// Quoted by the rate service.
    Remote,
    /// Taken from the configured table after the service failed.
    Fallback,
}

/// A BGN rate for one currency and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Units of BGN per unit of the currency.
    pub rate: Decimal,
    pub source: RateSourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RateQuote {
    fn fixed(rate: Decimal) -> Self {
        Self {
            rate,
            source: RateSourceKind::Fixed,
            warning: None,
        }
    }
}

/// Looks up exchange rates with an in-memory cache and a static fallback
/// table.
pub struct CurrencyConverter {
    source: Option<Arc<dyn RateSource>>,
    fallback_rates: BTreeMap<String, Decimal>,
    nearby_days: u32,
    cache: Mutex<HashMap<(NaiveDate, String), Decimal>>,
}

impl CurrencyConverter {
    /// Converter backed by the configured rate service.
    pub fn new(config: &CurrencyConfig) -> Result<Self, RateError> {
        let host = ExchangeRateHost::new(
            config.base_url.clone(),
            std::time::Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::with_source(config, Arc::new(host)))
    }

    pub fn with_source(config: &CurrencyConfig, source: Arc<dyn RateSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::offline(config)
        }
    }

    /// Converter that only knows the fixed rates and the fallback table.
    pub fn offline(config: &CurrencyConfig) -> Self {
        Self {
            source: None,
            fallback_rates: config
                .fallback_rates
                .iter()
                .map(|(code, rate)| (code.to_uppercase(), *rate))
                .collect(),
            nearby_days: config.nearby_days,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// BGN per unit of `currency` on `date`.
    pub async fn exchange_rate(&self, date: NaiveDate, currency: &str) -> Result<RateQuote, RateError> {
        let code = currency.trim().to_uppercase();

        match code.as_str() {
            "BGN" => return Ok(RateQuote::fixed(Decimal::ONE)),
            "EUR" => return Ok(RateQuote::fixed(EUR_BGN_PEG)),
            _ => {}
        }

        if let Some(rate) = self.cached(date, &code) {
            debug!("Using cached {} rate for {}", code, date);
            return Ok(RateQuote {
                rate,
                source: RateSourceKind::Remote,
                warning: None,
            });
        }

        let failure = match &self.source {
            Some(source) => match self.fetch_near(source.as_ref(), date, &code).await {
                Ok(rate) => {
                    self.store(date, &code, rate);
                    return Ok(RateQuote {
                        rate,
                        source: RateSourceKind::Remote,
                        warning: None,
                    });
                }
                Err(e) => e.to_string(),
            },
            None => "rate service not configured".to_string(),
        };

        match self.fallback_rates.get(&code) {
            Some(rate) => {
                warn!("Using fallback {} rate {}: {}", code, rate, failure);
                Ok(RateQuote {
                    rate: *rate,
                    source: RateSourceKind::Fallback,
                    warning: Some(format!(
                        "Exchange rate for {} on {} unavailable ({}), using fallback rate {}",
                        code, date, failure, rate
                    )),
                })
            }
            None => Err(RateError::NotFound(code)),
        }
    }

    /// One request per candidate date: the date itself, then one day
    /// earlier and later, out to `nearby_days`.
    async fn fetch_near(
        &self,
        source: &dyn RateSource,
        date: NaiveDate,
        code: &str,
    ) -> Result<Decimal, RateError> {
        let mut last_error = None;

        for day in candidate_dates(date, self.nearby_days) {
            match source.fetch_rate(day, code).await {
                Ok(rate) => {
                    info!("Fetched {} rate {} for {}", code, rate, day);
                    return Ok(rate);
                }
                Err(e) => {
                    debug!("No {} rate for {}: {}", code, day, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RateError::NotFound(code.to_string())))
    }

    fn cached(&self, date: NaiveDate, code: &str) -> Option<Decimal> {
        self.cache
            .lock()
            .ok()?
            .get(&(date, code.to_string()))
            .copied()
    }

    fn store(&self, date: NaiveDate, code: &str, rate: Decimal) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert((date, code.to_string()), rate);
        }
    }
}

fn candidate_dates(date: NaiveDate, nearby_days: u32) -> Vec<NaiveDate> {
    let mut dates = vec![date];
    for delta in 1..=i64::from(nearby_days) {
        dates.extend(date.checked_sub_signed(Duration::days(delta)));
        dates.extend(date.checked_add_signed(Duration::days(delta)));
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Quotes `rate` only on `available`, counting requests.
    struct FakeSource {
        rate: Decimal,
        available: Option<NaiveDate>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(rate: Decimal, available: Option<NaiveDate>) -> Arc<Self> {
            Arc::new(Self {
                rate,
                available,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RateSource for FakeSource {
        async fn fetch_rate(&self, date: NaiveDate, currency: &str) -> Result<Decimal, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.available == Some(date) {
                Ok(self.rate)
            } else {
                Err(RateError::Unpublished {
                    currency: currency.to_string(),
                    date: date.to_string(),
                })
            }
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 8, d).unwrap()
    }

    #[tokio::test]
    async fn test_fixed_rates_skip_service() {
        let source = FakeSource::new(Decimal::new(9, 0), None);
        let converter = CurrencyConverter::with_source(&CurrencyConfig::default(), source.clone());

        let bgn = converter.exchange_rate(day(18), "bgn").await.unwrap();
        let eur = converter.exchange_rate(day(1), "EUR").await.unwrap();

        assert_eq!(bgn, RateQuote::fixed(Decimal::ONE));
        assert_eq!(eur.rate.to_string(), "1.95583");
        assert_eq!(eur.source, RateSourceKind::Fixed);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_rate_is_cached() {
        let source = FakeSource::new(Decimal::new(16588, 4), Some(day(18)));
        let converter = CurrencyConverter::with_source(&CurrencyConfig::default(), source.clone());

        let first = converter.exchange_rate(day(18), "USD").await.unwrap();
        let second = converter.exchange_rate(day(18), "usd").await.unwrap();

        assert_eq!(first.rate, Decimal::new(16588, 4));
        assert_eq!(first.source, RateSourceKind::Remote);
        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nearby_days_search() {
        let source = FakeSource::new(Decimal::new(23, 1), Some(day(20)));
        let config = CurrencyConfig {
            nearby_days: 3,
            ..Default::default()
        };
        let converter = CurrencyConverter::with_source(&config, source.clone());

        let quote = converter.exchange_rate(day(18), "GBP").await.unwrap();

        assert_eq!(quote.rate, Decimal::new(23, 1));
        // 18, 17, 19, 16, 20
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_fallback_on_failure() {
        let source = FakeSource::new(Decimal::ONE, None);
        let converter = CurrencyConverter::with_source(&CurrencyConfig::default(), source.clone());

        let quote = converter.exchange_rate(day(18), "USD").await.unwrap();

        assert_eq!(quote.rate, Decimal::new(180, 2));
        assert_eq!(quote.source, RateSourceKind::Fallback);
        assert!(quote.warning.unwrap().contains("USD"));
        // the date and three days either side
        assert_eq!(source.calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_unknown_currency() {
        let converter = CurrencyConverter::offline(&CurrencyConfig::default());
        let err = converter.exchange_rate(day(18), "JPY").await.unwrap_err();
        assert!(matches!(err, RateError::NotFound(code) if code == "JPY"));
    }

    #[test]
    fn test_candidate_dates() {
        assert_eq!(candidate_dates(day(18), 0), vec![day(18)]);
        assert_eq!(candidate_dates(day(18), 1), vec![day(18), day(17), day(19)]);
    }
}
