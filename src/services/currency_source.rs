use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;

use crate::types::external::{CurrencyCatalog, ErRates};
use crate::utils::error::ApiError;

/// Lower-cased currency code → rate against the requested base.
pub type RateMap = HashMap<String, f64>;

#[async_trait]
pub trait CurrencySource: Send + Sync {
    async fn fetch_all_currencies(&self) -> Result<CurrencyCatalog, ApiError>;
    async fn fetch_exchange_rates(&self, base: &str) -> Result<RateMap, ApiError>;
}

pub struct HttpCurrencySource {
    http: Client,
    currencies_url: String,
    /// May contain `{base}`, replaced with the requested base currency.
    rates_url: String,
}

impl HttpCurrencySource {
    pub fn new(http: Client, currencies_url: impl Into<String>, rates_url: impl Into<String>) -> Self {
        Self {
            http,
            currencies_url: currencies_url.into(),
            rates_url: rates_url.into(),
        }
    }

    fn rates_url_for(&self, base: &str) -> String {
        self.rates_url.replace("{base}", base)
    }
}

#[async_trait]
impl CurrencySource for HttpCurrencySource {
    async fn fetch_all_currencies(&self) -> Result<CurrencyCatalog, ApiError> {
        self.http
            .get(&self.currencies_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::External(format!("Could not fetch currency list: {}", e)))?
            .json()
            .await
            .map_err(|e| ApiError::External(format!("Could not parse currency list: {}", e)))
    }

    async fn fetch_exchange_rates(&self, base: &str) -> Result<RateMap, ApiError> {
        let resp: ErRates = self
            .http
            .get(self.rates_url_for(base))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::External(format!("Could not fetch rates for {}: {}", base, e)))?
            .json()
            .await
            .map_err(|e| ApiError::External(format!("Could not parse rates: {}", e)))?;

        Ok(resp
            .rates
            .into_iter()
            .map(|(code, rate)| (code.to_lowercase(), rate))
            .collect())
    }
}
