//! In-memory stand-ins for the upstream collaborators, shared by unit and router tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::services::currency_source::{CurrencySource, RateMap};
use crate::services::flag_validator::FlagValidator;
use crate::types::external::{CurrencyCatalog, CurrencyInfo};
use crate::utils::error::ApiError;

pub fn catalog(entries: &[(&str, Option<&str>)]) -> CurrencyCatalog {
    entries
        .iter()
        .map(|(code, name)| (*code, CurrencyInfo { name: name.map(str::to_string) }))
        .collect()
}

pub fn rates(entries: &[(&str, f64)]) -> RateMap {
    entries.iter().map(|(c, r)| (c.to_string(), *r)).collect()
}

#[derive(Default)]
pub struct StaticSource {
    pub catalog: CurrencyCatalog,
    pub rates: RateMap,
    pub fail_currencies: bool,
    pub fail_rates: bool,
    /// Artificial latency of the rate call, per base currency.
    pub rate_delays: Vec<(String, Duration)>,
}

#[async_trait]
impl CurrencySource for StaticSource {
    async fn fetch_all_currencies(&self) -> Result<CurrencyCatalog, ApiError> {
        if self.fail_currencies {
            return Err(ApiError::External("currency list unavailable".into()));
        }
        Ok(self.catalog.clone())
    }

    async fn fetch_exchange_rates(&self, base: &str) -> Result<RateMap, ApiError> {
        if let Some((_, delay)) = self.rate_delays.iter().find(|(b, _)| b == base) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_rates {
            return Err(ApiError::External("rates unavailable".into()));
        }
        // Tag the map with its base so tests can tell responses apart.
        let mut rates = self.rates.clone();
        rates.insert(base.to_lowercase(), 1.0);
        Ok(rates)
    }
}

pub struct FixedValidator(pub bool);

#[async_trait]
impl FlagValidator for FixedValidator {
    async fn validate(&self, _url: &str) -> bool {
        self.0
    }
}

/// Accepts only URLs ending in one of the given `{prefix}.png` names; counts peak concurrency.
#[derive(Default)]
pub struct PrefixValidator {
    pub accepted: HashSet<String>,
    pub delay: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl PrefixValidator {
    pub fn accepting(prefixes: &[&str]) -> Self {
        Self {
            accepted: prefixes.iter().map(|p| format!("{p}.png")).collect(),
            ..Default::default()
        }
    }

    /// Rejects every flag, each check taking `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Default::default() }
    }
}

#[async_trait]
impl FlagValidator for PrefixValidator {
    async fn validate(&self, url: &str) -> bool {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.accepted.iter().any(|name| url.ends_with(&format!("/{name}")))
    }
}
