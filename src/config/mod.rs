use reqwest::Client;
use std::env;
use std::sync::Arc;
use tracing::info;

use crate::services::currency_source::HttpCurrencySource;
use crate::services::enrichment::{FlagSettings, DEFAULT_FLAG_CDN_BASE, FALLBACK_FLAG_URL};
use crate::services::flag_validator::HttpFlagValidator;
use crate::services::rate_board::{normalize_base, RateBoard};
use crate::utils::ad_slot::{AdClient, ADSENSE_SCRIPT_SRC, DEFAULT_AD_CLIENT};

const DEFAULT_CURRENCIES_URL: &str = "https://openexchangerates.org/api/currencies.json";
const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/{base}";

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<RateBoard>,
    pub ads: AdClient,
    pub ad_slot: Option<String>,
}

pub struct AppConfig {
    pub port: u16,
    pub currencies_url: String,
    pub rates_url: String,
    pub flag_cdn_base: String,
    pub fallback_flag_url: String,
    pub external_timeout_ms: u64,
    pub default_base_currency: String,
    pub flag_check_concurrency: usize,
    pub ad_client_id: String,
    pub ad_slot: Option<String>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let port: u16 = var_or("PORT", "8080").parse()?;
        let external_timeout_ms: u64 = env::var("EXTERNAL_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(12_000);
        let flag_check_concurrency: usize = env::var("FLAG_CHECK_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(16);
        let default_base_currency = normalize_base(&var_or("DEFAULT_BASE_CURRENCY", "USD"))
            .map_err(|e| anyhow::anyhow!("DEFAULT_BASE_CURRENCY: {}", e))?;
        let ad_slot = env::var("AD_SLOT_ID").ok().filter(|s| !s.trim().is_empty());

        Ok(Self {
            port,
            currencies_url: var_or("CURRENCIES_URL", DEFAULT_CURRENCIES_URL),
            rates_url: var_or("RATES_URL", DEFAULT_RATES_URL),
            flag_cdn_base: var_or("FLAG_CDN_BASE", DEFAULT_FLAG_CDN_BASE),
            fallback_flag_url: var_or("FALLBACK_FLAG_URL", FALLBACK_FLAG_URL),
            external_timeout_ms,
            default_base_currency,
            flag_check_concurrency,
            ad_client_id: var_or("AD_CLIENT_ID", DEFAULT_AD_CLIENT),
            ad_slot,
        })
    }

    /// Builds shared state and starts loading rates for the default base currency.
    pub async fn build_state(&self) -> Result<AppState, anyhow::Error> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(self.external_timeout_ms))
            .build()?;

        let source = HttpCurrencySource::new(http.clone(), &self.currencies_url, &self.rates_url);
        let validator = HttpFlagValidator::new(http);
        let flags = FlagSettings {
            cdn_base: self.flag_cdn_base.clone(),
            fallback_url: self.fallback_flag_url.clone(),
            concurrency: self.flag_check_concurrency,
        };

        let board = Arc::new(RateBoard::new(
            Arc::new(source),
            Arc::new(validator),
            flags,
            &self.default_base_currency,
        ));
        board.select_base(&self.default_base_currency).await?;
        info!("✅ Loading rates for {}", self.default_base_currency);

        Ok(AppState {
            board,
            ads: AdClient {
                script_src: ADSENSE_SCRIPT_SRC.into(),
                publisher_id: self.ad_client_id.clone(),
            },
            ad_slot: self.ad_slot.clone(),
        })
    }
}
