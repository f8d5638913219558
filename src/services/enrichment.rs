use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::models::rate_row::{DisplayRow, Rate};
use crate::services::currency_source::{CurrencySource, RateMap};
use crate::services::flag_validator::FlagValidator;
use crate::types::external::CurrencyInfo;
use crate::utils::error::ApiError;

pub const DEFAULT_FLAG_CDN_BASE: &str = "https://flagcdn.com/w40";
pub const FALLBACK_FLAG_URL: &str = "https://via.placeholder.com/40x30?text=No+Flag";
pub const UNKNOWN_NAME: &str = "Unknown";

/// Two-character code prefixes that have no country flag (supranational, historical, metals...).
pub const IGNORED_CODE_PREFIXES: [&str; 60] = [
    "10", "eo", "av", "aa", "ap", "1i", "ak", "en", "an", "bc", "bu", "ce", "dy",
    "dc", "df", "da", "cs", "ks", "fx", "fl", "fe", "ft", "ka", "kl", "kd", "kc",
    "ic", "hb", "ho", "ok", "on", "op", "qt", "rp", "tu", "or", "qn", "rv", "su",
    "ld", "sp", "wa", "xb", "le", "we", "mb", "xo", "xp", "xc", "ze", "xt", "zi",
    "mi", "xd", "xe", "xa", "xl", "wo", "xr", "xm",
];

#[derive(Debug, Clone)]
pub struct FlagSettings {
    pub cdn_base: String,
    pub fallback_url: String,
    /// Upper bound on flag checks in flight for one pipeline run.
    pub concurrency: usize,
}

impl Default for FlagSettings {
    fn default() -> Self {
        Self {
            cdn_base: DEFAULT_FLAG_CDN_BASE.into(),
            fallback_url: FALLBACK_FLAG_URL.into(),
            concurrency: 16,
        }
    }
}

impl FlagSettings {
    pub fn flag_url(&self, prefix: &str) -> String {
        format!("{}/{}.png", self.cdn_base.trim_end_matches('/'), prefix)
    }
}

/// First two characters, lower-cased.
pub fn code_prefix(code: &str) -> String {
    code.chars().take(2).collect::<String>().to_lowercase()
}

pub fn is_ignored_prefix(prefix: &str) -> bool {
    IGNORED_CODE_PREFIXES.contains(&prefix)
}

struct Candidate {
    flag_url: String,
    name: String,
    rate: Rate,
}

fn candidate(code: &str, info: &CurrencyInfo, rates: &RateMap, flags: &FlagSettings) -> Option<Candidate> {
    let prefix = code_prefix(code);
    if is_ignored_prefix(&prefix) {
        return None;
    }
    let name = info
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string();
    Some(Candidate {
        flag_url: flags.flag_url(&prefix),
        name,
        rate: Rate::from_lookup(rates.get(&code.to_lowercase()).copied()),
    })
}

/// Fetches currencies and rates for `base` and turns them into display rows, in catalog order.
///
/// Flag checks fan out with at most `flags.concurrency` in flight and all of them are awaited
/// before anything is returned. Data-source failures are returned as-is; flag failures fall
/// back to `flags.fallback_url`.
pub async fn build_rows(
    source: &dyn CurrencySource,
    validator: &dyn FlagValidator,
    flags: &FlagSettings,
    base: &str,
) -> Result<Vec<DisplayRow>, ApiError> {
    let (catalog, rates) = tokio::try_join!(
        source.fetch_all_currencies(),
        source.fetch_exchange_rates(base),
    )?;

    let candidates: Vec<Candidate> = catalog
        .iter()
        .filter_map(|(code, info)| candidate(code, info, &rates, flags))
        .collect();
    debug!(
        "enriching {} of {} currencies for base {}",
        candidates.len(),
        catalog.0.len(),
        base
    );

    let rows: Vec<DisplayRow> = stream::iter(candidates)
        .map(|c| async move {
            let flag = if validator.validate(&c.flag_url).await {
                c.flag_url
            } else {
                flags.fallback_url.clone()
            };
            DisplayRow {
                flag,
                country: c.name.clone(),
                currency: c.name,
                rate: c.rate,
            }
        })
        .buffered(flags.concurrency.max(1))
        .collect()
        .await;

    Ok(rows)
}
