use chrono::Utc;
use serde::Serialize;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::models::rate_row::DisplayRow;
use crate::services::currency_source::CurrencySource;
use crate::services::enrichment::{build_rows, FlagSettings};
use crate::services::flag_validator::FlagValidator;
use crate::utils::error::ApiError;

pub const PAGE_SIZE: usize = 10;

/// Base currencies offered by the selector. Any other well-formed code is accepted too.
pub const SUPPORTED_BASES: [(&str, &str); 5] = [
    ("USD", "United States Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("JPY", "Japanese Yen"),
    ("INR", "Indian Rupee"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Country,
    Currency,
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ord: CmpOrdering) -> CmpOrdering {
        match self {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    /// 1-based.
    pub page: usize,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatePage {
    pub base: String,
    pub state: Phase,
    pub page: usize,
    pub per_page: usize,
    pub total_rows: usize,
    pub total_pages: usize,
    pub rows: Vec<DisplayRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardStatus {
    pub base: String,
    pub state: Phase,
    pub total_rows: usize,
    pub last_refreshed_at: Option<String>,
}

struct BoardState {
    base: String,
    phase: Phase,
    rows: Vec<DisplayRow>,
    last_refreshed_at: Option<String>,
}

/// Shared rate table: the selected base currency and the rows last built for it.
///
/// Every base selection gets a sequence number; only the result of the most recent one is
/// published, so a slow earlier request can never overwrite a newer one. Rows of the previous
/// base stay in place until the new ones are ready.
pub struct RateBoard {
    source: Arc<dyn CurrencySource>,
    validator: Arc<dyn FlagValidator>,
    flags: FlagSettings,
    state: RwLock<BoardState>,
    latest: AtomicU64,
}

/// Upper-cases and checks a base currency code (2-3 ASCII letters or digits).
pub fn normalize_base(code: &str) -> Result<String, ApiError> {
    let code = code.trim();
    let ok = (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
    if !ok {
        return Err(ApiError::Validation(
            "base must be a 2-3 character currency code (e.g., USD)".into(),
        ));
    }
    Ok(code.to_ascii_uppercase())
}

impl RateBoard {
    pub fn new(
        source: Arc<dyn CurrencySource>,
        validator: Arc<dyn FlagValidator>,
        flags: FlagSettings,
        default_base: &str,
    ) -> Self {
        Self {
            source,
            validator,
            flags,
            state: RwLock::new(BoardState {
                base: default_base.to_ascii_uppercase(),
                phase: Phase::Loading,
                rows: Vec::new(),
                last_refreshed_at: None,
            }),
            latest: AtomicU64::new(0),
        }
    }

    pub async fn base(&self) -> String {
        self.state.read().await.base.clone()
    }

    /// Switches the board to `base` and rebuilds its rows in the background.
    pub async fn select_base(self: &Arc<Self>, base: &str) -> Result<u64, ApiError> {
        let base = normalize_base(base)?;
        let seq = self.begin(&base).await;
        let board = Arc::clone(self);
        tokio::spawn(async move {
            board.complete(seq, &base).await;
        });
        Ok(seq)
    }

    /// Same transition as [`select_base`](Self::select_base), but waits for the rows.
    pub async fn refresh_now(&self, base: &str) -> Result<BoardStatus, ApiError> {
        let base = normalize_base(base)?;
        let seq = self.begin(&base).await;
        self.complete(seq, &base).await;
        Ok(self.status().await)
    }

    async fn begin(&self, base: &str) -> u64 {
        let mut st = self.state.write().await;
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        st.base = base.to_string();
        st.phase = Phase::Loading;
        info!("loading rates for base {} (request {})", base, seq);
        seq
    }

    /// Runs the pipeline and publishes its rows if `seq` is still the latest request.
    async fn complete(&self, seq: u64, base: &str) {
        let rows = match build_rows(self.source.as_ref(), self.validator.as_ref(), &self.flags, base).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to fetch currency rates for {}: {}", base, e);
                Vec::new()
            }
        };

        let mut st = self.state.write().await;
        if self.latest.load(Ordering::SeqCst) != seq {
            debug!("discarding stale rates for {} (request {})", base, seq);
            return;
        }
        info!("{} rows ready for base {}", rows.len(), base);
        st.rows = rows;
        st.phase = Phase::Ready;
        st.last_refreshed_at = Some(Utc::now().to_rfc3339());
    }

    pub async fn status(&self) -> BoardStatus {
        let st = self.state.read().await;
        BoardStatus {
            base: st.base.clone(),
            state: st.phase,
            total_rows: st.rows.len(),
            last_refreshed_at: st.last_refreshed_at.clone(),
        }
    }

    pub async fn page(&self, req: PageRequest) -> RatePage {
        let st = self.state.read().await;
        let page = req.page.max(1);
        let total_rows = st.rows.len();
        let total_pages = total_rows.div_ceil(PAGE_SIZE).max(1);

        let mut rows: Vec<&DisplayRow> = st.rows.iter().collect();
        if let Some(key) = req.sort {
            rows.sort_by(|a, b| compare_rows(a, b, key, req.order));
        }
        let rows = rows
            .into_iter()
            .skip((page - 1).saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .cloned()
            .collect();

        RatePage {
            base: st.base.clone(),
            state: st.phase,
            page,
            per_page: PAGE_SIZE,
            total_rows,
            total_pages,
            rows,
        }
    }
}

/// `N/A` rates stay after numeric ones in both directions.
fn compare_rows(a: &DisplayRow, b: &DisplayRow, key: SortKey, order: SortOrder) -> CmpOrdering {
    match key {
        SortKey::Country => order.apply(a.country.cmp(&b.country)),
        SortKey::Currency => order.apply(a.currency.cmp(&b.currency)),
        SortKey::Rate => match (a.rate.value(), b.rate.value()) {
            (Some(x), Some(y)) => order.apply(x.total_cmp(&y)),
            _ => a.rate.sort_cmp(&b.rate),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rate_row::Rate;
    use crate::services::fakes::{catalog, rates, FixedValidator, StaticSource};
    use std::time::Duration;

    fn board_with(source: StaticSource) -> Arc<RateBoard> {
        Arc::new(RateBoard::new(
            Arc::new(source),
            Arc::new(FixedValidator(true)),
            FlagSettings::default(),
            "usd",
        ))
    }

    fn many_currencies(n: usize) -> StaticSource {
        let names: Vec<String> = (0..n).map(|i| format!("Currency {i:02}")).collect();
        // No ignored prefix starts with "g" or "j".
        let codes: Vec<String> = (0..n)
            .map(|i| {
                let first = if i % 2 == 0 { 'G' } else { 'J' };
                format!("{first}{}X", (b'A' + (i / 2) as u8) as char)
            })
            .collect();
        let entries: Vec<(&str, Option<&str>)> = codes
            .iter()
            .zip(&names)
            .map(|(c, n)| (c.as_str(), Some(n.as_str())))
            .collect();
        StaticSource { catalog: catalog(&entries), ..Default::default() }
    }

    #[tokio::test]
    async fn starts_loading_with_default_base() {
        let board = board_with(StaticSource::default());
        let status = board.status().await;
        assert_eq!(status.base, "USD");
        assert_eq!(status.state, Phase::Loading);
        assert_eq!(status.total_rows, 0);
        assert!(status.last_refreshed_at.is_none());
    }

    #[tokio::test]
    async fn refresh_moves_to_ready_with_rows() {
        let board = board_with(StaticSource {
            catalog: catalog(&[("USD", Some("US Dollar")), ("10", Some("Ignored"))]),
            rates: rates(&[("usd", 1.0)]),
            ..Default::default()
        });

        let status = board.refresh_now("USD").await.unwrap();

        assert_eq!(status.state, Phase::Ready);
        assert_eq!(status.total_rows, 1);
        assert!(status.last_refreshed_at.is_some());
        let page = board.page(PageRequest::default()).await;
        assert_eq!(page.rows[0].rate, Rate::Value(1.0));
    }

    #[tokio::test]
    async fn source_failure_ends_ready_and_empty() {
        let board = board_with(StaticSource { fail_currencies: true, ..Default::default() });

        let status = board.refresh_now("USD").await.unwrap();

        assert_eq!(status.state, Phase::Ready);
        assert_eq!(status.total_rows, 0);
    }

    #[tokio::test]
    async fn invalid_base_is_rejected_without_state_change() {
        let board = board_with(StaticSource::default());
        assert!(matches!(board.refresh_now("dollars").await, Err(ApiError::Validation(_))));
        assert!(matches!(board.select_base("").await, Err(ApiError::Validation(_))));
        assert_eq!(board.base().await, "USD");
    }

    #[tokio::test]
    async fn latest_selection_wins_over_slow_earlier_one() {
        let board = board_with(StaticSource {
            catalog: catalog(&[("USD", Some("US Dollar")), ("EUR", Some("Euro"))]),
            rate_delays: vec![("USD".into(), Duration::from_millis(200))],
            ..Default::default()
        });

        board.select_base("USD").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let status = board.refresh_now("EUR").await.unwrap();
        assert_eq!(status.state, Phase::Ready);

        // Let the slow USD request finish; it must not overwrite the EUR rows.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let page = board.page(PageRequest::default()).await;
        assert_eq!(page.base, "EUR");
        assert_eq!(page.state, Phase::Ready);
        let euro = page.rows.iter().find(|r| r.country == "Euro").unwrap();
        assert_eq!(euro.rate, Rate::Value(1.0));
        let dollar = page.rows.iter().find(|r| r.country == "US Dollar").unwrap();
        assert_eq!(dollar.rate, Rate::NotAvailable);
    }

    #[tokio::test]
    async fn old_rows_stay_visible_while_reloading() {
        let board = board_with(StaticSource {
            catalog: catalog(&[("USD", Some("US Dollar"))]),
            rate_delays: vec![("EUR".into(), Duration::from_millis(200))],
            ..Default::default()
        });
        board.refresh_now("USD").await.unwrap();

        board.select_base("EUR").await.unwrap();
        let status = board.status().await;
        assert_eq!(status.state, Phase::Loading);
        assert_eq!(status.base, "EUR");
        assert_eq!(status.total_rows, 1);
    }

    #[tokio::test]
    async fn pages_hold_ten_rows() {
        let board = board_with(many_currencies(23));
        board.refresh_now("USD").await.unwrap();

        let first = board.page(PageRequest { page: 1, ..Default::default() }).await;
        let last = board.page(PageRequest { page: 3, ..Default::default() }).await;
        let past = board.page(PageRequest { page: 9, ..Default::default() }).await;

        assert_eq!(first.total_rows, 23);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.rows.len(), 10);
        assert_eq!(first.rows[0].country, "Currency 00");
        assert_eq!(last.rows.len(), 3);
        assert!(past.rows.is_empty());
    }

    #[tokio::test]
    async fn huge_page_number_is_empty_not_wrapped() {
        let board = board_with(many_currencies(23));
        board.refresh_now("USD").await.unwrap();

        let page = board.page(PageRequest { page: usize::MAX, ..Default::default() }).await;
        assert_eq!(page.page, usize::MAX);
        assert_eq!(page.total_pages, 3);
        assert!(page.rows.is_empty());

        // Would wrap to skip(4) without saturation.
        let page = board.page(PageRequest { page: 1844674407370955163, ..Default::default() }).await;
        assert!(page.rows.is_empty());
    }

    #[tokio::test]
    async fn empty_board_has_one_page() {
        let board = board_with(StaticSource::default());
        board.refresh_now("USD").await.unwrap();
        let page = board.page(PageRequest::default()).await;
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.rows.is_empty());
    }

    #[tokio::test]
    async fn sorts_by_rate_with_not_available_last() {
        let board = board_with(StaticSource {
            catalog: catalog(&[
                ("JPY", Some("Yen")),
                ("GBP", Some("Pound")),
                ("CHF", Some("Franc")),
                ("EUR", Some("Euro")),
            ]),
            rates: rates(&[("jpy", 151.0), ("gbp", 0.79), ("eur", 0.92)]),
            ..Default::default()
        });
        board.refresh_now("USD").await.unwrap();

        let asc = board
            .page(PageRequest { page: 1, sort: Some(SortKey::Rate), order: SortOrder::Asc })
            .await;
        let desc = board
            .page(PageRequest { page: 1, sort: Some(SortKey::Rate), order: SortOrder::Desc })
            .await;
        let by_name = board
            .page(PageRequest { page: 1, sort: Some(SortKey::Country), order: SortOrder::Desc })
            .await;

        let names = |p: &RatePage| p.rows.iter().map(|r| r.country.clone()).collect::<Vec<_>>();
        assert_eq!(names(&asc), ["Pound", "Euro", "Yen", "Franc"]);
        assert_eq!(names(&desc), ["Yen", "Euro", "Pound", "Franc"]);
        assert_eq!(names(&by_name), ["Yen", "Pound", "Franc", "Euro"]);
    }

    #[test]
    fn base_codes_are_normalized() {
        assert_eq!(normalize_base(" eur ").unwrap(), "EUR");
        assert_eq!(normalize_base("cn").unwrap(), "CN");
        assert!(normalize_base("EURO").is_err());
        assert!(normalize_base("u$").is_err());
    }
}
