use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use maud::Markup;
use serde::Deserialize;

use crate::config::AppState;
use crate::services::rate_board::{normalize_base, PageRequest, SortKey, SortOrder};
use crate::utils::ad_slot::{AdSlot, Head};
use crate::utils::error::ApiError;
use crate::utils::page::rates_page;

#[derive(Deserialize, Default)]
pub struct PageParams {
    pub base: Option<String>,
    pub page: Option<usize>,
    /// Allowed: country | currency | rate
    pub sort: Option<String>,
    /// Allowed: asc | desc
    pub order: Option<String>,
}

#[derive(Deserialize)]
pub struct BaseBody {
    pub base: String,
}

// --- Basic validation using ApiError::Validation(String) ---
fn validate_page_params(p: &PageParams) -> Result<PageRequest, ApiError> {
    let sort = match p.sort.as_deref() {
        None | Some("") => None,
        Some("country") => Some(SortKey::Country),
        Some("currency") => Some(SortKey::Currency),
        Some("rate") => Some(SortKey::Rate),
        Some(_) => {
            return Err(ApiError::Validation(
                "sort must be one of country, currency, rate".into(),
            ))
        }
    };
    let order = match p.order.as_deref() {
        None | Some("") | Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        Some(_) => return Err(ApiError::Validation("order must be asc or desc".into())),
    };
    if let Some(page) = p.page {
        if page < 1 {
            return Err(ApiError::Validation("page must be >= 1".into()));
        }
    }
    Ok(PageRequest { page: p.page.unwrap_or(1), sort, order })
}

/// Starts a reload when the requested base differs from the board's current one.
async fn apply_base(state: &AppState, base: Option<&str>) -> Result<(), ApiError> {
    let Some(base) = base.filter(|b| !b.trim().is_empty()) else {
        return Ok(());
    };
    let base = normalize_base(base)?;
    if base != state.board.base().await {
        state.board.select_base(&base).await?;
    }
    Ok(())
}

pub async fn index(
    State(state): State<AppState>,
    Query(p): Query<PageParams>,
) -> Result<Markup, ApiError> {
    let req = validate_page_params(&p)?;
    apply_base(&state, p.base.as_deref()).await?;
    let page = state.board.page(req).await;

    let mut head = Head::default();
    let ad = state.ad_slot.as_ref().map(|slot_id| {
        state.ads.mount(&mut head, AdSlot { slot_id: slot_id.clone(), class_name: None })
    });
    let markup = rates_page(&page, &req, &head, ad.as_ref());
    if let Some(ad) = ad {
        ad.unmount(&mut head);
    }
    Ok(markup)
}

pub async fn list_rates(
    State(state): State<AppState>,
    Query(p): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let req = validate_page_params(&p)?;
    apply_base(&state, p.base.as_deref()).await?;
    let page = state.board.page(req).await;
    Ok((axum::http::StatusCode::OK, Json(page)))
}

pub async fn set_base(
    State(state): State<AppState>,
    Json(body): Json<BaseBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.board.refresh_now(&body.base).await?;
    let page = state.board.page(PageRequest::default()).await;
    Ok((axum::http::StatusCode::OK, Json(page)))
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(state.board.status().await))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".into())
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(sort: Option<&str>, order: Option<&str>, page: Option<usize>) -> PageParams {
        PageParams {
            base: None,
            page,
            sort: sort.map(str::to_string),
            order: order.map(str::to_string),
        }
    }

    #[test]
    fn accepts_known_sort_and_order() {
        let req = validate_page_params(&params(Some("rate"), Some("desc"), Some(2))).unwrap();
        assert_eq!(req.sort, Some(SortKey::Rate));
        assert_eq!(req.order, SortOrder::Desc);
        assert_eq!(req.page, 2);

        let req = validate_page_params(&PageParams::default()).unwrap();
        assert_eq!(req.sort, None);
        assert_eq!(req.order, SortOrder::Asc);
        assert_eq!(req.page, 1);
    }

    #[test]
    fn rejects_unknown_sort_order_and_zero_page() {
        assert!(validate_page_params(&params(Some("flag"), None, None)).is_err());
        assert!(validate_page_params(&params(None, Some("up"), None)).is_err());
        assert!(validate_page_params(&params(None, None, Some(0))).is_err());
    }
}
