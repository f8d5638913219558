use maud::{html, Markup, DOCTYPE};

use crate::services::rate_board::{PageRequest, Phase, RatePage, SortKey, SortOrder, SUPPORTED_BASES};
use crate::utils::ad_slot::{Head, MountedAd};

const TITLE: &str = "Currency Rates Table";
const LOADING_REFRESH_SECS: &str = "2";

const STYLE: &str = "
body { font-family: system-ui, sans-serif; margin: 2rem; }
.card { border: 1px solid #ddd; border-radius: 8px; padding: 1rem 1.5rem; }
.card-title { display: flex; justify-content: space-between; align-items: center; }
.loading { display: flex; justify-content: center; align-items: center; height: 400px; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 0.4rem; border-bottom: 1px solid #eee; }
td img { width: 30px; height: 20px; border-radius: 3px; }
nav.pager { display: flex; gap: 1rem; margin-top: 0.8rem; }
";

pub fn sort_param(key: SortKey) -> &'static str {
    match key {
        SortKey::Country => "country",
        SortKey::Currency => "currency",
        SortKey::Rate => "rate",
    }
}

pub fn order_param(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    }
}

fn href(page: usize, sort: Option<SortKey>, order: SortOrder) -> String {
    match sort {
        Some(key) => format!("/?page={}&sort={}&order={}", page, sort_param(key), order_param(order)),
        None => format!("/?page={}", page),
    }
}

fn sort_header(label: &str, key: SortKey, req: &PageRequest) -> Markup {
    let active = req.sort == Some(key);
    let next = if active && req.order == SortOrder::Asc { SortOrder::Desc } else { SortOrder::Asc };
    let arrow = match (active, req.order) {
        (false, _) => "",
        (true, SortOrder::Asc) => " ▲",
        (true, SortOrder::Desc) => " ▼",
    };
    html! {
        th { a href=(href(1, Some(key), next)) { (label) (arrow) } }
    }
}

fn base_selector(current: &str) -> Markup {
    let known = SUPPORTED_BASES.iter().any(|(code, _)| *code == current);
    html! {
        form method="get" action="/" {
            select name="base" onchange="this.form.submit()" {
                @if !known {
                    option value=(current) selected { (current) }
                }
                @for (code, name) in SUPPORTED_BASES {
                    option value=(code) selected[code == current] { (code) " - " (name) }
                }
            }
            noscript { input type="submit" value="Show"; }
        }
    }
}

fn grid(page: &RatePage, req: &PageRequest) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { "Flag" }
                    (sort_header("Country", SortKey::Country, req))
                    (sort_header("Currency", SortKey::Currency, req))
                    (sort_header("Exchange Rate", SortKey::Rate, req))
                }
            }
            tbody {
                @for row in &page.rows {
                    tr {
                        td { img src=(row.flag) alt="Flag"; }
                        td { (row.country) }
                        td { (row.currency) }
                        td { (row.rate.to_string()) }
                    }
                }
            }
        }
        nav.pager {
            @if page.page > 1 {
                a href=(href(page.page - 1, req.sort, req.order)) { "Previous" }
            }
            span { "Page " (page.page) " of " (page.total_pages) " (" (page.total_rows) " rows)" }
            @if page.page < page.total_pages {
                a href=(href(page.page + 1, req.sort, req.order)) { "Next" }
            }
        }
    }
}

/// Full rates page. While loading, the page shows a placeholder and reloads itself.
pub fn rates_page(page: &RatePage, req: &PageRequest, doc_head: &Head, ad: Option<&MountedAd>) -> Markup {
    let loading = page.state == Phase::Loading;
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                @if loading {
                    meta http-equiv="refresh" content=(LOADING_REFRESH_SECS);
                }
                title { (TITLE) }
                style { (STYLE) }
                (doc_head)
            }
            body {
                div.card {
                    div.card-title {
                        span { (TITLE) }
                        (base_selector(&page.base))
                    }
                    div.card-content {
                        @if loading {
                            div.loading { "Loading..." }
                        } @else {
                            (grid(page, req))
                        }
                    }
                }
                @if let Some(ad) = ad {
                    (ad)
                }
            }
        }
    }
}
