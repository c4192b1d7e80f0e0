//! Client-side search and aggregate statistics over a page of listings

use std::collections::BTreeMap;

use crate::list::STATUS_ACTIVE;
use crate::types::{IpoInfo, MarketOverview, OverviewStatistics, SearchOutput};

/// Filter listings by stock name, ignoring case
///
/// A substring match by default; `exact_match` requires the whole name to match.
pub fn search_by_name(items: &[IpoInfo], keyword: &str, exact_match: bool) -> SearchOutput {
    let needle = keyword.trim().to_lowercase();

    let matched: Vec<IpoInfo> = items
        .iter()
        .filter(|item| {
            let name = item.stock_name.to_lowercase();
            if exact_match {
                name == needle
            } else {
                name.contains(&needle)
            }
        })
        .cloned()
        .collect();

    SearchOutput {
        keyword: keyword.to_string(),
        exact_match,
        matched_count: matched.len(),
        items: matched,
    }
}

/// Mean of the finite, strictly positive values; `0` when there are none
pub fn calculate_average(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|n| n.is_finite() && *n > 0.0)
        .fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Number of listings per non-empty industry label
pub fn industry_distribution(items: &[IpoInfo]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for item in items.iter().filter(|item| !item.industry.is_empty()) {
        *distribution.entry(item.industry.clone()).or_insert(0) += 1;
    }
    distribution
}

pub fn build_market_overview(items: &[IpoInfo], days: u32, generated_at: &str) -> MarketOverview {
    MarketOverview {
        total_ipos: items.len(),
        period: format!("last {days} days"),
        statistics: OverviewStatistics {
            active_ipos: items
                .iter()
                .filter(|item| item.status == STATUS_ACTIVE)
                .count(),
            avg_market_cap: calculate_average(items.iter().map(|item| item.market_cap)),
            avg_pe_ratio: calculate_average(items.iter().map(|item| item.pe_ratio)),
            industries: industry_distribution(items),
        },
        last_updated: generated_at.to_string(),
    }
}
