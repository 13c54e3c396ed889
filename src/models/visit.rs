use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

use super::Month;

/// Page every process seeds its monthly counters against
pub const DEFAULT_PAGE: &str = "/";

/// One stored counter row, keyed by (month, page)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VisitRecord {
    pub month: String,
    pub page: String,
    pub count: i64,
}

/// Visit counts aggregated over every record of a process
///
/// Never stored; rebuilt from the rows on each query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    #[serde(default)]
    pub page_counts: BTreeMap<String, i64>,
    #[serde(default)]
    pub monthly_counts: BTreeMap<String, i64>,
    #[serde(default)]
    pub all_time_count: i64,
}

impl AggregateResult {
    /// Group records by month and by page, summing counts
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a VisitRecord>,
    {
        let mut result = Self::default();

        for record in records {
            *result
                .monthly_counts
                .entry(record.month.clone())
                .or_insert(0) += record.count;
            *result.page_counts.entry(record.page.clone()).or_insert(0) += record.count;
            result.all_time_count += record.count;
        }

        result
    }

    /// Sum over `page_counts`; equals `all_time_count` for any record set
    pub fn page_views(&self) -> i64 {
        self.page_counts.values().sum()
    }

    /// Monthly totals in calendar order
    ///
    /// Keys that are not canonical month names are left out.
    pub fn monthly_series(&self) -> Vec<(Month, i64)> {
        let mut series: Vec<(Month, i64)> = self
            .monthly_counts
            .iter()
            .filter_map(|(name, total)| name.parse::<Month>().ok().map(|month| (month, *total)))
            .collect();
        series.sort_by_key(|(month, _)| *month);
        series
    }

    /// Pages with the highest counts, ties broken by path
    pub fn top_pages(&self, limit: usize) -> Vec<(String, i64)> {
        let mut pages: Vec<(String, i64)> = self
            .page_counts
            .iter()
            .map(|(page, count)| (page.clone(), *count))
            .collect();
        pages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pages.truncate(limit);
        pages
    }
}
