//! Plain-text dashboard built from aggregate counts

use std::fmt;

use crate::models::{AggregateResult, Month};

const TOP_PAGES: usize = 5;
const BAR_WIDTH: usize = 40;

/// Summary cards, monthly series and top pages for one process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardView {
    pub total_visitors: i64,
    /// Distinct visitors are not tracked
    pub unique_visitors: Option<i64>,
    pub page_views: i64,
    /// Visit durations are not tracked
    pub avg_visit_secs: Option<i64>,
    pub monthly: Vec<(Month, i64)>,
    pub top_pages: Vec<(String, i64)>,
}

impl DashboardView {
    /// Build the view; `None` (no data) gives zeroed cards and empty lists
    pub fn new(counts: Option<&AggregateResult>) -> Self {
        let Some(counts) = counts else {
            return Self::default();
        };

        Self {
            total_visitors: counts.all_time_count,
            unique_visitors: None,
            page_views: counts.page_views(),
            avg_visit_secs: None,
            monthly: counts.monthly_series(),
            top_pages: counts.top_pages(TOP_PAGES),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analytics Dashboard")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "{:<22} {}", "Total Visitors", self.total_visitors)?;
        writeln!(f, "{:<22} {}", "Unique Visitors", or_na(self.unique_visitors))?;
        writeln!(f, "{:<22} {}", "Page Views", self.page_views)?;
        writeln!(
            f,
            "{:<22} {}",
            "Avg. Visit Duration",
            self.avg_visit_secs
                .map(|secs| format!("{secs}s"))
                .unwrap_or_else(|| "N/A".to_string())
        )?;

        writeln!(f)?;
        writeln!(f, "Visitor Overview")?;
        writeln!(f, "{}", "-".repeat(60))?;
        if self.monthly.is_empty() {
            writeln!(f, "(no data)")?;
        }
        let max = self.monthly.iter().map(|(_, total)| *total).max().unwrap_or(0);
        for (month, total) in &self.monthly {
            writeln!(
                f,
                "{:<10} {:<width$} {}",
                month.as_str(),
                "#".repeat(bar_len(*total, max)),
                total,
                width = BAR_WIDTH
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Top Pages")?;
        writeln!(f, "{}", "-".repeat(60))?;
        if self.top_pages.is_empty() {
            writeln!(f, "(no data)")?;
        }
        for (rank, (page, visits)) in self.top_pages.iter().enumerate() {
            writeln!(f, "{:>2}. {:<40} {} visits", rank + 1, page, visits)?;
        }

        Ok(())
    }
}

fn or_na(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn bar_len(total: i64, max: i64) -> usize {
    if total <= 0 || max <= 0 {
        return 0;
    }
    let scaled = (total as u128 * BAR_WIDTH as u128).div_ceil(max as u128);
    usize::try_from(scaled).unwrap_or(BAR_WIDTH).min(BAR_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitRecord;

    fn counts() -> AggregateResult {
        let records = [
            ("March", "/", 4),
            ("January", "/", 1),
            ("January", "/pricing", 6),
            ("March", "/blog", 2),
            ("March", "/docs", 1),
            ("March", "/about", 3),
            ("March", "/careers", 1),
        ]
        .map(|(month, page, count)| VisitRecord {
            month: month.to_string(),
            page: page.to_string(),
            count,
        });
        AggregateResult::from_records(&records)
    }

    #[test]
    fn test_view_without_data() {
        let view = DashboardView::new(None);
        assert_eq!(view, DashboardView::default());

        let rendered = view.render();
        assert!(rendered.contains(&format!("{:<22} {}", "Total Visitors", 0)));
        assert!(rendered.contains("(no data)"));
        assert_eq!(rendered, format!("{view}"));
    }

    #[test]
    fn test_view_cards_and_series() {
        let counts = counts();
        let view = DashboardView::new(Some(&counts));

        assert_eq!(view.total_visitors, 18);
        assert_eq!(view.page_views, 18);
        assert_eq!(view.unique_visitors, None);
        assert_eq!(view.monthly, vec![(Month::January, 7), (Month::March, 11)]);
        assert_eq!(view.top_pages.len(), 5);
        assert_eq!(view.top_pages[0], ("/pricing".to_string(), 6));
        assert_eq!(view.top_pages[1], ("/".to_string(), 5));
        assert_eq!(view.top_pages[4], ("/careers".to_string(), 1));
    }

    #[test]
    fn test_render_lists_months_in_order() {
        let counts = counts();
        let rendered = DashboardView::new(Some(&counts)).render();

        let january = rendered.find("January").unwrap();
        let march = rendered.find("March").unwrap();
        assert!(january < march);
        assert!(rendered.contains(" 1. /pricing"));
        assert!(rendered.contains(&format!("{:<22} {}", "Unique Visitors", "N/A")));
    }

    #[test]
    fn test_bar_len_scales_to_max() {
        assert_eq!(bar_len(0, 10), 0);
        assert_eq!(bar_len(10, 10), BAR_WIDTH);
        assert_eq!(bar_len(5, 10), BAR_WIDTH / 2);
        assert_eq!(bar_len(1, 1000), 1);
    }
}
