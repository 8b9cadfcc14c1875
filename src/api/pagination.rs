// ABOUTME: Page-number pagination for the activity listing endpoint
// ABOUTME: Clamps page sizes and renders the per-page query with optional time filters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use strava_core::constants::pagination::{FIRST_PAGE, MAX_PER_PAGE, MIN_PER_PAGE};

/// Clamp a requested page size into the range the provider serves
#[must_use]
pub fn clamp_per_page(per_page: u32) -> u32 {
    per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE)
}

/// Filters held constant across a whole activity walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityQuery {
    per_page: u32,
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
}

impl ActivityQuery {
    /// Query with the given page size, clamped into `[1, 200]`
    #[must_use]
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: clamp_per_page(per_page),
            before: None,
            after: None,
        }
    }

    /// Only activities that started before `before`
    #[must_use]
    pub const fn before(mut self, before: Option<DateTime<Utc>>) -> Self {
        self.before = before;
        self
    }

    /// Only activities that started after `after`
    #[must_use]
    pub const fn after(mut self, after: Option<DateTime<Utc>>) -> Self {
        self.after = after;
        self
    }

    /// Effective page size
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Query string for one page; time filters go out as epoch seconds
    #[must_use]
    pub fn params(&self, cursor: &PageCursor) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("per_page", self.per_page.to_string()),
            ("page", cursor.page().to_string()),
        ];
        if let Some(before) = self.before {
            params.push(("before", before.timestamp().to_string()));
        }
        if let Some(after) = self.after {
            params.push(("after", after.timestamp().to_string()));
        }
        params
    }
}

/// Position in a page walk, starting at page 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
}

impl PageCursor {
    /// Cursor on the first page
    #[must_use]
    pub const fn start() -> Self {
        Self { page: FIRST_PAGE }
    }

    /// Current page number
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Move to the next page
    pub fn advance(&mut self) {
        self.page = self.page.saturating_add(1);
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_per_page(0), 1);
        assert_eq!(clamp_per_page(50), 50);
        assert_eq!(clamp_per_page(1000), 200);
    }

    #[test]
    fn params_include_epoch_filters() {
        let before = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid");
        let query = ActivityQuery::new(2).before(Some(before));
        let mut cursor = PageCursor::start();
        cursor.advance();

        let params = query.params(&cursor);
        assert_eq!(
            params,
            vec![
                ("per_page", "2".to_owned()),
                ("page", "2".to_owned()),
                ("before", "1704067200".to_owned()),
            ]
        );
    }
}
