//! Cost estimate shown before a conversion is started.

use serde::Serialize;
use std::fmt;

/// Price the service charges per converted page, in US cents.
pub const COST_PER_PAGE_CENTS: u64 = 10;

/// Estimated cost of converting a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceEstimate {
    pub pages: usize,
    pub total_cents: u64,
}

/// Price `pages` pages at [`COST_PER_PAGE_CENTS`].
pub fn estimate(pages: usize) -> PriceEstimate {
    PriceEstimate {
        pages,
        total_cents: (pages as u64).saturating_mul(COST_PER_PAGE_CENTS),
    }
}

impl fmt::Display for PriceEstimate {
    /// Formats the total as US dollars, e.g. `$1,234.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = (self.total_cents / 100).to_string();
        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "${}.{:02}", grouped, self.total_cents % 100)
    }
}
