use tracing::warn;

use super::reference::ReferenceTables;
use super::types::{RateMatch, Rates};

// First closed range containing the multiple wins; shared boundaries take the lower band.
pub fn lookup_rates(tables: &ReferenceTables, daily_wage: f64, index_daily: f64) -> Rates {
    debug_assert!(index_daily > 0.0, "index must be positive");
    let wage_multiple = daily_wage / index_daily;

    let matched = tables
        .percent_table
        .iter()
        .position(|band| band.range_min <= wage_multiple && wage_multiple <= band.range_max);

    let (band, matched) = match matched {
        Some(idx) => (tables.percent_table.get(idx), RateMatch::Band(idx)),
        None => {
            warn!(
                wage_multiple,
                daily_wage, index_daily, "no percent band matched; using top band"
            );
            (tables.percent_table.last(), RateMatch::Fallback)
        }
    };

    let (basic_pct, increment_pct) = band
        .map(|b| (b.basic_quantity_pct, b.annual_increment_pct))
        .unwrap_or((0.0, 0.0));

    Rates {
        wage_multiple,
        basic_quantity: basic_pct / 100.0,
        increment: increment_pct / 100.0,
        matched,
    }
}
