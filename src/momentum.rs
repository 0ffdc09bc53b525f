//! Trailing-window momentum: how far each day's price and volume sit from the
//! simple average of the preceding `MOMENTUM_WINDOW` days.

use crate::model::{DailyRecord, Momentum};
use crate::stats::mean_of;
use crate::thresholds::MOMENTUM_WINDOW;

/// Returns a new sequence with momentum set on every record that has a full
/// trailing window. The input must already be date-sorted.
pub fn annotate_momentum(records: &[DailyRecord]) -> Vec<DailyRecord> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut annotated = record.clone();
            annotated.momentum = if i >= MOMENTUM_WINDOW {
                trailing_momentum(record, &records[i - MOMENTUM_WINDOW..i])
            } else {
                None
            };
            annotated
        })
        .collect()
}

fn trailing_momentum(record: &DailyRecord, window: &[DailyRecord]) -> Option<Momentum> {
    let avg_price = mean_of(window.iter().map(|r| r.unit_price))?;
    let avg_quantity = mean_of(window.iter().map(|r| r.quantity_sold as f64))?;

    let price_change_pct = pct_change(record.unit_price, avg_price)?;
    let quantity_change_pct = pct_change(record.quantity_sold as f64, avg_quantity)?;

    Some(Momentum {
        price_change_pct,
        quantity_change_pct,
    })
}

fn pct_change(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    let change = (value - baseline) / baseline * 100.0;
    change.is_finite().then_some(change)
}
