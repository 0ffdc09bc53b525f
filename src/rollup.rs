use std::collections::HashMap;

use chrono::Datelike;
use tracing::debug;

use crate::error::Result;
use crate::model::{DailyRecord, MonthlyBucket};
use crate::stats::{checked_quantity_total, checked_revenue_total, mean_of};

/// Group records by calendar month. Buckets come out in order of first
/// appearance, which is chronological for date-sorted input.
pub fn monthly_rollup(records: &[DailyRecord]) -> Result<Vec<MonthlyBucket>> {
    let mut order: Vec<(i32, u32)> = Vec::new();
    let mut groups: HashMap<(i32, u32), Vec<&DailyRecord>> = HashMap::new();

    for record in records {
        let key = (record.date.year(), record.date.month());
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    let mut buckets = Vec::with_capacity(order.len());
    for key in order {
        if let Some(days) = groups.remove(&key) {
            buckets.extend(build_bucket(key, &days)?);
        }
    }

    debug!(months = buckets.len(), "rolled up monthly buckets");
    Ok(buckets)
}

fn build_bucket((year, month): (i32, u32), days: &[&DailyRecord]) -> Result<Option<MonthlyBucket>> {
    let Some(avg_unit_price) = mean_of(days.iter().map(|r| r.unit_price)) else {
        return Ok(None);
    };

    Ok(Some(MonthlyBucket {
        key: format!("{}-{:02}", year, month),
        year,
        month,
        days: days.len(),
        avg_unit_price,
        total_quantity: checked_quantity_total(days.iter().copied(), "monthly quantity")?,
        total_revenue: checked_revenue_total(days.iter().copied(), "monthly revenue")?,
        avg_gross_profit_pct: mean_of(days.iter().filter_map(|r| r.gross_profit_pct)),
    }))
}
