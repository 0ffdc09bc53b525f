use std::collections::HashSet;

use statrs::statistics::Statistics;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::model::{AnalysisResult, Campaign, DailyRecord, PromoLift, SegmentAverages};
use crate::thresholds::REGULAR_MIN_QUANTITY;

/// Neumaier-compensated sum. Long daily series of large revenue figures lose
/// low-order digits under a naive left-to-right fold.
pub fn compensated_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for v in values {
        let t = sum + v;
        if f64::abs(sum) >= f64::abs(v) {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// Arithmetic mean, or `None` for an empty input.
///
/// statrs accumulates a running mean rather than a sum, so finite inputs of
/// one sign never overflow to infinity.
pub fn mean_of<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let mean = Statistics::mean(values);
    mean.is_finite().then_some(mean)
}

/// Money total that must stay representable.
pub fn checked_revenue_total<'a, I>(records: I, metric: &'static str) -> Result<f64>
where
    I: IntoIterator<Item = &'a DailyRecord>,
{
    let total = compensated_sum(records.into_iter().map(|r| r.revenue));
    if total.is_finite() {
        Ok(total)
    } else {
        Err(AnalysisError::Overflow { metric })
    }
}

pub fn checked_quantity_total<'a, I>(records: I, metric: &'static str) -> Result<u64>
where
    I: IntoIterator<Item = &'a DailyRecord>,
{
    records
        .into_iter()
        .try_fold(0u64, |acc, r| acc.checked_add(r.quantity_sold))
        .ok_or(AnalysisError::Overflow { metric })
}

/// Global metrics plus promotional vs regular comparison.
///
/// `campaigns_detected` is the number of campaigns found before top-N
/// selection; `top_campaigns` defines the promotional-day set. Returns
/// `Ok(None)` for an empty record sequence and an error when a total cannot
/// be represented.
pub fn aggregate(
    records: &[DailyRecord],
    top_campaigns: Vec<Campaign>,
    campaigns_detected: usize,
) -> Result<Option<AnalysisResult>> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Ok(None);
    };
    let record_count = records.len();

    let total_revenue = checked_revenue_total(records, "total revenue")?;
    let total_quantity = checked_quantity_total(records, "total quantity")?;

    let prices: Vec<f64> = records.iter().map(|r| r.unit_price).collect();
    let avg_unit_price =
        mean_of(prices.iter().copied()).ok_or(AnalysisError::Overflow { metric: "average unit price" })?;
    let min_unit_price = Statistics::min(&prices);
    let max_unit_price = Statistics::max(&prices);
    let avg_gross_profit_pct = mean_of(records.iter().filter_map(|r| r.gross_profit_pct));

    // Records may be cloned between stages, so membership is by date text.
    let promo_dates: HashSet<&str> = top_campaigns
        .iter()
        .flat_map(|c| c.records())
        .map(|r| r.raw_date_text.as_str())
        .collect();

    let promo_days: Vec<&DailyRecord> = top_campaigns.iter().flat_map(|c| c.records()).collect();
    let regular_days: Vec<&DailyRecord> = records
        .iter()
        .filter(|r| !promo_dates.contains(r.raw_date_text.as_str()))
        .filter(|r| r.quantity_sold > REGULAR_MIN_QUANTITY)
        .collect();

    let promotional = segment_averages(&promo_days);
    let regular = segment_averages(&regular_days);
    let lift = match (&promotional, &regular) {
        (Some(p), Some(r)) => promo_lift(p, r),
        _ => None,
    };

    debug!(
        promo_days = promo_days.len(),
        regular_days = regular_days.len(),
        "computed aggregates"
    );

    Ok(Some(AnalysisResult {
        record_count,
        first_date: first.date,
        last_date: last.date,
        avg_unit_price,
        min_unit_price,
        max_unit_price,
        avg_gross_profit_pct,
        total_revenue,
        total_quantity,
        avg_daily_revenue: total_revenue / record_count as f64,
        avg_daily_quantity: total_quantity as f64 / record_count as f64,
        campaigns_detected,
        top_campaigns,
        promotional,
        regular,
        lift,
    }))
}

/// `None` only for an empty set.
pub fn segment_averages(days: &[&DailyRecord]) -> Option<SegmentAverages> {
    Some(SegmentAverages {
        days: days.len(),
        avg_unit_price: mean_of(days.iter().map(|r| r.unit_price))?,
        avg_quantity: mean_of(days.iter().map(|r| r.quantity_sold as f64))?,
        avg_revenue: mean_of(days.iter().map(|r| r.revenue))?,
        avg_gross_profit_pct: mean_of(days.iter().filter_map(|r| r.gross_profit_pct)),
    })
}

pub fn promo_lift(promo: &SegmentAverages, regular: &SegmentAverages) -> Option<PromoLift> {
    let lift_pct = |p: f64, r: f64| {
        let v = (p / r - 1.0) * 100.0;
        v.is_finite().then_some(v)
    };

    let gross_profit_delta_pct = match (promo.avg_gross_profit_pct, regular.avg_gross_profit_pct) {
        (Some(p), Some(r)) => Some(p - r).filter(|d| d.is_finite()),
        _ => None,
    };

    Some(PromoLift {
        revenue_lift_pct: lift_pct(promo.avg_revenue, regular.avg_revenue)?,
        quantity_lift_pct: lift_pct(promo.avg_quantity, regular.avg_quantity)?,
        price_change_pct: lift_pct(promo.avg_unit_price, regular.avg_unit_price)?,
        gross_profit_delta_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32, revenue: f64, cost: f64, qty: u64) -> DailyRecord {
        let date = NaiveDate::from_ymd_opt(2020, 1, d).unwrap();
        DailyRecord::new(date, format!("{:02}/01/2020", d), revenue, cost, qty).unwrap()
    }

    #[test]
    fn compensated_sum_keeps_small_terms() {
        let values = [1e16, 1.0, -1e16];
        assert_eq!(compensated_sum(values), 1.0);
        assert_eq!(values.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn mean_of_empty_is_undefined() {
        assert_eq!(mean_of(Vec::new()), None);
        assert_eq!(mean_of(vec![2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn aggregate_empty_is_undefined() {
        assert!(aggregate(&[], Vec::new(), 0).unwrap().is_none());
    }

    #[test]
    fn global_metrics() {
        let records = vec![day(1, 100.0, 60.0, 10), day(2, 90.0, 55.0, 9), day(3, 60.0, 30.0, 12)];
        let result = aggregate(&records, Vec::new(), 0).unwrap().unwrap();
        assert_eq!(result.record_count, 3);
        assert_eq!(result.total_quantity, 31);
        assert!((result.total_revenue - 250.0).abs() < 1e-9);
        assert!((result.min_unit_price - 5.0).abs() < 1e-9);
        assert!((result.max_unit_price - 10.0).abs() < 1e-9);
        assert!((result.avg_unit_price - 25.0 / 3.0).abs() < 1e-9);
        assert!((result.avg_daily_quantity - 31.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.first_date, records[0].date);
        assert_eq!(result.last_date, records[2].date);
    }

    #[test]
    fn no_campaigns_means_no_lift() {
        let records = vec![day(1, 20_000.0, 15_000.0, 2000), day(2, 20_000.0, 15_000.0, 2000)];
        let result = aggregate(&records, Vec::new(), 0).unwrap().unwrap();
        assert!(result.promotional.is_none());
        assert_eq!(result.regular.unwrap().days, 2);
        assert!(result.lift.is_none());
    }

    #[test]
    fn regular_days_exclude_promo_and_low_volume() {
        let records = vec![
            day(1, 20_000.0, 15_000.0, 2000),
            day(2, 30_000.0, 28_000.0, 6000),
            day(3, 30_000.0, 28_000.0, 6000),
            day(4, 5_000.0, 4_000.0, 500),
            day(5, 20_000.0, 15_000.0, 2000),
        ];
        let campaign = Campaign::new(records[1..3].to_vec());
        let result = aggregate(&records, vec![campaign], 1).unwrap().unwrap();

        let promo = result.promotional.unwrap();
        let regular = result.regular.unwrap();
        assert_eq!(promo.days, 2);
        assert_eq!(regular.days, 2);
        assert!((promo.avg_quantity - 6000.0).abs() < 1e-9);
        assert!((regular.avg_unit_price - 10.0).abs() < 1e-9);

        let lift = result.lift.unwrap();
        assert!((lift.revenue_lift_pct - 50.0).abs() < 1e-9);
        assert!((lift.quantity_lift_pct - 200.0).abs() < 1e-9);
        assert!((lift.price_change_pct - (-50.0)).abs() < 1e-9);
        assert!((lift.gross_profit_delta_pct.unwrap() - (6.0 + 2.0 / 3.0 - 25.0)).abs() < 1e-9);
    }

    #[test]
    fn quantity_total_overflow_is_an_error() {
        let records = vec![day(1, 100.0, 50.0, u64::MAX), day(2, 100.0, 50.0, 10)];
        let err = aggregate(&records, Vec::new(), 0).unwrap_err();
        assert!(matches!(err, AnalysisError::Overflow { metric: "total quantity" }));
    }

    #[test]
    fn revenue_total_overflow_is_an_error() {
        let records = vec![day(1, 1.7e308, 1.0, 1), day(2, 1.7e308, 1.0, 1)];
        let err = aggregate(&records, Vec::new(), 0).unwrap_err();
        assert!(matches!(err, AnalysisError::Overflow { metric: "total revenue" }));
    }

    #[test]
    fn huge_values_keep_finite_means() {
        let values = vec![1.7e308, 1.7e308, 1.0];
        let mean = mean_of(values).unwrap();
        assert!(mean.is_finite());
        assert!(mean > 1.0e308);
    }

    #[test]
    fn zero_revenue_day_has_no_gross_profit_pct() {
        let records = vec![day(1, 0.0, 10.0, 5), day(2, 100.0, 60.0, 10)];
        assert!(records[0].gross_profit_pct.is_none());
        let result = aggregate(&records, Vec::new(), 0).unwrap().unwrap();
        assert_eq!(result.record_count, 2);
        assert!((result.avg_gross_profit_pct.unwrap() - 40.0).abs() < 1e-9);
        assert!((result.min_unit_price - 0.0).abs() < 1e-12);
    }
}
