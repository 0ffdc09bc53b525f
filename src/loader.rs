//! CSV sales loader and record parser.
//!
//! Expected CSV columns (header row skipped):
//!   date (DD/MM/YYYY), revenue, cost_of_sales, quantity_sold
//!
//! Rows that cannot become a valid `DailyRecord` are dropped and counted,
//! never reported as errors.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::model::DailyRecord;

/// One untyped input row, fields in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub date: String,
    pub revenue: String,
    pub cost_of_sales: String,
    pub quantity: String,
}

impl RawRow {
    pub fn new(date: &str, revenue: &str, cost_of_sales: &str, quantity: &str) -> Self {
        RawRow {
            date: date.to_string(),
            revenue: revenue.to_string(),
            cost_of_sales: cost_of_sales.to_string(),
            quantity: quantity.to_string(),
        }
    }

    /// Missing trailing fields become empty strings, which fail parsing later.
    fn from_fields<'a>(mut fields: impl Iterator<Item = &'a str>) -> Self {
        let mut next = || fields.next().unwrap_or_default().to_string();
        RawRow {
            date: next(),
            revenue: next(),
            cost_of_sales: next(),
            quantity: next(),
        }
    }
}

/// Parser output: the date-sorted records plus how many rows were dropped.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<DailyRecord>,
    pub dropped: usize,
}

/// Read raw rows from CSV text. Only stream-level failures are errors.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.byte_records() {
        let record = result?;
        let fields: Vec<String> = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        rows.push(RawRow::from_fields(fields.iter().map(String::as_str)));
    }

    Ok(rows)
}

pub fn read_rows_file(path: impl AsRef<Path>) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

/// Turn raw rows into date-sorted daily records, dropping invalid rows.
pub fn parse_records(rows: &[RawRow]) -> ParsedRecords {
    let mut records: Vec<DailyRecord> = rows.iter().filter_map(parse_row).collect();
    let dropped = rows.len() - records.len();

    // Same calendar day written two ways ("1/1/2020", "01/01/2020") orders by text.
    records.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.raw_date_text.cmp(&b.raw_date_text))
    });

    debug!(parsed = records.len(), dropped, "parsed sales rows");

    ParsedRecords { records, dropped }
}

pub fn parse_row(row: &RawRow) -> Option<DailyRecord> {
    let raw_date = row.date.trim();
    let date = parse_date(raw_date)?;
    let revenue = parse_amount(&row.revenue)?;
    let cost_of_sales = parse_amount(&row.cost_of_sales)?;
    let quantity = parse_quantity(&row.quantity)?;

    DailyRecord::new(date, raw_date, revenue, cost_of_sales, quantity)
}

/// Day/month/year, slash separated, components padded or not. The year is taken as written.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.trim().split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_amount(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// Accepts "1200" and "1200.0", rejects fractional or negative counts.
fn parse_quantity(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Ok(q) = text.parse::<u64>() {
        return Some(q);
    }
    let q = text.parse::<f64>().ok()?;
    if q.is_finite() && q >= 0.0 && q.fract() == 0.0 && q <= u64::MAX as f64 {
        Some(q as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Date,Sales,Cost Of Sales,Quantity Sold
02/01/2020, 90, 55, 9
01/01/2020,100,60,10
3/1/2020,abc,60,10
04/01/2020,100,60,0
05/01/2020,100,60
";

    #[test]
    fn read_sample_csv() {
        let rows = read_rows(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], RawRow::new("02/01/2020", "90", "55", "9"));
        assert_eq!(rows[4].quantity, "");
    }

    #[test]
    fn parse_drops_invalid_rows_and_sorts() {
        let rows = read_rows(SAMPLE_CSV.as_bytes()).unwrap();
        let parsed = parse_records(&rows);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.dropped, 3);
        assert_eq!(parsed.records[0].raw_date_text, "01/01/2020");
        assert_eq!(parsed.records[1].raw_date_text, "02/01/2020");
    }

    #[test]
    fn derived_unit_economics() {
        let rows = vec![
            RawRow::new("01/01/2020", "100", "60", "10"),
            RawRow::new("02/01/2020", "90", "55", "9"),
        ];
        let parsed = parse_records(&rows);
        let r = &parsed.records;
        assert_eq!(r.len(), 2);
        assert!((r[0].unit_price - 10.0).abs() < 1e-9);
        assert!((r[1].unit_price - 10.0).abs() < 1e-9);
        assert!((r[0].gross_profit_pct.unwrap() - 40.0).abs() < 1e-9);
        assert!((r[1].gross_profit_pct.unwrap() - 38.89).abs() < 0.005);
        assert!((r[0].gross_profit - 40.0).abs() < 1e-9);
        assert!(r.iter().all(|d| d.momentum.is_none()));
    }

    #[test]
    fn zero_quantity_never_survives() {
        for (rev, cost) in [("0", "0"), ("100", "50"), ("-5", "3"), ("1e9", "0")] {
            let rows = vec![RawRow::new("01/01/2020", rev, cost, "0")];
            assert!(parse_records(&rows).records.is_empty());
        }
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("1/2/2015"), NaiveDate::from_ymd_opt(2015, 2, 1));
        assert_eq!(parse_date("01/02/2015"), NaiveDate::from_ymd_opt(2015, 2, 1));
        assert_eq!(parse_date(" 28/11/2016 "), NaiveDate::from_ymd_opt(2016, 11, 28));
        assert_eq!(parse_date("31/02/2020"), None);
        assert_eq!(parse_date("2020-01-01"), None);
        assert_eq!(parse_date("1/2/2015/3"), None);
    }

    #[test]
    fn quantity_variants() {
        assert_eq!(parse_quantity("1200"), Some(1200));
        assert_eq!(parse_quantity("1200.0"), Some(1200));
        assert_eq!(parse_quantity("12.5"), None);
        assert_eq!(parse_quantity("-3"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn zero_revenue_is_kept_without_gross_profit_pct() {
        let rows = vec![RawRow::new("01/01/2020", "0", "10", "5")];
        let parsed = parse_records(&rows);
        assert_eq!(parsed.dropped, 0);
        assert_eq!(parsed.records[0].unit_price, 0.0);
        assert!((parsed.records[0].gross_profit - (-10.0)).abs() < 1e-9);
        assert_eq!(parsed.records[0].gross_profit_pct, None);
    }

    #[test]
    fn negative_amounts_are_dropped() {
        let rows = vec![
            RawRow::new("01/01/2020", "-5", "10", "5"),
            RawRow::new("02/01/2020", "50", "-1", "5"),
        ];
        assert_eq!(parse_records(&rows).dropped, 2);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let csv_data = "a,b,c,d\n01/01/2020,100,60,10,extra\n";
        let rows = read_rows(csv_data.as_bytes()).unwrap();
        let parsed = parse_records(&rows);
        assert_eq!(parsed.records.len(), 1);
    }
}
