use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::stats::mean_of;

/// Trailing-window deviation of one day's metrics, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Momentum {
    pub price_change_pct: f64,
    pub quantity_change_pct: f64,
}

/// One trading day with its derived unit economics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub raw_date_text: String,

    pub revenue: f64,
    pub cost_of_sales: f64,
    pub quantity_sold: u64,

    pub unit_price: f64,
    pub gross_profit: f64,
    pub gross_profit_pct: Option<f64>, // None when revenue is zero

    pub momentum: Option<Momentum>, // None for the first 7 days
}

impl DailyRecord {
    /// Builds a record and its derived fields. Returns `None` for a zero
    /// quantity, a negative or non-finite amount, or an undefined unit price,
    /// so callers can drop the row.
    pub fn new(
        date: NaiveDate,
        raw_date_text: impl Into<String>,
        revenue: f64,
        cost_of_sales: f64,
        quantity_sold: u64,
    ) -> Option<Self> {
        if quantity_sold == 0 || !revenue.is_finite() || !cost_of_sales.is_finite() {
            return None;
        }
        if revenue < 0.0 || cost_of_sales < 0.0 {
            return None;
        }

        let unit_price = revenue / quantity_sold as f64;
        if !unit_price.is_finite() {
            return None;
        }
        let gross_profit = revenue - cost_of_sales;
        let gross_profit_pct = Some(gross_profit / revenue * 100.0).filter(|p| p.is_finite());

        Some(DailyRecord {
            date,
            raw_date_text: raw_date_text.into(),
            revenue,
            cost_of_sales,
            quantity_sold,
            unit_price,
            gross_profit,
            gross_profit_pct,
            momentum: None,
        })
    }

    pub fn price_change_pct(&self) -> Option<f64> {
        self.momentum.map(|m| m.price_change_pct)
    }

    pub fn quantity_change_pct(&self) -> Option<f64> {
        self.momentum.map(|m| m.quantity_change_pct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Elasticity {
    /// Quantity moves proportionally more than price (|PED| > 1).
    Elastic,
    Inelastic,
}

impl Elasticity {
    pub fn classify(ped: f64) -> Self {
        if ped.abs() > 1.0 {
            Elasticity::Elastic
        } else {
            Elasticity::Inelastic
        }
    }
}

/// A run of promotion days grouped by the gap-tolerant clustering rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    records: Vec<DailyRecord>,
}

impl Campaign {
    pub(crate) fn new(records: Vec<DailyRecord>) -> Self {
        Campaign { records }
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn days(&self) -> usize {
        self.records.len()
    }

    pub fn start_date_text(&self) -> Option<&str> {
        self.records.first().map(|r| r.raw_date_text.as_str())
    }

    pub fn end_date_text(&self) -> Option<&str> {
        self.records.last().map(|r| r.raw_date_text.as_str())
    }

    pub fn avg_unit_price(&self) -> Option<f64> {
        mean_of(self.records.iter().map(|r| r.unit_price))
    }

    pub fn avg_quantity(&self) -> Option<f64> {
        mean_of(self.records.iter().map(|r| r.quantity_sold as f64))
    }

    /// Mean price change over the campaign. Undefined if any day lacks momentum.
    pub fn avg_price_change_pct(&self) -> Option<f64> {
        let changes: Option<Vec<f64>> = self.records.iter().map(|r| r.price_change_pct()).collect();
        mean_of(changes?)
    }

    pub fn avg_quantity_change_pct(&self) -> Option<f64> {
        let changes: Option<Vec<f64>> =
            self.records.iter().map(|r| r.quantity_change_pct()).collect();
        mean_of(changes?)
    }

    /// Price elasticity of demand: average quantity change over average price change.
    pub fn price_elasticity(&self) -> Option<f64> {
        let price_change = self.avg_price_change_pct()?;
        let quantity_change = self.avg_quantity_change_pct()?;
        if price_change == 0.0 {
            return None;
        }
        let ped = quantity_change / price_change;
        ped.is_finite().then_some(ped)
    }

    pub fn elasticity(&self) -> Option<Elasticity> {
        self.price_elasticity().map(Elasticity::classify)
    }

    pub fn summary(&self) -> CampaignSummary {
        CampaignSummary {
            start_date: self.start_date_text().unwrap_or_default().to_string(),
            end_date: self.end_date_text().unwrap_or_default().to_string(),
            days: self.days(),
            avg_unit_price: self.avg_unit_price(),
            avg_quantity: self.avg_quantity(),
            avg_price_change_pct: self.avg_price_change_pct(),
            avg_quantity_change_pct: self.avg_quantity_change_pct(),
            price_elasticity: self.price_elasticity(),
            elasticity: self.elasticity(),
        }
    }
}

/// Flattened view of a campaign for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub start_date: String,
    pub end_date: String,
    pub days: usize,
    pub avg_unit_price: Option<f64>,
    pub avg_quantity: Option<f64>,
    pub avg_price_change_pct: Option<f64>,
    pub avg_quantity_change_pct: Option<f64>,
    pub price_elasticity: Option<f64>,
    pub elasticity: Option<Elasticity>,
}

/// Per-day averages over a set of trading days (promotional or regular).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentAverages {
    pub days: usize,
    pub avg_unit_price: f64,
    pub avg_quantity: f64,
    pub avg_revenue: f64,
    pub avg_gross_profit_pct: Option<f64>, // None if no day has a defined GP%
}

/// Promotional performance relative to the regular baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PromoLift {
    pub revenue_lift_pct: f64,
    pub quantity_lift_pct: f64,
    pub price_change_pct: f64,
    pub gross_profit_delta_pct: Option<f64>, // percentage points
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub record_count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,

    pub avg_unit_price: f64,
    pub min_unit_price: f64,
    pub max_unit_price: f64,
    pub avg_gross_profit_pct: Option<f64>,

    pub total_revenue: f64,
    pub total_quantity: u64,
    pub avg_daily_revenue: f64,
    pub avg_daily_quantity: f64,

    pub campaigns_detected: usize, // before top-N selection
    #[serde(rename = "campaigns", serialize_with = "serialize_summaries")]
    pub top_campaigns: Vec<Campaign>,

    pub promotional: Option<SegmentAverages>,
    pub regular: Option<SegmentAverages>,
    pub lift: Option<PromoLift>,
}

impl AnalysisResult {
    pub fn campaign_summaries(&self) -> Vec<CampaignSummary> {
        self.top_campaigns.iter().map(Campaign::summary).collect()
    }
}

fn serialize_summaries<S: Serializer>(campaigns: &[Campaign], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(campaigns.iter().map(Campaign::summary))
}

/// One calendar month of trading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub key: String, // "YYYY-MM"
    pub year: i32,
    pub month: u32,
    pub days: usize,
    pub avg_unit_price: f64,
    pub total_quantity: u64,
    pub total_revenue: f64,
    pub avg_gross_profit_pct: Option<f64>,
}
