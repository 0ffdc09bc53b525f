use tracing::debug;

use crate::model::{Campaign, DailyRecord};
use crate::thresholds::{
    CAMPAIGN_MAX_GAP_DAYS, CAMPAIGN_MIN_DAYS, PROMO_MIN_QUANTITY, PROMO_PRICE_DROP_PCT,
    TOP_CAMPAIGNS,
};

/// Detected campaigns, longest first, plus how many qualified before the top-N cut.
#[derive(Debug, Clone, Default)]
pub struct CampaignDetection {
    pub top: Vec<Campaign>,
    pub detected: usize,
}

/// A promotion day trades noticeably below its trailing price on high volume.
/// Days without momentum never qualify.
pub fn is_promotion_day(record: &DailyRecord) -> bool {
    match record.price_change_pct() {
        Some(change) => change < PROMO_PRICE_DROP_PCT && record.quantity_sold > PROMO_MIN_QUANTITY,
        None => false,
    }
}

/// Group date-sorted promotion days into campaigns. A day joins the running
/// cluster when it is at most `CAMPAIGN_MAX_GAP_DAYS` after the cluster's last
/// day. Clusters shorter than `CAMPAIGN_MIN_DAYS` are discarded. Campaigns are
/// returned in discovery order.
pub fn cluster_promotions<'a, I>(promo_days: I) -> Vec<Campaign>
where
    I: IntoIterator<Item = &'a DailyRecord>,
{
    let mut campaigns = Vec::new();
    let mut current: Vec<DailyRecord> = Vec::new();
    let mut discarded = 0usize;

    let mut close = |cluster: Vec<DailyRecord>, campaigns: &mut Vec<Campaign>| {
        if cluster.len() >= CAMPAIGN_MIN_DAYS {
            campaigns.push(Campaign::new(cluster));
        } else if !cluster.is_empty() {
            discarded += 1;
        }
    };

    for day in promo_days {
        let joins = match current.last() {
            Some(prev) => (day.date - prev.date).num_days() <= CAMPAIGN_MAX_GAP_DAYS,
            None => true,
        };
        if !joins {
            close(std::mem::take(&mut current), &mut campaigns);
        }
        current.push(day.clone());
    }
    close(current, &mut campaigns);

    debug!(campaigns = campaigns.len(), discarded, "clustered promotion days");
    campaigns
}

/// Longest `n` campaigns, ties kept in discovery order.
pub fn select_top_campaigns(mut campaigns: Vec<Campaign>, n: usize) -> Vec<Campaign> {
    campaigns.sort_by(|a, b| b.days().cmp(&a.days()));
    campaigns.truncate(n);
    campaigns
}

/// Flag promotion days, cluster them, and keep the longest campaigns.
pub fn detect_campaigns(records: &[DailyRecord]) -> CampaignDetection {
    let promo_days: Vec<&DailyRecord> = records.iter().filter(|r| is_promotion_day(r)).collect();
    debug!(promo_days = promo_days.len(), "flagged promotion days");

    let campaigns = cluster_promotions(promo_days);
    let detected = campaigns.len();

    CampaignDetection {
        top: select_top_campaigns(campaigns, TOP_CAMPAIGNS),
        detected,
    }
}
