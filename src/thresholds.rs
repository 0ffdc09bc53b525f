//! Fixed policy constants for momentum and promotion detection.
//!
//! These are calibrated for a single-product daily sales series. Changing a
//! value here changes which days count as promotional and therefore every
//! downstream comparison.

/// Number of preceding trading days in the trailing momentum baseline.
pub const MOMENTUM_WINDOW: usize = 7;

/// A promotion day trades at least this far below its trailing average price (percent).
pub const PROMO_PRICE_DROP_PCT: f64 = -3.0;

/// A promotion day sells strictly more than this many units.
pub const PROMO_MIN_QUANTITY: u64 = 5000;

/// Maximum calendar-day gap between consecutive promotion days in one campaign.
pub const CAMPAIGN_MAX_GAP_DAYS: i64 = 5;

/// Clusters shorter than this are noise, not campaigns.
pub const CAMPAIGN_MIN_DAYS: usize = 5;

/// How many of the longest campaigns feed the promotional comparison.
pub const TOP_CAMPAIGNS: usize = 3;

/// Non-promotional days at or below this volume are left out of the regular baseline.
pub const REGULAR_MIN_QUANTITY: u64 = 1000;
