//! Daily retail sales analysis: unit economics, trailing momentum, promotional
//! campaign detection, promo-vs-regular comparison and monthly rollups.

pub mod campaigns;
pub mod error;
pub mod loader;
pub mod model;
pub mod momentum;
pub mod pipeline;
pub mod rollup;
pub mod stats;
pub mod thresholds;

pub use error::{AnalysisError, Result};
pub use model::{AnalysisResult, Campaign, DailyRecord, MonthlyBucket};
pub use pipeline::{run, run_from_path, run_from_reader, Analysis};
