//! End-to-end analysis: parse, annotate momentum, then detect campaigns and
//! aggregate alongside the monthly rollup.

use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::campaigns::detect_campaigns;
use crate::error::{AnalysisError, Result};
use crate::loader::{parse_records, read_rows, read_rows_file, RawRow};
use crate::model::{AnalysisResult, MonthlyBucket};
use crate::momentum::annotate_momentum;
use crate::rollup::monthly_rollup;
use crate::stats::aggregate;

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub monthly: Vec<MonthlyBucket>,
    pub dropped_rows: usize,
}

pub fn run(rows: &[RawRow]) -> Result<Analysis> {
    if rows.is_empty() {
        warn!("sales input has no data rows");
        return Err(AnalysisError::EmptyInput);
    }

    let parsed = parse_records(rows);
    if parsed.records.is_empty() {
        warn!(rows = rows.len(), "every sales row was dropped");
        return Err(AnalysisError::NoValidRecords { rows: rows.len() });
    }
    let records = annotate_momentum(&parsed.records);

    // Campaign detection and the monthly rollup only read the annotated series.
    let (result, monthly) = rayon::join(
        || {
            let detection = detect_campaigns(&records);
            aggregate(&records, detection.top, detection.detected)
        },
        || monthly_rollup(&records),
    );

    let result = match result {
        Ok(Some(result)) => result,
        Ok(None) => return Err(AnalysisError::NoValidRecords { rows: rows.len() }),
        Err(e) => {
            warn!(error = %e, "sales aggregates are not representable");
            return Err(e);
        }
    };
    let monthly = monthly?;

    info!(
        records = result.record_count,
        dropped = parsed.dropped,
        campaigns = result.top_campaigns.len(),
        months = monthly.len(),
        "sales analysis complete"
    );

    Ok(Analysis {
        result,
        monthly,
        dropped_rows: parsed.dropped,
    })
}

pub fn run_from_reader<R: Read>(reader: R) -> Result<Analysis> {
    let rows = read_rows(reader)?;
    debug!(rows = rows.len(), "read sales rows");
    run(&rows)
}

pub fn run_from_path(path: impl AsRef<Path>) -> Result<Analysis> {
    let rows = read_rows_file(path)?;
    debug!(rows = rows.len(), "read sales rows");
    run(&rows)
}
