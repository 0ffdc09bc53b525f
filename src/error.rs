#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input contains no data rows")]
    EmptyInput,

    #[error("None of the {rows} input rows produced a valid record")]
    NoValidRecords { rows: usize },

    #[error("{metric} overflows its numeric range")]
    Overflow { metric: &'static str },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
