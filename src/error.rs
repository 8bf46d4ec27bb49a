use thiserror::Error;

/// Plot construction failures that callers may want to tell apart.
///
/// Loading errors (missing files, unreadable formats) are not listed here:
/// they reach the caller as plain `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("no features selected for plotting")]
    NoFeatures,

    #[error("feature '{feature}' not found in feature set (available: {available:?})")]
    UnknownFeature {
        feature: String,
        available: Vec<String>,
    },

    #[error("feature '{feature}' has non-numeric value '{value}' for sample '{sample}'")]
    NonNumericFeature {
        feature: String,
        sample: String,
        value: String,
    },

    #[error("prediction set has neither a prediction column nor class probability columns")]
    NoClassLabels,

    #[error("unknown storage engine '{0}' (expected auto, parquet, json or csv)")]
    UnknownEngine(String),
}
