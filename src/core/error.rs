use crate::core::types::StrategyAttempt;
use thiserror::Error;

/// Caller-visible failures of the conversion pipeline. Everything below this
/// level (per-strategy transport errors, validator rejections, decode issues)
/// travels as strings inside `StrategyResult` / `StrategyAttempt` and only
/// surfaces aggregated in `AllStrategiesFailed`.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("all strategies failed for {url}: [{}]", summarize_attempts(.attempts))]
    AllStrategiesFailed {
        url: String,
        attempts: Vec<StrategyAttempt>,
    },
}

pub(crate) fn summarize_attempts(attempts: &[StrategyAttempt]) -> String {
    attempts
        .iter()
        .map(|a| match &a.error {
            Some(e) => format!("{}: {}", a.strategy, e),
            None => format!("{}: ok", a.strategy),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
