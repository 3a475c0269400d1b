//! Error types for run QA

use thiserror::Error;

/// Errors raised while checking run profiles
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QaError {
    #[error("Insufficient data: need at least {required} valid runs, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Unknown energy label: {0} (expected one of 39GeV, 27GeV, 19GeV, 14GeV, 11GeV, 7GeV)")]
    UnknownEnergy(String),

    #[error("Profile {name} covers runs [{low}, {high}) but the energy range is [{expected_low}, {expected_high})")]
    RangeMismatch {
        name: String,
        low: i64,
        high: i64,
        expected_low: i64,
        expected_high: i64,
    },

    #[error("Run {run} is outside [{low}, {high}) in profile {name}")]
    RunOutOfRange {
        name: String,
        run: i64,
        low: i64,
        high: i64,
    },

    #[error("Profile {name} has an invalid run range [{low}, {high}) (must be non-empty and at most {max_runs} runs)")]
    InvalidRange {
        name: String,
        low: i64,
        high: i64,
        max_runs: usize,
    },

    #[error("Non-finite statistics in profile {profile}: contents or errors overflow f64")]
    NonFiniteStatistics { profile: String },

    #[error("Profile {0} has no run range and no energy range was configured")]
    MissingRange(String),

    #[error("Unsupported profile store version: {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type Result<T> = std::result::Result<T, QaError>;
