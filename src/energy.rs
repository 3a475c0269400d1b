//! Collision energy configurations and their run-id ranges
//!
//! Each beam energy maps to the contiguous run-id window `[low, high)` the
//! profiles were booked with.

use crate::error::{QaError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Half-open run-id interval `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRange {
    pub low: i64,
    pub high: i64,
}

impl RunRange {
    pub fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }

    /// Number of runs (bins) in the range
    ///
    /// Zero for an inverted range, or one too wide to index.
    pub fn len(&self) -> usize {
        self.span().unwrap_or(0)
    }

    /// Number of runs, `None` when `high <= low` or the width overflows
    pub fn span(&self) -> Option<usize> {
        self.high
            .checked_sub(self.low)
            .filter(|width| *width > 0)
            .and_then(|width| usize::try_from(width).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.high <= self.low
    }

    pub fn contains(&self, run: i64) -> bool {
        run >= self.low && run < self.high
    }
}

/// Beam energy of a data-taking period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum Energy {
    #[value(name = "39GeV")]
    #[serde(rename = "39GeV")]
    Gev39,
    #[value(name = "27GeV")]
    #[serde(rename = "27GeV")]
    Gev27,
    #[value(name = "19GeV")]
    #[serde(rename = "19GeV")]
    Gev19,
    #[value(name = "14GeV")]
    #[serde(rename = "14GeV")]
    Gev14,
    #[value(name = "11GeV")]
    #[serde(rename = "11GeV")]
    Gev11,
    #[value(name = "7GeV")]
    #[serde(rename = "7GeV")]
    Gev7,
}

impl Energy {
    pub const ALL: [Energy; 6] = [
        Energy::Gev39,
        Energy::Gev27,
        Energy::Gev19,
        Energy::Gev14,
        Energy::Gev11,
        Energy::Gev7,
    ];

    /// Run-id window booked for this energy
    pub fn run_range(self) -> RunRange {
        match self {
            Energy::Gev39 => RunRange::new(11_095_000, 11_115_000),
            Energy::Gev27 => RunRange::new(12_171_000, 12_180_000),
            Energy::Gev19 => RunRange::new(12_110_000, 12_123_000),
            Energy::Gev14 => RunRange::new(15_045_000, 15_075_000),
            Energy::Gev11 => RunRange::new(11_145_000, 11_165_000),
            Energy::Gev7 => RunRange::new(11_110_000, 11_150_000),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Energy::Gev39 => "39GeV",
            Energy::Gev27 => "27GeV",
            Energy::Gev19 => "19GeV",
            Energy::Gev14 => "14GeV",
            Energy::Gev11 => "11GeV",
            Energy::Gev7 => "7GeV",
        }
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Energy {
    type Err = QaError;

    /// Case-insensitive: `14gev`, `14GeV` and `14GEV` all parse
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Energy::ALL
            .iter()
            .copied()
            .find(|e| e.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| QaError::UnknownEnergy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ranges_match_booking_table() {
        assert_eq!(Energy::Gev39.run_range(), RunRange::new(11095000, 11115000));
        assert_eq!(Energy::Gev27.run_range(), RunRange::new(12171000, 12180000));
        assert_eq!(Energy::Gev19.run_range(), RunRange::new(12110000, 12123000));
        assert_eq!(Energy::Gev14.run_range(), RunRange::new(15045000, 15075000));
        assert_eq!(Energy::Gev11.run_range(), RunRange::new(11145000, 11165000));
        assert_eq!(Energy::Gev7.run_range(), RunRange::new(11110000, 11150000));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("14gev".parse::<Energy>().unwrap(), Energy::Gev14);
        assert_eq!("14GeV".parse::<Energy>().unwrap(), Energy::Gev14);
        assert_eq!("7GEV".parse::<Energy>().unwrap(), Energy::Gev7);
    }

    #[test]
    fn test_parse_unknown_label() {
        let err = "200GeV".parse::<Energy>().unwrap_err();
        assert_eq!(err, QaError::UnknownEnergy("200GeV".to_string()));
    }

    #[test]
    fn test_run_range_len_and_contains() {
        let range = Energy::Gev27.run_range();
        assert_eq!(range.len(), 9000);
        assert!(range.contains(12171000));
        assert!(range.contains(12179999));
        assert!(!range.contains(12180000));
        assert!(!range.is_empty());
    }

    #[test]
    fn test_span_of_inverted_and_extreme_ranges() {
        assert_eq!(RunRange::new(10, 10).span(), None);
        assert_eq!(RunRange::new(10, 5).span(), None);
        assert_eq!(RunRange::new(10, 5).len(), 0);
        let wide = RunRange::new(-9_000_000_000_000_000_000, 9_000_000_000_000_000_000);
        assert_eq!(wide.span(), None);
        assert_eq!(wide.len(), 0);
        assert_eq!(RunRange::new(100, 110).span(), Some(10));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for energy in Energy::ALL {
            assert_eq!(energy.to_string().parse::<Energy>().unwrap(), energy);
        }
    }
}
