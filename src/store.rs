//! Persisted profile stores
//!
//! A store is a JSON document holding named run profiles with sparse bins:
//!
//! ```json
//! {
//!   "version": 1,
//!   "profiles": [
//!     { "name": "hEventProfile_0", "title": "Profile of refMult",
//!       "run_id_low": 15045000, "run_id_high": 15075000,
//!       "bins": [ { "run": 15045001, "content": 12.3, "error": 0.4 } ] }
//!   ]
//! }
//! ```
//!
//! Profiles without `run_id_low`/`run_id_high` take the run range of the
//! configured energy.

use crate::energy::RunRange;
use crate::error::{QaError, Result as QaResult};
use crate::profile::{ProfileBin, RunProfile};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Store format version (currently only v1 supported)
pub const SUPPORTED_VERSION: u32 = 1;

/// Widest run range a stored profile may declare
pub const MAX_PROFILE_RUNS: usize = 1_000_000;

/// On-disk representation of a store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    pub version: u32,
    #[serde(default)]
    pub profiles: Vec<StoredProfile>,
}

/// On-disk representation of one profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id_low: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id_high: Option<i64>,
    #[serde(default)]
    pub bins: Vec<StoredBin>,
}

/// Sparse bin entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoredBin {
    pub run: i64,
    pub content: f64,
    pub error: f64,
}

impl StoredProfile {
    /// Serialize a profile, keeping only bins that hold any value
    pub fn from_profile(profile: &RunProfile) -> Self {
        let range = profile.range();
        Self {
            name: profile.name().to_string(),
            title: profile.title().to_string(),
            run_id_low: Some(range.low),
            run_id_high: Some(range.high),
            bins: profile
                .iter()
                .filter(|(_, b)| b.content != 0.0 || b.error != 0.0)
                .map(|(run, b)| StoredBin {
                    run,
                    content: b.content,
                    error: b.error,
                })
                .collect(),
        }
    }

    fn stored_range(&self) -> Option<RunRange> {
        match (self.run_id_low, self.run_id_high) {
            (Some(low), Some(high)) => Some(RunRange::new(low, high)),
            _ => None,
        }
    }

    /// Materialize into a dense profile
    ///
    /// A stored range must agree with `expected` when both are present.
    pub fn into_profile(self, expected: Option<RunRange>) -> QaResult<RunProfile> {
        let range = match (self.stored_range(), expected) {
            (Some(stored), Some(expected)) if stored != expected => {
                return Err(QaError::RangeMismatch {
                    name: self.name,
                    low: stored.low,
                    high: stored.high,
                    expected_low: expected.low,
                    expected_high: expected.high,
                })
            }
            (Some(stored), _) => stored,
            (None, Some(expected)) => expected,
            (None, None) => return Err(QaError::MissingRange(self.name)),
        };
        if !range.span().is_some_and(|runs| runs <= MAX_PROFILE_RUNS) {
            return Err(QaError::InvalidRange {
                name: self.name,
                low: range.low,
                high: range.high,
                max_runs: MAX_PROFILE_RUNS,
            });
        }

        let entries = self
            .bins
            .iter()
            .map(|b| (b.run, ProfileBin::new(b.content, b.error)));
        Ok(RunProfile::from_entries(self.name.clone(), range, entries)?.with_title(self.title))
    }
}

/// Named profiles, lazily materialized on lookup
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles: HashMap<String, StoredProfile>,
    order: Vec<String>,
    range: Option<RunRange>,
}

impl ProfileStore {
    /// Load and validate a store from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P, range: Option<RunRange>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("Profile store not found: {}", path.display());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json_str(&contents, range)
            .with_context(|| format!("Invalid profile store {}", path.display()))
    }

    /// Parse and validate a store from JSON text
    pub fn from_json_str(contents: &str, range: Option<RunRange>) -> Result<Self> {
        let document: StoreDocument =
            serde_json::from_str(contents).context("Invalid profile store JSON")?;
        Ok(Self::from_document(document, range)?)
    }

    pub fn from_document(document: StoreDocument, range: Option<RunRange>) -> QaResult<Self> {
        if document.version != SUPPORTED_VERSION {
            return Err(QaError::UnsupportedVersion {
                found: document.version,
                expected: SUPPORTED_VERSION,
            });
        }

        let mut store = Self {
            profiles: HashMap::with_capacity(document.profiles.len()),
            order: Vec::with_capacity(document.profiles.len()),
            range,
        };
        for profile in document.profiles {
            // Validate eagerly so a broken profile fails at load, not mid-batch
            profile.clone().into_profile(range)?;
            if store.profiles.contains_key(&profile.name) {
                debug!(name = %profile.name, "duplicate profile, keeping the last one");
            } else {
                store.order.push(profile.name.clone());
            }
            store.profiles.insert(profile.name.clone(), profile);
        }
        debug!(profiles = store.order.len(), "loaded profile store");
        Ok(store)
    }

    /// Build a store from in-memory profiles
    pub fn from_profiles<I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = RunProfile>,
    {
        let mut store = Self {
            profiles: HashMap::new(),
            order: Vec::new(),
            range: None,
        };
        for profile in profiles {
            let stored = StoredProfile::from_profile(&profile);
            if !store.profiles.contains_key(&stored.name) {
                store.order.push(stored.name.clone());
            }
            store.profiles.insert(stored.name.clone(), stored);
        }
        store
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> QaResult<RunProfile> {
        let stored = self
            .profiles
            .get(name)
            .ok_or_else(|| QaError::ProfileNotFound(name.to_string()))?;
        stored.clone().into_profile(self.range)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Profile names in document order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn to_document(&self) -> StoreDocument {
        StoreDocument {
            version: SUPPORTED_VERSION,
            profiles: self
                .order
                .iter()
                .filter_map(|name| self.profiles.get(name).cloned())
                .collect(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_document()).context("Failed to serialize store")
    }
}
