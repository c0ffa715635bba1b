//! Pillar scorecards: flat classification-code to risk-value tables.
//!
//! Tables are read once per store and shared behind an `Arc`. Entries whose value is not a
//! number in [1,5] are dropped at load time, and a missing or unreadable table simply loads
//! empty, so scoring falls back to the configured defaults.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use super::domain::Pillar;
use super::engine_config::{MAX_SCORE, MIN_SCORE};
use crate::config::DEFAULT_SCORECARDS_DIR;

/// Key consulted when a code has no entry of its own.
pub const FALLBACK_KEY: &str = "default";

/// One pillar's lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scorecard {
    entries: HashMap<String, f64>,
}

impl Scorecard {
    /// Build from `(code, value)` pairs, applying the same filtering as file loads.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .filter(|(_, value)| is_valid_score(*value))
                .map(|(code, value)| (code.into(), value))
                .collect(),
        }
    }

    /// Keep only the numeric entries of a JSON object; anything else yields an empty table.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        Self::from_entries(
            object
                .iter()
                .filter_map(|(code, value)| value.as_f64().map(|score| (code.clone(), score))),
        )
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.entries.get(code).copied()
    }

    /// The table's own `"default"` entry, if present.
    pub fn fallback(&self) -> Option<f64> {
        self.get(FALLBACK_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_valid_score(value: f64) -> bool {
    value.is_finite() && value >= f64::from(MIN_SCORE) && value <= f64::from(MAX_SCORE)
}

/// All five pillar tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScorecardSet {
    pub geography: Scorecard,
    pub industry: Scorecard,
    pub entity: Scorecard,
    pub product: Scorecard,
    pub delivery: Scorecard,
}

impl ScorecardSet {
    pub fn get(&self, pillar: Pillar) -> &Scorecard {
        match pillar {
            Pillar::Geography => &self.geography,
            Pillar::Industry => &self.industry,
            Pillar::Entity => &self.entity,
            Pillar::Product => &self.product,
            Pillar::Delivery => &self.delivery,
        }
    }

    pub fn with(mut self, pillar: Pillar, scorecard: Scorecard) -> Self {
        *self.slot(pillar) = scorecard;
        self
    }

    fn slot(&mut self, pillar: Pillar) -> &mut Scorecard {
        match pillar {
            Pillar::Geography => &mut self.geography,
            Pillar::Industry => &mut self.industry,
            Pillar::Entity => &mut self.entity,
            Pillar::Product => &mut self.product,
            Pillar::Delivery => &mut self.delivery,
        }
    }

    /// Read `<dir>/<pillar>.json` for every pillar.
    pub fn load_dir(dir: &Path) -> Self {
        let mut set = ScorecardSet::default();
        for pillar in Pillar::ALL {
            let path = dir.join(format!("{}.json", pillar.table_name()));
            match read_table(&path) {
                Ok(scorecard) => {
                    debug!(pillar = %pillar, entries = scorecard.len(), "loaded scorecard");
                    *set.slot(pillar) = scorecard;
                }
                Err(err) => {
                    warn!(pillar = %pillar, path = %path.display(), error = %err, "scorecard unavailable; using empty table");
                }
            }
        }
        set
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ScorecardLoadError {
    #[error("unable to read scorecard: {0}")]
    Io(#[from] std::io::Error),
    #[error("scorecard is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scorecard must be a JSON object")]
    NotAnObject,
}

fn read_table(path: &Path) -> Result<Scorecard, ScorecardLoadError> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    if !value.is_object() {
        return Err(ScorecardLoadError::NotAnObject);
    }
    Ok(Scorecard::from_json(&value))
}

/// Where a store builds its tables from.
#[derive(Debug, Clone)]
pub enum ScorecardSource {
    Directory(PathBuf),
    Inline(ScorecardSet),
    Empty,
}

impl ScorecardSource {
    /// Directory named by `CRA_SCORECARDS_DIR`, or `./scorecards`.
    pub fn from_env() -> Self {
        let dir = env::var("CRA_SCORECARDS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCORECARDS_DIR));
        ScorecardSource::Directory(dir)
    }

    fn load(&self) -> ScorecardSet {
        match self {
            ScorecardSource::Directory(dir) => ScorecardSet::load_dir(dir),
            ScorecardSource::Inline(set) => set.clone(),
            ScorecardSource::Empty => ScorecardSet::default(),
        }
    }
}

/// Lazily built, immutable-after-build scorecard cache.
///
/// Concurrent first calls to [`ScorecardStore::get`] build the tables exactly once.
#[derive(Debug)]
pub struct ScorecardStore {
    source: ScorecardSource,
    cache: RwLock<Option<Arc<ScorecardSet>>>,
}

impl ScorecardStore {
    pub fn new(source: ScorecardSource) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    pub fn inline(set: ScorecardSet) -> Self {
        Self::new(ScorecardSource::Inline(set))
    }

    pub fn source(&self) -> &ScorecardSource {
        &self.source
    }

    pub fn get(&self) -> Arc<ScorecardSet> {
        if let Some(set) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(set);
        }

        let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = guard.as_ref() {
            return Arc::clone(set);
        }
        let set = Arc::new(self.source.load());
        *guard = Some(Arc::clone(&set));
        set
    }

    pub fn is_loaded(&self) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drop the cached tables; the next `get` reloads from the source.
    pub fn reset(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

static GLOBAL: OnceLock<Arc<ScorecardStore>> = OnceLock::new();

/// Install the process-wide store. Returns the already installed store if one exists.
pub fn install_global(source: ScorecardSource) -> Arc<ScorecardStore> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(ScorecardStore::new(source))))
}

/// Process-wide store, sourced from the environment when nothing was installed.
pub fn global() -> Arc<ScorecardStore> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(ScorecardStore::new(ScorecardSource::from_env()))))
}
