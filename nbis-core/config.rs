use serde::{Deserialize, Serialize};

use crate::error::{NbisError, NbisResult};
use crate::gray::DEFAULT_PPI;
use crate::xyt::MAX_BOZORTH_MINUTIAE;

/// Default number of minutiae per print the matcher compares.
pub const DEFAULT_BOZORTH_MINUTIAE: usize = 150;
/// Prints with fewer usable minutiae than this always score 0.
pub const MIN_COMPUTABLE_BOZORTH_MINUTIAE: usize = 10;

/// Limits applied on the matching path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    /// Rows from each interchange record actually compared.
    pub max_minutiae: usize,
    pub min_computable_minutiae: usize,
    /// Interchange capacity used when converting feature sets.
    pub capacity: usize,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            max_minutiae: DEFAULT_BOZORTH_MINUTIAE,
            min_computable_minutiae: MIN_COMPUTABLE_BOZORTH_MINUTIAE,
            capacity: MAX_BOZORTH_MINUTIAE,
        }
    }
}

/// Diagnostic verbosity. Only gates log events, never results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Verbosity {
    pub main: bool,
    pub load: bool,
    pub bozorth: bool,
    pub threshold: bool,
}

/// Immutable configuration context shared by every call.
///
/// Built once and passed by reference; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NbisConfig {
    /// Resolution assumed when a call does not provide one.
    pub ppi: u32,
    /// Worker threads for batch operations.
    pub n_threads: usize,
    pub matcher: MatcherSettings,
    pub verbosity: Verbosity,
}

impl Default for NbisConfig {
    fn default() -> Self {
        Self {
            ppi: DEFAULT_PPI,
            n_threads: num_cpus::get().max(1),
            matcher: MatcherSettings::default(),
            verbosity: Verbosity::default(),
        }
    }
}

impl NbisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ppi(mut self, ppi: u32) -> Self {
        self.ppi = ppi;
        self
    }

    pub fn with_max_minutiae(mut self, max_minutiae: usize) -> Self {
        self.matcher.max_minutiae = max_minutiae;
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Resolve an optional per-call resolution against the configured default.
    pub fn resolve_ppi(&self, ppi: Option<u32>) -> NbisResult<u32> {
        let ppi = ppi.unwrap_or(self.ppi);
        if ppi == 0 {
            return Err(NbisError::InvalidInput("ppi must be > 0".into()));
        }
        Ok(ppi)
    }

    pub fn validate(&self) -> NbisResult<()> {
        if self.ppi == 0 {
            return Err(NbisError::Config("ppi must be > 0".into()));
        }
        let m = &self.matcher;
        if m.capacity == 0 || m.capacity > MAX_BOZORTH_MINUTIAE {
            return Err(NbisError::Config(format!(
                "capacity {} outside 1..={}",
                m.capacity, MAX_BOZORTH_MINUTIAE
            )));
        }
        if m.max_minutiae == 0 || m.max_minutiae > MAX_BOZORTH_MINUTIAE {
            return Err(NbisError::Config(format!(
                "max_minutiae {} outside 1..={}",
                m.max_minutiae, MAX_BOZORTH_MINUTIAE
            )));
        }
        if m.min_computable_minutiae > m.max_minutiae {
            return Err(NbisError::Config(format!(
                "min_computable_minutiae {} exceeds max_minutiae {}",
                m.min_computable_minutiae, m.max_minutiae
            )));
        }
        if self.n_threads == 0 {
            return Err(NbisError::Config("n_threads must be > 0".into()));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "NbisConfig: ppi={}, max_minutiae={}, min_computable={}, capacity={}, threads={}",
            self.ppi,
            self.matcher.max_minutiae,
            self.matcher.min_computable_minutiae,
            self.matcher.capacity,
            self.n_threads
        )
    }

    pub fn to_json(&self) -> NbisResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NbisError::Config(e.to_string()))
    }

    pub fn from_json(json: &str) -> NbisResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NbisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> NbisResult<String> {
        toml::to_string_pretty(self).map_err(|e| NbisError::Config(e.to_string()))
    }

    pub fn from_toml(toml_str: &str) -> NbisResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| NbisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` or `.toml` file, chosen by extension.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> NbisResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(NbisError::Config(format!(
                "unsupported config extension: {:?}",
                other
            ))),
        }
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> NbisResult<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => self.to_toml()?,
            _ => self.to_json()?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}
