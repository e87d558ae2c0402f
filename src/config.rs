//! Configuration value type consumed by the analysis pipeline.
//!
//! Loading and merging configuration from files/CLI flags is out of scope
//! here; this type and its validation are not. Components read thresholds
//! and policy flags directly off `Config`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneAlgorithm {
    RollingHash,
    SuffixArray,
    MinHashLsh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParallelMode {
    Off,
    Safe,
    Maximum,
}

/// Root-selection policy flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootPolicy {
    pub treat_public_as_root: bool,
    pub treat_objc_as_root: bool,
    pub treat_tests_as_root: bool,
    pub treat_view_likes_as_root: bool,
}

impl Default for RootPolicy {
    fn default() -> Self {
        Self {
            treat_public_as_root: true,
            treat_objc_as_root: true,
            treat_tests_as_root: true,
            treat_view_likes_as_root: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisMode {
    Reachability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum token span for any clone group.
    pub min_tokens: usize,
    /// Minimum Jaccard similarity for near-clone verification.
    pub min_similarity: f64,
    pub clone_algorithm: CloneAlgorithm,
    pub parallel_mode: ParallelMode,
    pub root_policy: RootPolicy,
    pub analysis_mode: AnalysisMode,
    /// MinHash signature width: `minhash_bands * minhash_rows_per_band`.
    pub minhash_bands: usize,
    pub minhash_rows_per_band: usize,
    /// Direction-optimizing BFS switch thresholds.
    pub bfs_alpha: f64,
    pub bfs_beta: f64,
    /// Ignore-directive comment prefix: `<prefix>:<directive>`.
    pub ignore_directive_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_tokens: 50,
            min_similarity: 0.8,
            clone_algorithm: CloneAlgorithm::RollingHash,
            parallel_mode: ParallelMode::Safe,
            root_policy: RootPolicy::default(),
            analysis_mode: AnalysisMode::Reachability,
            minhash_bands: 32,
            minhash_rows_per_band: 4,
            bfs_alpha: 14.0,
            bfs_beta: 24.0,
            ignore_directive_prefix: "swa".to_string(),
        }
    }
}

impl Config {
    /// Validate thresholds, returning `Error::Configuration` on a bad value.
    pub fn validate(&self) -> Result<()> {
        if self.min_tokens == 0 {
            return Err(Error::Configuration {
                message: "min_tokens must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(Error::Configuration {
                message: format!(
                    "min_similarity must be in [0, 1], got {}",
                    self.min_similarity
                ),
            });
        }
        if self.minhash_bands == 0 || self.minhash_rows_per_band == 0 {
            return Err(Error::Configuration {
                message: "minhash_bands and minhash_rows_per_band must be positive".to_string(),
            });
        }
        if self.bfs_alpha <= 0.0 || self.bfs_beta <= 0.0 {
            return Err(Error::Configuration {
                message: "bfs_alpha and bfs_beta must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn minhash_width(&self) -> usize {
        self.minhash_bands * self.minhash_rows_per_band
    }
}
