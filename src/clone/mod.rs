//! Clone detection engine (C5): three pluggable detectors over the
//! normalized token view (C4) — rolling-hash and suffix-array for exact
//! clones, MinHash+LSH for near-clones.

pub mod minhash;
pub mod rolling_hash;
pub mod suffix_array;

use serde::{Deserialize, Serialize};

use crate::config::{CloneAlgorithm, Config};
use crate::tokens::TokenStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneType {
    Exact,
    Near,
    Semantic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occurrence {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_token: usize,
    pub end_token: usize,
    pub code_snippet: Option<String>,
}

/// A clone group always has `occurrences.len() >= 2`, and every pair of
/// occurrences spans at least `min_tokens` tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneGroup {
    pub kind: CloneType,
    pub fingerprint: u64,
    pub similarity: f64,
    pub occurrences: Vec<Occurrence>,
}

/// Build an [`Occurrence`] for token range `[start, end)` in `stream`.
pub(crate) fn occurrence_from_range(
    stream: &TokenStream,
    start: usize,
    end: usize,
) -> Occurrence {
    let file = stream.file_name(start).to_string();
    Occurrence {
        file,
        start_line: stream.line(start) as usize,
        end_line: stream.line(end.saturating_sub(1).max(start)) as usize,
        start_token: start,
        end_token: end,
        code_snippet: None,
    }
}

/// Run whichever detector `config.clone_algorithm` selects.
pub fn detect_clones(stream: &TokenStream, config: &Config) -> Vec<CloneGroup> {
    match config.clone_algorithm {
        CloneAlgorithm::RollingHash => rolling_hash::detect(stream, config.min_tokens),
        CloneAlgorithm::SuffixArray => suffix_array::detect(stream, config.min_tokens),
        CloneAlgorithm::MinHashLsh => minhash::detect(stream, config),
    }
}

/// Drop occurrences that nest entirely within a longer occurrence of the
/// same cluster sharing a file.
pub(crate) fn prune_nested_occurrences(mut occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
    occurrences.sort_by_key(|o| (o.file.clone(), o.start_token, std::cmp::Reverse(o.end_token)));
    let mut kept: Vec<Occurrence> = Vec::new();
    for occ in occurrences {
        let nested = kept.iter().any(|k| {
            k.file == occ.file && k.start_token <= occ.start_token && k.end_token >= occ.end_token
                && (k.start_token, k.end_token) != (occ.start_token, occ.end_token)
        });
        if !nested {
            kept.push(occ);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(file: &str, start: usize, end: usize) -> Occurrence {
        Occurrence {
            file: file.to_string(),
            start_line: 1,
            end_line: 1,
            start_token: start,
            end_token: end,
            code_snippet: None,
        }
    }

    #[test]
    fn nested_occurrence_is_pruned_in_favor_of_the_longer_one() {
        let occs = vec![occ("a.swift", 0, 10), occ("a.swift", 2, 6)];
        let kept = prune_nested_occurrences(occs);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start_token, 0);
        assert_eq!(kept[0].end_token, 10);
    }

    #[test]
    fn non_nested_occurrences_in_different_files_both_survive() {
        let occs = vec![occ("a.swift", 0, 10), occ("b.swift", 0, 10)];
        let kept = prune_nested_occurrences(occs);
        assert_eq!(kept.len(), 2);
    }
}
