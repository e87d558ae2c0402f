//! Near-clone (Type-2) detection via k-gram shingling, MinHash, and
//! LSH banding.
//!
//! Candidate spans are non-overlapping windows of `min_tokens` tokens.
//! Each span is shingled into normalized 5-grams (identifiers and literals
//! collapse to a placeholder so renamed variables and changed constants
//! still match), summarized by a fixed-width MinHash signature, and bucketed
//! by band. Only pairs that collide in at least one band are verified
//! against their raw shingle sets, so the expensive exact-Jaccard check only
//! ever runs on plausible candidates.

use std::collections::{HashMap, HashSet};

use ahash::AHashSet;

use crate::clone::{occurrence_from_range, prune_nested_occurrences, CloneGroup, CloneType};
use crate::config::Config;
use crate::tokens::{TokenKind, TokenStream};
use crate::util::fnv1a_hash;

const SHINGLE_K: usize = 5;

/// A normalized-token span ready for shingling.
struct Span {
    start: usize,
    end: usize,
    shingles: AHashSet<u64>,
}

fn normalized_symbol(stream: &TokenStream, i: usize) -> String {
    match stream.kind(i) {
        TokenKind::Identifier => "IDENT".to_string(),
        TokenKind::Literal => "LIT".to_string(),
        _ => stream.text(i).to_string(),
    }
}

fn shingle_span(stream: &TokenStream, start: usize, end: usize) -> AHashSet<u64> {
    let symbols: Vec<String> = (start..end).map(|i| normalized_symbol(stream, i)).collect();
    let mut shingles = AHashSet::new();
    if symbols.len() < SHINGLE_K {
        shingles.insert(fnv1a_hash(symbols.join("\u{1}").as_bytes()));
        return shingles;
    }
    for w in symbols.windows(SHINGLE_K) {
        shingles.insert(fnv1a_hash(w.join("\u{1}").as_bytes()));
    }
    shingles
}

/// Universal hash family member `i`: `(a_i * x + b_i) mod p`, using distinct
/// odd multipliers derived deterministically from the index so signatures
/// are reproducible across runs without external randomness.
fn hash_family_member(i: usize, x: u64) -> u64 {
    let a = fnv1a_hash(format!("swa-minhash-a-{i}").as_bytes()) | 1;
    let b = fnv1a_hash(format!("swa-minhash-b-{i}").as_bytes());
    a.wrapping_mul(x).wrapping_add(b)
}

fn signature(shingles: &AHashSet<u64>, width: usize) -> Vec<u64> {
    (0..width)
        .map(|i| {
            shingles
                .iter()
                .map(|&s| hash_family_member(i, s))
                .min()
                .unwrap_or(u64::MAX)
        })
        .collect()
}

fn jaccard(a: &AHashSet<u64>, b: &AHashSet<u64>) -> f64 {
    let intersection = a.intersection(b).count();
    if intersection == 0 {
        return 0.0;
    }
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

pub fn detect(stream: &TokenStream, config: &Config) -> Vec<CloneGroup> {
    let n = stream.count();
    let w = config.min_tokens;
    if w == 0 || n < w {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut start = 0;
    while start + w <= n {
        if !stream.range_crosses_boundary(start..start + w) {
            let shingles = shingle_span(stream, start, start + w);
            spans.push(Span {
                start,
                end: start + w,
                shingles,
            });
        }
        start += w;
    }
    if spans.len() < 2 {
        return Vec::new();
    }

    let width = config.minhash_width();
    let signatures: Vec<Vec<u64>> = spans.iter().map(|s| signature(&s.shingles, width)).collect();

    let bands = config.minhash_bands;
    let rows = config.minhash_rows_per_band;

    let mut candidate_pairs: HashSet<(usize, usize)> = HashSet::new();
    for b in 0..bands {
        let lo = b * rows;
        let hi = (lo + rows).min(width);
        if lo >= hi {
            continue;
        }
        let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
        for (idx, sig) in signatures.iter().enumerate() {
            let key = fnv1a_hash(
                &sig[lo..hi]
                    .iter()
                    .flat_map(|v| v.to_le_bytes())
                    .collect::<Vec<u8>>(),
            );
            buckets.entry(key).or_default().push(idx);
        }
        for bucket in buckets.values() {
            if bucket.len() < 2 {
                continue;
            }
            for i in 0..bucket.len() {
                for j in (i + 1)..bucket.len() {
                    let (a, b) = (bucket[i].min(bucket[j]), bucket[i].max(bucket[j]));
                    candidate_pairs.insert((a, b));
                }
            }
        }
    }

    let mut uf = UnionFind::new(spans.len());
    for (a, b) in candidate_pairs {
        let sim = jaccard(&spans[a].shingles, &spans[b].shingles);
        if sim >= config.min_similarity {
            uf.union(a, b);
        }
    }

    let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..spans.len() {
        let root = uf.find(i);
        clusters.entry(root).or_default().push(i);
    }

    let mut groups = Vec::new();
    for members in clusters.values() {
        if members.len() < 2 {
            continue;
        }
        let mut min_sim = 1.0f64;
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                min_sim = min_sim.min(jaccard(&spans[members[i]].shingles, &spans[members[j]].shingles));
            }
        }
        let occurrences: Vec<_> = members
            .iter()
            .map(|&idx| occurrence_from_range(stream, spans[idx].start, spans[idx].end))
            .collect();
        let occurrences = prune_nested_occurrences(occurrences);
        if occurrences.len() < 2 {
            continue;
        }
        let fingerprint = stream.hash_range(spans[members[0]].start..spans[members[0]].end);
        groups.push(CloneGroup {
            kind: CloneType::Near,
            fingerprint,
            similarity: min_sim,
            occurrences,
        });
    }

    groups.sort_by_key(|g| (g.occurrences[0].file.clone(), g.occurrences[0].start_token));
    groups
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{RawToken, TokenStreamBuilder};
    use std::sync::Arc;

    fn ident(offset: u32, col: u32) -> RawToken {
        RawToken {
            kind: TokenKind::Identifier,
            offset,
            length: 1,
            line: 1,
            column: col,
        }
    }

    #[test]
    fn near_identical_spans_with_renamed_identifiers_are_grouped() {
        // Two 50-token spans of identical structure but different
        // identifier text: normalization should still match them.
        let mut toks_a = Vec::new();
        let mut toks_b = Vec::new();
        let mut src = String::new();
        for i in 0..50u32 {
            src.push('a');
            toks_a.push(ident(i, i + 1));
        }
        for i in 0..50u32 {
            toks_b.push(ident(i, i + 1));
        }
        let source: Arc<str> = Arc::from(src.as_str());

        let mut builder = TokenStreamBuilder::default();
        builder.push_file("a.swift", source.clone(), &toks_a);
        builder.push_file("b.swift", source, &toks_b);
        let stream = builder.build();

        let config = Config {
            min_tokens: 50,
            min_similarity: 0.5,
            ..Config::default()
        };
        let groups = detect(&stream, &config);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, CloneType::Near);
        assert!(groups[0].similarity >= config.min_similarity);
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a: AHashSet<u64> = [1, 2, 3].into_iter().collect();
        let b: AHashSet<u64> = [4, 5, 6].into_iter().collect();
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a: AHashSet<u64> = [1, 2, 3].into_iter().collect();
        assert_eq!(jaccard(&a, &a.clone()), 1.0);
    }
}
