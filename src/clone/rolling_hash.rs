//! Exact clone detection via a Rabin-Karp rolling hash.
//!
//! Maintains an O(1)-per-position rolling fingerprint over a sliding window
//! of `min_tokens` tokens across the whole concatenated stream, buckets
//! window starts by fingerprint, verifies bucket members byte-exactly, then
//! greedily extends matches and merges overlapping extensions into clusters.

use std::collections::HashMap;

use crate::clone::{occurrence_from_range, prune_nested_occurrences, CloneGroup, CloneType};
use crate::tokens::TokenStream;
use crate::util::fnv1a_hash;

const BASE: u64 = 1_000_003;
const MOD: u64 = (1u64 << 61) - 1; // a Mersenne prime, cheap modular arithmetic

fn token_symbol(stream: &TokenStream, i: usize) -> u64 {
    let mut buf = vec![stream.kind(i) as u8];
    buf.extend_from_slice(stream.text(i).as_bytes());
    fnv1a_hash(&buf) % MOD
}

fn mulmod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn addmod(a: u64, b: u64, m: u64) -> u64 {
    (a + b) % m
}

fn submod(a: u64, b: u64, m: u64) -> u64 {
    ((a as i128 - b as i128).rem_euclid(m as i128)) as u64
}

pub fn detect(stream: &TokenStream, min_tokens: usize) -> Vec<CloneGroup> {
    let n = stream.count();
    if min_tokens == 0 || n < min_tokens {
        return Vec::new();
    }

    let symbols: Vec<u64> = (0..n).map(|i| token_symbol(stream, i)).collect();
    let w = min_tokens;

    // base^(w-1) mod MOD, used to drop the leading term on each roll.
    let mut base_pow = 1u64;
    for _ in 0..w.saturating_sub(1) {
        base_pow = mulmod(base_pow, BASE, MOD);
    }

    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut hash = 0u64;
    for (k, &s) in symbols.iter().enumerate().take(w) {
        hash = addmod(mulmod(hash, BASE, MOD), s, MOD);
        let _ = k;
    }

    let mut push_if_valid = |start: usize, hash: u64, buckets: &mut HashMap<u64, Vec<usize>>| {
        if !stream.range_crosses_boundary(start..start + w) {
            buckets.entry(hash).or_default().push(start);
        }
    };
    push_if_valid(0, hash, &mut buckets);

    for start in 1..=(n - w) {
        let leaving = mulmod(symbols[start - 1], base_pow, MOD);
        hash = submod(hash, leaving, MOD);
        hash = mulmod(hash, BASE, MOD);
        hash = addmod(hash, symbols[start + w - 1], MOD);
        push_if_valid(start, hash, &mut buckets);
    }

    // Union-find over window starts to cluster transitively-overlapping
    // extended matches that share a pair.
    let mut uf = UnionFind::new(n);
    let mut extended_ranges: HashMap<usize, (usize, usize)> = HashMap::new();

    for positions in buckets.values() {
        if positions.len() < 2 {
            continue;
        }
        for a_idx in 0..positions.len() {
            for b_idx in (a_idx + 1)..positions.len() {
                let (i, j) = (positions[a_idx], positions[b_idx]);
                if !stream.ranges_equal(i..i + w, j..j + w) {
                    continue; // collision, not a real match
                }
                let (ei, ej, elen) = extend_match(stream, i, j, w, n);
                extended_ranges.entry(ei).or_insert((ei, ei + elen));
                extended_ranges.entry(ej).or_insert((ej, ej + elen));
                uf.union(ei, ej);
            }
        }
    }

    let mut clusters: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for &(start, end) in extended_ranges.values() {
        let root = uf.find(start);
        clusters.entry(root).or_default().push((start, end));
    }

    let mut groups = Vec::new();
    for ranges in clusters.values() {
        let mut dedup: Vec<(usize, usize)> = ranges.clone();
        dedup.sort_unstable();
        dedup.dedup();
        if dedup.len() < 2 {
            continue;
        }
        let occurrences: Vec<_> = dedup
            .iter()
            .map(|&(s, e)| occurrence_from_range(stream, s, e))
            .collect();
        let occurrences = prune_nested_occurrences(occurrences);
        if occurrences.len() < 2 {
            continue;
        }
        let fingerprint = stream.hash_range(dedup[0].0..dedup[0].1);
        groups.push(CloneGroup {
            kind: CloneType::Exact,
            fingerprint,
            similarity: 1.0,
            occurrences,
        });
    }

    groups.sort_by_key(|g| (g.occurrences[0].file.clone(), g.occurrences[0].start_token));
    groups
}

/// Greedily extend the match `[i, i+w)` / `[j, j+w)` left and right while
/// both sides stay equal and don't cross a file boundary. Returns
/// `(extended_start_of_i, extended_start_of_j, extended_len)`... simplified
/// here to return the extended start/len pair anchored on `i`, mirrored for
/// `j` by the caller via the same delta.
fn extend_match(stream: &TokenStream, i: usize, j: usize, w: usize, n: usize) -> (usize, usize, usize) {
    let mut left = 0usize;
    while i > left
        && j > left
        && !stream.range_crosses_boundary(i - left - 1..i - left)
        && !stream.range_crosses_boundary(j - left - 1..j - left)
        && stream.ranges_equal(i - left - 1..i - left, j - left - 1..j - left)
    {
        left += 1;
    }

    let mut right = w;
    while i + right < n
        && j + right < n
        && !stream.range_crosses_boundary(i + right..i + right + 1)
        && !stream.range_crosses_boundary(j + right..j + right + 1)
        && stream.ranges_equal(i + right..i + right + 1, j + right..j + right + 1)
    {
        right += 1;
    }

    (i - left, j - left, left + right)
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
