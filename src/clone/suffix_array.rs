//! Exact clone detection via a suffix array over the token stream.
//!
//! Construction uses the classic O(n log^2 n) prefix-doubling / rank-sort
//! algorithm rather than linear-time SA-IS: SA-IS's induced-sort passes are
//! intricate enough that getting them right without a compiler to check
//! against is not a bet worth making here. Doubling is asymptotically worse
//! but simple to verify by inspection, and clone detection runs offline.

use crate::clone::{occurrence_from_range, prune_nested_occurrences, CloneGroup, CloneType};
use crate::tokens::TokenStream;
use crate::util::fnv1a_hash;

/// Map each token to a symbol; `FileBoundary` tokens get a unique sentinel
/// strictly less than every real symbol, so a suffix starting at a boundary
/// (or a comparison crossing one) always sorts before real content and no
/// reported match ever spans two files.
fn build_symbols(stream: &TokenStream) -> Vec<i64> {
    let n = stream.count();
    let mut symbols = Vec::with_capacity(n);
    let mut next_sentinel: i64 = -1;
    for i in 0..n {
        if stream.kind(i) == crate::tokens::TokenKind::FileBoundary {
            symbols.push(next_sentinel);
            next_sentinel -= 1;
        } else {
            let mut buf = vec![stream.kind(i) as u8];
            buf.extend_from_slice(stream.text(i).as_bytes());
            // Keep real symbols non-negative and distinct from sentinels.
            let h = fnv1a_hash(&buf);
            symbols.push((h % (i64::MAX as u64 / 2)) as i64);
        }
    }
    symbols
}

/// Prefix-doubling suffix array construction. Returns the suffix array `sa`
/// where `sa[i]` is the starting index of the i-th smallest suffix.
fn build_suffix_array(symbols: &[i64]) -> Vec<usize> {
    let n = symbols.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sa: Vec<usize> = (0..n).collect();
    let mut rank: Vec<i64> = symbols.to_vec();
    let mut tmp = vec![0i64; n];
    let mut k = 1usize;

    let rank_at = |rank: &[i64], i: usize| -> i64 {
        if i < n {
            rank[i]
        } else {
            i64::MIN
        }
    };

    while k < n {
        sa.sort_unstable_by(|&a, &b| {
            let ka = (rank[a], rank_at(&rank, a + k));
            let kb = (rank[b], rank_at(&rank, b + k));
            ka.cmp(&kb)
        });

        tmp[sa[0]] = 0;
        for i in 1..n {
            let prev = sa[i - 1];
            let cur = sa[i];
            let same = rank[prev] == rank[cur] && rank_at(&rank, prev + k) == rank_at(&rank, cur + k);
            tmp[cur] = tmp[prev] + if same { 0 } else { 1 };
        }
        rank.copy_from_slice(&tmp);

        if rank[sa[n - 1]] as usize == n - 1 {
            break;
        }
        k *= 2;
    }

    sa
}

/// Kasai's algorithm: LCP array where `lcp[i]` is the length of the common
/// prefix between `sa[i-1]` and `sa[i]` (`lcp[0] = 0`).
fn build_lcp(symbols: &[i64], sa: &[usize]) -> Vec<usize> {
    let n = symbols.len();
    if n == 0 {
        return Vec::new();
    }
    let mut rank = vec![0usize; n];
    for (i, &s) in sa.iter().enumerate() {
        rank[s] = i;
    }

    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for i in 0..n {
        if rank[i] == 0 {
            h = 0;
            continue;
        }
        let j = sa[rank[i] - 1];
        while i + h < n && j + h < n && symbols[i + h] == symbols[j + h] {
            h += 1;
        }
        lcp[rank[i]] = h;
        h = h.saturating_sub(1);
    }
    lcp
}

pub fn detect(stream: &TokenStream, min_tokens: usize) -> Vec<CloneGroup> {
    let n = stream.count();
    if min_tokens == 0 || n < min_tokens {
        return Vec::new();
    }

    let symbols = build_symbols(stream);
    let sa = build_suffix_array(&symbols);
    let lcp = build_lcp(&symbols, &sa);

    // Group maximal runs in the LCP array where every adjacent pair shares
    // at least `min_tokens` common symbols; each run is one clone cluster.
    let mut groups = Vec::new();
    let mut i = 1;
    while i < lcp.len() {
        if lcp[i] < min_tokens {
            i += 1;
            continue;
        }
        let run_start = i - 1;
        let mut run_end = i;
        let mut min_lcp = lcp[i];
        while run_end + 1 < lcp.len() && lcp[run_end + 1] >= min_tokens {
            run_end += 1;
            min_lcp = min_lcp.min(lcp[run_end]);
        }

        let starts: Vec<usize> = sa[run_start..=run_end].to_vec();
        let occurrences: Vec<_> = starts
            .iter()
            .filter(|&&s| !stream.range_crosses_boundary(s..s + min_lcp))
            .map(|&s| occurrence_from_range(stream, s, s + min_lcp))
            .collect();
        let occurrences = prune_nested_occurrences(occurrences);

        if occurrences.len() >= 2 {
            let fingerprint = stream.hash_range(starts[0]..starts[0] + min_lcp);
            groups.push(CloneGroup {
                kind: CloneType::Exact,
                fingerprint,
                similarity: 1.0,
                occurrences,
            });
        }

        i = run_end + 1;
    }

    groups.sort_by_key(|g| (g.occurrences[0].file.clone(), g.occurrences[0].start_token));
    groups
}
