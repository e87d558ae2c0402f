//! Clone engine benchmarks.
//!
//! Run with: cargo bench --bench clone_detection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use swa_engine::clone::detect_clones;
use swa_engine::config::{CloneAlgorithm, Config};
use swa_engine::tokens::{RawToken, TokenKind, TokenStreamBuilder};

fn synthetic_stream(file_count: usize, tokens_per_file: usize) -> swa_engine::tokens::TokenStream {
    let mut builder = TokenStreamBuilder::default();
    let source: Arc<str> = Arc::from("x".repeat(tokens_per_file * 2));
    for f in 0..file_count {
        let toks: Vec<RawToken> = (0..tokens_per_file)
            .map(|i| RawToken {
                kind: TokenKind::Identifier,
                offset: (i * 2) as u32,
                length: 1,
                line: 1,
                column: (i * 2 + 1) as u32,
            })
            .collect();
        builder.push_file(format!("file{f}.swift"), source.clone(), &toks);
    }
    builder.build()
}

fn bench_rolling_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_hash");
    for files in [4usize, 16, 64] {
        let stream = synthetic_stream(files, 200);
        let config = Config {
            min_tokens: 50,
            clone_algorithm: CloneAlgorithm::RollingHash,
            ..Config::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(files), &stream, |b, stream| {
            b.iter(|| black_box(detect_clones(stream, &config)));
        });
    }
    group.finish();
}

fn bench_suffix_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("suffix_array");
    for files in [4usize, 16, 64] {
        let stream = synthetic_stream(files, 200);
        let config = Config {
            min_tokens: 50,
            clone_algorithm: CloneAlgorithm::SuffixArray,
            ..Config::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(files), &stream, |b, stream| {
            b.iter(|| black_box(detect_clones(stream, &config)));
        });
    }
    group.finish();
}

fn bench_minhash_lsh(c: &mut Criterion) {
    let mut group = c.benchmark_group("minhash_lsh");
    for files in [4usize, 16, 64] {
        let stream = synthetic_stream(files, 200);
        let config = Config {
            min_tokens: 50,
            min_similarity: 0.8,
            clone_algorithm: CloneAlgorithm::MinHashLsh,
            ..Config::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(files), &stream, |b, stream| {
            b.iter(|| black_box(detect_clones(stream, &config)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rolling_hash, bench_suffix_array, bench_minhash_lsh);
criterion_main!(benches);
