//! Benchmarks for file name classification
//!
//! Tests performance of the network-free part of resolution: noise
//! stripping, type classification, index extraction and candidate matching.

use animatch::classifier::{classify, strip_noise};
use animatch::config::ResolverConfig;
use animatch::extractor::IndexExtractor;
use animatch::matcher::{MatchQuery, Matcher};
use animatch_common::{EpisodeId, EpisodeRecord, EpisodeType, SubjectId};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const NAMES: &[(&str, &str)] = &[
    ("plain", "Show - 05.mkv"),
    (
        "noisy",
        "[Group] Show - 05v2 [1080p][x264][10bit][ABCD1234].mkv",
    ),
    (
        "bdrip",
        "White Album 2[01][Hi10p_1080p][BDRip][x264_2flac].mkv",
    ),
    ("opening", "[Group] Show - NCOP2 [1080p].mkv"),
    ("special", "[Group] Show OVA [BDRip].mkv"),
];

fn season(count: u32) -> Vec<EpisodeRecord> {
    let mut records: Vec<EpisodeRecord> = (1..=count)
        .map(|n| EpisodeRecord {
            id: EpisodeId::new(u64::from(n)),
            ..EpisodeRecord::synthesized(SubjectId::new(1), EpisodeType::Normal, f64::from(n))
        })
        .collect();
    records.extend((1..=count / 4).map(|n| EpisodeRecord {
        id: EpisodeId::new(10_000 + u64::from(n)),
        ..EpisodeRecord::synthesized(SubjectId::new(1), EpisodeType::Special, f64::from(n))
    }));
    records
}

fn bench_strip_and_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for (label, name) in NAMES {
        group.bench_with_input(BenchmarkId::new("strip_noise", label), name, |b, name| {
            b.iter(|| strip_noise(black_box(name)));
        });
        group.bench_with_input(BenchmarkId::new("classify", label), name, |b, name| {
            b.iter(|| classify(black_box(name), Some("Show")));
        });
    }

    group.finish();
}

fn bench_index_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_extraction");
    let extractor = IndexExtractor::new(&ResolverConfig::default());

    for (label, name) in NAMES {
        let stripped = strip_noise(name);
        group.bench_with_input(BenchmarkId::new("extract", label), &stripped, |b, stripped| {
            b.iter(|| extractor.extract(black_box(stripped), Some(5.0), Some(24.0), None));
        });
    }

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    let matcher = Matcher::default();

    for count in [12u32, 26, 100, 500] {
        let candidates = season(count);
        let query = MatchQuery {
            index: f64::from(count),
            alternate: None,
        };
        group.bench_with_input(
            BenchmarkId::new("last_episode", count),
            &candidates,
            |b, candidates| {
                b.iter(|| matcher.select(black_box(candidates), black_box(&query)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_strip_and_classify,
    bench_index_extraction,
    bench_matching
);
criterion_main!(benches);
