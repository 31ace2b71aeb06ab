//! Benchmarks for fieldstore operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fieldstore::config::{Config, JournalSyncStrategy};
use fieldstore::gather::{HandleGatherer, PartHandle};
use fieldstore::{Journal, Key, Schema};
use tempfile::TempDir;

const SCHEMA: &str = "[class=od/rd,expver,stream[date,time[levtype=sfc[param,step]][levtype=pl[levelist,param,step]]]]";

fn journal_benchmarks(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .sync_strategy(JournalSyncStrategy::OsBuffered)
        .build()
        .unwrap();
    let journal = Journal::new(temp.path().join("od:0001:oper"), &config);
    journal
        .write_init(&Key::new().with("class", "od").with("expver", "0001"))
        .unwrap();

    for i in 0..1000u64 {
        journal.write_index(&format!("index.{}", i % 50), i * 4096, b"meta").unwrap();
        if i % 10 == 9 {
            journal.write_clear(&format!("index.{}", (i - 5) % 50), (i - 5) * 4096).unwrap();
        }
    }

    c.bench_function("journal_replay_1000", |b| {
        b.iter(|| black_box(journal.reconstruct().unwrap()))
    });
}

fn schema_benchmarks(c: &mut Criterion) {
    let schema = Schema::parse(SCHEMA).unwrap();
    let key = Key::new()
        .with("class", "od")
        .with("expver", "0001")
        .with("stream", "oper")
        .with("date", "20160101")
        .with("time", "1200")
        .with("levtype", "pl")
        .with("levelist", "500")
        .with("param", "t")
        .with("step", "6");

    c.bench_function("schema_parse", |b| b.iter(|| Schema::parse(black_box(SCHEMA)).unwrap()));
    c.bench_function("schema_match_first_level", |b| {
        b.iter(|| schema.match_first_level(black_box(&Key::new().with("stream", "oper"))))
    });
    c.bench_function("schema_match_full", |b| b.iter(|| schema.match_full(black_box(&key))));
}

fn gather_benchmarks(c: &mut Criterion) {
    c.bench_function("gather_sorted_1000", |b| {
        b.iter(|| {
            let mut gatherer = HandleGatherer::sorted();
            for i in 0..1000u64 {
                gatherer.add(PartHandle::new(format!("data.{}", i % 7), (i / 7) * 100, 100));
            }
            black_box(gatherer.data_handle())
        })
    });
}

criterion_group!(benches, journal_benchmarks, schema_benchmarks, gather_benchmarks);
criterion_main!(benches);
