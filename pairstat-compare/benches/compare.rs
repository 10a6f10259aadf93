use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pairstat_compare::statistic::{MannWhitney, Pearson};
use pairstat_compare::{compare, CompareOptions, PairData};
use pairstat_core::Result;
use pairstat_stats::CorrectionMethod;
use pairstat_table::{RowTags, Table};

fn random_f64(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

fn random_table(n_columns: usize, n_rows: usize) -> Table {
    let names = (0..n_columns).map(|i| format!("c{i:03}")).collect();
    let columns = (0..n_columns)
        .map(|i| random_f64(n_rows, i as u64 + 1))
        .collect();
    Table::new(names, columns).unwrap()
}

fn mean_difference(d: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
    let mx = d.x.iter().sum::<f64>() / d.x.len() as f64;
    let my = d.y.iter().sum::<f64>() / d.y.len() as f64;
    Ok((mx - my, (mx - my).abs().min(1.0)))
}

fn bench_full_pairwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pairwise");
    group.sample_size(20);

    // 100 columns → 4,950 pairs
    let table = random_table(100, 50);
    let options = CompareOptions::default();
    group.bench_function("closure_100x50", |b| {
        b.iter(|| compare(black_box(&table), &options, &mean_difference))
    });
    group.bench_function("pearson_100x50", |b| {
        b.iter(|| compare(black_box(&table), &options, &Pearson))
    });
    group.bench_function("mann_whitney_100x50", |b| {
        b.iter(|| compare(black_box(&table), &options, &MannWhitney::default()))
    });

    let fdr = CompareOptions::default().with_correction(CorrectionMethod::BenjaminiHochberg, 0.05);
    group.bench_function("closure_100x50_fdr_bh", |b| {
        b.iter(|| compare(black_box(&table), &fdr, &mean_difference))
    });

    group.finish();
}

fn bench_row_tag(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_tag");
    group.sample_size(20);

    let groups = ["a", "b", "c", "d", "e"];
    let tags: Vec<RowTags> = (0..200)
        .map(|row| RowTags::from([("Site".to_string(), groups[row % groups.len()].to_string())]))
        .collect();
    let table = random_table(50, 200).with_row_tags(tags).unwrap();
    let options = CompareOptions::default().with_row_tag_key("Site");
    group.bench_function("closure_50x200_5_groups", |b| {
        b.iter(|| compare(black_box(&table), &options, &mean_difference))
    });

    group.finish();
}

criterion_group!(benches, bench_full_pairwise, bench_row_tag);
criterion_main!(benches);
