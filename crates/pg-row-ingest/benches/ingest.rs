use arrow_format::DataType;
use arrow_types::ResolvedColumn;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pg_row_ingest::ColumnIngester;

fn int_column() -> ResolvedColumn {
    ResolvedColumn {
        name: "id".to_string(),
        data_type: DataType::Int {
            bit_width: 32,
            is_signed: true,
        },
        source_type_id: 23,
        children: Vec::new(),
    }
}

fn text_column() -> ResolvedColumn {
    ResolvedColumn {
        name: "name".to_string(),
        data_type: DataType::Utf8,
        source_type_id: 25,
        children: Vec::new(),
    }
}

fn bench_ingest_int_column(c: &mut Criterion) {
    c.bench_function("ingest 10k int4 rows", |b| {
        b.iter(|| {
            let resolved = int_column();
            let mut ingester = ColumnIngester::new(&resolved).unwrap();
            for i in 0..10_000i32 {
                ingester.put_value(Some(black_box(&i.to_be_bytes()))).unwrap();
            }
            black_box(ingester.row_count());
        });
    });
}

fn bench_ingest_text_column(c: &mut Criterion) {
    c.bench_function("ingest 10k short text rows", |b| {
        b.iter(|| {
            let resolved = text_column();
            let mut ingester = ColumnIngester::new(&resolved).unwrap();
            for _ in 0..10_000 {
                ingester.put_value(Some(black_box(b"hello world"))).unwrap();
            }
            black_box(ingester.row_count());
        });
    });
}

criterion_group!(benches, bench_ingest_int_column, bench_ingest_text_column);
criterion_main!(benches);
