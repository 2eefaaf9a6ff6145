//! Benchmarks for vtable flat-table construction and growable-buffer growth.

#![allow(clippy::unwrap_used, missing_docs)]

use arrow_format::buffer::GrowableBuffer;
use arrow_format::flatbuf::TableBuilder;
use arrow_format::schema::{DataType, Field, Schema};
use arrow_format::message::create_arrow_schema;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_table_builder_flatten(c: &mut Criterion) {
    c.bench_function("table_builder_flatten_scalars", |b| {
        b.iter(|| {
            let mut builder = TableBuilder::new(4);
            builder.add_i32(0, black_box(42)).unwrap();
            builder.add_i64(1, black_box(1_000_000)).unwrap();
            builder.add_bool(2, black_box(true)).unwrap();
            builder.add_string(3, black_box("column_name")).unwrap();
            black_box(builder.flatten())
        })
    });
}

fn bench_schema_with_many_fields(c: &mut Criterion) {
    let fields: Vec<Field> = (0..64)
        .map(|i| {
            Field::new(
                format!("col_{i}"),
                DataType::Int {
                    bit_width: 32,
                    is_signed: true,
                },
            )
        })
        .collect();
    let schema = Schema::new(fields);

    c.bench_function("create_arrow_schema_64_fields", |b| {
        b.iter(|| black_box(create_arrow_schema(black_box(&schema))))
    });
}

fn bench_growable_buffer_append(c: &mut Criterion) {
    c.bench_function("growable_buffer_append_1mib", |b| {
        let chunk = vec![0xABu8; 4096];
        b.iter(|| {
            let mut buf = GrowableBuffer::with_capacity(4096).unwrap();
            for _ in 0..256 {
                buf.append(black_box(&chunk)).unwrap();
            }
            black_box(buf.usage())
        })
    });
}

criterion_group!(
    benches,
    bench_table_builder_flatten,
    bench_schema_with_many_fields,
    bench_growable_buffer_append,
);
criterion_main!(benches);
