//! End-to-end scenario tests, built on `pg2arrow-testing`'s synthetic row
//! builders: one test per documented scenario (single column, variable-length
//! column, batch splitting, reader round-trip, decimal decoding, malformed
//! composite rejection).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use arrow_types::{resolve, ColumnCatalog};
use pg2arrow::{ArrowFileWriter, EncoderConfig};
use pg2arrow_reader::ArrowFileReader;
use pg2arrow_testing::{composite_column, int4_column, numeric_column, text_column, RowBuilder, ScalarValue};
use tempfile::NamedTempFile;

fn bool_column(name: &str) -> ColumnCatalog {
    ColumnCatalog::scalar(name, "pg_catalog", "bool", 1)
}

fn resolved(catalog: &[arrow_types::ColumnCatalog]) -> Vec<arrow_types::ResolvedColumn> {
    catalog.iter().map(resolve).collect::<Result<_, _>>().expect("resolve")
}

#[test]
fn scenario_single_int_column_with_a_null() {
    let catalog = vec![int4_column("id")];
    let tmp = NamedTempFile::new().unwrap();
    let config = EncoderConfig::new(tmp.path());
    let mut writer = ArrowFileWriter::create_resolved(config, &resolved(&catalog)).unwrap();

    let mut rows = RowBuilder::new();
    rows.push_row(vec![ScalarValue::Int(1, 4)]);
    rows.push_row(vec![ScalarValue::Int(2, 4)]);
    rows.push_row(vec![ScalarValue::Null]);
    rows.push_row(vec![ScalarValue::Int(3, 4)]);
    for row in rows.as_rows() {
        writer.append_row(&row).unwrap();
    }
    writer.close().unwrap();

    let reader = ArrowFileReader::open(tmp.path()).unwrap();
    let batches = reader.record_batches().unwrap();
    let col = &batches[0].columns[0];
    assert_eq!(col.length, 4);
    assert_eq!(col.null_count, 1);
    assert_eq!(col.validity.unwrap()[0] & 0b1111, 0b1011);

    let expected: Vec<u8> = [1i32, 2, 0, 3].iter().flat_map(|v| v.to_le_bytes()).collect();
    assert_eq!(&col.values[0..16], &expected[..]);
}

#[test]
fn scenario_text_column_with_empty_and_null_values() {
    let catalog = vec![text_column("name")];
    let tmp = NamedTempFile::new().unwrap();
    let config = EncoderConfig::new(tmp.path());
    let mut writer = ArrowFileWriter::create_resolved(config, &resolved(&catalog)).unwrap();

    let mut rows = RowBuilder::new();
    rows.push_row(vec![ScalarValue::Text("a".into())]);
    rows.push_row(vec![ScalarValue::Text(String::new())]);
    rows.push_row(vec![ScalarValue::Null]);
    rows.push_row(vec![ScalarValue::Text("bc".into())]);
    for row in rows.as_rows() {
        writer.append_row(&row).unwrap();
    }
    writer.close().unwrap();

    let reader = ArrowFileReader::open(tmp.path()).unwrap();
    let batches = reader.record_batches().unwrap();
    let col = &batches[0].columns[0];
    assert_eq!(col.length, 4);
    assert_eq!(col.null_count, 1);
    assert_eq!(col.validity.unwrap()[0] & 0b1111, 0b1011);

    let offsets: Vec<u32> = (0..5)
        .map(|i| u32::from_le_bytes(col.values[i * 4..i * 4 + 4].try_into().unwrap()))
        .collect();
    assert_eq!(offsets, vec![0, 1, 1, 1, 3]);
    assert_eq!(&col.extra.unwrap()[0..3], b"abc");
}

#[test]
fn scenario_oversized_row_forces_two_record_batches() {
    let catalog = vec![int4_column("id")];
    let tmp = NamedTempFile::new().unwrap();
    // Small enough that the fifth row's values region crosses an align8
    // boundary, forcing exactly one mid-stream flush.
    let config = EncoderConfig::new(tmp.path()).segment_size_bytes(16);
    let mut writer = ArrowFileWriter::create_resolved(config, &resolved(&catalog)).unwrap();

    let mut rows = RowBuilder::new();
    for i in 0..5 {
        rows.push_row(vec![ScalarValue::Int(i, 4)]);
    }
    for row in rows.as_rows() {
        writer.append_row(&row).unwrap();
    }
    assert_eq!(writer.flushed_batch_count(), 1);
    writer.close().unwrap();

    let reader = ArrowFileReader::open(tmp.path()).unwrap();
    let batches = reader.record_batches().unwrap();
    assert_eq!(batches.len(), 2);
    let total_rows: i64 = batches.iter().map(|b| b.length).sum();
    assert_eq!(total_rows, 5);
}

#[test]
fn scenario_reader_round_trips_a_mixed_schema() {
    let catalog = vec![int4_column("id"), text_column("name"), bool_column("active")];
    let tmp = NamedTempFile::new().unwrap();
    let config = EncoderConfig::new(tmp.path());
    let mut writer = ArrowFileWriter::create_resolved(config, &resolved(&catalog)).unwrap();

    let mut rows = RowBuilder::new();
    rows.push_row(vec![
        ScalarValue::Int(1, 4),
        ScalarValue::Text("alice".into()),
        ScalarValue::Bool(true),
    ]);
    rows.push_row(vec![ScalarValue::Int(2, 4), ScalarValue::Null, ScalarValue::Null]);
    for row in rows.as_rows() {
        writer.append_row(&row).unwrap();
    }
    writer.close().unwrap();

    let reader = ArrowFileReader::open(tmp.path()).unwrap();
    let schema = reader.schema();
    assert_eq!(schema.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), [
        "id", "name", "active"
    ]);

    let batches = reader.record_batches().unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.length, 2);
    assert_eq!(batch.columns[1].null_count, 1);
    assert_eq!(batch.columns[2].null_count, 1);
}

#[test]
fn scenario_numeric_column_decodes_to_its_declared_scale() {
    let catalog = vec![numeric_column("amount", 10, 2)];
    let tmp = NamedTempFile::new().unwrap();
    let config = EncoderConfig::new(tmp.path());
    let mut writer = ArrowFileWriter::create_resolved(config, &resolved(&catalog)).unwrap();

    let mut rows = RowBuilder::new();
    rows.push_row(vec![ScalarValue::Numeric(1_234_567, 2)]); // 12345.67
    for row in rows.as_rows() {
        writer.append_row(&row).unwrap();
    }
    writer.close().unwrap();

    let reader = ArrowFileReader::open(tmp.path()).unwrap();
    let batches = reader.record_batches().unwrap();
    let values = batches[0].columns[0].values;
    assert_eq!(i128::from_le_bytes(values[0..16].try_into().unwrap()), 1_234_567);
}

#[test]
fn scenario_malformed_composite_row_is_rejected_without_partial_writes() {
    let catalog = vec![composite_column("addr", 16385, vec![int4_column("zip")])];
    let config = EncoderConfig::new(NamedTempFile::new().unwrap().path());
    let mut writer = ArrowFileWriter::create_resolved(config, &resolved(&catalog)).unwrap();

    // n_fields=1, atttypid=0 (matching the unset `ColumnCatalog::scalar`
    // default so the type-id check passes), attlen=999 (far larger than the
    // 2 bytes of payload that actually follow) — a truncated/corrupt composite.
    let mut wire = Vec::new();
    wire.extend_from_slice(&1i32.to_be_bytes());
    wire.extend_from_slice(&0i32.to_be_bytes());
    wire.extend_from_slice(&999i32.to_be_bytes());
    wire.extend_from_slice(&[0u8, 0u8]);

    let err = writer.append_row(&vec![Some(&wire[..])]).unwrap_err();
    assert!(matches!(err, pg2arrow::WriterError::Ingest(pg_row_ingest::IngestError::CompositeCorruption)));
}
