//! Mmap-backed entry point: opens a file this crate's sibling writer
//! produced, validates its framing, and exposes the decoded schema and
//! record batches.

use std::fs::File;
use std::path::Path;

use arrow_format::{Schema, MAGIC};
use memmap2::Mmap;
use tracing::{debug, instrument};

use crate::batch::{columns, ColumnView};
use crate::error::ReaderError;
use crate::flatbuf::TableCursor;
use crate::message::{decode_arrow_footer, decode_arrow_record_batch, DecodedBlock, DecodedFooter};

/// An open, memory-mapped file, positioned for decoding.
pub struct ArrowFileReader {
    mmap: Mmap,
    footer: DecodedFooter,
}

/// Peek a table's `vlen` header (its first two bytes) to find its root —
/// the table root always sits exactly `vlen` bytes after the flat-table's
/// own start, see `arrow_format::flatbuf::TableBuilder::flatten`.
fn table_root_from_start(data: &[u8], start: usize) -> Result<usize, ReaderError> {
    let vlen_bytes = data.get(start..start + 2).ok_or(ReaderError::Truncated {
        expected: start + 2,
        found: data.len(),
    })?;
    let vlen = u16::from_le_bytes(vlen_bytes.try_into().expect("checked above")) as usize;
    Ok(start + vlen)
}

/// Open the `Message` envelope at a block's `metaLength` word and return a
/// cursor onto its nested header table (the Schema or RecordBatch the
/// message wraps).
fn open_message_header<'a>(data: &'a [u8], block: &DecodedBlock) -> Result<TableCursor<'a>, ReaderError> {
    let message_start = block.offset as usize + 8;
    let message_root = table_root_from_start(data, message_start)?;
    let message_cursor = TableCursor::at(data, message_root)?;
    message_cursor
        .get_table(2)?
        .ok_or(ReaderError::MissingRequiredField { table: "Message", field: 2 })
}

/// One decoded record batch: its row count and the columns walked out of
/// its `FieldNode`/`Buffer` descriptors.
pub struct RecordBatchView<'a> {
    /// Rows shared by every top-level column.
    pub length: i64,
    /// Decoded columns, in schema field order.
    pub columns: Vec<ColumnView<'a>>,
}

impl ArrowFileReader {
    /// Map `path` and decode its footer (the schema and the record-batch
    /// block index). Record batches themselves decode lazily on
    /// [`ArrowFileReader::record_batches`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let file = File::open(path.as_ref())?;
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_mmap(mmap)
    }

    fn from_mmap(mmap: Mmap) -> Result<Self, ReaderError> {
        let data: &[u8] = &mmap;
        if data.len() < 6 + 2 + 10 || &data[0..6] != MAGIC {
            return Err(ReaderError::BadMagic);
        }
        let tail = &data[data.len() - 10..];
        if &tail[6..10] != MAGIC {
            return Err(ReaderError::BadMagic);
        }
        let tail_meta_len = i32::from_le_bytes(tail[0..4].try_into().expect("4 bytes")) as usize;
        let footer_block_start = data
            .len()
            .checked_sub(10 + 4 + tail_meta_len)
            .ok_or(ReaderError::Truncated {
                expected: 10 + 4 + tail_meta_len,
                found: data.len(),
            })?;
        let recorded_meta_len =
            i32::from_le_bytes(data[footer_block_start..footer_block_start + 4].try_into().expect("4 bytes")) as usize;
        if recorded_meta_len != tail_meta_len {
            return Err(ReaderError::Truncated {
                expected: tail_meta_len,
                found: recorded_meta_len,
            });
        }

        let footer_table_start = footer_block_start + 8;
        let footer_root = table_root_from_start(data, footer_table_start)?;
        let footer_cursor = TableCursor::at(data, footer_root)?;
        let footer = decode_arrow_footer(&footer_cursor)?;
        debug!(
            fields = footer.schema.fields.len(),
            record_batches = footer.record_batches.len(),
            "opened arrow file"
        );

        Ok(Self { mmap, footer })
    }

    /// The file-level schema, decoded from the footer's embedded copy (the
    /// writer emits the same schema twice: once as the leading Schema
    /// message, once inline in the footer; this reader only needs the
    /// latter).
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.footer.schema
    }

    /// Decode every record batch, in on-disk order.
    pub fn record_batches(&self) -> Result<Vec<RecordBatchView<'_>>, ReaderError> {
        let data: &[u8] = &self.mmap;
        self.footer
            .record_batches
            .iter()
            .map(|block| self.record_batch_at(data, block))
            .collect()
    }

    fn record_batch_at<'a>(&'a self, data: &'a [u8], block: &DecodedBlock) -> Result<RecordBatchView<'a>, ReaderError> {
        let header_cursor = open_message_header(data, block)?;
        let decoded = decode_arrow_record_batch(&header_cursor)?;

        let body_start = block.offset as usize + 8 + (block.meta_data_length as usize - 4);
        let body_end = body_start + block.body_length as usize;
        let body = data.get(body_start..body_end).ok_or(ReaderError::Truncated {
            expected: body_end,
            found: data.len(),
        })?;

        let cols = columns(&self.footer.schema.fields, &decoded, body)?;
        Ok(RecordBatchView {
            length: decoded.length,
            columns: cols,
        })
    }

    /// Print the reconstructed schema and per-batch column shapes to
    /// stdout, for development diagnostics.
    pub fn dump(&self) -> Result<(), ReaderError> {
        println!("schema:");
        for field in &self.footer.schema.fields {
            println!("  {} {:?} nullable={}", field.name, field.data_type, field.nullable);
        }
        for (i, batch) in self.record_batches()?.iter().enumerate() {
            println!("record batch {i}: {} rows", batch.length);
            dump_columns(&batch.columns, 1);
        }
        Ok(())
    }
}

fn dump_columns(cols: &[ColumnView<'_>], depth: usize) {
    let indent = "  ".repeat(depth);
    for col in cols {
        println!(
            "{indent}{} len={} nulls={}",
            col.field.name, col.length, col.null_count
        );
        if !col.children.is_empty() {
            dump_columns(&col.children, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_types::resolve;
    use pg2arrow::{ArrowFileWriter, EncoderConfig};
    use pg2arrow_testing::{int4_column, text_column, RowBuilder, ScalarValue};
    use tempfile::NamedTempFile;

    #[test]
    fn round_trips_schema_and_rows() {
        let tmp = NamedTempFile::new().expect("tempfile");
        let catalog = vec![int4_column("id"), text_column("name")];
        let resolved: Vec<_> = catalog.iter().map(resolve).collect::<Result<_, _>>().expect("resolve");

        let config = EncoderConfig::new(tmp.path());
        let mut writer = ArrowFileWriter::create_resolved(config, &resolved).expect("create");

        let mut rows = RowBuilder::new();
        rows.push_row(vec![ScalarValue::Int(1, 4), ScalarValue::Text("alice".into())]);
        rows.push_row(vec![ScalarValue::Int(2, 4), ScalarValue::Null]);
        for row in rows.as_rows() {
            writer.append_row(&row).expect("append");
        }
        writer.close().expect("close");

        let reader = ArrowFileReader::open(tmp.path()).expect("open");
        assert_eq!(reader.schema().fields.len(), 2);
        assert_eq!(reader.schema().fields[0].name, "id");
        assert_eq!(reader.schema().fields[1].name, "name");

        let batches = reader.record_batches().expect("record batches");
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].length, 2);
        assert_eq!(batches[0].columns.len(), 2);
        assert_eq!(batches[0].columns[1].null_count, 1);
    }
}
