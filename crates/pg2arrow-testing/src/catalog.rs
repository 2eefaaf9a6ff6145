//! Catalog fixtures for common column shapes, built with the same
//! `ColumnCatalog` builders a real catalog lookup would use.

use arrow_types::ColumnCatalog;

/// A 4-byte signed integer column (`int4`/`oid` family, type id 23).
#[must_use]
pub fn int4_column(name: &str) -> ColumnCatalog {
    ColumnCatalog::scalar(name, "pg_catalog", "int4", 4)
}

/// A variable-length text column (`text`, type id 25).
#[must_use]
pub fn text_column(name: &str) -> ColumnCatalog {
    ColumnCatalog::scalar(name, "pg_catalog", "text", -1)
}

/// A `numeric(precision, scale)` column, with the type modifier encoded the
/// way the catalog reports it: `((precision << 16) | scale) + 4`.
#[must_use]
pub fn numeric_column(name: &str, precision: u16, scale: u16) -> ColumnCatalog {
    let modifier = ((u32::from(precision) << 16) | u32::from(scale)) as i32 + 4;
    ColumnCatalog::scalar(name, "pg_catalog", "numeric", -1).with_type_modifier(modifier)
}

/// A `timestamptz` column (type id 1184).
#[must_use]
pub fn timestamptz_column(name: &str) -> ColumnCatalog {
    ColumnCatalog::scalar(name, "pg_catalog", "timestamptz", 8)
}

/// A composite (row) column backed by `rel_id`, with the given subtype
/// columns in declaration order.
#[must_use]
pub fn composite_column(name: &str, rel_id: u32, children: Vec<ColumnCatalog>) -> ColumnCatalog {
    ColumnCatalog::scalar(name, "public", name, -1).with_composite(rel_id, children)
}
