//! Converts resolved catalog columns into the columnar schema tree.

use arrow_format::{Field, Schema};
use arrow_types::ResolvedColumn;

/// Build the file-level [`Schema`] from the resolved top-level columns,
/// recursing into `Struct` children.
pub fn build_schema(columns: &[ResolvedColumn]) -> Schema {
    Schema::new(columns.iter().map(build_field).collect())
}

fn build_field(column: &ResolvedColumn) -> Field {
    let children = column.children.iter().map(build_field).collect::<Vec<_>>();
    Field::new(column.name.clone(), column.data_type.clone()).with_children(children)
}
