//! Maps a [`ColumnCatalog`] descriptor onto a columnar [`DataType`].

use arrow_format::{DataType, DateUnit, FloatPrecision, TimeUnit};
use tracing::trace;

use crate::catalog::ColumnCatalog;
use crate::error::ResolveError;

/// Default `(precision, scale)` used for a `numeric` column with no type
/// modifier (`type_modifier < 0`). Carried forward from the source this
/// format was distilled from; callers who need a different default should
/// pass an explicit type modifier.
pub const DEFAULT_DECIMAL_PRECISION: u16 = 30;
/// See [`DEFAULT_DECIMAL_PRECISION`].
pub const DEFAULT_DECIMAL_SCALE: u16 = 11;

/// The outcome of resolving one catalog column: its columnar type, whether
/// it may contain nulls, and (for composite columns) its resolved children
/// in declaration order.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    /// The column's name, copied from the catalog descriptor.
    pub name: String,
    /// The resolved columnar type.
    pub data_type: DataType,
    /// The source type's OID, copied from the catalog descriptor. Used to
    /// validate per-subfield type ids embedded in a composite row's binary
    /// payload (§4.3's "binary composite record corruption" check).
    pub source_type_id: u32,
    /// For `Struct` columns, the resolved subtype columns. Empty otherwise.
    pub children: Vec<ResolvedColumn>,
}

impl ResolvedColumn {
    /// Whether this column's ingester tracks running min/max statistics.
    /// Per §4.3, defined for signed integers and floating point only.
    #[must_use]
    pub fn has_stat_update(&self) -> bool {
        matches!(
            self.data_type,
            DataType::Int { is_signed: true, .. } | DataType::FloatingPoint(_)
        )
    }
}

/// Decode a `numeric` type modifier into `(precision, scale)`.
///
/// `type_modifier` encodes `((precision << 16) | scale) + 4`; a negative
/// modifier means "no modifier supplied", which defaults to
/// `(DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE)`.
#[must_use]
pub fn decode_decimal_modifier(type_modifier: i32) -> (u16, u16) {
    if type_modifier < 0 {
        return (DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE);
    }
    let raw = (type_modifier - 4) as u32;
    let precision = ((raw >> 16) & 0xffff) as u16;
    let scale = (raw & 0xffff) as u16;
    (precision, scale)
}

/// Resolve one catalog column into a columnar type, recursing into
/// composite subtypes.
///
/// Priority order, per §4.2:
/// 1. composite (`composite_rel_id` present) → `Struct`.
/// 2. array (`element_type_id` present) → `List`.
/// 3. `pg_catalog` well-known type name → the matching primitive.
/// 4. fall back on `byte_length` (1/2/4/8 → unsigned int, -1 → binary).
pub fn resolve(catalog: &ColumnCatalog) -> Result<ResolvedColumn, ResolveError> {
    if catalog.composite_rel_id.is_some() {
        trace!(type_name = %catalog.type_name, "resolving composite column");
        let children = catalog
            .children
            .iter()
            .map(resolve)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ResolvedColumn {
            name: catalog.attname.clone(),
            data_type: DataType::Struct,
            source_type_id: catalog.type_id,
            children,
        });
    }

    if catalog.element_type_id.is_some() {
        trace!(type_name = %catalog.type_name, "resolving array column");
        return Ok(ResolvedColumn {
            name: catalog.attname.clone(),
            data_type: DataType::List,
            source_type_id: catalog.type_id,
            children: Vec::new(),
        });
    }

    if catalog.type_namespace == "pg_catalog" {
        if let Some(data_type) = resolve_pg_catalog_type(catalog) {
            return Ok(ResolvedColumn {
                name: catalog.attname.clone(),
                data_type,
                source_type_id: catalog.type_id,
                children: Vec::new(),
            });
        }
    }

    match catalog.byte_length {
        1 => Ok(fixed_width_fallback(catalog, 8)),
        2 => Ok(fixed_width_fallback(catalog, 16)),
        4 => Ok(fixed_width_fallback(catalog, 32)),
        8 => Ok(fixed_width_fallback(catalog, 64)),
        -1 => Ok(ResolvedColumn {
            name: catalog.attname.clone(),
            data_type: DataType::Binary,
            source_type_id: catalog.type_id,
            children: Vec::new(),
        }),
        other => Err(ResolveError::UnsupportedType {
            type_name: catalog.type_name.clone(),
            type_namespace: catalog.type_namespace.clone(),
            byte_length: other,
        }),
    }
}

fn fixed_width_fallback(catalog: &ColumnCatalog, bit_width: u8) -> ResolvedColumn {
    ResolvedColumn {
        name: catalog.attname.clone(),
        data_type: DataType::Int {
            bit_width,
            is_signed: false,
        },
        source_type_id: catalog.type_id,
        children: Vec::new(),
    }
}

fn resolve_pg_catalog_type(catalog: &ColumnCatalog) -> Option<DataType> {
    Some(match catalog.type_name.as_str() {
        "bool" => DataType::Bool,
        "int2" => DataType::Int {
            bit_width: 16,
            is_signed: true,
        },
        "int4" => DataType::Int {
            bit_width: 32,
            is_signed: true,
        },
        "int8" => DataType::Int {
            bit_width: 64,
            is_signed: true,
        },
        "float4" => DataType::FloatingPoint(FloatPrecision::Single),
        "float8" => DataType::FloatingPoint(FloatPrecision::Double),
        "date" => DataType::Date(DateUnit::Day),
        "time" => DataType::Time {
            unit: TimeUnit::Microsecond,
            bit_width: 64,
        },
        "timestamp" | "timestamptz" => DataType::Timestamp {
            unit: TimeUnit::Microsecond,
            timezone: None,
        },
        "text" | "varchar" | "bpchar" => DataType::Utf8,
        "numeric" => {
            let (precision, scale) = decode_decimal_modifier(catalog.type_modifier);
            DataType::Decimal { precision, scale }
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnCatalog;

    #[test]
    fn int4_maps_to_signed_32() {
        let col = ColumnCatalog::scalar("id", "pg_catalog", "int4", 4);
        let resolved = resolve(&col).unwrap();
        assert_eq!(
            resolved.data_type,
            DataType::Int {
                bit_width: 32,
                is_signed: true
            }
        );
    }

    #[test]
    fn numeric_decodes_modifier() {
        // precision=10, scale=2: ((10<<16)|2) + 4
        let modifier = ((10i32) << 16 | 2) + 4;
        let col = ColumnCatalog::scalar("amount", "pg_catalog", "numeric", -1).with_type_modifier(modifier);
        let resolved = resolve(&col).unwrap();
        assert_eq!(
            resolved.data_type,
            DataType::Decimal { precision: 10, scale: 2 }
        );
    }

    #[test]
    fn numeric_without_modifier_defaults() {
        let col = ColumnCatalog::scalar("amount", "pg_catalog", "numeric", -1);
        let resolved = resolve(&col).unwrap();
        assert_eq!(
            resolved.data_type,
            DataType::Decimal {
                precision: DEFAULT_DECIMAL_PRECISION,
                scale: DEFAULT_DECIMAL_SCALE
            }
        );
    }

    #[test]
    fn unknown_fixed_byte_length_falls_back_to_unsigned_int() {
        let col = ColumnCatalog::scalar("x", "my_ext", "custom8", 8);
        let resolved = resolve(&col).unwrap();
        assert_eq!(
            resolved.data_type,
            DataType::Int {
                bit_width: 64,
                is_signed: false
            }
        );
    }

    #[test]
    fn variable_byte_length_falls_back_to_binary() {
        let col = ColumnCatalog::scalar("x", "my_ext", "blob", -1);
        let resolved = resolve(&col).unwrap();
        assert_eq!(resolved.data_type, DataType::Binary);
    }

    #[test]
    fn unsupported_byte_length_errors() {
        let col = ColumnCatalog::scalar("x", "my_ext", "weird3", 3);
        let err = resolve(&col).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedType { byte_length: 3, .. }));
    }

    #[test]
    fn composite_resolves_struct_with_children() {
        let child = ColumnCatalog::scalar("a", "pg_catalog", "int4", 4);
        let col = ColumnCatalog::scalar("point", "public", "point_t", -1).with_composite(12345, vec![child]);
        let resolved = resolve(&col).unwrap();
        assert_eq!(resolved.data_type, DataType::Struct);
        assert_eq!(resolved.children.len(), 1);
    }

    #[test]
    fn array_resolves_list() {
        let col = ColumnCatalog::scalar("tags", "pg_catalog", "text", -1).with_element_type(25);
        let resolved = resolve(&col).unwrap();
        assert_eq!(resolved.data_type, DataType::List);
    }
}
