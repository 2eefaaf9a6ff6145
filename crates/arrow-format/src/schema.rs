//! The columnar schema tree: [`DataType`], [`Field`], [`Schema`].

/// Floating-point precision tag used by [`DataType::FloatingPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPrecision {
    /// 16-bit half-precision float.
    Half,
    /// 32-bit single-precision float.
    Single,
    /// 64-bit double-precision float.
    Double,
}

/// Unit for [`DataType::Date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    /// Days since the Unix epoch, stored as `i32`.
    Day,
    /// Milliseconds since the Unix epoch, stored as `i64`.
    Millisecond,
}

/// Unit for [`DataType::Time`] and [`DataType::Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Microseconds.
    Microsecond,
    /// Nanoseconds.
    Nanosecond,
}

/// Dense vs. sparse union layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionMode {
    /// One values buffer per member, all the same length.
    Sparse,
    /// One values buffer per member, lengths independent; an extra offsets
    /// buffer selects the element within the active member.
    Dense,
}

/// The closed set of column type variants the schema tree supports.
///
/// Variants not reachable from [`crate::message`]'s record-batch writer
/// (`List`, `Struct`, `Union`, `Map`, `FixedSizeList`) remain part of the
/// type model — the reader needs them to reconstruct an arbitrary schema —
/// even though `pg-row-ingest` never emits columns of those kinds (see the
/// Non-goals on nested/list/union column *writing*).
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// No physical storage; every value is null.
    Null,
    /// Fixed-width integer.
    Int {
        /// Bit width: 8, 16, 32, or 64.
        bit_width: u8,
        /// Whether the integer is two's-complement signed.
        is_signed: bool,
    },
    /// IEEE 754 floating point.
    FloatingPoint(FloatPrecision),
    /// Variable-length UTF-8 text.
    Utf8,
    /// Variable-length opaque bytes.
    Binary,
    /// Boolean, stored one bit per value.
    Bool,
    /// Fixed-precision decimal, stored as a 128-bit signed integer scaled by
    /// `10^scale`.
    Decimal {
        /// Total number of significant digits.
        precision: u16,
        /// Digits to the right of the decimal point.
        scale: u16,
    },
    /// Calendar date.
    Date(DateUnit),
    /// Time of day, no date component.
    Time {
        /// Resolution.
        unit: TimeUnit,
        /// Storage width: 32 or 64 bits.
        bit_width: u8,
    },
    /// Calendar date and time.
    Timestamp {
        /// Resolution.
        unit: TimeUnit,
        /// IANA timezone name, if the column carries one.
        timezone: Option<String>,
    },
    /// Elapsed time not tied to a calendar.
    Interval(TimeUnit),
    /// Nested list column (reader-only; not written, see Non-goals).
    List,
    /// Nested composite column (reader-only; not written, see Non-goals).
    Struct,
    /// Tagged union column (reader-only; not written, see Non-goals).
    Union {
        /// Sparse or dense layout.
        mode: UnionMode,
        /// Type ids for each member, in declaration order.
        type_ids: Vec<i32>,
    },
    /// Fixed-width opaque bytes.
    FixedSizeBinary {
        /// Width in bytes of every element.
        byte_width: i32,
    },
    /// Fixed-length list column (reader-only; not written).
    FixedSizeList {
        /// Number of elements per list.
        list_size: i32,
    },
    /// Key/value map column (reader-only; not written).
    Map {
        /// Whether keys within each map entry are sorted.
        keys_sorted: bool,
    },
}

impl DataType {
    /// Whether this type's single-row storage is a fixed number of bytes
    /// (as opposed to `Utf8`/`Binary`, whose storage is an offsets buffer
    /// plus a variable-length extra region).
    pub fn is_fixed_width(&self) -> bool {
        !matches!(self, DataType::Utf8 | DataType::Binary)
    }
}

/// Dictionary encoding metadata attached to a [`Field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEncoding {
    /// Identifier shared with the corresponding `DictionaryBatch`.
    pub id: i64,
    /// Index type (always a signed integer in practice).
    pub index_bit_width: u8,
    /// Whether the dictionary may be updated by later `DictionaryBatch`
    /// deltas.
    pub is_ordered: bool,
}

/// One column definition in a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Whether the column may contain nulls.
    pub nullable: bool,
    /// The column's type.
    pub data_type: DataType,
    /// Present only for dictionary-encoded columns (reserved; see
    /// `EncoderConfig::emit_dictionary_batches`).
    pub dictionary: Option<DictionaryEncoding>,
    /// Child fields, populated for `Struct`/`List`/`Union`/`Map` columns.
    pub children: Vec<Field>,
    /// Arbitrary string key/value metadata carried alongside the field.
    pub metadata: Vec<(String, String)>,
}

impl Field {
    /// Construct a nullable field with no dictionary, children, or
    /// metadata.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            nullable: true,
            data_type,
            dictionary: None,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Builder-style setter for [`Field::nullable`].
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Builder-style setter for [`Field::children`].
    #[must_use]
    pub fn with_children(mut self, children: Vec<Field>) -> Self {
        self.children = children;
        self
    }
}

/// An ordered sequence of [`Field`]s, plus file-level custom metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// Columns, in on-disk order.
    pub fields: Vec<Field>,
    /// Arbitrary string key/value metadata carried alongside the schema.
    pub metadata: Vec<(String, String)>,
}

impl Schema {
    /// Construct a schema from a field list with no custom metadata.
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            metadata: Vec::new(),
        }
    }
}
