//! The catalog descriptor a database client delivers for each result column.
//!
//! This is the input half of resolution: one [`ColumnCatalog`] per column,
//! as the source database's type catalog reports it. Fetching these
//! descriptors (querying `pg_type`/`pg_attribute` or their equivalent) is an
//! external collaborator's job; this crate only consumes the result.

/// The source type's storage class, as the catalog's single-character
/// `typtype` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// An ordinary base type (`'b'`).
    Base,
    /// A composite (row) type (`'c'`).
    Composite,
    /// A domain over another type (`'d'`).
    Domain,
    /// An enumerated type (`'e'`).
    Enum,
}

/// One column's type-catalog descriptor, as delivered by the external
/// database client.
#[derive(Debug, Clone)]
pub struct ColumnCatalog {
    /// The column's name.
    pub attname: String,
    /// The source type's OID (or equivalent numeric type identifier).
    pub type_id: u32,
    /// The type modifier (`atttypmod`); encodes precision/scale for
    /// `numeric`, length for `varchar`, etc. `-1` means "no modifier".
    pub type_modifier: i32,
    /// Fixed storage width in bytes, or `-1` for variable-length types.
    pub byte_length: i16,
    /// Whether values of this type are passed by value (fits in a machine
    /// word) rather than by reference.
    pub by_value: bool,
    /// Required alignment in bytes.
    pub alignment: u8,
    /// The type's storage class.
    pub type_class: TypeClass,
    /// For composite types, the relation OID describing the row's columns.
    pub composite_rel_id: Option<u32>,
    /// For array types, the element type's OID.
    pub element_type_id: Option<u32>,
    /// The type's namespace (schema), e.g. `"pg_catalog"`.
    pub type_namespace: String,
    /// The type's unqualified name, e.g. `"int4"`.
    pub type_name: String,
    /// For composite columns, the subtype columns in declaration order.
    /// Populated by the caller (looking these up is the same external
    /// catalog-lookup collaborator that produced this descriptor);
    /// meaningless for non-composite columns.
    pub children: Vec<ColumnCatalog>,
}

impl ColumnCatalog {
    /// Construct a scalar (non-array, non-composite) base-type descriptor
    /// with no children — the common case for primitive columns.
    #[must_use]
    pub fn scalar(
        attname: impl Into<String>,
        type_namespace: impl Into<String>,
        type_name: impl Into<String>,
        byte_length: i16,
    ) -> Self {
        Self {
            attname: attname.into(),
            type_id: 0,
            type_modifier: -1,
            byte_length,
            by_value: byte_length > 0 && byte_length <= 8,
            alignment: byte_length.clamp(1, 8) as u8,
            type_class: TypeClass::Base,
            composite_rel_id: None,
            element_type_id: None,
            type_namespace: type_namespace.into(),
            type_name: type_name.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style setter for [`ColumnCatalog::type_modifier`].
    #[must_use]
    pub fn with_type_modifier(mut self, type_modifier: i32) -> Self {
        self.type_modifier = type_modifier;
        self
    }

    /// Builder-style setter marking this descriptor as an array over
    /// `element_type_id`.
    #[must_use]
    pub fn with_element_type(mut self, element_type_id: u32) -> Self {
        self.element_type_id = Some(element_type_id);
        self
    }

    /// Builder-style setter marking this descriptor as a composite type
    /// backed by `rel_id`, with the given subtype columns.
    #[must_use]
    pub fn with_composite(mut self, rel_id: u32, children: Vec<ColumnCatalog>) -> Self {
        self.composite_rel_id = Some(rel_id);
        self.type_class = TypeClass::Composite;
        self.children = children;
        self
    }
}
