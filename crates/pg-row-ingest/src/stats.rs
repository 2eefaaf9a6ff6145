//! Running min/max tracking for numeric columns.

use arrow_format::DataType;

/// Running min/max for one column, updated as values are ingested.
///
/// Only maintained for signed integer and floating-point columns; every
/// other column carries `stats: None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunningStats {
    /// Signed integer min/max, compared as `i64`.
    Int {
        /// Smallest value observed so far.
        min: i64,
        /// Largest value observed so far.
        max: i64,
    },
    /// Floating point min/max, compared as `f64`.
    Float {
        /// Smallest value observed so far.
        min: f64,
        /// Largest value observed so far.
        max: f64,
    },
}

impl RunningStats {
    /// Build the initial stats tracker for a resolved column's type, or
    /// `None` if this type does not carry running statistics.
    #[must_use]
    pub fn for_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int { is_signed: true, .. } => Some(RunningStats::Int {
                min: i64::MAX,
                max: i64::MIN,
            }),
            DataType::FloatingPoint(_) => Some(RunningStats::Float {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            }),
            _ => None,
        }
    }

    /// Fold in one observed signed integer value.
    pub fn update_int(&mut self, value: i64) {
        if let RunningStats::Int { min, max } = self {
            *min = (*min).min(value);
            *max = (*max).max(value);
        }
    }

    /// Fold in one observed floating-point value.
    pub fn update_float(&mut self, value: f64) {
        if let RunningStats::Float { min, max } = self {
            *min = min.min(value);
            *max = max.max(value);
        }
    }
}
