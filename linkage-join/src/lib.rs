//! Join and union kernels over in-memory Arrow batches.
//!
//! This crate exposes the shared types (`JoinKey`, `JoinType`, `JoinOptions`)
//! the resolver uses to describe each join, the hash join that executes them,
//! and the bag union used to concatenate partial results.
#![forbid(unsafe_code)]

mod hash_join;
mod union;

use arrow::datatypes::Schema;
use arrow::row::{RowConverter, SortField};
use linkage_result::{Error, Result as LinkageResult};
use std::fmt;

pub use hash_join::{build_output_schema, hash_join, hash_join_stream};
pub use union::{bag_union, null_extend};

/// Type of join to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Emit only matching row pairs.
    Inner,
    /// Emit all left rows; unmatched left rows have NULL right columns.
    Left,
    /// Emit left rows that have no match (no right columns).
    Anti,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Anti => write!(f, "ANTI"),
        }
    }
}

/// Join key pair describing which columns to equate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinKey {
    /// Column index in the left batch.
    pub left_column: usize,
    /// Column index in the right batch.
    pub right_column: usize,
    /// If true, NULL == NULL for this key (SQL-style NULL-safe equality).
    /// If false, NULL != NULL (Arrow default).
    pub null_equals_null: bool,
}

impl JoinKey {
    /// Create a join key with standard Arrow null semantics (NULL != NULL).
    pub fn new(left_column: usize, right_column: usize) -> Self {
        Self {
            left_column,
            right_column,
            null_equals_null: false,
        }
    }

    /// Create a join key with SQL-style NULL-safe equality (NULL == NULL).
    pub fn null_safe(left_column: usize, right_column: usize) -> Self {
        Self {
            left_column,
            right_column,
            null_equals_null: true,
        }
    }
}

/// Options controlling join execution.
#[derive(Clone, Debug)]
pub struct JoinOptions {
    /// Type of join to perform.
    pub join_type: JoinType,
    /// Maximum number of rows per output `RecordBatch`.
    pub batch_size: usize,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            join_type: JoinType::Inner,
            batch_size: 8192,
        }
    }
}

impl JoinOptions {
    /// Create options for an inner join with default settings.
    pub fn inner() -> Self {
        Self {
            join_type: JoinType::Inner,
            ..Default::default()
        }
    }

    /// Create options for a left outer join with default settings.
    pub fn left() -> Self {
        Self {
            join_type: JoinType::Left,
            ..Default::default()
        }
    }

    /// Create options for an anti join with default settings.
    pub fn anti() -> Self {
        Self {
            join_type: JoinType::Anti,
            ..Default::default()
        }
    }

    /// Set the output batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Validate join keys against the schemas of both inputs.
///
/// Every key must reference an existing column on each side, both columns must
/// share a data type, and that type must be encodable in Arrow's row format.
/// Cross products are not supported, so an empty key list is rejected.
pub fn validate_join_keys(left: &Schema, right: &Schema, keys: &[JoinKey]) -> LinkageResult<()> {
    if keys.is_empty() {
        return Err(Error::InvalidArgumentError(
            "join requires at least one key column".to_string(),
        ));
    }

    for key in keys {
        let left_field = left.fields().get(key.left_column).ok_or_else(|| {
            Error::schema(format!(
                "left join key column {} out of range ({} columns)",
                key.left_column,
                left.fields().len()
            ))
        })?;
        let right_field = right.fields().get(key.right_column).ok_or_else(|| {
            Error::schema(format!(
                "right join key column {} out of range ({} columns)",
                key.right_column,
                right.fields().len()
            ))
        })?;

        if left_field.data_type() != right_field.data_type() {
            return Err(Error::schema(format!(
                "join key type mismatch: '{}' is {} but '{}' is {}",
                left_field.name(),
                left_field.data_type(),
                right_field.name(),
                right_field.data_type()
            )));
        }

        if !RowConverter::supports_fields(&[SortField::new(
            left_field.data_type().clone(),
        )]) {
            return Err(Error::schema(format!(
                "unsupported join key type {} for column '{}'",
                left_field.data_type(),
                left_field.name()
            )));
        }
    }

    Ok(())
}

/// Validate join options before execution.
pub fn validate_join_options(options: &JoinOptions) -> LinkageResult<()> {
    if options.batch_size == 0 {
        return Err(Error::InvalidArgumentError(
            "join batch_size must be > 0".to_string(),
        ));
    }
    Ok(())
}
