use std::fmt;
use thiserror::Error;

/// Unified error type for all linkage operations.
///
/// Absent matches between relations are never errors: a product without a
/// category is data and surfaces as a null `category_name`. The variants below
/// cover inputs that cannot be joined at all (bad schemas, ambiguous column
/// references) plus option validation and Arrow kernel failures.
///
/// Every variant is unrecoverable for the call that produced it. Nothing in
/// the resolver performs I/O, so retrying with the same inputs yields the same
/// error.
#[derive(Error, Debug)]
pub enum Error {
    /// Arrow library error during columnar operations.
    ///
    /// Raised by `take`, `concat_batches`, row conversion, or `RecordBatch`
    /// construction. For validated inputs this indicates a bug rather than a
    /// data condition.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An input relation does not have the shape the resolver needs.
    ///
    /// This covers:
    /// - A required column (`product_id`, `product_name`, `category_id`,
    ///   `category_name`) missing from a relation
    /// - A column with an unsupported data type (text columns must be `Utf8`,
    ///   identifiers must be integers or `Utf8`)
    /// - Join key columns whose types differ between the two joined relations
    /// - Nulls in a name column
    ///
    /// Schema errors are detected before any join runs.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A column reference matched more than one field of a relation.
    ///
    /// Arrow schemas permit duplicate field names. The resolver addresses
    /// columns by exact name and refuses to pick one of several candidates.
    #[error("ambiguous column '{column}' in {relation}: {matches} fields share this name")]
    AmbiguousColumn {
        column: String,
        relation: String,
        matches: usize,
    },

    /// Data constraint violation.
    ///
    /// Only produced when key validation is switched on: a duplicate
    /// `product_id` in the products relation or a duplicate `category_id` in
    /// the categories relation.
    #[error("Constraint Error: {0}")]
    ConstraintError(String),

    /// Invalid API parameter, such as a zero batch size.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create a schema error from any displayable message.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkage_result::Error;
    ///
    /// let err = Error::schema("products is missing column 'product_id'");
    /// assert!(matches!(err, Error::SchemaError(msg) if msg.contains("product_id")));
    /// ```
    #[inline]
    pub fn schema<E: fmt::Display>(msg: E) -> Self {
        Error::SchemaError(msg.to_string())
    }

    /// Create an ambiguous column error.
    #[inline]
    pub fn ambiguous(column: impl Into<String>, relation: impl Into<String>, matches: usize) -> Self {
        Error::AmbiguousColumn {
            column: column.into(),
            relation: relation.into(),
            matches,
        }
    }

    /// Returns `true` for the errors that describe malformed input relations.
    pub fn is_schema_related(&self) -> bool {
        matches!(self, Error::SchemaError(_) | Error::AmbiguousColumn { .. })
    }
}
