//! Error types and result definitions for the linkage crates.
//!
//! Every crate in the workspace returns [`Result<T>`], whose error variant is
//! the single [`Error`] enum. Errors propagate across crate boundaries with `?`
//! and are matched on directly by callers that care about the cause.
//!
//! # Error Categories
//!
//! - **Input shape** ([`Error::SchemaError`], [`Error::AmbiguousColumn`]): a
//!   relation is missing a column, carries the wrong type, or names a column
//!   twice
//! - **Data constraints** ([`Error::ConstraintError`]): duplicate catalog keys,
//!   only when key validation is requested
//! - **Parameters** ([`Error::InvalidArgumentError`]): bad options
//! - **Kernels** ([`Error::Arrow`], [`Error::Internal`]): failures inside Arrow
//!   compute or broken internal invariants

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
