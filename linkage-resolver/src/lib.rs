//! Product/category pair resolution.
//!
//! Given a product catalog, a category catalog and a many-to-many link table,
//! the resolver produces every `(product_name, category_name)` association.
//! Products without links are kept with a NULL category.
//!
//! Two independent strategies compute the result:
//!
//! - [`resolve_left_join`]: a chain of two LEFT joins, projected to the output
//!   columns.
//! - [`resolve_union_anti`]: INNER-joined pairs bag-unioned with the
//!   anti-joined products that have no links, null-extended.
//!
//! Both return bags (duplicates are significant, order is not). They agree on
//! every input except links that reference a missing category; see
//! [`DanglingPolicy`]. [`compare_strategies`] runs both and reports any
//! difference.
//!
//! Inputs are validated when the relation wrappers ([`Products`],
//! [`Categories`], [`Links`]) are built: a missing column is a
//! [`Error::SchemaError`] and a duplicated column name is an
//! [`Error::AmbiguousColumn`]. Missing matches are never errors.
#![forbid(unsafe_code)]

pub mod fixture;
mod left_join;
mod options;
mod pairs;
mod relation;
mod strategy;
mod union_anti;

pub use left_join::resolve_left_join;
pub use linkage_result::{Error, Result};
pub use options::{DanglingPolicy, ResolveOptions};
pub use pairs::{BagDifference, PairBatch, ResultPair, bag_difference, bag_eq, pair_schema};
pub use relation::{
    CATEGORY_ID, CATEGORY_NAME, Categories, Links, PRODUCT_ID, PRODUCT_NAME, Products,
    resolve_column,
};
pub use strategy::{Strategy, StrategyComparison, compare_strategies, resolve};
pub use union_anti::resolve_union_anti;
