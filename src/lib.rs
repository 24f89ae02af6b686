//! Linkage: product/category pair resolution over Arrow relations
//!
//! This crate is the entrypoint for the linkage toolkit. It re-exports the
//! resolver API and the join kernels from the underlying `linkage-*` crates.
//!
//! # Quick Start
//!
//! ```rust
//! use linkage::{Categories, Links, Products, ResolveOptions, resolve_left_join};
//!
//! let products = Products::from_rows(&[(1, "Laptop Alpha"), (4, "Headphones Delta")]).unwrap();
//! let categories = Categories::from_rows(&[(101, "Electronics")]).unwrap();
//! let links = Links::from_rows(&[(1, 101)]).unwrap();
//!
//! let pairs = resolve_left_join(&products, &categories, &links, &ResolveOptions::default()).unwrap();
//! assert_eq!(pairs.num_rows(), 2);
//! assert_eq!(pairs.unmatched_rows(), 1);
//! ```
//!
//! # Architecture
//!
//! - **Resolver** (`linkage-resolver`): relation wrappers, the two strategies,
//!   options and bag comparison.
//! - **Kernels** (`linkage-join`): hash join, bag union and null-extension over
//!   `RecordBatch`es.
//! - **Errors** (`linkage-result`): the shared `Error` enum and `Result` alias.

pub use linkage_resolver::*;

pub mod join {
    //! Batch-level join and union kernels.

    pub use linkage_join::{
        JoinKey, JoinOptions, JoinType, bag_union, hash_join, hash_join_stream, null_extend,
    };
}
