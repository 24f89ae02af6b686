//! Pair resolution through a chain of two LEFT joins.
//!
//! ```text
//! products ⟕ links      ON product_id   -> (product_id, product_name, category_id NULL)
//!          ⟕ categories ON category_id  -> ... category_name NULL
//!          π (product_name, category_name)
//! ```
//!
//! Every product survives the first join at least once, so it appears in the
//! output at least once. A product with k links yields k rows, one per link,
//! whether or not the linked category exists.

use crate::options::ResolveOptions;
use crate::pairs::PairBatch;
use crate::relation::{Categories, Links, NarrowInputs, Products};
use arrow::array::RecordBatch;
use linkage_join::{JoinKey, JoinType, hash_join};
use linkage_result::Result as LinkageResult;
use std::sync::Arc;

// products ⟕ links: [product_id, product_name, product_id_1, category_id]
const LINKED_PRODUCT_ID: usize = 0;
const LINKED_PRODUCT_NAME: usize = 1;
const LINKED_CATEGORY_ID: usize = 3;

// After projecting [product_id, product_name, category_id] and joining
// categories: [product_id, product_name, category_id, category_id_1, category_name]
const PROJECTED_CATEGORY_ID: usize = 2;
const RESOLVED_PRODUCT_NAME: usize = 1;
const RESOLVED_CATEGORY_NAME: usize = 4;

/// Resolve all (product, category) pairs with the LEFT join chain.
///
/// Dangling links and products without links both come out as
/// `(product_name, NULL)`.
pub fn resolve_left_join(
    products: &Products,
    categories: &Categories,
    links: &Links,
    options: &ResolveOptions,
) -> LinkageResult<PairBatch> {
    options.validate()?;
    let inputs = NarrowInputs::prepare(products, categories, links, options.validate_keys)?;
    let left = options.join_options(JoinType::Left);

    let with_links: RecordBatch = hash_join(
        &inputs.products,
        &inputs.links,
        &[JoinKey::new(0, 0)],
        &left,
    )?
    .project(&[LINKED_PRODUCT_ID, LINKED_PRODUCT_NAME, LINKED_CATEGORY_ID])?;

    let with_categories = hash_join(
        &with_links,
        &inputs.categories,
        &[JoinKey::new(PROJECTED_CATEGORY_ID, 0)],
        &left,
    )?;

    let pairs = PairBatch::try_from_columns(
        Arc::clone(with_categories.column(RESOLVED_PRODUCT_NAME)),
        Arc::clone(with_categories.column(RESOLVED_CATEGORY_NAME)),
    )?;

    tracing::debug!(
        products = products.num_rows(),
        links = links.num_rows(),
        categories = categories.num_rows(),
        rows = pairs.num_rows(),
        unmatched = pairs.unmatched_rows(),
        "resolved pairs via left join chain"
    );

    Ok(pairs)
}
