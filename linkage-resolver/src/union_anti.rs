//! Pair resolution as matched pairs plus null-extended unmatched products.
//!
//! ```text
//! matched   = π (product_name, category_name) (products ⋈ links ⋈ categories)
//! unmatched = π (product_name, NULL)          (products ▷ links)
//! result    = matched ⊎ unmatched
//! ```
//!
//! `⊎` is a bag union. The anti-join only removes products that have no link
//! row at all, so a link pointing at a missing category falls through both
//! halves. [`DanglingPolicy`] decides whether such links are dropped or
//! reported as `(product_name, NULL)`.

use crate::options::{DanglingPolicy, ResolveOptions};
use crate::pairs::{PairBatch, pair_schema};
use crate::relation::{CATEGORY_NAME, Categories, Links, NarrowInputs, Products};
use arrow::array::RecordBatch;
use arrow::datatypes::{DataType, Field};
use linkage_join::{JoinKey, JoinType, bag_union, hash_join, null_extend};
use linkage_result::Result as LinkageResult;

// products ⋈ links: [product_id, product_name, product_id_1, category_id]
const LINKED_PRODUCT_NAME: usize = 1;
const LINKED_CATEGORY_ID: usize = 3;

// [product_name, category_id] ⋈ categories:
// [product_name, category_id, category_id_1, category_name]
const MATCHED_PRODUCT_NAME: usize = 0;
const MATCHED_CATEGORY_NAME: usize = 3;

// Narrow products and links layouts.
const PRODUCT_NAME_COLUMN: usize = 1;
const LINK_CATEGORY_ID: usize = 1;

/// Resolve all (product, category) pairs as inner-joined pairs bag-unioned
/// with the anti-joined products that have no links.
pub fn resolve_union_anti(
    products: &Products,
    categories: &Categories,
    links: &Links,
    options: &ResolveOptions,
) -> LinkageResult<PairBatch> {
    options.validate()?;
    let inputs = NarrowInputs::prepare(products, categories, links, options.validate_keys)?;

    let matched = matched_pairs(&inputs, options)?;
    let mut parts = vec![matched, products_without_links(&inputs, options)?];

    let dangling = dangling_links(&inputs, options)?;
    if dangling.num_rows() > 0 {
        match options.dangling {
            DanglingPolicy::Drop => {
                tracing::warn!(
                    dangling_links = dangling.num_rows(),
                    "links reference missing categories; their rows are dropped from the union"
                );
            }
            DanglingPolicy::NullExtend => {
                parts.push(products_with_dangling_links(&inputs, &dangling, options)?);
            }
        }
    }

    let union = bag_union(&pair_schema(), &parts)?;
    let pairs = PairBatch::try_from_batch(union)?;

    tracing::debug!(
        products = products.num_rows(),
        links = links.num_rows(),
        categories = categories.num_rows(),
        matched = parts[0].num_rows(),
        rows = pairs.num_rows(),
        dangling_policy = %options.dangling,
        "resolved pairs via union of inner and anti joins"
    );

    Ok(pairs)
}

/// `products ⋈ links ⋈ categories` as `[product_name, category_name]`.
fn matched_pairs(inputs: &NarrowInputs, options: &ResolveOptions) -> LinkageResult<RecordBatch> {
    let inner = options.join_options(JoinType::Inner);

    let linked = hash_join(&inputs.products, &inputs.links, &[JoinKey::new(0, 0)], &inner)?
        .project(&[LINKED_PRODUCT_NAME, LINKED_CATEGORY_ID])?;

    let resolved = hash_join(&linked, &inputs.categories, &[JoinKey::new(1, 0)], &inner)?;
    Ok(resolved.project(&[MATCHED_PRODUCT_NAME, MATCHED_CATEGORY_NAME])?)
}

/// `products ▷ links` as `[product_name, NULL]`.
fn products_without_links(
    inputs: &NarrowInputs,
    options: &ResolveOptions,
) -> LinkageResult<RecordBatch> {
    let unlinked = hash_join(
        &inputs.products,
        &inputs.links,
        &[JoinKey::new(0, 0)],
        &options.join_options(JoinType::Anti),
    )?;
    null_extend(&unlinked, &[PRODUCT_NAME_COLUMN], null_category_field())
}

/// `links ▷ categories`: link rows whose category does not resolve.
fn dangling_links(inputs: &NarrowInputs, options: &ResolveOptions) -> LinkageResult<RecordBatch> {
    hash_join(
        &inputs.links,
        &inputs.categories,
        &[JoinKey::new(LINK_CATEGORY_ID, 0)],
        &options.join_options(JoinType::Anti),
    )
}

/// `products ⋈ dangling` as `[product_name, NULL]`, one row per dangling link.
fn products_with_dangling_links(
    inputs: &NarrowInputs,
    dangling: &RecordBatch,
    options: &ResolveOptions,
) -> LinkageResult<RecordBatch> {
    let joined = hash_join(
        &inputs.products,
        dangling,
        &[JoinKey::new(0, 0)],
        &options.join_options(JoinType::Inner),
    )?;
    null_extend(&joined, &[PRODUCT_NAME_COLUMN], null_category_field())
}

fn null_category_field() -> Field {
    Field::new(CATEGORY_NAME, DataType::Utf8, true)
}
