//! Output relation and bag comparison.

use crate::relation::{CATEGORY_NAME, PRODUCT_NAME};
use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use linkage_result::{Error, Result as LinkageResult};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

static PAIR_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new(PRODUCT_NAME, DataType::Utf8, false),
        Field::new(CATEGORY_NAME, DataType::Utf8, true),
    ]))
});

/// Schema of every resolver output: `(product_name, category_name NULL)`.
pub fn pair_schema() -> SchemaRef {
    Arc::clone(&PAIR_SCHEMA)
}

/// One output row. `category_name` is `None` when the product has no
/// resolvable category for this row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultPair {
    pub product_name: String,
    pub category_name: Option<String>,
}

impl ResultPair {
    pub fn new(product_name: impl Into<String>, category_name: Option<&str>) -> Self {
        Self {
            product_name: product_name.into(),
            category_name: category_name.map(str::to_string),
        }
    }

    pub fn matched(product_name: impl Into<String>, category_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            category_name: Some(category_name.into()),
        }
    }

    pub fn unmatched(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            category_name: None,
        }
    }
}

impl fmt::Display for ResultPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category_name {
            Some(category) => write!(f, "({}, {})", self.product_name, category),
            None => write!(f, "({}, NULL)", self.product_name),
        }
    }
}

/// The resolver's output relation, always shaped by [`pair_schema`].
#[derive(Clone, Debug)]
pub struct PairBatch {
    batch: RecordBatch,
}

impl PairBatch {
    /// Assemble a pair batch from its two columns.
    pub fn try_from_columns(product_name: ArrayRef, category_name: ArrayRef) -> LinkageResult<Self> {
        let batch = RecordBatch::try_new(pair_schema(), vec![product_name, category_name])?;
        Ok(Self { batch })
    }

    /// Re-label a two-column batch under [`pair_schema`].
    pub fn try_from_batch(batch: RecordBatch) -> LinkageResult<Self> {
        if batch.num_columns() != 2 {
            return Err(Error::Internal(format!(
                "pair batch needs 2 columns, got {}",
                batch.num_columns()
            )));
        }
        Self::try_from_columns(Arc::clone(batch.column(0)), Arc::clone(batch.column(1)))
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Rows with a NULL category.
    pub fn unmatched_rows(&self) -> usize {
        self.batch.column(1).null_count()
    }

    /// Materialize the rows in output order.
    pub fn pairs(&self) -> LinkageResult<Vec<ResultPair>> {
        let products = self.batch.column(0).as_string_opt::<i32>().ok_or_else(|| {
            Error::Internal("product_name column is not Utf8".to_string())
        })?;
        let categories = self.batch.column(1).as_string_opt::<i32>().ok_or_else(|| {
            Error::Internal("category_name column is not Utf8".to_string())
        })?;

        Ok((0..self.batch.num_rows())
            .map(|row| ResultPair {
                product_name: products.value(row).to_string(),
                category_name: categories
                    .is_valid(row)
                    .then(|| categories.value(row).to_string()),
            })
            .collect())
    }
}

fn bag_counts(pairs: &[ResultPair]) -> FxHashMap<&ResultPair, usize> {
    let mut counts: FxHashMap<&ResultPair, usize> = FxHashMap::default();
    for pair in pairs {
        *counts.entry(pair).or_default() += 1;
    }
    counts
}

/// Multiset equality: same rows with the same multiplicities, any order.
pub fn bag_eq(left: &[ResultPair], right: &[ResultPair]) -> bool {
    left.len() == right.len() && bag_counts(left) == bag_counts(right)
}

/// Rows present in one bag more often than in the other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BagDifference {
    /// Surplus rows of the left bag, sorted.
    pub only_left: Vec<ResultPair>,
    /// Surplus rows of the right bag, sorted.
    pub only_right: Vec<ResultPair>,
}

impl BagDifference {
    pub fn is_empty(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty()
    }
}

/// Multiset difference in both directions.
pub fn bag_difference(left: &[ResultPair], right: &[ResultPair]) -> BagDifference {
    let left_counts = bag_counts(left);
    let right_counts = bag_counts(right);

    let surplus = |a: &FxHashMap<&ResultPair, usize>, b: &FxHashMap<&ResultPair, usize>| {
        let mut rows: Vec<ResultPair> = a
            .iter()
            .flat_map(|(pair, &count)| {
                let extra = count.saturating_sub(b.get(pair).copied().unwrap_or(0));
                std::iter::repeat_n((*pair).clone(), extra)
            })
            .collect();
        rows.sort();
        rows
    };

    BagDifference {
        only_left: surplus(&left_counts, &right_counts),
        only_right: surplus(&right_counts, &left_counts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;

    #[test]
    fn pairs_round_trip_nulls() {
        let batch = PairBatch::try_from_columns(
            Arc::new(StringArray::from(vec!["Laptop Alpha", "Headphones Delta"])),
            Arc::new(StringArray::from(vec![Some("Electronics"), None])),
        )
        .unwrap();

        assert_eq!(
            batch.pairs().unwrap(),
            vec![
                ResultPair::matched("Laptop Alpha", "Electronics"),
                ResultPair::unmatched("Headphones Delta"),
            ]
        );
        assert_eq!(batch.unmatched_rows(), 1);
    }

    #[test]
    fn bag_eq_respects_multiplicity_not_order() {
        let a = vec![
            ResultPair::matched("Widget", "Tools"),
            ResultPair::matched("Widget", "Tools"),
            ResultPair::unmatched("Gizmo"),
        ];
        let reordered = vec![a[2].clone(), a[0].clone(), a[1].clone()];
        let deduped = vec![a[0].clone(), a[2].clone()];

        assert!(bag_eq(&a, &reordered));
        assert!(!bag_eq(&a, &deduped));

        let diff = bag_difference(&a, &deduped);
        assert_eq!(diff.only_left, vec![ResultPair::matched("Widget", "Tools")]);
        assert!(diff.only_right.is_empty());
        assert!(bag_difference(&a, &reordered).is_empty());
    }

    #[test]
    fn display_marks_nulls() {
        assert_eq!(ResultPair::unmatched("Gizmo").to_string(), "(Gizmo, NULL)");
        assert_eq!(ResultPair::new("Gizmo", Some("Toys")).to_string(), "(Gizmo, Toys)");
    }
}
