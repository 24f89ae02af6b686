//! Validated input relations.
//!
//! Each relation wraps a caller-supplied `RecordBatch`. Construction checks
//! that the required columns exist exactly once and carry usable types, so the
//! strategies can address columns by position afterwards. Extra columns are
//! allowed and ignored.

use arrow::array::{Array, ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::row::{RowConverter, SortField};
use linkage_result::{Error, Result as LinkageResult};
use rustc_hash::FxHashSet;
use std::sync::Arc;

pub const PRODUCT_ID: &str = "product_id";
pub const PRODUCT_NAME: &str = "product_name";
pub const CATEGORY_ID: &str = "category_id";
pub const CATEGORY_NAME: &str = "category_name";

/// Locate `column` in `schema`, refusing to guess between duplicates.
pub fn resolve_column(schema: &Schema, relation: &str, column: &str) -> LinkageResult<usize> {
    let matches: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| field.name() == column)
        .map(|(idx, _)| idx)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::schema(format!(
            "{relation} is missing required column '{column}'"
        ))),
        [idx] => Ok(*idx),
        _ => Err(Error::ambiguous(column, relation, matches.len())),
    }
}

fn require_identifier(schema: &Schema, relation: &str, idx: usize) -> LinkageResult<()> {
    let field = schema.field(idx);
    let dt = field.data_type();
    if dt.is_integer() || matches!(dt, DataType::Utf8 | DataType::LargeUtf8) {
        return Ok(());
    }
    Err(Error::schema(format!(
        "{relation}.{} must be an integer or string identifier, found {dt}",
        field.name()
    )))
}

fn require_text(batch: &RecordBatch, relation: &str, idx: usize) -> LinkageResult<()> {
    let field = batch.schema_ref().field(idx);
    if field.data_type() != &DataType::Utf8 {
        return Err(Error::schema(format!(
            "{relation}.{} must be Utf8, found {}",
            field.name(),
            field.data_type()
        )));
    }
    let nulls = batch.column(idx).null_count();
    if nulls > 0 {
        return Err(Error::schema(format!(
            "{relation}.{} contains {nulls} null values",
            field.name()
        )));
    }
    Ok(())
}

/// Fail if a non-null value appears twice in `column`.
fn require_unique(column: &ArrayRef, relation: &str, name: &str) -> LinkageResult<()> {
    let converter = RowConverter::new(vec![SortField::new(column.data_type().clone())])?;
    let rows = converter.convert_columns(std::slice::from_ref(column))?;

    let mut seen: FxHashSet<Box<[u8]>> = FxHashSet::default();
    for row_idx in 0..rows.num_rows() {
        if column.is_null(row_idx) {
            continue;
        }
        if !seen.insert(rows.row(row_idx).as_ref().into()) {
            return Err(Error::ConstraintError(format!(
                "{relation}.{name} is not unique: duplicate key at row {row_idx}"
            )));
        }
    }
    Ok(())
}

/// Build a narrow `[key, name]` or `[key, key]` batch from two columns.
fn narrow(batch: &RecordBatch, first: usize, second: usize) -> LinkageResult<RecordBatch> {
    Ok(batch.project(&[first, second])?)
}

/// Product catalog: `(product_id, product_name)`.
#[derive(Clone, Debug)]
pub struct Products {
    batch: RecordBatch,
    id_column: usize,
    name_column: usize,
}

impl Products {
    pub const RELATION: &'static str = "products";

    pub fn try_new(batch: RecordBatch) -> LinkageResult<Self> {
        let schema = batch.schema();
        let id_column = resolve_column(&schema, Self::RELATION, PRODUCT_ID)?;
        let name_column = resolve_column(&schema, Self::RELATION, PRODUCT_NAME)?;
        require_identifier(&schema, Self::RELATION, id_column)?;
        require_text(&batch, Self::RELATION, name_column)?;
        Ok(Self {
            batch,
            id_column,
            name_column,
        })
    }

    /// Build a relation with `Int64` identifiers from `(product_id, product_name)` rows.
    pub fn from_rows(rows: &[(i64, &str)]) -> LinkageResult<Self> {
        let schema = Arc::new(Schema::new(vec![
            Field::new(PRODUCT_ID, DataType::Int64, false),
            Field::new(PRODUCT_NAME, DataType::Utf8, false),
        ]));
        let ids = Int64Array::from_iter_values(rows.iter().map(|(id, _)| *id));
        let names = StringArray::from_iter_values(rows.iter().map(|(_, name)| *name));
        Self::try_new(RecordBatch::try_new(
            schema,
            vec![Arc::new(ids) as ArrayRef, Arc::new(names) as ArrayRef],
        )?)
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn id_type(&self) -> &DataType {
        self.batch.schema_ref().field(self.id_column).data_type()
    }

    /// `[product_id, product_name]`.
    pub(crate) fn narrow(&self) -> LinkageResult<RecordBatch> {
        narrow(&self.batch, self.id_column, self.name_column)
    }

    pub(crate) fn validate_keys(&self) -> LinkageResult<()> {
        require_unique(self.batch.column(self.id_column), Self::RELATION, PRODUCT_ID)
    }
}

/// Category catalog: `(category_id, category_name)`.
#[derive(Clone, Debug)]
pub struct Categories {
    batch: RecordBatch,
    id_column: usize,
    name_column: usize,
}

impl Categories {
    pub const RELATION: &'static str = "categories";

    pub fn try_new(batch: RecordBatch) -> LinkageResult<Self> {
        let schema = batch.schema();
        let id_column = resolve_column(&schema, Self::RELATION, CATEGORY_ID)?;
        let name_column = resolve_column(&schema, Self::RELATION, CATEGORY_NAME)?;
        require_identifier(&schema, Self::RELATION, id_column)?;
        require_text(&batch, Self::RELATION, name_column)?;
        Ok(Self {
            batch,
            id_column,
            name_column,
        })
    }

    /// Build a relation with `Int64` identifiers from `(category_id, category_name)` rows.
    pub fn from_rows(rows: &[(i64, &str)]) -> LinkageResult<Self> {
        let schema = Arc::new(Schema::new(vec![
            Field::new(CATEGORY_ID, DataType::Int64, false),
            Field::new(CATEGORY_NAME, DataType::Utf8, false),
        ]));
        let ids = Int64Array::from_iter_values(rows.iter().map(|(id, _)| *id));
        let names = StringArray::from_iter_values(rows.iter().map(|(_, name)| *name));
        Self::try_new(RecordBatch::try_new(
            schema,
            vec![Arc::new(ids) as ArrayRef, Arc::new(names) as ArrayRef],
        )?)
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn id_type(&self) -> &DataType {
        self.batch.schema_ref().field(self.id_column).data_type()
    }

    /// `[category_id, category_name]`.
    pub(crate) fn narrow(&self) -> LinkageResult<RecordBatch> {
        narrow(&self.batch, self.id_column, self.name_column)
    }

    pub(crate) fn validate_keys(&self) -> LinkageResult<()> {
        require_unique(self.batch.column(self.id_column), Self::RELATION, CATEGORY_ID)
    }
}

/// Many-to-many edge set: `(product_id, category_id)`. Rows may repeat.
#[derive(Clone, Debug)]
pub struct Links {
    batch: RecordBatch,
    product_column: usize,
    category_column: usize,
}

impl Links {
    pub const RELATION: &'static str = "links";

    pub fn try_new(batch: RecordBatch) -> LinkageResult<Self> {
        let schema = batch.schema();
        let product_column = resolve_column(&schema, Self::RELATION, PRODUCT_ID)?;
        let category_column = resolve_column(&schema, Self::RELATION, CATEGORY_ID)?;
        require_identifier(&schema, Self::RELATION, product_column)?;
        require_identifier(&schema, Self::RELATION, category_column)?;
        Ok(Self {
            batch,
            product_column,
            category_column,
        })
    }

    /// Build a relation with `Int64` identifiers from `(product_id, category_id)` rows.
    pub fn from_rows(rows: &[(i64, i64)]) -> LinkageResult<Self> {
        let schema = Arc::new(Schema::new(vec![
            Field::new(PRODUCT_ID, DataType::Int64, false),
            Field::new(CATEGORY_ID, DataType::Int64, false),
        ]));
        let products = Int64Array::from_iter_values(rows.iter().map(|(p, _)| *p));
        let categories = Int64Array::from_iter_values(rows.iter().map(|(_, c)| *c));
        Self::try_new(RecordBatch::try_new(
            schema,
            vec![Arc::new(products) as ArrayRef, Arc::new(categories) as ArrayRef],
        )?)
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn product_id_type(&self) -> &DataType {
        self.batch.schema_ref().field(self.product_column).data_type()
    }

    pub fn category_id_type(&self) -> &DataType {
        self.batch.schema_ref().field(self.category_column).data_type()
    }

    /// `[product_id, category_id]`.
    pub(crate) fn narrow(&self) -> LinkageResult<RecordBatch> {
        narrow(&self.batch, self.product_column, self.category_column)
    }
}

/// The three relations narrowed to their required columns, ready to join.
///
/// Column layout is fixed: products `[product_id, product_name]`, categories
/// `[category_id, category_name]`, links `[product_id, category_id]`.
pub(crate) struct NarrowInputs {
    pub products: RecordBatch,
    pub categories: RecordBatch,
    pub links: RecordBatch,
}

impl NarrowInputs {
    /// Check cross-relation key types (and optionally key uniqueness) and
    /// narrow every relation. Runs before any join.
    pub fn prepare(
        products: &Products,
        categories: &Categories,
        links: &Links,
        validate_keys: bool,
    ) -> LinkageResult<Self> {
        if products.id_type() != links.product_id_type() {
            return Err(Error::schema(format!(
                "{}.{PRODUCT_ID} is {} but {}.{PRODUCT_ID} is {}",
                Products::RELATION,
                products.id_type(),
                Links::RELATION,
                links.product_id_type()
            )));
        }
        if categories.id_type() != links.category_id_type() {
            return Err(Error::schema(format!(
                "{}.{CATEGORY_ID} is {} but {}.{CATEGORY_ID} is {}",
                Categories::RELATION,
                categories.id_type(),
                Links::RELATION,
                links.category_id_type()
            )));
        }

        if validate_keys {
            products.validate_keys()?;
            categories.validate_keys()?;
        }

        Ok(Self {
            products: products.narrow()?,
            categories: categories.narrow()?,
            links: links.narrow()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;

    #[test]
    fn resolve_column_reports_missing_and_duplicate_names() {
        let schema = Schema::new(vec![
            Field::new("product_id", DataType::Int64, false),
            Field::new("product_id", DataType::Int64, false),
        ]);
        assert!(matches!(
            resolve_column(&schema, "products", "product_id"),
            Err(Error::AmbiguousColumn { matches: 2, .. })
        ));
        assert!(matches!(
            resolve_column(&schema, "products", "product_name"),
            Err(Error::SchemaError(_))
        ));
    }

    #[test]
    fn extra_columns_are_ignored_when_narrowing() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("sku", DataType::Utf8, false),
            Field::new(PRODUCT_NAME, DataType::Utf8, false),
            Field::new(PRODUCT_ID, DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A-1"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["Laptop Alpha"])) as ArrayRef,
                Arc::new(Int32Array::from(vec![1])) as ArrayRef,
            ],
        )
        .unwrap();

        let products = Products::try_new(batch).unwrap();
        let narrow = products.narrow().unwrap();
        let names: Vec<&str> = narrow
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names, vec![PRODUCT_ID, PRODUCT_NAME]);
        assert_eq!(products.id_type(), &DataType::Int32);
    }

    #[test]
    fn float_identifiers_are_rejected() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(CATEGORY_ID, DataType::Float64, false),
            Field::new(CATEGORY_NAME, DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(arrow::array::Float64Array::from(vec![1.0])) as ArrayRef,
                Arc::new(StringArray::from(vec!["Electronics"])) as ArrayRef,
            ],
        )
        .unwrap();
        assert!(matches!(
            Categories::try_new(batch),
            Err(Error::SchemaError(_))
        ));
    }

    #[test]
    fn null_names_are_rejected() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(PRODUCT_ID, DataType::Int64, false),
            Field::new(PRODUCT_NAME, DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("Laptop Alpha"), None])) as ArrayRef,
            ],
        )
        .unwrap();
        let err = Products::try_new(batch).unwrap_err();
        assert!(err.to_string().contains("1 null values"), "{err}");
    }

    #[test]
    fn duplicate_keys_fail_validation() {
        let products = Products::from_rows(&[(1, "Laptop Alpha"), (1, "Laptop Alpha Pro")]).unwrap();
        assert!(matches!(
            products.validate_keys(),
            Err(Error::ConstraintError(_))
        ));

        let categories = Categories::from_rows(&[(101, "Electronics"), (102, "Computers")]).unwrap();
        assert!(categories.validate_keys().is_ok());
    }
}
