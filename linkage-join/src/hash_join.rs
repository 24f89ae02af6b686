//! Hash join over in-memory Arrow batches.
//!
//! Algorithm:
//! 1. Build phase: encode the right side's key columns with Arrow's row format
//!    and index every row by its encoded key.
//! 2. Probe phase: encode the left side's key columns with the same converter
//!    and look each row up, emitting index pairs that are gathered with `take`.
//!
//! Both inputs are single `RecordBatch`es, so a row reference is a plain
//! `u32` row index. Output batches preserve left-row order, and for a given
//! probe row the matches appear in right-row order.
//!
//! ## NULL keys
//!
//! Arrow's row format encodes NULL as an ordinary byte sequence, so two NULL
//! keys would compare equal after encoding. Rows with a NULL in any key column
//! whose [`JoinKey::null_equals_null`] is `false` are therefore kept out of
//! the hash table and never match on the probe side. Under a LEFT join such a
//! probe row is null-extended; under an ANTI join it is emitted.

use crate::{JoinKey, JoinOptions, JoinType, validate_join_keys, validate_join_options};
use arrow::array::{Array, ArrayRef, RecordBatch, UInt32Array, UInt32Builder};
use arrow::compute::{concat_batches, take};
use arrow::datatypes::{Field, FieldRef, Schema, SchemaRef};
use arrow::row::{RowConverter, Rows, SortField};
use linkage_result::{Error, Result as LinkageResult};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Hash table mapping encoded join keys to the right-side rows carrying them.
type HashTable = FxHashMap<Box<[u8]>, Vec<u32>>;

/// Entry point for the hash join.
///
/// `on_batch` receives output batches of at most `options.batch_size` rows.
/// Empty results produce no callbacks.
pub fn hash_join_stream<F>(
    left: &RecordBatch,
    right: &RecordBatch,
    keys: &[JoinKey],
    options: &JoinOptions,
    mut on_batch: F,
) -> LinkageResult<()>
where
    F: FnMut(RecordBatch),
{
    validate_join_options(options)?;
    validate_join_keys(left.schema_ref(), right.schema_ref(), keys)?;
    check_row_index_range(left, "left")?;
    check_row_index_range(right, "right")?;

    let output_schema = build_output_schema(left.schema_ref(), right.schema_ref(), options.join_type);

    let sort_fields: Vec<SortField> = keys
        .iter()
        .map(|key| SortField::new(right.column(key.right_column).data_type().clone()))
        .collect();
    let converter = RowConverter::new(sort_fields)?;

    // Build phase: right side.
    let right_key_columns = key_columns(right, keys, |key| key.right_column);
    let build_rows = converter.convert_columns(&right_key_columns)?;
    let hash_table = build_hash_table(&build_rows, &right_key_columns, keys);

    // Probe phase: left side.
    let left_key_columns = key_columns(left, keys, |key| key.left_column);
    let probe_rows = converter.convert_columns(&left_key_columns)?;

    let mut emitter = BatchEmitter {
        left,
        right,
        output_schema: &output_schema,
        join_type: options.join_type,
        batch_size: options.batch_size,
        left_indices: UInt32Builder::with_capacity(options.batch_size),
        right_indices: UInt32Builder::with_capacity(options.batch_size),
        pending: 0,
        emitted_rows: 0,
    };

    for probe_idx in 0..left.num_rows() {
        let matches = if is_matchable(&left_key_columns, keys, probe_idx) {
            hash_table.get(probe_rows.row(probe_idx).as_ref())
        } else {
            None
        };

        match (options.join_type, matches) {
            (JoinType::Inner | JoinType::Left, Some(build_rows)) => {
                for &build_idx in build_rows {
                    emitter.push(probe_idx as u32, Some(build_idx), &mut on_batch)?;
                }
            }
            (JoinType::Left, None) | (JoinType::Anti, None) => {
                emitter.push(probe_idx as u32, None, &mut on_batch)?;
            }
            (JoinType::Inner, None) | (JoinType::Anti, Some(_)) => {}
        }
    }

    emitter.flush(&mut on_batch)?;

    tracing::debug!(
        join_type = %options.join_type,
        left_rows = left.num_rows(),
        right_rows = right.num_rows(),
        distinct_build_keys = hash_table.len(),
        output_rows = emitter.emitted_rows,
        "hash join complete"
    );

    Ok(())
}

/// Run a hash join and collect its output into a single batch.
///
/// An empty result is returned as a zero-row batch carrying the join's output
/// schema.
pub fn hash_join(
    left: &RecordBatch,
    right: &RecordBatch,
    keys: &[JoinKey],
    options: &JoinOptions,
) -> LinkageResult<RecordBatch> {
    let schema = build_output_schema(left.schema_ref(), right.schema_ref(), options.join_type);
    let mut batches = Vec::new();
    hash_join_stream(left, right, keys, options, |batch| batches.push(batch))?;

    match batches.len() {
        0 => Ok(RecordBatch::new_empty(schema)),
        1 => Ok(batches.remove(0)),
        _ => Ok(concat_batches(&schema, &batches)?),
    }
}

/// Compute the output schema a join of `left` and `right` produces.
///
/// INNER and LEFT joins emit all left fields followed by all right fields.
/// Right fields become nullable under a LEFT join. A right field whose name is
/// already taken gets a numeric suffix (`category_id_1`). ANTI joins emit the
/// left fields only.
pub fn build_output_schema(left: &SchemaRef, right: &SchemaRef, join_type: JoinType) -> SchemaRef {
    if matches!(join_type, JoinType::Anti) {
        return Arc::clone(left);
    }

    let mut fields: Vec<FieldRef> = Vec::with_capacity(left.fields().len() + right.fields().len());
    let mut field_names: FxHashSet<String> = FxHashSet::default();

    for field in left.fields() {
        fields.push(Arc::clone(field));
        field_names.insert(field.name().clone());
    }

    for field in right.fields() {
        let mut name = field.name().clone();
        let mut suffix = 1;
        while field_names.contains(&name) {
            name = format!("{}_{}", field.name(), suffix);
            suffix += 1;
        }

        let nullable = field.is_nullable() || matches!(join_type, JoinType::Left);
        let renamed: Field = field
            .as_ref()
            .clone()
            .with_name(name.clone())
            .with_nullable(nullable);

        fields.push(Arc::new(renamed));
        field_names.insert(name);
    }

    Arc::new(Schema::new_with_metadata(fields, left.metadata().clone()))
}

fn key_columns(
    batch: &RecordBatch,
    keys: &[JoinKey],
    column_of: impl Fn(&JoinKey) -> usize,
) -> Vec<ArrayRef> {
    keys.iter()
        .map(|key| Arc::clone(batch.column(column_of(key))))
        .collect()
}

fn build_hash_table(rows: &Rows, key_columns: &[ArrayRef], keys: &[JoinKey]) -> HashTable {
    let mut table = HashTable::default();
    for row_idx in 0..rows.num_rows() {
        if !is_matchable(key_columns, keys, row_idx) {
            continue;
        }
        table
            .entry(rows.row(row_idx).as_ref().into())
            .or_default()
            .push(row_idx as u32);
    }
    table
}

/// A row can match only if none of its NULL-rejecting key columns is NULL.
fn is_matchable(key_columns: &[ArrayRef], keys: &[JoinKey], row_idx: usize) -> bool {
    key_columns
        .iter()
        .zip(keys)
        .all(|(column, key)| key.null_equals_null || column.is_valid(row_idx))
}

fn check_row_index_range(batch: &RecordBatch, side: &str) -> LinkageResult<()> {
    if batch.num_rows() > u32::MAX as usize {
        return Err(Error::InvalidArgumentError(format!(
            "hash join {side} side has {} rows, exceeding the supported row index range",
            batch.num_rows()
        )));
    }
    Ok(())
}

/// Accumulates output index pairs and gathers them into batches.
struct BatchEmitter<'a> {
    left: &'a RecordBatch,
    right: &'a RecordBatch,
    output_schema: &'a SchemaRef,
    join_type: JoinType,
    batch_size: usize,
    left_indices: UInt32Builder,
    right_indices: UInt32Builder,
    pending: usize,
    emitted_rows: usize,
}

impl BatchEmitter<'_> {
    fn push<F>(&mut self, probe_idx: u32, build_idx: Option<u32>, on_batch: &mut F) -> LinkageResult<()>
    where
        F: FnMut(RecordBatch),
    {
        self.left_indices.append_value(probe_idx);
        self.right_indices.append_option(build_idx);
        self.pending += 1;

        if self.pending >= self.batch_size {
            self.flush(on_batch)?;
        }
        Ok(())
    }

    fn flush<F>(&mut self, on_batch: &mut F) -> LinkageResult<()>
    where
        F: FnMut(RecordBatch),
    {
        if self.pending == 0 {
            return Ok(());
        }

        let left_indices = self.left_indices.finish();
        let right_indices = self.right_indices.finish();
        let rows = self.pending;
        self.pending = 0;

        let mut columns = gather(self.left, &left_indices)?;
        if !matches!(self.join_type, JoinType::Anti) {
            // NULL indices gather NULLs, which is exactly the LEFT join null-extension.
            columns.extend(gather(self.right, &right_indices)?);
        }

        let batch = RecordBatch::try_new(Arc::clone(self.output_schema), columns)?;
        tracing::trace!(join_type = %self.join_type, rows, "emitting join batch");
        self.emitted_rows += rows;
        on_batch(batch);
        Ok(())
    }
}

fn gather(batch: &RecordBatch, indices: &UInt32Array) -> LinkageResult<Vec<ArrayRef>> {
    batch
        .columns()
        .iter()
        .map(|column| take(column.as_ref(), indices, None).map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, Int64Array, StringArray};
    use arrow::datatypes::DataType;

    fn batch(ids: Vec<Option<i64>>, names: Vec<&str>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids)) as ArrayRef,
                Arc::new(StringArray::from(names)) as ArrayRef,
            ],
        )
        .unwrap()
    }

    #[test]
    fn output_schema_suffixes_colliding_right_names() {
        let left = batch(vec![Some(1)], vec!["a"]);
        let right = batch(vec![Some(1)], vec!["b"]);
        let schema = build_output_schema(left.schema_ref(), right.schema_ref(), JoinType::Left);

        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["id", "name", "id_1", "name_1"]);
        assert!(schema.field(3).is_nullable(), "LEFT join right side must be nullable");
        assert!(!schema.field(1).is_nullable());
    }

    #[test]
    fn anti_schema_is_left_schema() {
        let left = batch(vec![Some(1)], vec!["a"]);
        let right = batch(vec![Some(1)], vec!["b"]);
        let schema = build_output_schema(left.schema_ref(), right.schema_ref(), JoinType::Anti);
        assert_eq!(schema.as_ref(), left.schema_ref().as_ref());
    }

    #[test]
    fn null_keys_never_match_by_default() {
        let left = batch(vec![None, Some(1)], vec!["l-null", "l-one"]);
        let right = batch(vec![None, Some(1)], vec!["r-null", "r-one"]);

        let inner = hash_join(&left, &right, &[JoinKey::new(0, 0)], &JoinOptions::inner()).unwrap();
        assert_eq!(inner.num_rows(), 1);

        let safe = hash_join(&left, &right, &[JoinKey::null_safe(0, 0)], &JoinOptions::inner()).unwrap();
        assert_eq!(safe.num_rows(), 2);

        let anti = hash_join(&left, &right, &[JoinKey::new(0, 0)], &JoinOptions::anti()).unwrap();
        let names = anti
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(anti.num_rows(), 1);
        assert_eq!(names.value(0), "l-null");
    }

    #[test]
    fn batch_size_caps_emitted_batches() {
        let left = batch(vec![Some(7)], vec!["only"]);
        let right = batch(vec![Some(7); 5], vec!["a", "b", "c", "d", "e"]);

        let mut sizes = Vec::new();
        hash_join_stream(
            &left,
            &right,
            &[JoinKey::new(0, 0)],
            &JoinOptions::inner().with_batch_size(2),
            |b| sizes.push(b.num_rows()),
        )
        .unwrap();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn mismatched_key_types_are_schema_errors() {
        let left = batch(vec![Some(1)], vec!["a"]);
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
        let right = RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1])) as ArrayRef])
            .unwrap();

        let err = hash_join(&left, &right, &[JoinKey::new(0, 0)], &JoinOptions::inner()).unwrap_err();
        assert!(matches!(err, Error::SchemaError(_)), "{err:?}");
    }
}
