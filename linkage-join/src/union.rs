//! Bag union and null-extension helpers.
//!
//! A bag union keeps every input row, duplicates included. It is a plain
//! concatenation of the inputs in the order given; there is no distinct pass.

use arrow::array::{ArrayRef, RecordBatch, new_null_array};
use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema, SchemaRef};
use linkage_result::{Error, Result as LinkageResult};
use std::sync::Arc;

/// Concatenate `inputs` under `schema` without removing duplicates.
///
/// Inputs are matched to the schema by position, not by name, so partial
/// results whose columns were labelled differently can still be combined. Each
/// input must have the same number of columns as the schema and identical data
/// types per position. The output row count is the sum of the input row
/// counts.
pub fn bag_union(schema: &SchemaRef, inputs: &[RecordBatch]) -> LinkageResult<RecordBatch> {
    let mut aligned = Vec::with_capacity(inputs.len());

    for (input_idx, batch) in inputs.iter().enumerate() {
        if batch.num_columns() != schema.fields().len() {
            return Err(Error::schema(format!(
                "union input {input_idx} has {} columns, expected {}",
                batch.num_columns(),
                schema.fields().len()
            )));
        }

        for (col_idx, (column, field)) in batch.columns().iter().zip(schema.fields()).enumerate() {
            if column.data_type() != field.data_type() {
                return Err(Error::schema(format!(
                    "union input {input_idx} column {col_idx} is {}, expected {} for '{}'",
                    column.data_type(),
                    field.data_type(),
                    field.name()
                )));
            }
        }

        aligned.push(RecordBatch::try_new(
            Arc::clone(schema),
            batch.columns().to_vec(),
        )?);
    }

    let union = concat_batches(schema, &aligned)?;
    tracing::trace!(inputs = inputs.len(), rows = union.num_rows(), "bag union");
    Ok(union)
}

/// Project `columns` out of `batch` and append an all-NULL column for `field`.
///
/// The appended field is forced nullable. This is how a relation that has no
/// counterpart on the other side of a join gets the missing column.
pub fn null_extend(batch: &RecordBatch, columns: &[usize], field: Field) -> LinkageResult<RecordBatch> {
    let projected = batch.project(columns)?;

    let mut fields: Vec<Arc<Field>> = projected.schema().fields().iter().cloned().collect();
    fields.push(Arc::new(field.with_nullable(true)));

    let mut arrays: Vec<ArrayRef> = projected.columns().to_vec();
    let null_column = new_null_array(fields[fields.len() - 1].data_type(), projected.num_rows());
    arrays.push(null_column);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
