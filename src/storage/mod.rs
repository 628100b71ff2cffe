//! Tabular storage (Arrow/Parquet)
//!
//! Every table the pipeline touches (feature store, train/test splits) is a
//! single Arrow [`RecordBatch`] wrapped in [`Table`]. Parquet preserves column
//! types across stages, so a split read back by validation has the same schema
//! ingestion wrote.

use crate::{Error, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
    UInt32Array,
};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use serde_json::{Map, Value};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// A single record as exported from the document store
pub type Document = Map<String, Value>;

/// Key the document store adds to every record; never part of the data
pub const DOCUMENT_ID_KEY: &str = "_id";

/// Immutable columnar table backed by one Arrow record batch
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Wrap an existing record batch
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Table with no columns and no rows
    #[must_use]
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    /// Build a table from document-store records.
    ///
    /// Column order follows first appearance across the documents. Each
    /// column's type is inferred from its non-null values: all booleans become
    /// `Boolean`, all integers `Int64`, all numbers `Float64`, anything else
    /// `Utf8` (non-string values are rendered as JSON text). The document-store
    /// `_id` key is skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the Arrow batch cannot be assembled
    pub fn from_documents(documents: &[Document]) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        for document in documents {
            for key in document.keys() {
                if key != DOCUMENT_ID_KEY && !names.iter().any(|name| name == key) {
                    names.push(key.clone());
                }
            }
        }

        if names.is_empty() {
            return Ok(Self::empty());
        }

        let mut fields = Vec::with_capacity(names.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len());
        for name in &names {
            let values: Vec<Option<&Value>> = documents
                .iter()
                .map(|doc| doc.get(name).filter(|value| !value.is_null()))
                .collect();
            let column = infer_column(&values);
            fields.push(Field::new(name, column.data_type().clone(), true));
            columns.push(column);
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self { batch })
    }

    /// Underlying record batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// True when the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// `(rows, columns)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    /// Column names in table order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    /// Whether a column with this name exists
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// Raw Arrow column by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the column does not exist
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| Error::Schema(format!("Column '{name}' not found in table")))
    }

    /// True when the column holds numbers (integers or floats)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the column does not exist
    pub fn is_numeric(&self, name: &str) -> Result<bool> {
        Ok(self.column(name)?.data_type().is_numeric())
    }

    /// Column values as `f64`.
    ///
    /// # Errors
    ///
    /// Returns error if the column is missing, cannot be cast to `Float64`,
    /// or contains nulls
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.column(name)?;
        let cast = compute::cast(column, &DataType::Float64)?;
        let values = cast
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| Error::StorageError(format!("Column '{name}' is not numeric")))?;

        if values.null_count() > 0 {
            return Err(Error::Schema(format!(
                "Column '{name}' contains {} null values",
                values.null_count()
            )));
        }

        Ok(values.values().to_vec())
    }

    /// Column values rendered as strings.
    ///
    /// # Errors
    ///
    /// Returns error if the column is missing, cannot be cast to `Utf8`, or
    /// contains nulls
    pub fn string_column(&self, name: &str) -> Result<Vec<String>> {
        let column = self.column(name)?;
        let cast = compute::cast(column, &DataType::Utf8)?;
        let values = cast
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| Error::StorageError(format!("Column '{name}' is not textual")))?;

        if values.null_count() > 0 {
            return Err(Error::Schema(format!(
                "Column '{name}' contains {} null values",
                values.null_count()
            )));
        }

        Ok(values.iter().flatten().map(str::to_string).collect())
    }

    /// Rows at the given positions, in the given order.
    ///
    /// # Errors
    ///
    /// Returns error if an index is out of bounds
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&index| index >= self.num_rows()) {
            return Err(Error::InvalidInput(format!(
                "Row index {bad} out of bounds (table has {} rows)",
                self.num_rows()
            )));
        }

        let indices = UInt32Array::from_iter_values(
            indices
                .iter()
                .map(|&index| u32::try_from(index).unwrap_or(u32::MAX)),
        );
        let columns = self
            .batch
            .columns()
            .iter()
            .map(|column| compute::take(column.as_ref(), &indices, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let batch = RecordBatch::try_new(self.batch.schema(), columns)?;
        Ok(Self { batch })
    }

    /// Copy of the table with a column appended, or replaced if the name exists.
    ///
    /// # Errors
    ///
    /// Returns error if the array length differs from the row count
    pub fn with_column(&self, name: &str, values: ArrayRef) -> Result<Self> {
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema
            .fields()
            .iter()
            .map(|field| field.as_ref().clone())
            .collect();
        let mut columns: Vec<ArrayRef> = self.batch.columns().to_vec();
        let field = Field::new(name, values.data_type().clone(), true);

        if let Ok(index) = schema.index_of(name) {
            fields[index] = field;
            columns[index] = values;
        } else {
            fields.push(field);
            columns.push(values);
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self { batch })
    }

    /// Copy of the table without the named columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if any named column does not exist
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let missing: Vec<&str> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.has_column(name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Schema(format!(
                "Cannot drop missing columns: {missing:?}"
            )));
        }

        let schema = self.batch.schema();
        let keep: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| !names.iter().any(|name| name.as_ref() == field.name()))
            .map(|(index, _)| index)
            .collect();

        let batch = self.batch.project(&keep)?;
        Ok(Self { batch })
    }

    /// Write the table to a Parquet file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use parquet::arrow::ArrowWriter;

        crate::persist::ensure_parent_dir(path.as_ref())?;
        let file = File::create(path.as_ref()).map_err(|e| {
            Error::StorageError(format!(
                "Failed to create Parquet file {}: {e}",
                path.as_ref().display()
            ))
        })?;

        let mut writer = ArrowWriter::try_new(file, self.batch.schema(), None)?;
        writer.write(&self.batch)?;
        writer.close()?;
        Ok(())
    }

    /// Load a table from a Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path.as_ref()).map_err(|e| {
            Error::StorageError(format!(
                "Failed to open Parquet file {}: {e}",
                path.as_ref().display()
            ))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;
        let schema = builder.schema().clone();

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            batches.push(batch);
        }

        let batch = compute::concat_batches(&schema, &batches)?;
        Ok(Self { batch })
    }
}

fn infer_column(values: &[Option<&Value>]) -> ArrayRef {
    let present = || values.iter().flatten();

    if present().all(|value| value.is_boolean()) {
        return Arc::new(BooleanArray::from(
            values
                .iter()
                .map(|value| value.and_then(Value::as_bool))
                .collect::<Vec<_>>(),
        ));
    }

    if present().all(|value| value.is_i64()) {
        return Arc::new(Int64Array::from(
            values
                .iter()
                .map(|value| value.and_then(Value::as_i64))
                .collect::<Vec<_>>(),
        ));
    }

    if present().all(|value| value.is_number()) {
        return Arc::new(Float64Array::from(
            values
                .iter()
                .map(|value| value.and_then(Value::as_f64))
                .collect::<Vec<_>>(),
        ));
    }

    Arc::new(StringArray::from(
        values
            .iter()
            .map(|value| {
                value.map(|value| match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
            })
            .collect::<Vec<_>>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn documents() -> Vec<Document> {
        vec![
            json!({
                "_id": "a1",
                "case_id": "EZYV01",
                "no_of_employees": 14513,
                "prevailing_wage": 592.2029,
                "full_time_position": "Y"
            }),
            json!({
                "_id": "a2",
                "case_id": "EZYV02",
                "no_of_employees": 2412,
                "prevailing_wage": 83425.65,
                "full_time_position": "N"
            }),
            json!({
                "_id": "a3",
                "case_id": "EZYV03",
                "no_of_employees": 44444,
                "prevailing_wage": 122996,
                "full_time_position": "Y"
            }),
        ]
        .into_iter()
        .map(|value| value.as_object().cloned().unwrap())
        .collect()
    }

    #[test]
    fn test_from_documents_infers_types() {
        let table = Table::from_documents(&documents()).unwrap();

        assert_eq!(table.shape(), (3, 4));
        assert!(!table.has_column("_id"));
        assert_eq!(
            table.column("no_of_employees").unwrap().data_type(),
            &DataType::Int64
        );
        assert_eq!(
            table.column("prevailing_wage").unwrap().data_type(),
            &DataType::Float64
        );
        assert_eq!(table.column("case_id").unwrap().data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_integers_and_floats_widen_to_float() {
        let docs: Vec<Document> = [json!({"wage": 10}), json!({"wage": 2.5}), json!({})]
            .into_iter()
            .map(|value| value.as_object().cloned().unwrap())
            .collect();
        let table = Table::from_documents(&docs).unwrap();

        assert_eq!(table.column("wage").unwrap().data_type(), &DataType::Float64);
        assert_eq!(table.column("wage").unwrap().null_count(), 1);
    }

    #[test]
    fn test_from_documents_preserves_first_seen_order() {
        let table = Table::from_documents(&documents()).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["case_id", "no_of_employees", "prevailing_wage", "full_time_position"]
        );
    }

    #[test]
    fn test_from_documents_empty() {
        let table = Table::from_documents(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn test_numeric_and_string_access() {
        let table = Table::from_documents(&documents()).unwrap();

        let employees = table.numeric_column("no_of_employees").unwrap();
        assert_eq!(employees, vec![14513.0, 2412.0, 44444.0]);

        let flags = table.string_column("full_time_position").unwrap();
        assert_eq!(flags, vec!["Y", "N", "Y"]);

        assert!(table.numeric_column("missing").is_err());
    }

    #[test]
    fn test_take_reorders_rows() {
        let table = Table::from_documents(&documents()).unwrap();
        let taken = table.take(&[2, 0]).unwrap();

        assert_eq!(taken.num_rows(), 2);
        assert_eq!(
            taken.string_column("case_id").unwrap(),
            vec!["EZYV03", "EZYV01"]
        );
        assert!(table.take(&[3]).is_err());
    }

    #[test]
    fn test_with_and_drop_columns() {
        let table = Table::from_documents(&documents()).unwrap();
        let age: ArrayRef = Arc::new(Int64Array::from(vec![10, 20, 30]));

        let extended = table.with_column("company_age", age).unwrap();
        assert_eq!(extended.num_columns(), 5);

        let dropped = extended.drop_columns(&["case_id", "company_age"]).unwrap();
        assert_eq!(dropped.num_columns(), 3);
        assert!(!dropped.has_column("case_id"));

        let result = dropped.drop_columns(&["case_id"]);
        assert!(result.unwrap_err().to_string().contains("Cannot drop missing"));
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/feature_store/usvisa.parquet");
        let table = Table::from_documents(&documents()).unwrap();

        table.write_parquet(&path).unwrap();
        let loaded = Table::read_parquet(&path).unwrap();

        assert_eq!(loaded.shape(), table.shape());
        assert_eq!(loaded.column_names(), table.column_names());
        assert_eq!(
            loaded.numeric_column("prevailing_wage").unwrap(),
            table.numeric_column("prevailing_wage").unwrap()
        );
    }

    #[test]
    fn test_read_parquet_missing_file() {
        let result = Table::read_parquet("/nonexistent/usvisa.parquet");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open Parquet file"));
    }
}
