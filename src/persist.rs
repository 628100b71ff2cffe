//! Persistence helpers for configuration files, fitted objects and numeric arrays
//!
//! - YAML for human-edited configuration and the drift report
//! - JSON for fitted objects (preprocessor, bundled model); floats round-trip exactly
//! - Parquet for 2-D numeric arrays, one `Float64` column per array column

use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Create the parent directory of `path` if it has one
///
/// # Errors
///
/// Returns error if the directory cannot be created
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Read and deserialize a YAML file
///
/// # Errors
///
/// Returns error if the file cannot be opened or does not match `T`
pub fn read_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::Config(format!(
            "Failed to open YAML file {}: {e}",
            path.as_ref().display()
        ))
    })?;
    Ok(serde_yaml::from_reader(BufReader::new(file))?)
}

/// Serialize `content` as YAML into `path`.
///
/// With `replace`, an existing file is removed first.
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn write_yaml<T: Serialize, P: AsRef<Path>>(path: P, content: &T, replace: bool) -> Result<()> {
    let path = path.as_ref();
    if replace && path.exists() {
        fs::remove_file(path)?;
    }
    ensure_parent_dir(path)?;

    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, content)?;
    writer.flush()?;
    Ok(())
}

/// Serialize a fitted object to `path`
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn save_object<T: Serialize, P: AsRef<Path>>(path: P, object: &T) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, object)?;
    writer.flush()?;
    Ok(())
}

/// Load an object written by [`save_object`]
///
/// # Errors
///
/// Returns error if the file cannot be read or does not match `T`
pub fn load_object<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::StorageError(format!(
            "Failed to open object file {}: {e}",
            path.as_ref().display()
        ))
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Decode an object from bytes produced by [`save_object`]
///
/// # Errors
///
/// Returns error if the bytes do not decode to `T`
pub fn object_from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Store a 2-D array as Parquet, one `Float64` column per array column
///
/// # Errors
///
/// Returns error if the array has no columns or the file cannot be written
pub fn save_array<P: AsRef<Path>>(path: P, array: &Array2<f64>) -> Result<()> {
    if array.ncols() == 0 {
        return Err(Error::InvalidInput(
            "Cannot store an array with zero columns".to_string(),
        ));
    }

    let fields: Vec<Field> = (0..array.ncols())
        .map(|index| Field::new(format!("c{index}"), DataType::Float64, false))
        .collect();
    let columns: Vec<ArrayRef> = array
        .columns()
        .into_iter()
        .map(|column| Arc::new(Float64Array::from(column.to_vec())) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    crate::storage::Table::new(batch).write_parquet(path)
}

/// Load an array written by [`save_array`]
///
/// # Errors
///
/// Returns error if the file cannot be read or holds non-`Float64` columns
pub fn load_array<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let table = crate::storage::Table::read_parquet(path)?;
    let (rows, cols) = table.shape();

    let mut columns = Vec::with_capacity(cols);
    for column in table.batch().columns() {
        let values = column
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                Error::StorageError(format!(
                    "Array column has type {:?}, expected Float64",
                    column.data_type()
                ))
            })?;
        columns.push(values);
    }

    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for values in &columns {
            data.push(values.value(row));
        }
    }

    Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::StorageError(format!("Invalid array shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Fitted {
        name: String,
        weights: Vec<f64>,
    }

    #[test]
    fn test_object_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transformed_object/preprocessing.json");
        let fitted = Fitted {
            name: "scaler".to_string(),
            weights: vec![0.1 + 0.2, 1.0 / 3.0, -2.5e-17, 123_456.789_012_345],
        };

        save_object(&path, &fitted).unwrap();
        let loaded: Fitted = load_object(&path).unwrap();

        assert_eq!(loaded, fitted);
    }

    #[test]
    fn test_yaml_replace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drift_report/report.yaml");

        write_yaml(&path, &vec!["first"], false).unwrap();
        write_yaml(&path, &vec!["second"], true).unwrap();

        let loaded: Vec<String> = read_yaml(&path).unwrap();
        assert_eq!(loaded, vec!["second"]);
    }

    #[test]
    fn test_array_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transformed/train.parquet");
        let data = array![[1.0, -0.5, 0.0], [2.25, 3.0, 1.0]];

        save_array(&path, &data).unwrap();
        let loaded = load_array(&path).unwrap();

        assert_eq!(loaded, data);
    }

    #[test]
    fn test_save_array_rejects_zero_columns() {
        let dir = tempfile::tempdir().unwrap();
        let data = Array2::<f64>::zeros((3, 0));
        assert!(save_array(dir.path().join("x.parquet"), &data).is_err());
    }

    #[test]
    fn test_read_yaml_missing_file() {
        let result: Result<Vec<String>> = read_yaml("/nonexistent/schema.yaml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
