//! Data ingestion: export the collection, then split it into train and test

use crate::artifact::DataIngestionArtifact;
use crate::config::DataIngestionConfig;
use crate::error::{Stage, StageContext};
use crate::source::DocumentStore;
use crate::storage::Table;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Rows in the test partition: `ceil(ratio * n)`
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn test_row_count(n_rows: usize, test_ratio: f64) -> usize {
    ((test_ratio * n_rows as f64).ceil() as usize).min(n_rows)
}

/// Shuffle rows with `seed` and cut off `ceil(test_ratio * n)` of them as the
/// test partition.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the ratio is outside `(0, 1)` or either
/// partition would be empty
pub fn train_test_split(table: &Table, test_ratio: f64, seed: u64) -> Result<(Table, Table)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(Error::InvalidInput(format!(
            "test_size={test_ratio} should be strictly between 0 and 1"
        )));
    }

    let n_rows = table.num_rows();
    let n_test = test_row_count(n_rows, test_ratio);
    if n_test == 0 || n_test == n_rows {
        return Err(Error::InvalidInput(format!(
            "With n_samples={n_rows} and test_size={test_ratio}, one partition would be empty"
        )));
    }

    let mut order: Vec<usize> = (0..n_rows).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test_rows, train_rows) = order.split_at(n_test);

    Ok((table.take(train_rows)?, table.take(test_rows)?))
}

/// Ingestion stage
pub struct DataIngestion<'a> {
    config: DataIngestionConfig,
    store: &'a dyn DocumentStore,
}

impl<'a> DataIngestion<'a> {
    /// Stage reading from `store`
    #[must_use]
    pub fn new(config: DataIngestionConfig, store: &'a dyn DocumentStore) -> Self {
        Self { config, store }
    }

    /// Export the configured collection and write it to the feature store
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] before writing anything if the
    /// collection is empty, or a store/storage error
    pub fn export_data_into_feature_store(&self) -> Result<Table> {
        tracing::info!(
            database = %self.config.database_name,
            collection = %self.config.collection_name,
            "Exporting data from document store"
        );
        let documents = self
            .store
            .export_collection(&self.config.database_name, &self.config.collection_name)?;
        let table = Table::from_documents(&documents)?;
        tracing::info!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            "Exported dataframe"
        );

        if table.is_empty() {
            tracing::error!("Fetched collection is empty, cannot proceed");
            return Err(Error::EmptyDataset {
                collection: self.config.collection_name.clone(),
            });
        }

        table.write_parquet(&self.config.feature_store_file_path)?;
        tracing::info!(
            path = %self.config.feature_store_file_path.display(),
            "Saved exported data into feature store"
        );
        Ok(table)
    }

    /// Split and write the train and test partitions
    ///
    /// # Errors
    ///
    /// Returns error if the split is impossible or a file cannot be written
    pub fn split_data_as_train_test(&self, table: &Table) -> Result<(Table, Table)> {
        let (train, test) =
            train_test_split(table, self.config.train_test_split_ratio, self.config.split_seed)?;
        tracing::info!(
            train_rows = train.num_rows(),
            test_rows = test.num_rows(),
            "Performed train test split"
        );

        train.write_parquet(&self.config.training_file_path)?;
        test.write_parquet(&self.config.test_file_path)?;
        tracing::info!(
            train = %self.config.training_file_path.display(),
            test = %self.config.test_file_path.display(),
            "Exported train and test files"
        );
        Ok((train, test))
    }

    /// Run export and split
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stage`] wrapping the first failure
    pub fn initiate_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        let _span = tracing::info_span!("data_ingestion").entered();

        let table = self.export_data_into_feature_store().stage(Stage::DataIngestion)?;
        self.split_data_as_train_test(&table).stage(Stage::DataIngestion)?;

        let artifact = DataIngestionArtifact::new(
            &self.config.training_file_path,
            &self.config.test_file_path,
        );
        tracing::info!(?artifact, "Data ingestion artifact");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::constants::{COLLECTION_NAME, DATABASE_NAME};
    use crate::source::MemoryDocumentStore;
    use crate::storage::Document;
    use serde_json::json;

    fn documents(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| {
                json!({"case_id": format!("EZYV{i}"), "no_of_employees": i})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect()
    }

    fn config(root: &std::path::Path) -> DataIngestionConfig {
        PipelineConfig::builder()
            .artifact_root(root)
            .timestamp("run")
            .build()
            .data_ingestion()
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let table = Table::from_documents(&documents(11)).unwrap();
        let (train, test) = train_test_split(&table, 0.2, 42).unwrap();
        assert_eq!(test.num_rows(), 3);
        assert_eq!(train.num_rows(), 8);

        let (train_again, _) = train_test_split(&table, 0.2, 42).unwrap();
        assert_eq!(train, train_again);
    }

    #[test]
    fn test_split_rejects_degenerate() {
        let table = Table::from_documents(&documents(1)).unwrap();
        assert!(train_test_split(&table, 0.2, 42).is_err());
        let table = Table::from_documents(&documents(10)).unwrap();
        assert!(train_test_split(&table, 1.0, 42).is_err());
    }

    #[test]
    fn test_initiate_writes_splits() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryDocumentStore::new();
        store.insert_collection(DATABASE_NAME, COLLECTION_NAME, documents(20));
        let config = config(dir.path());

        let artifact = DataIngestion::new(config.clone(), &store)
            .initiate_data_ingestion()
            .unwrap();

        assert!(config.feature_store_file_path.exists());
        assert_eq!(Table::read_parquet(artifact.trained_file_path()).unwrap().num_rows(), 16);
        assert_eq!(Table::read_parquet(artifact.test_file_path()).unwrap().num_rows(), 4);
    }

    #[test]
    fn test_empty_collection_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryDocumentStore::new();
        store.insert_collection(DATABASE_NAME, COLLECTION_NAME, Vec::new());

        let err = DataIngestion::new(config(dir.path()), &store)
            .initiate_data_ingestion()
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::DataIngestion));
        assert!(matches!(err.root_cause(), Error::EmptyDataset { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
