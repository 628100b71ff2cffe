//! Inference with the registered model

use crate::config::PredictorConfig;
use crate::error::{Stage, StageContext};
use crate::features::CaseStatus;
use crate::registry::{ObjectStore, RegistryEstimator};
use crate::storage::{Document, Table};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One visa application, as submitted for a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisaApplication {
    /// Continent of the employee
    pub continent: String,
    /// Highest education level
    pub education_of_employee: String,
    /// `Y` or `N`
    pub has_job_experience: String,
    /// `Y` or `N`
    pub requires_job_training: String,
    /// Employer head count
    pub no_of_employees: i64,
    /// US region of the position
    pub region_of_employment: String,
    /// Offered wage
    pub prevailing_wage: f64,
    /// `Hour`, `Week`, `Month` or `Year`
    pub unit_of_wage: String,
    /// `Y` or `N`
    pub full_time_position: String,
    /// Years since the employer was established
    pub company_age: i64,
}

impl VisaApplication {
    /// Input record as a document-store style map
    ///
    /// # Errors
    ///
    /// Returns error if the record does not serialize to an object
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::InvalidInput(format!("Application serialized to {other}"))),
        }
    }

    /// Single-row table for the model
    ///
    /// # Errors
    ///
    /// Returns error if the table cannot be built
    pub fn to_table(&self) -> Result<Table> {
        Table::from_documents(&[self.to_document()?])
    }
}

/// Serves decisions from the model in the registry
#[derive(Debug)]
pub struct VisaClassifier<'a> {
    estimator: RegistryEstimator<'a>,
}

impl<'a> VisaClassifier<'a> {
    /// Classifier over the model at `config`'s registry location
    #[must_use]
    pub fn new(config: &PredictorConfig, store: &'a dyn ObjectStore) -> Self {
        Self {
            estimator: RegistryEstimator::new(store, &config.bucket_name, &config.model_key),
        }
    }

    /// Decide every row of `table`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stage`] if no model is registered or the table lacks
    /// a column the model needs
    pub fn predict(&self, table: &Table) -> Result<Vec<CaseStatus>> {
        let _span = tracing::info_span!("prediction").entered();
        let labels = self.estimator.predict(table).stage(Stage::Prediction)?;
        labels
            .into_iter()
            .map(CaseStatus::from_label)
            .collect::<Result<Vec<_>>>()
            .stage(Stage::Prediction)
    }

    /// Decide one application
    ///
    /// # Errors
    ///
    /// See [`VisaClassifier::predict`]
    pub fn predict_application(&self, application: &VisaApplication) -> Result<CaseStatus> {
        let table = application.to_table().stage(Stage::Prediction)?;
        let statuses = self.predict(&table)?;
        statuses
            .into_iter()
            .next()
            .ok_or_else(|| Error::Model("Model returned no prediction".to_string()))
            .stage(Stage::Prediction)
    }
}
