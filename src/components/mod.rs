//! Pipeline stages
//!
//! Each stage is built from its config plus the artifacts of the stages it
//! depends on, and exposes one `initiate_*` operation that returns its own
//! artifact. Failures leave a stage as [`crate::Error::Stage`].

mod evaluation;
mod ingestion;
mod pusher;
mod trainer;
mod transformation;
mod validation;

pub use evaluation::{EvaluationModelResponse, ModelEvaluation};
pub use ingestion::{test_row_count, train_test_split, DataIngestion};
pub use pusher::ModelPusher;
pub use trainer::ModelTrainer;
pub use transformation::DataTransformation;
pub use validation::DataValidation;
