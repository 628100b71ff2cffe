//! Pipelines: training end to end, and inference with the registered model

mod prediction;
mod training;

pub use prediction::{VisaApplication, VisaClassifier};
pub use training::{PipelineOutcome, TrainPipeline};
