//! # visa-pipeline: staged training pipeline for visa-application outcomes
//!
//! Records are exported from a document store, validated, transformed and
//! used to train a classifier. The trained model is compared against the one
//! in the model registry and pushed only when it scores better.
//!
//! ## Stages
//!
//! | Stage | Reads | Writes |
//! |-------|-------|--------|
//! | Ingestion | document store | feature store, train/test Parquet |
//! | Validation | train/test | drift report |
//! | Transformation | train/test | preprocessor, transformed arrays |
//! | Trainer | arrays, preprocessor | bundled model |
//! | Evaluation | test split, registry | comparison |
//! | Pusher | bundled model | registry |
//!
//! Every stage returns an immutable artifact naming what it wrote, and the
//! next stage reads only what that artifact names.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use visa_pipeline::config::PipelineConfig;
//! use visa_pipeline::pipeline::TrainPipeline;
//! use visa_pipeline::registry::FsObjectStore;
//! use visa_pipeline::source::JsonLinesStore;
//!
//! let pipeline = TrainPipeline::new(
//!     PipelineConfig::default(),
//!     Box::new(JsonLinesStore::new("/data/docstore")),
//!     Box::new(FsObjectStore::new("/data/registry")),
//! );
//! let outcome = pipeline.run_pipeline()?;
//! println!("pushed: {}", outcome.is_model_pushed());
//! # Ok::<(), visa_pipeline::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod artifact;
pub mod components;
pub mod config;
pub mod constants;
pub mod drift;
pub mod error;
pub mod features;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod preprocess;
pub mod registry;
pub mod resample;
pub mod schema;
pub mod source;
pub mod stats;
pub mod storage;
pub mod tracking;

pub use error::{Error, Result, Stage, StageContext};
