//! CMIP6 to WRF intermediate conversion.
//!
//! # Architecture
//!
//! A run is assembled from read-only pieces built once at startup:
//!
//! - [`config::RunConfig`]: YAML run configuration
//! - [`metadata::ModelMetadata`]: input files and frequencies of each
//!   variable group, from `cmip6_meta.csv`
//! - [`catalog::VariableCatalog`]: validated variable tables
//! - [`store::SourceDataStore`]: source fields sliced to the ETL window
//!
//! [`pipeline::ConversionPipeline`] then walks the output time series one
//! timestamp at a time and writes the intermediate files.

pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod store;

// Re-exports
pub use catalog::{LevelMarking, VariableCatalog, VariableKind, VariableSpec};
pub use config::RunConfig;
pub use error::{ConversionError, ErrorKind, Result};
pub use metadata::{ModelMetadata, VariableGroup};
pub use pipeline::{ConversionPipeline, ConvertedField, OutputLayout, TimestampReport};
pub use store::{HybridInputs, SourceDataStore};
