#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod align;
pub mod artifact;
pub mod batch;
pub mod config;
pub mod engine;
pub mod explain;
pub mod input;
pub mod model;
pub mod report;
pub mod schema;
pub mod stats;

pub use align::{AlignedFeatures, InputRecord, align};
pub use artifact::{ArtifactPaths, LoadError, ServiceState, load};
pub use engine::{
    CONFIDENCE_LABEL, CONFIDENCE_Z, EngineError, ModelInfo, PredictionEngine, PredictionResult,
};
pub use model::{ModelError, Regressor, TrainedModel};
pub use schema::{FeatureSchema, SchemaError};
