//! Core library for the `raincast` prediction service.
//!
//! This crate defines:
//! - Model artifacts and the inference math for the two served models
//! - The date-indexed feature store and its zero-filled dummy variant
//! - The prediction service composing both
//! - The HTTP client and configuration used by the companion CLI
//!
//! It is used by `raincast-server` and `raincast-cli`, but can also be
//! reused by other binaries or services.

pub mod artifact;
pub mod client;
pub mod config;
pub mod error;
pub mod features;
pub mod forecast;
pub mod model;

pub use artifact::{LinearClassifier, LinearRegressor, ModelHandle, TargetTransform};
pub use client::ApiClient;
pub use config::Config;
pub use error::PredictError;
pub use features::{FeatureMode, FeatureProvider, FeatureRow};
pub use forecast::{ArtifactPaths, Forecaster};
pub use model::{PrecipPrediction, PrecipResponse, RainPrediction, RainResponse};
