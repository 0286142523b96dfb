//! Domain types, input classification, and configuration shared by every
//! reviewscope crate.

pub mod analysis;
pub mod app_config;
pub mod config;
pub mod input;
pub mod tags;

use thiserror::Error;

pub use analysis::{
    Analysis, AnalysisKey, DiscoverySource, NewAnalysis, NewVideoCandidate, SortDirection,
    SortField, SortKey, VideoCandidate, VideoQuery,
};
pub use app_config::{AppConfig, Environment, SecondaryLlm};
pub use config::{load_app_config, load_app_config_from_env, YOUTUBE_MAX_RESULTS_CAP};
pub use input::{classify, InputType};
pub use tags::{LlmType, Locale};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown input type: {0}")]
    UnknownInputType(String),

    #[error("unknown locale: {0}")]
    UnknownLocale(String),

    #[error("unknown model: {0}")]
    UnknownModel(String),
}
