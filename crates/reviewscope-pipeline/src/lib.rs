//! Product resolution and video discovery.
//!
//! Input is classified, a product name is resolved and cleaned, then three
//! discovery strategies fan out concurrently. Their results are normalized
//! and appended to the store. External services sit behind the traits in
//! [`ports`] so the pipeline can run against in-memory fakes.

pub mod discovery;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod fakes;
pub mod llm_json;
pub mod normalize;
pub mod persist;
pub mod ports;
pub mod prompts;
pub mod resolver;
pub mod service;
pub mod wiring;

pub use discovery::{BranchOutcome, BranchStatus, BranchSummary, Discovery, DiscoveryOrchestrator};
pub use error::{BranchError, PipelineError, ResolutionError};
pub use llm_json::{extract_json_block, ParseError};
pub use normalize::{clean_numeric_value, normalize_thumbnail, CandidateContext, RawCandidate};
pub use ports::{AnalysisStore, PageScraper, PgStore, TextGenerator, VideoMetadata, VideoSearch};
pub use resolver::{CleanedName, ProductNameResolver, ResolvedName};
pub use service::{AnalysisService, DiscoveryReport, Resolved};
pub use wiring::{build_service, http_settings};
