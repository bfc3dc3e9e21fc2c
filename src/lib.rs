//! movieroute - question router for movie knowledge sources
//!
//! Routes a natural-language movie question to:
//! - a statistics service (rental counts, ratings, release facts)
//! - a semantic retrieval service (plots, themes, character roles)
//! - or both, fusing the two answers with a text-generation step

pub mod types;
pub mod error;
pub mod config;
pub mod backends;
pub mod retrieval_client;
pub mod statistics_client;
pub mod http_text_gen;
pub mod classifier;
pub mod fuser;
pub mod history;
pub mod orchestrator;
pub mod server;

pub use types::*;
pub use error::RouteError;
pub use config::{FusionFallback, LlmSettings, OrchestratorSettings, Settings};
pub use backends::{
    MockRetrievalBackend, MockStatisticsBackend, MockTextGenerator, RetrievalBackend,
    StatisticsBackend, TextGenerator,
};
pub use retrieval_client::RetrievalClient;
pub use statistics_client::StatisticsClient;
pub use http_text_gen::HttpTextGen;
pub use classifier::Classifier;
pub use fuser::Fuser;
pub use orchestrator::{Orchestrator, SharedOrchestrator};
