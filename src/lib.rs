//! # medprompt
//!
//! Multi-model prompt generation and ranking for medical-imaging synthesis.
//! Several independent text-generation backends are driven with the same
//! templated instruction, their outputs are scored, and the best-scoring
//! model is surfaced to the caller.
//!
//! ## Architecture
//!
//! ```text
//! PromptRequest → template (instruction) → engine (per model) → scorer
//!                          orchestrator collects + ranks → ComparisonResult
//! ```
//!
//! The presentation shell on top of this crate supplies a [`PromptRequest`]
//! and renders the resulting [`ComparisonResult`]; everything in between is
//! owned here. Model backends sit behind the traits in [`backend`], so the
//! shipped pair (hub-resolved tokenizer + HTTP completion endpoint) and
//! deterministic test doubles are interchangeable.

pub mod backend;
pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod registry;
pub mod scorer;
pub mod template;

pub use backend::{BackendError, DecodingOptions, PromptTokenizer, TextGenerator};
pub use config::{AppConfig, ConfigError, EndpointConfig, ModelConfig, PromptLimits};
pub use engine::{GenerationEngine, GenerationError};
pub use orchestrator::{CompareError, ComparisonResult, GeneratedPrompt, Orchestrator};
pub use registry::{ModelRegistry, ModelSpec, RegistryError};
pub use scorer::{score, PromptScores, ScoreBand};
pub use template::{build_instruction, Modality, PromptRequest};

/// Build an [`Orchestrator`] from a configuration: every configured model is
/// resolved (hub tokenizer + completion endpoint) and registered, in order.
///
/// A model that cannot be loaded aborts the bootstrap; the registry is
/// all-or-nothing so no request ever runs against a partial model set.
pub fn bootstrap(config: &AppConfig) -> Result<Orchestrator, RegistryError> {
    let mut registry = ModelRegistry::new();
    for model in &config.models {
        registry.register_pretrained(&model.name, &model.repo, &config.endpoint)?;
    }
    Ok(Orchestrator::new(registry))
}
