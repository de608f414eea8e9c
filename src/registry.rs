//! Model registry.
//!
//! A fixed mapping from model name to its tokenizer and generation backend.
//! Populated once at process start and read-only afterwards; iteration order
//! is registration order, which the orchestrator relies on for tie-breaking.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::info;

use crate::backend::{
    BackendError, EndpointGenerator, HubTokenizer, PromptTokenizer, TextGenerator,
};
use crate::config::EndpointConfig;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to load model backend for {name}: {source}")]
    Load {
        name: String,
        source: BackendError,
    },
    #[error("unknown model: {name}")]
    UnknownModel { name: String },
}

/// One registered model: immutable once inserted.
pub struct ModelSpec {
    name: String,
    tokenizer: Box<dyn PromptTokenizer>,
    generator: Box<dyn TextGenerator>,
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ModelSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokenizer(&self) -> &dyn PromptTokenizer {
        self.tokenizer.as_ref()
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }
}

#[derive(Default)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under `name`. If the tokenizer has no padding token,
    /// the end-of-sequence token is adopted as the padding token.
    pub fn register(
        &mut self,
        name: &str,
        mut tokenizer: Box<dyn PromptTokenizer>,
        generator: Box<dyn TextGenerator>,
    ) {
        if tokenizer.pad_token_id().is_none() {
            if let Some(eos) = tokenizer.eos_token_id() {
                tokenizer.set_pad_token_id(eos);
            }
        }
        info!(model = name, "registered model backend");
        self.models.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                tokenizer,
                generator,
            },
        );
    }

    /// Resolve `repo_id` (hub tokenizer + completion endpoint) and register
    /// the pair under `name`. Fails with a load error when the tokenizer
    /// cannot be fetched or the endpoint client cannot be built.
    pub fn register_pretrained(
        &mut self,
        name: &str,
        repo_id: &str,
        endpoint: &EndpointConfig,
    ) -> Result<(), RegistryError> {
        let tokenizer = HubTokenizer::from_pretrained(repo_id).map_err(|source| {
            RegistryError::Load {
                name: name.to_string(),
                source,
            }
        })?;
        let generator =
            EndpointGenerator::new(endpoint, repo_id).map_err(|source| RegistryError::Load {
                name: name.to_string(),
                source,
            })?;
        self.register(name, Box::new(tokenizer), Box::new(generator));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ModelSpec, RegistryError> {
        self.models
            .get(name)
            .ok_or_else(|| RegistryError::UnknownModel {
                name: name.to_string(),
            })
    }

    /// Registered models in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
