//! Comparison orchestrator.
//!
//! Runs the full pipeline for every registered model: one templated
//! instruction, one generation per model in registration order, one set of
//! scores per output, then argmax on the final score. A single backend
//! failure fails the whole comparison and names the model that broke; no
//! partial result is produced.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{GenerationEngine, GenerationError};
use crate::registry::ModelRegistry;
use crate::scorer::{score, ScoreBand};
use crate::template::{build_instruction, PromptRequest};

#[derive(Error, Debug)]
pub enum CompareError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("no models registered; nothing to compare")]
    NoModels,
}

/// One model's output for one request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratedPrompt {
    pub model_name: String,
    pub text: String,
    pub length_score: usize,
    pub clarity_score: usize,
    pub final_score: usize,
}

impl GeneratedPrompt {
    /// First `n` whitespace-delimited words of the generated text.
    pub fn preview(&self, n: usize) -> String {
        self.text
            .split_whitespace()
            .take(n)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_final_score(self.final_score)
    }
}

/// Outputs for every registered model, keyed by model name in registration
/// order, plus the winner.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ComparisonResult {
    pub prompts: IndexMap<String, GeneratedPrompt>,
    pub best_model_name: String,
}

impl ComparisonResult {
    pub fn best(&self) -> &GeneratedPrompt {
        // best_model_name is always a key of `prompts`.
        &self.prompts[&self.best_model_name]
    }
}

/// Owns the registry for the process lifetime and runs comparisons over it.
pub struct Orchestrator {
    registry: ModelRegistry,
}

impl Orchestrator {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run one comparison across all registered models.
    pub fn compare(&self, request: &PromptRequest) -> Result<ComparisonResult, CompareError> {
        if self.registry.is_empty() {
            return Err(CompareError::NoModels);
        }

        // Built once; every model receives the same instruction.
        let instruction = build_instruction(request);
        let engine = GenerationEngine::new(&self.registry);

        let mut prompts = IndexMap::with_capacity(self.registry.len());
        let mut best: Option<(String, usize)> = None;

        for name in self.registry.names() {
            let text = engine.generate(name, &instruction, request.max_length)?;
            let scores = score(&text);
            debug!(
                model = name,
                length = scores.length_score,
                clarity = scores.clarity_score,
                final_score = scores.final_score,
                "scored generated prompt"
            );

            // Strictly-greater keeps the earliest-registered model on ties.
            if best.as_ref().map_or(true, |(_, s)| scores.final_score > *s) {
                best = Some((name.to_string(), scores.final_score));
            }
            prompts.insert(
                name.to_string(),
                GeneratedPrompt {
                    model_name: name.to_string(),
                    text,
                    length_score: scores.length_score,
                    clarity_score: scores.clarity_score,
                    final_score: scores.final_score,
                },
            );
        }

        // `best` is always set: the registry is non-empty and every model
        // either produced a prompt or aborted the comparison above.
        let (best_model_name, best_score) = best.ok_or(CompareError::NoModels)?;
        info!(best = %best_model_name, score = best_score, "comparison complete");

        Ok(ComparisonResult {
            prompts,
            best_model_name,
        })
    }
}
