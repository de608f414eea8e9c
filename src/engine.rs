//! Generation engine.
//!
//! Drives one model through one templated instruction: bound the instruction
//! to `max_length` tokens, hand the bounded window to the generation backend
//! with the fixed decoding parameters, then render the completion back to
//! clean text. Failures are tagged with the model name so a comparison can
//! report which backend broke.

use thiserror::Error;
use tracing::debug;

use crate::backend::{BackendError, DecodingOptions};
use crate::registry::{ModelRegistry, RegistryError};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("model {model}: tokenization failed: {source}")]
    Tokenize {
        model: String,
        source: BackendError,
    },
    #[error("model {model}: backend generation failed: {source}")]
    Backend {
        model: String,
        source: BackendError,
    },
    #[error("model {model}: decoding failed: {source}")]
    Decode {
        model: String,
        source: BackendError,
    },
}

impl GenerationError {
    /// Name of the model whose backend failed, when one is identified.
    pub fn model(&self) -> Option<&str> {
        match self {
            GenerationError::Registry(RegistryError::UnknownModel { name })
            | GenerationError::Registry(RegistryError::Load { name, .. }) => Some(name),
            GenerationError::Tokenize { model, .. }
            | GenerationError::Backend { model, .. }
            | GenerationError::Decode { model, .. } => Some(model),
        }
    }
}

pub struct GenerationEngine<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> GenerationEngine<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Generate one text from `model_name` for `instruction`, bounded to
    /// `max_length` tokens on both input and output.
    pub fn generate(
        &self,
        model_name: &str,
        instruction: &str,
        max_length: usize,
    ) -> Result<String, GenerationError> {
        let spec = self.registry.get(model_name)?;
        let tokenizer = spec.tokenizer();

        let input_ids = tokenizer
            .encode(instruction, Some(max_length))
            .map_err(|source| GenerationError::Tokenize {
                model: model_name.to_string(),
                source,
            })?;
        let bounded =
            tokenizer
                .decode(&input_ids, false)
                .map_err(|source| GenerationError::Tokenize {
                    model: model_name.to_string(),
                    source,
                })?;
        debug!(
            model = model_name,
            input_tokens = input_ids.len(),
            max_length,
            "dispatching generation"
        );

        let opts = DecodingOptions {
            max_length,
            pad_token_id: tokenizer.pad_token_id(),
            ..DecodingOptions::default()
        };
        let raw = spec
            .generator()
            .complete(&bounded, &opts)
            .map_err(|source| GenerationError::Backend {
                model: model_name.to_string(),
                source,
            })?;

        // Round-trip through the tokenizer so special/control tokens in the
        // completion are stripped before the text reaches the scorer.
        let output_ids =
            tokenizer
                .encode(&raw, None)
                .map_err(|source| GenerationError::Decode {
                    model: model_name.to_string(),
                    source,
                })?;
        let text = tokenizer
            .decode(&output_ids, true)
            .map_err(|source| GenerationError::Decode {
                model: model_name.to_string(),
                source,
            })?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::backend::{PromptTokenizer, TextGenerator};
    use crate::registry::ModelRegistry;

    /// One char = one token; ids above CHAR_MAX are "special".
    struct CharTokenizer {
        pad: Option<u32>,
        eos: Option<u32>,
    }

    const SPECIAL_BASE: u32 = 0x0011_0000;

    impl PromptTokenizer for CharTokenizer {
        fn encode(&self, text: &str, max_len: Option<usize>) -> Result<Vec<u32>, BackendError> {
            let mut ids: Vec<u32> = text
                .chars()
                .map(|c| if c == '\u{FFFC}' { SPECIAL_BASE } else { c as u32 })
                .collect();
            if let Some(limit) = max_len {
                ids.truncate(limit);
            }
            Ok(ids)
        }

        fn decode(&self, ids: &[u32], skip_special: bool) -> Result<String, BackendError> {
            Ok(ids
                .iter()
                .filter(|&&id| !(skip_special && id >= SPECIAL_BASE))
                .map(|&id| {
                    if id >= SPECIAL_BASE {
                        '\u{FFFC}'
                    } else {
                        char::from_u32(id).unwrap_or('\u{FFFD}')
                    }
                })
                .collect())
        }

        fn pad_token_id(&self) -> Option<u32> {
            self.pad
        }

        fn eos_token_id(&self) -> Option<u32> {
            self.eos
        }

        fn set_pad_token_id(&mut self, id: u32) {
            self.pad = Some(id);
        }
    }

    /// Returns a fixed completion and records the prompt/options it saw.
    struct ScriptedGenerator {
        output: String,
        seen: Arc<Mutex<Option<(String, DecodingOptions)>>>,
    }

    impl ScriptedGenerator {
        fn new(output: &str) -> (Self, Arc<Mutex<Option<(String, DecodingOptions)>>>) {
            let seen = Arc::new(Mutex::new(None));
            (
                Self {
                    output: output.to_string(),
                    seen: Arc::clone(&seen),
                },
                seen,
            )
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn complete(&self, prompt: &str, opts: &DecodingOptions) -> Result<String, BackendError> {
            *self.seen.lock().unwrap() = Some((prompt.to_string(), opts.clone()));
            Ok(self.output.clone())
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        fn complete(&self, _: &str, _: &DecodingOptions) -> Result<String, BackendError> {
            Err(BackendError::Http {
                reason: "backend unavailable".to_string(),
            })
        }
    }

    fn char_tokenizer() -> Box<CharTokenizer> {
        Box::new(CharTokenizer {
            pad: None,
            eos: Some(SPECIAL_BASE),
        })
    }

    #[test]
    fn generated_text_is_trimmed() {
        let mut registry = ModelRegistry::new();
        let (generator, _) = ScriptedGenerator::new("  a detailed scan  ");
        registry.register("m", char_tokenizer(), Box::new(generator));
        let engine = GenerationEngine::new(&registry);
        let text = engine.generate("m", "instruction", 100).unwrap();
        assert_eq!(text, "a detailed scan");
    }

    #[test]
    fn special_tokens_are_stripped_from_the_completion() {
        let mut registry = ModelRegistry::new();
        let (generator, _) = ScriptedGenerator::new("scan\u{FFFC}\u{FFFC}");
        registry.register("m", char_tokenizer(), Box::new(generator));
        let engine = GenerationEngine::new(&registry);
        let text = engine.generate("m", "instruction", 100).unwrap();
        assert_eq!(text, "scan");
    }

    #[test]
    fn backend_sees_bounded_prompt_and_fixed_options() {
        let mut registry = ModelRegistry::new();
        let (generator, seen) = ScriptedGenerator::new("ok");
        registry.register("m", char_tokenizer(), Box::new(generator));
        let engine = GenerationEngine::new(&registry);
        engine.generate("m", "abcdefghij", 4).unwrap();

        let (prompt, opts) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, "abcd");
        assert_eq!(opts.max_length, 4);
        assert!(opts.sample);
        assert_eq!(opts.temperature, 0.7);
        assert_eq!(opts.top_p, 0.9);
        // Registration adopted eos as pad; the engine passes it through.
        assert_eq!(opts.pad_token_id, Some(SPECIAL_BASE));
    }

    #[test]
    fn backend_failure_is_tagged_with_the_model_name() {
        let mut registry = ModelRegistry::new();
        registry.register("broken", char_tokenizer(), Box::new(FailingGenerator));
        let engine = GenerationEngine::new(&registry);
        let err = engine.generate("broken", "instruction", 100).unwrap_err();
        assert_eq!(err.model(), Some("broken"));
        assert!(matches!(err, GenerationError::Backend { .. }));
    }

    #[test]
    fn unknown_model_propagates_the_registry_error() {
        let registry = ModelRegistry::new();
        let engine = GenerationEngine::new(&registry);
        let err = engine.generate("ghost", "instruction", 100).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Registry(RegistryError::UnknownModel { .. })
        ));
    }

    #[test]
    fn minimum_length_bound_still_generates() {
        let mut registry = ModelRegistry::new();
        let (generator, _) = ScriptedGenerator::new("short scan");
        registry.register("m", char_tokenizer(), Box::new(generator));
        let engine = GenerationEngine::new(&registry);
        let instruction = "Generate a MRI scan of human brain. Focus on the medical imaging \
                           context only. Avoid any extra information.";
        let text = engine.generate("m", instruction, 50).unwrap();
        assert!(!text.is_empty());
    }
}
