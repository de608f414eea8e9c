use thiserror::Error;

mod endpoint;
mod tokenizer;

pub use endpoint::EndpointGenerator;
pub use tokenizer::HubTokenizer;

/**
 * Backend Seam for Text Generation
 *
 * Every registered model is a pair of handles behind these traits: a
 * tokenizer that maps text to and from token ids, and a generator that
 * completes a bounded prompt. The core pipeline never touches a concrete
 * backend directly, so a hub-resolved tokenizer plus an HTTP completion
 * endpoint and a deterministic test double are interchangeable.
 */

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to fetch {artifact} for {repo}: {reason}")]
    Fetch {
        repo: String,
        artifact: String,
        reason: String,
    },
    #[error("tokenizer error: {reason}")]
    Tokenizer { reason: String },
    #[error("request to generation endpoint failed: {reason}")]
    Http { reason: String },
    #[error("generation endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("generation endpoint returned an empty completion")]
    EmptyCompletion,
}

/// Decoding parameters passed through to a generator on every call.
#[derive(Debug, Clone)]
pub struct DecodingOptions {
    /// Upper bound on the generated sequence, in tokens.
    pub max_length: usize,
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Sampling on by default; greedy decoding when disabled.
    pub sample: bool,
    pub pad_token_id: Option<u32>,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            max_length: 100,
            temperature: 0.7,
            top_p: 0.9,
            sample: true,
            pad_token_id: None,
        }
    }
}

/// Text <-> token-id mapping for one model.
///
/// `encode` truncates to `max_len` ids when a bound is given. `decode` with
/// `skip_special` drops padding/eos and any other special tokens from the
/// rendered text.
pub trait PromptTokenizer: Send + Sync {
    fn encode(&self, text: &str, max_len: Option<usize>) -> Result<Vec<u32>, BackendError>;
    fn decode(&self, ids: &[u32], skip_special: bool) -> Result<String, BackendError>;
    fn pad_token_id(&self) -> Option<u32>;
    fn eos_token_id(&self) -> Option<u32>;
    fn set_pad_token_id(&mut self, id: u32);
}

/// One causal text-generation backend.
///
/// `complete` blocks until the backend returns the raw completion for the
/// given prompt. Sampling makes repeated calls non-deterministic unless the
/// backend honors `DecodingOptions::sample = false`.
pub trait TextGenerator: Send + Sync {
    fn complete(&self, prompt: &str, opts: &DecodingOptions) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_decoding_options_match_generation_contract() {
        let opts = DecodingOptions::default();
        assert!(opts.sample);
        assert_eq!(opts.temperature, 0.7);
        assert_eq!(opts.top_p, 0.9);
        assert_eq!(opts.max_length, 100);
        assert!(opts.pad_token_id.is_none());
    }
}
