//! Hub-resolved tokenizer handle.
//!
//! Wraps a `tokenizers` tokenizer loaded from a local `tokenizer.json` or
//! fetched once from the Hugging Face hub. Pad/eos ids are tracked here so
//! the registry can adopt eos as pad for models that ship without one
//! (GPT-2 family models do).

use std::path::Path;

use hf_hub::api::sync::Api;
use tokenizers::Tokenizer;
use tracing::debug;

use super::{BackendError, PromptTokenizer};

const TOKENIZER_FILE: &str = "tokenizer.json";

// Spellings used by the model families we resolve from the hub.
const EOS_CANDIDATES: &[&str] = &["<|endoftext|>", "</s>", "<eos>"];
const PAD_CANDIDATES: &[&str] = &["<pad>", "[PAD]"];

pub struct HubTokenizer {
    inner: Tokenizer,
    pad_id: Option<u32>,
    eos_id: Option<u32>,
}

impl HubTokenizer {
    /// Load from a tokenizer.json already on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let inner = Tokenizer::from_file(path.as_ref()).map_err(|e| BackendError::Tokenizer {
            reason: e.to_string(),
        })?;
        Ok(Self::from_tokenizer(inner))
    }

    /// Fetch tokenizer.json for `repo_id` from the hub, then load it.
    pub fn from_pretrained(repo_id: &str) -> Result<Self, BackendError> {
        let api = Api::new().map_err(|e| BackendError::Fetch {
            repo: repo_id.to_string(),
            artifact: TOKENIZER_FILE.to_string(),
            reason: e.to_string(),
        })?;
        let path = api
            .model(repo_id.to_string())
            .get(TOKENIZER_FILE)
            .map_err(|e| BackendError::Fetch {
                repo: repo_id.to_string(),
                artifact: TOKENIZER_FILE.to_string(),
                reason: e.to_string(),
            })?;
        debug!(repo = repo_id, path = %path.display(), "fetched tokenizer");
        Self::from_file(path)
    }

    fn from_tokenizer(inner: Tokenizer) -> Self {
        let eos_id = EOS_CANDIDATES.iter().find_map(|t| inner.token_to_id(t));
        let pad_id = PAD_CANDIDATES.iter().find_map(|t| inner.token_to_id(t));
        Self {
            inner,
            pad_id,
            eos_id,
        }
    }
}

impl PromptTokenizer for HubTokenizer {
    fn encode(&self, text: &str, max_len: Option<usize>) -> Result<Vec<u32>, BackendError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| BackendError::Tokenizer {
                reason: e.to_string(),
            })?;
        let mut ids = encoding.get_ids().to_vec();
        if let Some(limit) = max_len {
            ids.truncate(limit);
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[u32], skip_special: bool) -> Result<String, BackendError> {
        self.inner
            .decode(ids, skip_special)
            .map_err(|e| BackendError::Tokenizer {
                reason: e.to_string(),
            })
    }

    fn pad_token_id(&self) -> Option<u32> {
        self.pad_id
    }

    fn eos_token_id(&self) -> Option<u32> {
        self.eos_id
    }

    fn set_pad_token_id(&mut self, id: u32) {
        self.pad_id = Some(id);
    }
}
