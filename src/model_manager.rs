use std::path::{Path, PathBuf};

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use serde::Deserialize;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use crate::{
    embedding::{Embedder, Embedding},
    error::{Error, Result},
};

pub const DEFAULT_MODEL_ID: &str = "BAAI/bge-large-en";

/// Number of documents run through the model in one forward pass.
pub const ENCODE_BATCH_SIZE: usize = 32;

const WEIGHT_FILES: &[&str] = &["model.safetensors", "pytorch_model.bin"];
const POOLING_CONFIG: &str = "1_Pooling/config.json";
const DEFAULT_MAX_LENGTH: usize = 512;

/// Select the best available compute device.
///
/// Uses CUDA when compiled with the `cuda` feature, Metal when compiled with
/// the `metal` feature, and falls back to CPU otherwise.
fn default_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return device;
        }
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            return device;
        }
    }

    Device::Cpu
}

/// How token embeddings are reduced to one sentence embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pooling {
    /// Hidden state of the leading `[CLS]` token.
    #[default]
    Cls,
    /// Mean of the hidden states of all non-padding tokens.
    Mean,
}

/// The subset of a sentence-transformers `1_Pooling/config.json` we read.
#[derive(Debug, Default, Deserialize)]
struct PoolingConfig {
    #[serde(default)]
    pooling_mode_cls_token: bool,
    #[serde(default)]
    pooling_mode_mean_tokens: bool,
}

impl Pooling {
    fn from_config(config: &PoolingConfig) -> Self {
        if config.pooling_mode_mean_tokens && !config.pooling_mode_cls_token {
            Pooling::Mean
        } else {
            Pooling::Cls
        }
    }

    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Pooling::default());
        };
        let config: PoolingConfig =
            serde_json::from_str(&std::fs::read_to_string(path)?)?;
        Ok(Self::from_config(&config))
    }
}

#[derive(Debug, Deserialize)]
struct SequenceLimits {
    #[serde(default = "default_max_length")]
    max_position_embeddings: usize,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

/// Files making up a sentence-embedding model.
#[derive(Debug)]
struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
    pooling: Option<PathBuf>,
}

impl ModelFiles {
    /// Resolve model files from a local directory or the HuggingFace Hub.
    fn locate(model_id: &str) -> Result<Self> {
        let local = Path::new(model_id);
        if local.is_dir() {
            return Self::from_dir(local);
        }

        let api = Api::new().map_err(model_err)?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));
        let weights = WEIGHT_FILES
            .iter()
            .find_map(|name| repo.get(name).ok())
            .ok_or_else(|| {
                Error::Model(format!("no model weights found for {model_id}"))
            })?;

        Ok(Self {
            config: repo.get("config.json").map_err(model_err)?,
            tokenizer: repo.get("tokenizer.json").map_err(model_err)?,
            weights,
            pooling: repo.get(POOLING_CONFIG).ok(),
        })
    }

    fn from_dir(dir: &Path) -> Result<Self> {
        let weights = WEIGHT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                Error::Model(format!(
                    "no model weights found in {}",
                    dir.display()
                ))
            })?;
        let pooling = dir.join(POOLING_CONFIG);

        Ok(Self {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights,
            pooling: pooling.is_file().then_some(pooling),
        })
    }
}

/// A loaded BERT encoder with its tokenizer.
struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    pooling: Pooling,
    device: Device,
}

impl SentenceEncoder {
    fn load(model_id: &str) -> Result<Self> {
        let files = ModelFiles::locate(model_id)?;
        let device = default_device();

        let config_json = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&config_json)?;
        let limits: SequenceLimits = serde_json::from_str(&config_json)?;

        let mut tokenizer =
            Tokenizer::from_file(&files.tokenizer).map_err(model_err)?;
        tokenizer.with_padding(Some(PaddingParams::default()));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: limits.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(model_err)?;

        let is_safetensors = files
            .weights
            .extension()
            .is_some_and(|ext| ext == "safetensors");
        let vb = if is_safetensors {
            // SAFETY: the weights file is not modified while mapped.
            unsafe {
                VarBuilder::from_mmaped_safetensors(
                    &[&files.weights],
                    DTYPE,
                    &device,
                )?
            }
        } else {
            VarBuilder::from_pth(&files.weights, DTYPE, &device)?
        };

        let model = BertModel::load(vb, &config)?;
        let pooling = Pooling::load(files.pooling.as_deref())?;
        tracing::debug!(?pooling, ?device, "embedding model ready");

        Ok(Self {
            model,
            tokenizer,
            pooling,
            device,
        })
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(model_err)?;

        let mut ids = Vec::with_capacity(encodings.len());
        let mut type_ids = Vec::with_capacity(encodings.len());
        let mut masks = Vec::with_capacity(encodings.len());
        for encoding in &encodings {
            ids.push(Tensor::new(encoding.get_ids(), &self.device)?);
            type_ids.push(Tensor::new(encoding.get_type_ids(), &self.device)?);
            masks.push(Tensor::new(
                encoding.get_attention_mask(),
                &self.device,
            )?);
        }
        let input_ids = Tensor::stack(&ids, 0)?;
        let token_type_ids = Tensor::stack(&type_ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;

        // [batch, tokens, hidden]
        let hidden = self.model.forward(
            &input_ids,
            &token_type_ids,
            Some(&attention_mask),
        )?;

        let pooled = match self.pooling {
            Pooling::Cls => hidden.i((.., 0))?,
            Pooling::Mean => {
                let mask = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
                let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
                let counts = mask.sum(1)?;
                summed.broadcast_div(&counts)?
            }
        };

        Ok(pooled.to_dtype(DType::F32)?.to_vec2::<f32>()?)
    }
}

fn model_err(e: impl std::fmt::Display) -> Error {
    Error::Model(e.to_string())
}

/// Manages the sentence-embedding model lifecycle, supporting lazy loading
/// on first use.
pub struct ModelManager {
    encoder: Option<SentenceEncoder>,
    model_id: String,
}

impl ModelManager {
    /// Creates a `ModelManager` for a HuggingFace model ID or a local model
    /// directory. The model is not loaded until the first call to `encode`.
    pub fn with_model_id(model_id: String) -> Self {
        Self {
            encoder: None,
            model_id,
        }
    }

    /// Returns the model ID that will be (or has been) loaded.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Returns `true` if the model has already been loaded into memory.
    pub fn is_loaded(&self) -> bool {
        self.encoder.is_some()
    }

    /// Ensures the model is loaded, downloading from HuggingFace Hub if needed.
    fn ensure_loaded(&mut self) -> Result<&SentenceEncoder> {
        let encoder = match self.encoder.take() {
            Some(encoder) => encoder,
            None => {
                tracing::info!(model = %self.model_id, "loading embedding model");
                SentenceEncoder::load(&self.model_id)?
            }
        };
        Ok(self.encoder.insert(encoder))
    }
}

impl Embedder for ModelManager {
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encoder = self.ensure_loaded()?;
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(ENCODE_BATCH_SIZE) {
            embeddings.extend(encoder.encode_batch(batch)?);
        }
        Ok(embeddings)
    }
}
