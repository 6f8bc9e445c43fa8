use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::{InferenceResult, WhisperModel};

use super::audio_decoder::decode_audio_to_pcm;

const MEL_FILTERS_REPO: &str = "FL33TW00D-HF/whisper-base";
const MAX_DECODE_TOKENS: usize = 224;
const ENGLISH: &str = "en";

/// Language codes in the order of the multilingual vocabulary.
const LANGUAGES: &[&str] = &[
    "en", "zh", "de", "es", "ru", "ko", "fr", "ja", "pt", "tr", "pl", "ca", "nl", "ar", "sv", "it",
    "id", "hi", "fi", "vi", "he", "uk", "el", "ms", "cs", "ro", "da", "hu", "ta", "no", "th", "ur",
    "hr", "bg", "lt", "la", "mi", "ml", "cy", "sk", "te", "fa", "lv", "bn", "sr", "az", "sl", "kn",
    "et", "mk", "br", "eu", "is", "hy", "ne", "mn", "bs", "kk", "sq", "sw", "gl", "mr", "pa", "si",
    "km", "sn", "yo", "so", "af", "oc", "ka", "be", "tg", "sd", "gu", "am", "yi", "lo", "uz", "fo",
    "ht", "ps", "tk", "nn", "mt", "sa", "lb", "my", "bo", "tl", "mg", "as", "tt", "haw", "ln",
    "ha", "ba", "jw", "su",
];

/// Whisper running in-process on candle.
///
/// Decoding mutates the model's KV cache, so the weights sit behind a mutex
/// that is only ever taken on a blocking thread.
pub struct CandleWhisperEngine {
    runtime: Arc<WhisperRuntime>,
}

struct WhisperRuntime {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
    multilingual: bool,
}

impl CandleWhisperEngine {
    /// Downloads (or reuses the hub cache of) the checkpoint and loads it.
    /// Blocking.
    pub fn new(model: WhisperModel) -> Result<Self, TranscriptionError> {
        let device = Device::Cpu;
        let repo_id = model.repo_id();

        tracing::info!(
            device = ?device,
            model = %repo_id,
            "Initializing Candle Whisper transcription engine"
        );

        let api = Api::new().map_err(load_failed)?;
        let repo = api.repo(Repo::new(repo_id, RepoType::Model));
        let fetch = |file: &str| {
            repo.get(file)
                .map_err(|e| TranscriptionError::ModelLoadFailed(format!("{}: {}", file, e)))
        };

        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;
        let mel_bytes_path = api
            .repo(Repo::new(MEL_FILTERS_REPO.to_string(), RepoType::Model))
            .get("melfilters.bytes")
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("melfilters.bytes: {}", e)))?;

        let config: Config = serde_json::from_str(
            &std::fs::read_to_string(&config_path).map_err(load_failed)?,
        )
        .map_err(load_failed)?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(load_failed)?;
        let mel_filters =
            read_mel_filters(&std::fs::read(&mel_bytes_path).map_err(load_failed)?, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], m::DTYPE, &device)
                .map_err(load_failed)?
        };
        let whisper = m::model::Whisper::load(&vb, config.clone()).map_err(load_failed)?;

        tracing::info!(model = %model, "Candle Whisper engine loaded");

        Ok(Self {
            runtime: Arc::new(WhisperRuntime {
                model: Mutex::new(whisper),
                tokenizer,
                config,
                device,
                mel_filters,
                multilingual: model.is_multilingual(),
            }),
        })
    }
}

#[async_trait]
impl TranscriptionEngine for CandleWhisperEngine {
    async fn transcribe(&self, audio_path: &Path) -> Result<InferenceResult, TranscriptionError> {
        let data = tokio::fs::read(audio_path).await?;
        let extension = audio_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_owned);

        let runtime = Arc::clone(&self.runtime);
        tokio::task::spawn_blocking(move || runtime.run(data, extension.as_deref()))
            .await
            .map_err(|e| inference(format!("inference task: {}", e)))?
    }
}

impl WhisperRuntime {
    fn run(
        &self,
        data: Vec<u8>,
        extension: Option<&str>,
    ) -> Result<InferenceResult, TranscriptionError> {
        let pcm = decode_audio_to_pcm(data, extension)?;
        let mels = mel_segments(&self.config, &self.mel_filters, &self.device, &pcm)?;

        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        model.reset_kv_cache();

        let language = match (self.multilingual, mels.first()) {
            (true, Some(first)) => self.detect_language(&mut model, first)?,
            _ => ENGLISH.to_string(),
        };

        let prefix = self.prompt_tokens(&language)?;
        let mut segments = Vec::new();
        for (i, mel) in mels.iter().enumerate() {
            tracing::debug!(segment = i, "Transcribing audio segment");
            let text = self.decode_segment(&mut model, mel, &prefix)?;
            if !text.is_empty() {
                segments.push(text);
            }
        }

        let transcript = segments.join(" ");
        tracing::info!(
            segments = mels.len(),
            language = %language,
            chars = transcript.len(),
            "Audio transcription completed"
        );

        Ok(InferenceResult::new(language, transcript))
    }

    fn prompt_tokens(&self, language: &str) -> Result<Vec<u32>, TranscriptionError> {
        let mut prefix = vec![self.token_id(m::SOT_TOKEN)?];
        if self.multilingual {
            prefix.push(self.token_id(&format!("<|{}|>", language))?);
        }
        prefix.push(self.token_id(m::TRANSCRIBE_TOKEN)?);
        prefix.push(self.token_id(m::NO_TIMESTAMPS_TOKEN)?);
        Ok(prefix)
    }

    /// Picks the language token with the highest logit after a bare
    /// start-of-transcript prompt.
    fn detect_language(
        &self,
        model: &mut m::model::Whisper,
        mel: &Tensor,
    ) -> Result<String, TranscriptionError> {
        let candidates: Vec<(&str, u32)> = LANGUAGES
            .iter()
            .filter_map(|code| {
                self.tokenizer
                    .token_to_id(&format!("<|{}|>", code))
                    .map(|id| (*code, id))
            })
            .collect();
        if candidates.is_empty() {
            return Err(inference("tokenizer has no language tokens"));
        }

        let audio_features = model.encoder.forward(mel, true).map_err(inference)?;
        let sot = Tensor::new(&[self.token_id(m::SOT_TOKEN)?], &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference)?;
        let hidden = model
            .decoder
            .forward(&sot, &audio_features, true)
            .and_then(|h| h.squeeze(0))
            .map_err(inference)?;
        let logits = model
            .decoder
            .final_linear(&hidden)
            .and_then(|l| l.get(0))
            .map_err(inference)?;

        let ids: Vec<u32> = candidates.iter().map(|(_, id)| *id).collect();
        let best = Tensor::new(ids.as_slice(), &self.device)
            .and_then(|ids| logits.index_select(&ids, 0))
            .and_then(|l| l.argmax(0))
            .and_then(|i| i.to_scalar::<u32>())
            .map_err(inference)? as usize;

        model.reset_kv_cache();

        let language = candidates[best].0;
        tracing::debug!(language, "Detected spoken language");
        Ok(language.to_string())
    }

    /// Greedy decoding of one window.
    fn decode_segment(
        &self,
        model: &mut m::model::Whisper,
        mel: &Tensor,
        prefix: &[u32],
    ) -> Result<String, TranscriptionError> {
        let eot = self.token_id(m::EOT_TOKEN)?;
        let audio_features = model.encoder.forward(mel, true).map_err(inference)?;

        let mut tokens = prefix.to_vec();
        for _ in 0..MAX_DECODE_TOKENS {
            let input = Tensor::new(tokens.as_slice(), &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(inference)?;
            let hidden = model
                .decoder
                .forward(&input, &audio_features, tokens.len() == prefix.len())
                .and_then(|h| h.squeeze(0))
                .map_err(inference)?;
            let logits = model.decoder.final_linear(&hidden).map_err(inference)?;

            let last = logits
                .dim(0)
                .and_then(|len| logits.get(len - 1))
                .map_err(inference)?;
            let next = last
                .argmax(0)
                .and_then(|t| t.to_scalar::<u32>())
                .map_err(inference)?;

            if next == eot {
                break;
            }
            tokens.push(next);
        }

        model.reset_kv_cache();

        let text = self
            .tokenizer
            .decode(&tokens[prefix.len()..], true)
            .map_err(inference)?;
        Ok(text.trim().to_string())
    }

    fn token_id(&self, token: &str) -> Result<u32, TranscriptionError> {
        self.tokenizer
            .token_to_id(token)
            .ok_or_else(|| inference(format!("token not found: {}", token)))
    }
}

/// Converts the whole clip to log-mel once, then cuts it into encoder windows
/// of at most `N_FRAMES` frames.
fn mel_segments(
    config: &Config,
    mel_filters: &[f32],
    device: &Device,
    pcm: &[f32],
) -> Result<Vec<Tensor>, TranscriptionError> {
    let n_mel = config.num_mel_bins;
    let mel = m::audio::pcm_to_mel(config, pcm, mel_filters);
    let total_frames = mel.len() / n_mel;
    let mel = Tensor::from_vec(mel, (1, n_mel, total_frames), device)
        .map_err(|e| inference(format!("mel tensor: {}", e)))?;

    // pcm_to_mel appends trailing silence; frames past the clip are not decoded
    let content_frames = pcm.len().div_ceil(m::HOP_LENGTH).min(total_frames);

    let mut segments = Vec::with_capacity(content_frames.div_ceil(m::N_FRAMES));
    let mut seek = 0;
    while seek < content_frames {
        let len = m::N_FRAMES.min(content_frames - seek);
        segments.push(
            mel.narrow(2, seek, len)
                .map_err(|e| inference(format!("mel segment: {}", e)))?,
        );
        seek += len;
    }
    Ok(segments)
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn load_failed(e: impl Display) -> TranscriptionError {
    TranscriptionError::ModelLoadFailed(e.to_string())
}

fn inference(e: impl Display) -> TranscriptionError {
    TranscriptionError::TranscriptionFailed(e.to_string())
}
