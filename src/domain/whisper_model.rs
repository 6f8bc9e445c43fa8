use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhisperModel {
    TinyEn,
    Tiny,
    BaseEn,
    Base,
    SmallEn,
    Small,
    MediumEn,
    Medium,
    LargeV1,
    LargeV2,
}

impl WhisperModel {
    pub const DEFAULT: WhisperModel = WhisperModel::Medium;

    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::TinyEn => "tiny.en",
            WhisperModel::Tiny => "tiny",
            WhisperModel::BaseEn => "base.en",
            WhisperModel::Base => "base",
            WhisperModel::SmallEn => "small.en",
            WhisperModel::Small => "small",
            WhisperModel::MediumEn => "medium.en",
            WhisperModel::Medium => "medium",
            WhisperModel::LargeV1 => "large-v1",
            WhisperModel::LargeV2 => "large-v2",
        }
    }

    /// Hugging Face repository holding the safetensors weights.
    pub fn repo_id(&self) -> String {
        format!("openai/whisper-{}", self.as_str())
    }

    /// English-only checkpoints carry no language tokens.
    pub fn is_multilingual(&self) -> bool {
        !matches!(
            self,
            WhisperModel::TinyEn
                | WhisperModel::BaseEn
                | WhisperModel::SmallEn
                | WhisperModel::MediumEn
        )
    }

    /// Resolves an optional request identifier, falling back to `default`.
    pub fn resolve(requested: Option<&str>, default: WhisperModel) -> Result<Self, String> {
        match requested.map(str::trim) {
            None | Some("") => Ok(default),
            Some(name) => name.parse(),
        }
    }
}

impl Default for WhisperModel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for WhisperModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny.en" => Ok(WhisperModel::TinyEn),
            "tiny" => Ok(WhisperModel::Tiny),
            "base.en" => Ok(WhisperModel::BaseEn),
            "base" => Ok(WhisperModel::Base),
            "small.en" => Ok(WhisperModel::SmallEn),
            "small" => Ok(WhisperModel::Small),
            "medium.en" => Ok(WhisperModel::MediumEn),
            "medium" => Ok(WhisperModel::Medium),
            "large-v1" => Ok(WhisperModel::LargeV1),
            "large-v2" | "large" => Ok(WhisperModel::LargeV2),
            other => Err(format!("Unknown whisper model: {}", other)),
        }
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
