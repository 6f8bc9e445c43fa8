pub mod audio_decoder;
mod candle_whisper_engine;
mod openai_whisper_engine;
mod transcription_engine_factory;

pub use candle_whisper_engine::CandleWhisperEngine;
pub use openai_whisper_engine::OpenAiWhisperEngine;
pub use transcription_engine_factory::TranscriptionEngineFactory;
