//! Clients for the external AI capabilities the pipeline depends on.
//!
//! Each capability sits behind a trait so the pipeline can be driven by
//! any backend (or a fake in tests):
//! - [`TextGenerator`]: Gemini or OpenAI
//! - [`DocumentAnalyzer`]: Gemini multimodal
//! - [`SpeechSynthesizer`]: edge-tts CLI or OpenAI speech
//! - [`Transcriber`]: Whisper CLI or OpenAI transcription

mod env;
pub mod error;
pub mod http;
pub mod process;
pub mod speech;
pub mod text;
pub mod transcribe;

pub use error::{AiError, AiResult};
pub use speech::{SpeechBackend, SpeechSynthesizer, SynthesizedAudio};
pub use text::{DocumentAnalyzer, SourceDocument, TextGenerator, TextProvider};
pub use transcribe::{Transcriber, TranscriberBackend};
