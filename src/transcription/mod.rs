// Gateway module for transcription - follows the Train Station Pattern
// All external access must go through this gateway

mod openai;
mod service;
mod traits;

pub use openai::WhisperTranscriber;
pub use service::TranscriptionService;
pub use traits::Transcriber;
#[cfg(test)]
pub use traits::MockTranscriber;
